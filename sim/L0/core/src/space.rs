//! Conversion between canonical space and a backend's native space.
//!
//! Canonical space is right-handed and Z-up: the camera looks along +X, the
//! base of the screen is Y and the vertical side of the screen is Z. A backend
//! may use any other axis convention; its [`SpaceTransform`] is a fixed
//! signed permutation of the axes, so every conversion is exact (no rounding)
//! and `from_backend(to_backend(x)) == x` bit for bit.
//!
//! A signed permutation `M` with `det(M) = -1` flips handedness. Polar
//! vectors (positions, linear velocities) map through `M`; axial vectors
//! (angular velocities, quaternion axes) map through `det(M) · M`. With that
//! rule, rotating then converting equals converting then rotating:
//!
//! ```
//! use sim_core::space::{SpaceTransform, YUpLeftHanded};
//! use nalgebra::{UnitQuaternion, Vector3};
//!
//! let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
//! let v = Vector3::new(1.0, -2.0, 0.5);
//!
//! let converted_after = YUpLeftHanded::vector_to_backend(&(q * v));
//! let converted_before =
//!     YUpLeftHanded::quaternion_to_backend(&q) * YUpLeftHanded::vector_to_backend(&v);
//! assert!((converted_after - converted_before).norm() < 1e-12);
//! ```

use std::fmt;

use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};
use sim_types::{Pose, Twist};

/// A constant coordinate-system mapping between canonical space and a
/// backend's native space.
///
/// Implementors supply the four primitive conversions; everything else is
/// derived. Implementations must be exact inverses of each other.
pub trait SpaceTransform: 'static + Send + Sync + fmt::Debug {
    /// Human-readable name of the native convention.
    const NAME: &'static str;

    /// Whether native space has the same handedness as canonical space.
    const PRESERVES_HANDEDNESS: bool;

    /// Map a polar vector from canonical to native space.
    fn vector_to_backend(v: &Vector3<f64>) -> Vector3<f64>;

    /// Map a polar vector from native to canonical space.
    fn vector_from_backend(v: &Vector3<f64>) -> Vector3<f64>;

    /// Map an orientation from canonical to native space.
    fn quaternion_to_backend(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64>;

    /// Map an orientation from native to canonical space.
    fn quaternion_from_backend(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64>;

    /// Map a point from canonical to native space.
    fn point_to_backend(p: &Point3<f64>) -> Point3<f64> {
        Point3::from(Self::vector_to_backend(&p.coords))
    }

    /// Map a point from native to canonical space.
    fn point_from_backend(p: &Point3<f64>) -> Point3<f64> {
        Point3::from(Self::vector_from_backend(&p.coords))
    }

    /// Map an axial vector (e.g. angular velocity) to native space.
    fn axial_to_backend(v: &Vector3<f64>) -> Vector3<f64> {
        let mapped = Self::vector_to_backend(v);
        if Self::PRESERVES_HANDEDNESS {
            mapped
        } else {
            -mapped
        }
    }

    /// Map an axial vector from native to canonical space.
    fn axial_from_backend(v: &Vector3<f64>) -> Vector3<f64> {
        let mapped = Self::vector_from_backend(v);
        if Self::PRESERVES_HANDEDNESS {
            mapped
        } else {
            -mapped
        }
    }

    /// Convert a canonical pose into native space.
    fn to_backend(pose: &Pose) -> Pose {
        Pose::new(
            Self::point_to_backend(&pose.position),
            Self::quaternion_to_backend(&pose.orientation),
        )
    }

    /// Convert a native pose into canonical space.
    fn from_backend(pose: &Pose) -> Pose {
        Pose::new(
            Self::point_from_backend(&pose.position),
            Self::quaternion_from_backend(&pose.orientation),
        )
    }

    /// Convert a canonical twist into native space.
    fn twist_to_backend(twist: &Twist) -> Twist {
        Twist::new(
            Self::vector_to_backend(&twist.linear),
            Self::axial_to_backend(&twist.angular),
        )
    }

    /// Convert a native twist into canonical space.
    fn twist_from_backend(twist: &Twist) -> Twist {
        Twist::new(
            Self::vector_from_backend(&twist.linear),
            Self::axial_from_backend(&twist.angular),
        )
    }

    /// Matrix taking native-frame vectors to canonical-frame vectors.
    ///
    /// Backends use it to evaluate canonical shape geometry along a native
    /// direction.
    fn basis_from_backend() -> Matrix3<f64> {
        Matrix3::from_columns(&[
            Self::vector_from_backend(&Vector3::x()),
            Self::vector_from_backend(&Vector3::y()),
            Self::vector_from_backend(&Vector3::z()),
        ])
    }
}

/// Native space identical to canonical space (right-handed, Z-up).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Canonical;

impl SpaceTransform for Canonical {
    const NAME: &'static str = "canonical (right-handed, Z-up)";
    const PRESERVES_HANDEDNESS: bool = true;

    fn vector_to_backend(v: &Vector3<f64>) -> Vector3<f64> {
        *v
    }

    fn vector_from_backend(v: &Vector3<f64>) -> Vector3<f64> {
        *v
    }

    fn quaternion_to_backend(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        *q
    }

    fn quaternion_from_backend(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        *q
    }
}

/// Left-handed, Y-up native space with the camera along native Z.
///
/// Native X is canonical -Y, native Y is canonical Z, native Z is canonical
/// X.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YUpLeftHanded;

impl SpaceTransform for YUpLeftHanded {
    const NAME: &'static str = "left-handed, Y-up";
    const PRESERVES_HANDEDNESS: bool = false;

    fn vector_to_backend(v: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(-v.y, v.z, v.x)
    }

    fn vector_from_backend(v: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(v.z, -v.x, v.y)
    }

    fn quaternion_to_backend(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.j, -q.k, -q.i))
    }

    fn quaternion_from_backend(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        UnitQuaternion::new_unchecked(Quaternion::new(q.w, -q.k, q.i, -q.j))
    }
}

/// Right-handed, Y-up native space.
///
/// Native X is canonical X, native Y is canonical Z, native Z is canonical
/// -Y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YUpRightHanded;

impl SpaceTransform for YUpRightHanded {
    const NAME: &'static str = "right-handed, Y-up";
    const PRESERVES_HANDEDNESS: bool = true;

    fn vector_to_backend(v: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(v.x, v.z, -v.y)
    }

    fn vector_from_backend(v: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(v.x, -v.z, v.y)
    }

    fn quaternion_to_backend(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.i, q.k, -q.j))
    }

    fn quaternion_from_backend(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.i, -q.k, q.j))
    }
}
