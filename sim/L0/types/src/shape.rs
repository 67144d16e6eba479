//! Collision geometry of embodied entities.
//!
//! Shapes are described in the entity's local frame, which follows the
//! canonical convention (local Z is the axis of cylinders and capsules).

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bounding/collision geometry held by an entity's body component.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// Sphere centered on the entity origin.
    Sphere {
        /// Sphere radius in meters.
        radius: f64,
    },
    /// Box centered on the entity origin.
    Box {
        /// Half-extents along the local axes.
        half_extents: Vector3<f64>,
    },
    /// Cylinder along local Z, centered on the entity origin.
    Cylinder {
        /// Half of the cylinder height.
        half_length: f64,
        /// Cylinder radius.
        radius: f64,
    },
    /// Capsule (sphere-swept segment) along local Z.
    Capsule {
        /// Half-length of the cylindrical portion.
        half_length: f64,
        /// Capsule radius.
        radius: f64,
    },
}

impl Shape {
    /// Create a sphere.
    #[must_use]
    pub const fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box from its half-extents.
    #[must_use]
    pub const fn cuboid(half_extents: Vector3<f64>) -> Self {
        Self::Box { half_extents }
    }

    /// Create a cylinder.
    #[must_use]
    pub const fn cylinder(half_length: f64, radius: f64) -> Self {
        Self::Cylinder {
            half_length,
            radius,
        }
    }

    /// Create a capsule.
    #[must_use]
    pub const fn capsule(half_length: f64, radius: f64) -> Self {
        Self::Capsule {
            half_length,
            radius,
        }
    }

    /// Check that every dimension is finite and strictly positive
    /// (a capsule's half-length may be zero).
    ///
    /// Returns a description of the first offending dimension.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(format!("{name} must be positive and finite, got {value}"))
            }
        };
        match self {
            Self::Sphere { radius } => positive("radius", *radius),
            Self::Box { half_extents } => {
                positive("half_extents.x", half_extents.x)?;
                positive("half_extents.y", half_extents.y)?;
                positive("half_extents.z", half_extents.z)
            }
            Self::Cylinder {
                half_length,
                radius,
            } => {
                positive("half_length", *half_length)?;
                positive("radius", *radius)
            }
            Self::Capsule {
                half_length,
                radius,
            } => {
                if !(half_length.is_finite() && *half_length >= 0.0) {
                    return Err(format!(
                        "half_length must be non-negative and finite, got {half_length}"
                    ));
                }
                positive("radius", *radius)
            }
        }
    }

    /// Radius of the smallest origin-centered sphere enclosing the shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Box { half_extents } => half_extents.norm(),
            Self::Cylinder {
                half_length,
                radius,
            } => half_length.hypot(*radius),
            Self::Capsule {
                half_length,
                radius,
            } => half_length + radius,
        }
    }

    /// Support function: the largest extent of the shape along `direction`.
    ///
    /// `direction` is a unit vector in the shape's local frame. For a shape
    /// resting on a plane with normal `n`, `support(-n)` is the distance from
    /// the origin to the lowest point.
    #[must_use]
    pub fn support(&self, direction: &Vector3<f64>) -> f64 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Box { half_extents } => {
                direction.x.abs() * half_extents.x
                    + direction.y.abs() * half_extents.y
                    + direction.z.abs() * half_extents.z
            }
            Self::Cylinder {
                half_length,
                radius,
            } => radius * direction.x.hypot(direction.y) + half_length * direction.z.abs(),
            Self::Capsule {
                half_length,
                radius,
            } => radius + half_length * direction.z.abs(),
        }
    }
}
