//! Volumes and rays used by spatial queries.

use nalgebra::{Point3, UnitVector3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned box in canonical space.
///
/// Bounds are closed: a point lying exactly on a face is contained. Two
/// engines that share a face therefore both contain the points on it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Create a box from its corners.
    #[must_use]
    pub const fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Create a box from a center and half-extents.
    #[must_use]
    pub fn from_center(center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Whether every coordinate is finite and `min <= max` on each axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| {
            self.min[i].is_finite() && self.max[i].is_finite() && self.min[i] <= self.max[i]
        })
    }

    /// Closed containment test.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Half-extents of the box.
    #[must_use]
    pub fn half_extents(&self) -> Vector3<f64> {
        (self.max - self.min) * 0.5
    }
}

/// A ray (half-line, optionally clipped) in canonical space.
///
/// Distances along the ray are measured in meters from `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ray3 {
    /// Start point of the ray.
    pub origin: Point3<f64>,
    /// Unit direction.
    pub direction: UnitVector3<f64>,
    /// Hits farther than this are ignored.
    pub max_distance: f64,
}

impl Ray3 {
    /// Create an unbounded ray.
    ///
    /// The direction is normalized; a zero direction yields `None`.
    #[must_use]
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Option<Self> {
        UnitVector3::try_new(direction, 1e-12).map(|direction| Self {
            origin,
            direction,
            max_distance: f64::INFINITY,
        })
    }

    /// Create a ray covering the segment from `start` to `end`.
    ///
    /// Returns `None` when the two points coincide.
    #[must_use]
    pub fn from_segment(start: Point3<f64>, end: Point3<f64>) -> Option<Self> {
        let delta = end - start;
        let length = delta.norm();
        Self::new(start, delta).map(|ray| ray.with_max_distance(length))
    }

    /// Clip the ray at the given distance.
    #[must_use]
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Point at distance `t` along the ray.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction.as_ref() * t
    }
}
