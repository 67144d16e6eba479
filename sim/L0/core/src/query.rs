//! Spatial queries: ray intersection against entity geometry.
//!
//! All computations are in canonical space. Shapes are placed with the
//! model's canonical pose; boxes, cylinders and capsules are tested in their
//! local frame after transforming the ray.
//!
//! # Supported Shapes
//!
//! - Sphere: analytic quadratic
//! - Box: slab test in local coordinates
//! - Cylinder: infinite cylinder plus flat caps
//! - Capsule: infinite cylinder plus end-cap spheres

// Allow suspicious_operation_groupings - false positive for quadratic discriminant formula b*b - a*c
#![allow(clippy::suspicious_operation_groupings, clippy::many_single_char_names)]

use nalgebra::{Point3, Vector3};
use sim_types::{EntityId, Pose, Ray3, Shape};

/// Intersection of a ray with a single shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    /// Distance from the ray origin.
    pub distance: f64,
    /// Hit point in canonical space.
    pub point: Point3<f64>,
    /// Surface normal at the hit point (pointing away from the surface).
    pub normal: Vector3<f64>,
}

/// Nearest entity hit by a ray.
#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin.
    pub distance: f64,
    /// Entity that was hit.
    pub entity: EntityId,
    /// Hit point in canonical space.
    pub point: Point3<f64>,
    /// Surface normal at the hit point.
    pub normal: Vector3<f64>,
}

/// Keep the nearer of two optional hits. On equal distance `current` wins,
/// which makes the first candidate in iteration order the tie-breaker.
#[must_use]
pub fn nearer(current: Option<RayHit>, candidate: Option<RayHit>) -> Option<RayHit> {
    match (current, candidate) {
        (Some(best), Some(hit)) if hit.distance < best.distance => Some(hit),
        (Some(best), _) => Some(best),
        (None, hit) => hit,
    }
}

/// Nearest hit among `candidates`, ties broken by iteration order.
///
/// Returns `None` (not an error) when nothing is hit.
pub fn nearest_hit<'a, I>(candidates: I, ray: &Ray3) -> Option<RayHit>
where
    I: IntoIterator<Item = (&'a EntityId, Pose, &'a Shape)>,
{
    candidates
        .into_iter()
        .fold(None, |best, (entity, pose, shape)| {
            let candidate = raycast_shape(shape, &pose, ray).map(|hit| RayHit {
                distance: hit.distance,
                entity: entity.clone(),
                point: hit.point,
                normal: hit.normal,
            });
            nearer(best, candidate)
        })
}

/// Cast a ray against a shape placed at `pose`.
///
/// Returns the closest hit within `ray.max_distance`, or `None`.
#[must_use]
pub fn raycast_shape(shape: &Shape, pose: &Pose, ray: &Ray3) -> Option<ShapeHit> {
    if !(ray.max_distance >= 0.0) {
        return None;
    }
    match shape {
        Shape::Sphere { radius } => raycast_sphere(pose.position, *radius, ray),
        Shape::Box { half_extents } => raycast_box(pose, half_extents, ray),
        Shape::Cylinder {
            half_length,
            radius,
        } => raycast_cylinder(pose, *half_length, *radius, ray),
        Shape::Capsule {
            half_length,
            radius,
        } => raycast_capsule(pose, *half_length, *radius, ray),
    }
}

/// Safe vector normalization with fallback.
#[inline]
fn safe_normalize(v: &Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > 1e-10 { v / n } else { fallback }
}

/// Ray in a shape's local frame.
struct LocalRay {
    origin: Point3<f64>,
    dir: Vector3<f64>,
}

impl LocalRay {
    fn new(pose: &Pose, ray: &Ray3) -> Self {
        Self {
            origin: pose.inverse_transform_point(&ray.origin),
            dir: pose.inverse_transform_vector(ray.direction.as_ref()),
        }
    }

    fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.dir * t
    }
}

fn world_hit(pose: &Pose, t: f64, local_point: &Point3<f64>, local_normal: &Vector3<f64>) -> ShapeHit {
    ShapeHit {
        distance: t,
        point: pose.transform_point(local_point),
        normal: safe_normalize(&pose.transform_vector(local_normal), *local_normal),
    }
}

fn raycast_sphere(center: Point3<f64>, radius: f64, ray: &Ray3) -> Option<ShapeHit> {
    let oc = ray.origin - center;
    let dir = ray.direction.as_ref();

    // Quadratic: t^2 + 2*b*t + c = 0 where b = oc·dir, c = oc·oc - r²
    let b = oc.dot(dir);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = b * b - c;

    // Miss or NaN
    if !(discriminant >= 0.0) {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let mut t = -b - sqrt_d;
    if t < 0.0 {
        // Origin inside the sphere: exit point
        t = -b + sqrt_d;
    }
    if t < 0.0 || t > ray.max_distance {
        return None;
    }

    let point = ray.point_at(t);
    Some(ShapeHit {
        distance: t,
        point,
        normal: safe_normalize(&(point - center), *dir),
    })
}

fn raycast_box(pose: &Pose, half_extents: &Vector3<f64>, ray: &Ray3) -> Option<ShapeHit> {
    let local = LocalRay::new(pose, ray);

    let mut t_min = 0.0_f64;
    let mut t_max = ray.max_distance;
    let mut hit_normal = Vector3::zeros();

    for i in 0..3 {
        let origin_i = local.origin[i];
        let dir_i = local.dir[i];
        let extent = half_extents[i];

        if dir_i.abs() < 1e-10 {
            // Parallel to the slab
            if origin_i < -extent || origin_i > extent {
                return None;
            }
        } else {
            let inv_dir = 1.0 / dir_i;
            let t1 = (-extent - origin_i) * inv_dir;
            let t2 = (extent - origin_i) * inv_dir;
            let (t_near, t_far, sign) = if t1 < t2 { (t1, t2, -1.0) } else { (t2, t1, 1.0) };

            if t_near > t_min {
                t_min = t_near;
                hit_normal = Vector3::zeros();
                hit_normal[i] = sign;
            }
            t_max = t_max.min(t_far);
            if t_min > t_max {
                return None;
            }
        }
    }

    if hit_normal == Vector3::zeros() {
        // Origin inside the box: report the exit face
        let exit = local.at(t_max);
        let (axis, _) = (0..3)
            .map(|i| (i, (exit[i].abs() - half_extents[i]).abs()))
            .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });
        hit_normal[axis] = exit[axis].signum();
        if !t_max.is_finite() {
            return None;
        }
        return Some(world_hit(pose, t_max, &exit, &hit_normal));
    }

    Some(world_hit(pose, t_min, &local.at(t_min), &hit_normal))
}

/// Intersections with the infinite cylinder of `radius` around local Z,
/// kept where `|z| <= half_length`. Entry first.
fn side_wall_hits(
    local: &LocalRay,
    half_length: f64,
    radius: f64,
) -> [Option<(f64, Point3<f64>, Vector3<f64>)>; 2] {
    let oc = Vector3::new(local.origin.x, local.origin.y, 0.0);
    let dir_xy = Vector3::new(local.dir.x, local.dir.y, 0.0);
    let a = dir_xy.dot(&dir_xy);
    let b = oc.dot(&dir_xy);
    let c = oc.dot(&oc) - radius * radius;
    if a <= 1e-10 {
        return [None, None];
    }
    let discriminant = b * b - a * c;
    if discriminant < 0.0 || !discriminant.is_finite() {
        return [None, None];
    }
    let sqrt_d = discriminant.sqrt();
    [(-b - sqrt_d) / a, (-b + sqrt_d) / a].map(|t| {
        let pt = local.at(t);
        (pt.z.abs() <= half_length).then(|| {
            let radial = Vector3::new(pt.x, pt.y, 0.0);
            (t, pt, safe_normalize(&radial, Vector3::x()))
        })
    })
}

fn raycast_cylinder(pose: &Pose, half_length: f64, radius: f64, ray: &Ray3) -> Option<ShapeHit> {
    let local = LocalRay::new(pose, ray);
    let mut closest: Option<(f64, Point3<f64>, Vector3<f64>)> = None;
    let mut consider = |t: f64, pt: Point3<f64>, normal: Vector3<f64>| {
        if t >= 0.0 && t <= ray.max_distance && closest.map_or(true, |(best, _, _)| t < best) {
            closest = Some((t, pt, normal));
        }
    };

    for (t, pt, normal) in side_wall_hits(&local, half_length, radius).into_iter().flatten() {
        consider(t, pt, normal);
    }

    // Flat caps
    if local.dir.z.abs() > 1e-10 {
        for (cap_z, cap_normal) in [(-half_length, -Vector3::z()), (half_length, Vector3::z())] {
            let t = (cap_z - local.origin.z) / local.dir.z;
            let pt = local.at(t);
            if pt.x * pt.x + pt.y * pt.y <= radius * radius {
                consider(t, pt, cap_normal);
            }
        }
    }

    closest.map(|(t, pt, normal)| world_hit(pose, t, &pt, &normal))
}

fn raycast_capsule(pose: &Pose, half_length: f64, radius: f64, ray: &Ray3) -> Option<ShapeHit> {
    let local = LocalRay::new(pose, ray);
    let mut closest: Option<(f64, Point3<f64>, Vector3<f64>)> = None;
    let mut consider = |t: f64, pt: Point3<f64>, normal: Vector3<f64>| {
        if t >= 0.0 && t <= ray.max_distance && closest.map_or(true, |(best, _, _)| t < best) {
            closest = Some((t, pt, normal));
        }
    };

    // Cylindrical body
    for (t, pt, normal) in side_wall_hits(&local, half_length, radius).into_iter().flatten() {
        consider(t, pt, normal);
    }

    // End-cap spheres
    for cap_center in [
        Point3::new(0.0, 0.0, -half_length),
        Point3::new(0.0, 0.0, half_length),
    ] {
        let oc = local.origin - cap_center;
        let b = oc.dot(&local.dir);
        let c = oc.dot(&oc) - radius * radius;
        let discriminant = b * b - c;
        if discriminant >= 0.0 && discriminant.is_finite() {
            let sqrt_d = discriminant.sqrt();
            for t in [-b - sqrt_d, -b + sqrt_d] {
                let pt = local.at(t);
                consider(t, pt, safe_normalize(&(pt - cap_center), local.dir));
            }
        }
    }

    closest.map(|(t, pt, normal)| world_hit(pose, t, &pt, &normal))
}
