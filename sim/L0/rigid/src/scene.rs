//! The native rigid-body scene.
//!
//! The scene knows nothing about canonical space: gravity, the ground normal
//! and every body state are expressed in the backend's native convention.
//! Shapes are described in the entity frame, so the scene is given the
//! matrix mapping native body-frame directions into that frame.
//!
//! # Integration
//!
//! Semi-implicit Euler with `iterations` substeps per step:
//!
//! ```text
//! v ← v + g·h
//! x ← x + v·h
//! q ← exp(ω·h) · q
//! ```
//!
//! followed by ground contact for each dynamic body.

use nalgebra::{Matrix3, Point3, UnitQuaternion, UnitVector3, Vector3};
use sim_types::{MaterialConfig, Shape};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

new_key_type! {
    /// Generational handle to a body in a [`NativeScene`].
    pub struct BodyHandle;
}

/// Errors raised by the native scene.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SceneError {
    /// The handle does not refer to a live body.
    #[error("body handle {0:?} is stale")]
    StaleHandle(BodyHandle),

    /// Integration produced NaN or infinity.
    #[error("body {0:?} has a non-finite state")]
    NonFinite(BodyHandle),

    /// The scene description is unusable.
    #[error("invalid scene description: {0}")]
    InvalidDescription(String),
}

/// Native state of one body.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeBody {
    /// Position (native).
    pub position: Point3<f64>,
    /// Orientation (native).
    pub orientation: UnitQuaternion<f64>,
    /// Linear velocity (native).
    pub linear_velocity: Vector3<f64>,
    /// Angular velocity (native).
    pub angular_velocity: Vector3<f64>,
    /// Collision geometry in the entity frame.
    pub shape: Shape,
    /// Static bodies are never integrated.
    pub dynamic: bool,
}

impl NativeBody {
    fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.orientation.coords.iter().all(|x| x.is_finite())
            && self.linear_velocity.iter().all(|x| x.is_finite())
            && self.angular_velocity.iter().all(|x| x.is_finite())
    }
}

/// Construction parameters of a scene, in native space.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDesc {
    /// Gravity acceleration.
    pub gravity: Vector3<f64>,
    /// Ground plane normal (pointing up).
    pub up: UnitVector3<f64>,
    /// Whether the static ground plane through the origin exists.
    pub ground: bool,
    /// Default material for every contact.
    pub material: MaterialConfig,
    /// Maps native body-frame directions into the entity frame.
    pub shape_frame: Matrix3<f64>,
}

/// A self-contained rigid-body world.
#[derive(Debug, Clone)]
pub struct NativeScene {
    desc: SceneDesc,
    bodies: SlotMap<BodyHandle, NativeBody>,
    time: f64,
}

impl NativeScene {
    /// Create an empty scene.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidDescription`] for non-finite gravity or frame.
    pub fn new(desc: SceneDesc) -> Result<Self, SceneError> {
        if !desc.gravity.iter().all(|x| x.is_finite()) {
            return Err(SceneError::InvalidDescription("gravity is not finite".into()));
        }
        if !desc.shape_frame.iter().all(|x| x.is_finite()) {
            return Err(SceneError::InvalidDescription("shape frame is not finite".into()));
        }
        Ok(Self {
            desc,
            bodies: SlotMap::with_key(),
            time: 0.0,
        })
    }

    /// Scene description.
    #[must_use]
    pub fn desc(&self) -> &SceneDesc {
        &self.desc
    }

    /// Number of live bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the scene has no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Simulated time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Zero the clock.
    pub fn reset_time(&mut self) {
        self.time = 0.0;
    }

    /// Add a body.
    pub fn create_body(&mut self, body: NativeBody) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Remove a body and return its final state.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleHandle`] if the body was already released.
    pub fn release(&mut self, handle: BodyHandle) -> Result<NativeBody, SceneError> {
        self.bodies
            .remove(handle)
            .ok_or(SceneError::StaleHandle(handle))
    }

    /// Body state.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleHandle`] for released bodies.
    pub fn body(&self, handle: BodyHandle) -> Result<&NativeBody, SceneError> {
        self.bodies.get(handle).ok_or(SceneError::StaleHandle(handle))
    }

    /// Mutable body state.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleHandle`] for released bodies.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut NativeBody, SceneError> {
        self.bodies
            .get_mut(handle)
            .ok_or(SceneError::StaleHandle(handle))
    }

    /// Advance by `dt` seconds in `substeps` equal substeps.
    ///
    /// # Errors
    ///
    /// [`SceneError::NonFinite`] naming the first body whose state blew up.
    /// Bodies before it have already been advanced.
    pub fn step(&mut self, dt: f64, substeps: u32) -> Result<(), SceneError> {
        let substeps = substeps.max(1);
        let h = dt / f64::from(substeps);
        let desc = &self.desc;

        for (handle, body) in self.bodies.iter_mut().filter(|(_, body)| body.dynamic) {
            for _ in 0..substeps {
                integrate(body, desc.gravity, h);
                if desc.ground {
                    resolve_ground_contact(body, desc);
                }
            }
            if !body.is_finite() {
                return Err(SceneError::NonFinite(handle));
            }
        }

        self.time += dt;
        Ok(())
    }
}

fn integrate(body: &mut NativeBody, gravity: Vector3<f64>, h: f64) {
    body.linear_velocity += gravity * h;
    body.position += body.linear_velocity * h;
    body.orientation = UnitQuaternion::from_scaled_axis(body.angular_velocity * h) * body.orientation;
}

/// Push a body out of the ground plane and apply restitution and Coulomb
/// friction to the velocity at the contact.
fn resolve_ground_contact(body: &mut NativeBody, desc: &SceneDesc) {
    let up = desc.up.into_inner();
    let down_local = desc.shape_frame * (body.orientation.inverse() * -up);
    let extent = body.shape.support(&down_local);
    let height = body.position.coords.dot(&up);
    if height >= extent {
        return;
    }

    body.position += up * (extent - height);

    let normal_speed = body.linear_velocity.dot(&up);
    if normal_speed >= 0.0 {
        return;
    }
    let material = &desc.material;
    let tangential = body.linear_velocity - up * normal_speed;
    let impulse = (1.0 + material.restitution) * -normal_speed;
    let tangential_speed = tangential.norm();

    let tangential = if tangential_speed <= material.static_friction * impulse {
        Vector3::zeros()
    } else {
        tangential * (1.0 - material.dynamic_friction * impulse / tangential_speed).max(0.0)
    };
    body.linear_velocity = tangential - up * (normal_speed * material.restitution);
}
