//! Rigid-body physics model.

use std::marker::PhantomData;

use sim_core::entity::Entity;
use sim_core::{PhysicsModel, SpaceTransform};
use sim_types::{EntityId, Pose, Result, Shape, SimError, Twist};
use tracing::debug;

use crate::scene::{BodyHandle, NativeBody, NativeScene};

/// One entity's body in a [`NativeScene`] whose native convention is `S`.
///
/// The cached pose and twist are canonical; every read or write of the
/// native body goes through `S`.
#[derive(Debug)]
pub struct RigidModel<S> {
    entity: EntityId,
    handle: BodyHandle,
    shape: Shape,
    pose: Pose,
    twist: Twist,
    origin: Pose,
    origin_twist: Twist,
    _space: PhantomData<S>,
}

impl<S: SpaceTransform> RigidModel<S> {
    /// Create the native body for `entity` in `scene`.
    ///
    /// The body starts at the entity's current pose and velocity; reset
    /// returns it to the entity's creation pose and velocity.
    ///
    /// # Errors
    ///
    /// `MissingComponent` if the entity has no body component,
    /// `InvalidShape` if its shape is degenerate or its pose non-finite.
    pub fn create(entity: &Entity, scene: &mut NativeScene) -> Result<Self> {
        let body = entity.body()?;
        let shape = *body.shape();
        shape.validate().map_err(|reason| SimError::InvalidShape {
            entity: entity.id().to_string(),
            reason,
        })?;
        if !entity.pose().is_finite() || !body.velocity().is_finite() {
            return Err(SimError::InvalidShape {
                entity: entity.id().to_string(),
                reason: "pose or velocity is not finite".to_string(),
            });
        }

        let pose = *entity.pose();
        let twist = *body.velocity();
        let native_pose = S::to_backend(&pose);
        let native_twist = S::twist_to_backend(&twist);
        let handle = scene.create_body(NativeBody {
            position: native_pose.position,
            orientation: native_pose.orientation,
            linear_velocity: native_twist.linear,
            angular_velocity: native_twist.angular,
            shape,
            dynamic: body.is_movable(),
        });
        debug!(entity = %entity.id(), body = ?handle, space = S::NAME, "native body created");

        Ok(Self {
            entity: entity.id().clone(),
            handle,
            shape,
            pose,
            twist,
            origin: *body.origin(),
            origin_twist: *body.origin_velocity(),
            _space: PhantomData,
        })
    }

    /// Native body handle.
    #[must_use]
    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    /// Pose restored by reset.
    #[must_use]
    pub fn origin(&self) -> &Pose {
        &self.origin
    }
}

impl<S: SpaceTransform> PhysicsModel for RigidModel<S> {
    type Backend = NativeScene;

    fn entity_id(&self) -> &EntityId {
        &self.entity
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn twist(&self) -> Twist {
        self.twist
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn sync_from_backend(&mut self, scene: &NativeScene) {
        match scene.body(self.handle) {
            Ok(body) => {
                self.pose = S::from_backend(&Pose::new(body.position, body.orientation));
                self.twist =
                    S::twist_from_backend(&Twist::new(body.linear_velocity, body.angular_velocity));
            }
            Err(err) => debug!(entity = %self.entity, error = %err, "sync skipped"),
        }
    }

    fn sync_to_backend(&self, scene: &mut NativeScene) {
        let pose = S::to_backend(&self.pose);
        let twist = S::twist_to_backend(&self.twist);
        match scene.body_mut(self.handle) {
            Ok(body) => {
                body.position = pose.position;
                body.orientation = pose.orientation;
                body.linear_velocity = twist.linear;
                body.angular_velocity = twist.angular;
            }
            Err(err) => debug!(entity = %self.entity, error = %err, "sync skipped"),
        }
    }

    fn reset(&mut self, scene: &mut NativeScene) {
        self.pose = self.origin;
        self.twist = self.origin_twist;
        self.sync_to_backend(scene);
    }

    fn release(self, scene: &mut NativeScene) {
        if let Err(err) = scene.release(self.handle) {
            debug!(entity = %self.entity, error = %err, "native body already released");
        }
    }
}
