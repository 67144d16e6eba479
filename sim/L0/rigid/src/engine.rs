//! The rigid-body engine adapter.

use std::fmt;
use std::sync::Arc;

use nalgebra::{Point3, UnitVector3, Vector3};
use sim_core::entity::Entity;
use sim_core::{ActionTag, EngineCore, OperationRegistry, PhysicsEngine, PhysicsModel, RayHit, SpaceTransform, YUpLeftHanded};
use sim_types::{EngineConfig, EngineId, EngineState, EntityId, Pose, Ray3, Result, SimError, Twist};
use tracing::{debug, info, warn};

use crate::model::RigidModel;
use crate::scene::{NativeScene, SceneDesc};

/// A [`PhysicsEngine`] backed by a [`NativeScene`] in convention `S`.
///
/// Add and remove are dispatched through the shared [`OperationRegistry`];
/// the engine only handles entity kinds whose operations were registered
/// with [`register_operations`](crate::register_operations) for the same `S`.
pub struct RigidEngine<S: SpaceTransform = YUpLeftHanded> {
    core: EngineCore<RigidModel<S>>,
    scene: Option<NativeScene>,
    timestep: f64,
    iterations: u32,
}

impl<S: SpaceTransform> RigidEngine<S> {
    /// Create an uninitialized engine.
    #[must_use]
    pub fn new(id: impl Into<EngineId>, registry: Arc<OperationRegistry>) -> Self {
        Self {
            core: EngineCore::new(id, registry),
            scene: None,
            timestep: 0.0,
            iterations: 0,
        }
    }

    /// The native scene, once initialized.
    #[must_use]
    pub fn scene(&self) -> Option<&NativeScene> {
        self.scene.as_ref()
    }

    /// Model for `id`.
    #[must_use]
    pub fn model(&self, id: &EntityId) -> Option<&RigidModel<S>> {
        self.core.models().get(id)
    }

    fn scene_mut(&mut self, operation: &str) -> Result<&mut NativeScene> {
        let state = self.core.state();
        let id = self.core.id();
        self.scene
            .as_mut()
            .ok_or_else(|| SimError::invalid_state(id.as_str(), operation, state.name()))
    }

    /// Build a model for `entity` in the native scene.
    ///
    /// # Errors
    ///
    /// `InvalidState` before `init`, otherwise as
    /// [`RigidModel::create`].
    pub fn create_model(&mut self, entity: &Entity) -> Result<RigidModel<S>> {
        let scene = self.scene_mut("add")?;
        RigidModel::create(entity, scene)
    }

    /// Register a model with the engine.
    ///
    /// # Errors
    ///
    /// `DuplicateModel` if the entity already has one; the rejected model's
    /// native body is released.
    pub fn add_physics_model(&mut self, model: RigidModel<S>) -> Result<()> {
        let id = model.entity_id().clone();
        if let Err((err, model)) = self.core.insert_model(id, model) {
            if let Some(scene) = self.scene.as_mut() {
                model.release(scene);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Unregister and release the model for `id`.
    ///
    /// # Errors
    ///
    /// `ModelNotFound` if there is none; nothing changes.
    pub fn remove_physics_model(&mut self, id: &EntityId) -> Result<()> {
        let model = self.core.remove_model(id)?;
        if let Some(scene) = self.scene.as_mut() {
            model.release(scene);
        }
        Ok(())
    }

    fn dispatch(&mut self, action: ActionTag, entity: &mut Entity) -> Result<()> {
        self.core.require_live(action.name())?;
        let registry = Arc::clone(self.core.registry());
        registry.apply(action, self, entity)
    }
}

impl<S: SpaceTransform> PhysicsEngine for RigidEngine<S> {
    fn id(&self) -> &EngineId {
        self.core.id()
    }

    fn state(&self) -> EngineState {
        self.core.state()
    }

    fn init(&mut self, config: &EngineConfig) -> Result<()> {
        self.core.require("init", &[EngineState::Uninitialized])?;
        config.validate(self.core.id().as_str())?;

        let desc = SceneDesc {
            gravity: S::vector_to_backend(&config.gravity),
            up: UnitVector3::new_normalize(S::vector_to_backend(&Vector3::z())),
            ground: config.ground_plane,
            material: config.material,
            shape_frame: S::basis_from_backend(),
        };
        let scene = NativeScene::new(desc).map_err(|err| {
            SimError::invalid_config(self.core.id().as_str(), "gravity", err.to_string())
        })?;

        self.scene = Some(scene);
        self.timestep = config.timestep;
        self.iterations = config.iterations;
        self.core.mark_initialized(config.bounds);
        info!(
            engine = %self.core.id(),
            space = S::NAME,
            timestep = self.timestep,
            iterations = self.iterations,
            "rigid engine initialized"
        );
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        self.core.require_live("update")?;
        let (timestep, iterations) = (self.timestep, self.iterations);
        let scene = self.scene_mut("update")?;
        if let Err(err) = scene.step(timestep, iterations) {
            warn!(engine = %self.core.id(), error = %err, "native scene step failed");
            return Err(SimError::invalid_state(
                self.core.id().as_str(),
                "update",
                err.to_string(),
            ));
        }

        let Some(scene) = self.scene.as_ref() else {
            return Ok(());
        };
        for (_, model) in self.core.models_mut().iter_mut() {
            model.sync_from_backend(scene);
        }
        self.core.mark_running();
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.core.require_live("reset")?;
        let Some(scene) = self.scene.as_mut() else {
            return Err(SimError::invalid_state(
                self.core.id().as_str(),
                "reset",
                self.core.state().name(),
            ));
        };
        scene.reset_time();
        for (_, model) in self.core.models_mut().iter_mut() {
            model.reset(scene);
        }
        self.core.mark_reset();
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.core.require(
            "destroy",
            &[
                EngineState::Uninitialized,
                EngineState::Initialized,
                EngineState::Running,
            ],
        )?;
        let models = self.core.models_mut().drain_newest_first();
        if let Some(mut scene) = self.scene.take() {
            for model in models {
                model.release(&mut scene);
            }
            debug!(engine = %self.core.id(), remaining = scene.len(), "native scene released");
        }
        self.core.mark_destroyed();
        Ok(())
    }

    fn add_entity(&mut self, entity: &mut Entity) -> Result<()> {
        self.dispatch(ActionTag::ADD, entity)
    }

    fn remove_entity(&mut self, entity: &mut Entity) -> Result<()> {
        self.dispatch(ActionTag::REMOVE, entity)
    }

    fn model_count(&self) -> usize {
        self.core.models().len()
    }

    fn contains_model(&self, id: &EntityId) -> bool {
        self.core.models().contains(id)
    }

    fn model_pose(&self, id: &EntityId) -> Option<Pose> {
        self.core.model_pose(id)
    }

    fn model_twist(&self, id: &EntityId) -> Option<Twist> {
        self.core.model_twist(id)
    }

    fn entity_ids(&self) -> Vec<EntityId> {
        self.core.entity_ids()
    }

    fn is_point_contained(&self, point: &Point3<f64>) -> bool {
        self.core.is_point_contained(point)
    }

    fn transfer_candidates(&self) -> Vec<EntityId> {
        self.core.transfer_candidates()
    }

    fn check_intersection_with_ray(&self, ray: &Ray3) -> Option<RayHit> {
        self.core.nearest_hit(ray)
    }

    fn time(&self) -> f64 {
        self.scene.as_ref().map_or(0.0, NativeScene::time)
    }
}

impl<S: SpaceTransform> fmt::Debug for RigidEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigidEngine")
            .field("core", &self.core)
            .field("space", &S::NAME)
            .field("bodies", &self.scene.as_ref().map(NativeScene::len))
            .field("timestep", &self.timestep)
            .field("iterations", &self.iterations)
            .finish()
    }
}
