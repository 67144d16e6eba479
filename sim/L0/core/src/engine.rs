//! The physics-engine contract and shared engine bookkeeping.
//!
//! [`PhysicsEngine`] is the object-safe surface the driver, the transfer
//! protocol and the visualizer see. Backends implement it on top of
//! [`EngineCore`], which owns the lifecycle state, the model map, the
//! simulated volume and the shared [`OperationRegistry`].
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──init──▶ Initialized ──update──▶ Running
//!       │                      ▲                     │
//!       │                      └───────reset─────────┘
//!       └──────────────── destroy (any state) ──────────▶ Destroyed
//! ```

use std::fmt;
use std::sync::Arc;

use nalgebra::Point3;
use sim_types::{
    Aabb, EngineConfig, EngineId, EngineState, EntityId, Pose, Ray3, Result, SimError, Twist,
};
use tracing::info;

use crate::entity::Entity;
use crate::model::{ModelMap, PhysicsModel};
use crate::query::{self, RayHit};
use crate::registry::OperationRegistry;

/// A pluggable physics backend.
///
/// All poses crossing this boundary are in canonical space; conversion to the
/// backend's native convention happens inside the implementation.
pub trait PhysicsEngine: fmt::Debug {
    /// Stable identifier of this engine instance.
    fn id(&self) -> &EngineId;

    /// Current lifecycle state.
    fn state(&self) -> EngineState;

    /// Build the native world from `config`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration is rejected (the engine stays
    /// `Uninitialized`), `InvalidState` if called twice.
    fn init(&mut self, config: &EngineConfig) -> Result<()>;

    /// Advance the native simulation by one fixed step and synchronize every
    /// model's cached pose.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside `Initialized`/`Running`, or when the native
    /// world reports a failure.
    fn update(&mut self) -> Result<()>;

    /// Return to the post-`init` configuration, keeping models.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside `Initialized`/`Running`.
    fn reset(&mut self) -> Result<()>;

    /// Release every model and the native world.
    ///
    /// Safe after a failed `init`.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the engine is already destroyed.
    fn destroy(&mut self) -> Result<()>;

    /// Create a model for `entity` through the registry's Add operation.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` when the backend has no Add operation for the
    /// entity kind, `DuplicateModel` if the entity is already simulated here,
    /// `InvalidState` when the engine is not live.
    fn add_entity(&mut self, entity: &mut Entity) -> Result<()>;

    /// Remove the model of `entity` through the registry's Remove operation.
    ///
    /// # Errors
    ///
    /// `ModelNotFound` if there is no model (the map is left unchanged),
    /// `UnsupportedOperation` or `InvalidState` as for [`add_entity`](Self::add_entity).
    fn remove_entity(&mut self, entity: &mut Entity) -> Result<()>;

    /// Number of models this engine currently simulates.
    fn model_count(&self) -> usize;

    /// Whether this engine holds a model for `id`.
    fn contains_model(&self, id: &EntityId) -> bool;

    /// Last synchronized canonical pose of the model for `id`.
    fn model_pose(&self, id: &EntityId) -> Option<Pose>;

    /// Last synchronized canonical velocity of the model for `id`.
    fn model_twist(&self, id: &EntityId) -> Option<Twist>;

    /// Ids of all simulated entities, in insertion order.
    fn entity_ids(&self) -> Vec<EntityId>;

    /// Whether `point` (canonical) lies inside this engine's simulated volume.
    fn is_point_contained(&self, point: &Point3<f64>) -> bool;

    /// Entities whose position has left this engine's volume.
    fn transfer_candidates(&self) -> Vec<EntityId>;

    /// Whether any simulated entity has left this engine's volume.
    fn is_entity_transfer_needed(&self) -> bool {
        !self.transfer_candidates().is_empty()
    }

    /// Nearest model hit by `ray`; ties go to the earliest inserted model.
    fn check_intersection_with_ray(&self, ray: &Ray3) -> Option<RayHit>;

    /// Simulated time since `init` or the last `reset`, in seconds.
    fn time(&self) -> f64;
}

/// Backend-independent engine state: lifecycle, volume and models.
pub struct EngineCore<M> {
    id: EngineId,
    state: EngineState,
    bounds: Option<Aabb>,
    models: ModelMap<M>,
    registry: Arc<OperationRegistry>,
}

impl<M> EngineCore<M> {
    /// Create an uninitialized core.
    #[must_use]
    pub fn new(id: impl Into<EngineId>, registry: Arc<OperationRegistry>) -> Self {
        Self {
            id: id.into(),
            state: EngineState::Uninitialized,
            bounds: None,
            models: ModelMap::new(),
            registry,
        }
    }

    /// Engine id.
    #[must_use]
    pub fn id(&self) -> &EngineId {
        &self.id
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Simulated volume, `None` when unbounded.
    #[must_use]
    pub fn bounds(&self) -> Option<&Aabb> {
        self.bounds.as_ref()
    }

    /// Shared operation registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    /// Models, in insertion order.
    #[must_use]
    pub fn models(&self) -> &ModelMap<M> {
        &self.models
    }

    /// Mutable access to the models.
    pub fn models_mut(&mut self) -> &mut ModelMap<M> {
        &mut self.models
    }

    /// Fail with `InvalidState` unless the engine is in one of `allowed`.
    ///
    /// # Errors
    ///
    /// `InvalidState` naming this engine, `operation` and the current state.
    pub fn require(&self, operation: &str, allowed: &[EngineState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SimError::invalid_state(
                self.id.as_str(),
                operation,
                self.state.name(),
            ))
        }
    }

    /// Fail unless the engine is `Initialized` or `Running`.
    ///
    /// # Errors
    ///
    /// `InvalidState` otherwise.
    pub fn require_live(&self, operation: &str) -> Result<()> {
        self.require(operation, &[EngineState::Initialized, EngineState::Running])
    }

    /// Record a successful `init`.
    pub fn mark_initialized(&mut self, bounds: Option<Aabb>) {
        self.bounds = bounds;
        self.transition(EngineState::Initialized);
    }

    /// Record the first `update` after `init`/`reset`.
    pub fn mark_running(&mut self) {
        if self.state != EngineState::Running {
            self.transition(EngineState::Running);
        }
    }

    /// Record a `reset`.
    pub fn mark_reset(&mut self) {
        self.transition(EngineState::Initialized);
    }

    /// Record a `destroy`.
    pub fn mark_destroyed(&mut self) {
        self.transition(EngineState::Destroyed);
    }

    fn transition(&mut self, next: EngineState) {
        info!(engine = %self.id, from = %self.state, to = %next, "engine state change");
        self.state = next;
    }

    /// Insert a model, failing with `DuplicateModel` and handing it back
    /// so the caller can release its native body.
    ///
    /// # Errors
    ///
    /// `(DuplicateModel, model)` if `id` already has a model.
    pub fn insert_model(&mut self, id: EntityId, model: M) -> std::result::Result<(), (SimError, M)> {
        let entity = id.to_string();
        self.models.insert(id, model).map_err(|model| {
            (
                SimError::DuplicateModel {
                    engine: self.id.to_string(),
                    entity,
                },
                model,
            )
        })
    }

    /// Remove the model for `id`.
    ///
    /// # Errors
    ///
    /// `ModelNotFound` if there is none; the map is left unchanged.
    pub fn remove_model(&mut self, id: &EntityId) -> Result<M> {
        self.models.remove(id).ok_or_else(|| SimError::ModelNotFound {
            engine: self.id.to_string(),
            entity: id.to_string(),
        })
    }

    /// Containment against the configured bounds; unbounded engines contain
    /// every point.
    #[must_use]
    pub fn is_point_contained(&self, point: &Point3<f64>) -> bool {
        self.bounds
            .as_ref()
            .map_or(true, |bounds| bounds.contains(point))
    }
}

impl<M: PhysicsModel> EngineCore<M> {
    /// Ids of models whose cached position lies outside the bounds.
    #[must_use]
    pub fn transfer_candidates(&self) -> Vec<EntityId> {
        if self.bounds.is_none() {
            return Vec::new();
        }
        self.models
            .iter()
            .filter(|(_, model)| !self.is_point_contained(&model.pose().position))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Nearest model hit by `ray`, in canonical space.
    #[must_use]
    pub fn nearest_hit(&self, ray: &Ray3) -> Option<RayHit> {
        query::nearest_hit(
            self.models
                .iter()
                .map(|(id, model)| (id, model.pose(), model.shape())),
            ray,
        )
    }

    /// Canonical pose of the model for `id`.
    #[must_use]
    pub fn model_pose(&self, id: &EntityId) -> Option<Pose> {
        self.models.get(id).map(PhysicsModel::pose)
    }

    /// Canonical velocity of the model for `id`.
    #[must_use]
    pub fn model_twist(&self, id: &EntityId) -> Option<Twist> {
        self.models.get(id).map(PhysicsModel::twist)
    }

    /// Ids of all models in insertion order.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.models.ids().cloned().collect()
    }
}

impl<M> fmt::Debug for EngineCore<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineCore")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("bounds", &self.bounds)
            .field("models", &self.models.len())
            .finish_non_exhaustive()
    }
}
