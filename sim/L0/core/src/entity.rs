//! Simulated entities and their embodied component.
//!
//! An [`Entity`] carries a stable id, a runtime [`EntityKind`] tag, a
//! canonical pose and a set of named, type-erased components. Engines never
//! own entities; they hold one model per entity they simulate and record
//! their id in the entity's [`EmbodiedComponent`].

use std::any::Any;
use std::fmt;

use hashbrown::HashMap;
use nalgebra::Point3;
use sim_types::{EngineId, EntityId, EntityKind, Pose, Result, Shape, SimError, Twist};

/// Name of the component holding an entity's physical embodiment.
pub const BODY: &str = "body";

/// A simulated object: identity, pose and components.
///
/// # Example
///
/// ```
/// use sim_core::entity::{EmbodiedComponent, Entity};
/// use sim_types::{EntityKind, Pose, Shape};
/// use nalgebra::Point3;
///
/// let crate_box = Entity::embodied(
///     "box0",
///     EntityKind::BOX,
///     Pose::from_position(Point3::new(1.0, 0.0, 0.5)),
///     Shape::cuboid(nalgebra::Vector3::repeat(0.5)),
/// );
///
/// assert!(crate_box.body().unwrap().physics_models().is_empty());
/// ```
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    pose: Pose,
    components: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Entity {
    /// Create an entity without components.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, kind: EntityKind, pose: Pose) -> Self {
        Self {
            id: id.into(),
            kind,
            pose,
            components: HashMap::new(),
        }
    }

    /// Create an entity with a movable body component of the given shape.
    #[must_use]
    pub fn embodied(id: impl Into<EntityId>, kind: EntityKind, pose: Pose, shape: Shape) -> Self {
        Self::new(id, kind, pose).with_component(BODY, EmbodiedComponent::new(shape, pose))
    }

    /// Attach a named component (replacing any previous one of that name).
    #[must_use]
    pub fn with_component<C: Any + Send + Sync>(mut self, name: impl Into<String>, component: C) -> Self {
        self.insert_component(name, component);
        self
    }

    /// Attach a named component (replacing any previous one of that name).
    pub fn insert_component<C: Any + Send + Sync>(&mut self, name: impl Into<String>, component: C) {
        self.components.insert(name.into(), Box::new(component));
    }

    /// Entity identifier.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Entity kind tag.
    #[must_use]
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Canonical pose.
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Canonical position.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        self.pose.position
    }

    /// Overwrite the canonical pose.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Whether a component with this name exists.
    #[must_use]
    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Names of all components.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Typed access to a named component.
    pub fn component<C: Any>(&self, name: &str) -> Result<&C> {
        self.components
            .get(name)
            .and_then(|c| c.downcast_ref::<C>())
            .ok_or_else(|| self.missing(name))
    }

    /// Typed mutable access to a named component.
    pub fn component_mut<C: Any>(&mut self, name: &str) -> Result<&mut C> {
        match self.components.get_mut(name).and_then(|c| c.downcast_mut::<C>()) {
            Some(component) => Ok(component),
            None => Err(SimError::MissingComponent {
                entity: self.id.to_string(),
                component: name.to_owned(),
            }),
        }
    }

    /// The `"body"` component.
    pub fn body(&self) -> Result<&EmbodiedComponent> {
        self.component(BODY)
    }

    /// The `"body"` component, mutably.
    pub fn body_mut(&mut self) -> Result<&mut EmbodiedComponent> {
        self.component_mut(BODY)
    }

    /// Whether the entity has a body component.
    #[must_use]
    pub fn is_embodied(&self) -> bool {
        self.body().is_ok()
    }

    fn missing(&self, name: &str) -> SimError {
        SimError::MissingComponent {
            entity: self.id.to_string(),
            component: name.to_owned(),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.component_names().collect();
        names.sort_unstable();
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("pose", &self.pose)
            .field("components", &names)
            .finish()
    }
}

/// Physical embodiment of an entity.
///
/// Besides the shape, the component tracks which engines currently hold a
/// model for the entity. Outside a transfer there is at most one per
/// partitioned engine set.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbodiedComponent {
    shape: Shape,
    movable: bool,
    velocity: Twist,
    origin: Pose,
    origin_velocity: Twist,
    physics_models: Vec<EngineId>,
}

impl EmbodiedComponent {
    /// Create a movable body at rest whose reset pose is `origin`.
    #[must_use]
    pub fn new(shape: Shape, origin: Pose) -> Self {
        Self {
            shape,
            movable: true,
            velocity: Twist::zero(),
            origin,
            origin_velocity: Twist::zero(),
            physics_models: Vec::new(),
        }
    }

    /// Make the body static (immovable) or movable.
    #[must_use]
    pub fn with_movable(mut self, movable: bool) -> Self {
        self.movable = movable;
        self
    }

    /// Set the initial velocity (also used on reset).
    #[must_use]
    pub fn with_velocity(mut self, velocity: Twist) -> Self {
        self.velocity = velocity;
        self.origin_velocity = velocity;
        self
    }

    /// Collision geometry in the entity frame.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether the body is affected by dynamics.
    #[must_use]
    pub fn is_movable(&self) -> bool {
        self.movable
    }

    /// Last canonical velocity synchronized from an engine.
    #[must_use]
    pub fn velocity(&self) -> &Twist {
        &self.velocity
    }

    /// Overwrite the canonical velocity.
    pub fn set_velocity(&mut self, velocity: Twist) {
        self.velocity = velocity;
    }

    /// Pose the entity returns to on reset.
    #[must_use]
    pub fn origin(&self) -> &Pose {
        &self.origin
    }

    /// Velocity the entity returns to on reset.
    #[must_use]
    pub fn origin_velocity(&self) -> &Twist {
        &self.origin_velocity
    }

    /// Engines currently holding a model for this body, in attach order.
    #[must_use]
    pub fn physics_models(&self) -> &[EngineId] {
        &self.physics_models
    }

    /// Whether any engine simulates this body.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        !self.physics_models.is_empty()
    }

    /// Record that `engine` now holds a model. Returns `false` if it already
    /// did.
    pub fn add_physics_model(&mut self, engine: EngineId) -> bool {
        if self.physics_models.contains(&engine) {
            return false;
        }
        self.physics_models.push(engine);
        true
    }

    /// Record that `engine` released its model. Returns `false` if it held
    /// none.
    pub fn remove_physics_model(&mut self, engine: &EngineId) -> bool {
        let before = self.physics_models.len();
        self.physics_models.retain(|e| e != engine);
        self.physics_models.len() != before
    }

    /// Forget every engine (used after all engines are destroyed).
    pub fn clear_physics_models(&mut self) {
        self.physics_models.clear();
    }
}
