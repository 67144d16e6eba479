//! Entity-operation dispatch.
//!
//! Applying an action to an entity needs code that knows both the concrete
//! host (a physics backend, a renderer, ...) and the entity kind. Neither side
//! enumerates the other: each plugin registers the operations it supports,
//! keyed by
//!
//! - the [`ActionTag`] (add, remove, draw, ...),
//! - the host's concrete type (by `TypeId`),
//! - the entity's [`EntityKind`].
//!
//! # Lifecycle
//!
//! 1. Create one registry at process start.
//! 2. Every plugin registers its operations (duplicates are rejected, the
//!    first registration stays).
//! 3. Freeze it, usually with [`OperationRegistry::into_shared`], and hand
//!    the `Arc` to every engine. A frozen registry refuses registrations and
//!    is read-only for the rest of the run.
//!
//! # Example
//!
//! ```
//! use sim_core::entity::Entity;
//! use sim_core::registry::{ActionTag, OperationRegistry};
//! use sim_types::{EntityKind, Pose};
//!
//! #[derive(Default)]
//! struct Counter {
//!     added: usize,
//! }
//!
//! let mut registry = OperationRegistry::new();
//! registry
//!     .register(ActionTag::ADD, EntityKind::BOX, |host: &mut Counter, _: &mut Entity| {
//!         host.added += 1;
//!         Ok(())
//!     })
//!     .unwrap();
//! let registry = registry.into_shared();
//!
//! let mut host = Counter::default();
//! let mut entity = Entity::new("box0", EntityKind::BOX, Pose::identity());
//! registry.apply(ActionTag::ADD, &mut host, &mut entity).unwrap();
//! assert_eq!(host.added, 1);
//!
//! // No operation for spheres: reported, not a crash.
//! let mut ball = Entity::new("ball", EntityKind::SPHERE, Pose::identity());
//! assert!(registry.apply(ActionTag::ADD, &mut host, &mut ball).is_err());
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use sim_types::{EntityKind, Result, SimError};
use tracing::debug;

use crate::entity::Entity;

/// Kind of action applied to an entity. Open set: plugins may define more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionTag(&'static str);

impl ActionTag {
    /// Create the entity's model in an engine.
    pub const ADD: Self = Self("add");
    /// Destroy the entity's model in an engine.
    pub const REMOVE: Self = Self("remove");
    /// Draw the entity in a visualization.
    pub const DRAW_NORMAL: Self = Self("draw-normal");
    /// Draw the selection overlay of the entity in a visualization.
    pub const DRAW_SELECTED: Self = Self("draw-selected");

    /// Create a custom action tag.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Tag name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An operation applying an action to an entity on host `H`.
///
/// Implemented for every `Fn(&mut H, &mut Entity) -> Result<()>` closure.
pub trait Operation<H>: Send + Sync {
    /// Run the operation.
    fn apply(&self, host: &mut H, entity: &mut Entity) -> Result<()>;
}

impl<H, F> Operation<H> for F
where
    F: Fn(&mut H, &mut Entity) -> Result<()> + Send + Sync,
{
    fn apply(&self, host: &mut H, entity: &mut Entity) -> Result<()> {
        self(host, entity)
    }
}

/// Shared handle to a registered operation.
pub type OperationRef<H> = Arc<dyn Operation<H>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OperationKey {
    action: ActionTag,
    host: TypeId,
    kind: EntityKind,
}

struct Entry {
    host_name: &'static str,
    // Always an `OperationRef<H>` for the `H` whose `TypeId` is in the key.
    operation: Box<dyn Any + Send + Sync>,
}

/// Table of operations keyed by (action, host type, entity kind).
#[derive(Default)]
pub struct OperationRegistry {
    entries: HashMap<OperationKey, Entry>,
    frozen: bool,
}

impl OperationRegistry {
    /// Create an empty, unfrozen registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `operation` for `action` on entities of `kind` hosted by `H`.
    ///
    /// # Errors
    ///
    /// - [`SimError::DuplicateOperation`] if the combination is taken (the
    ///   existing operation is kept).
    /// - [`SimError::RegistryFrozen`] after [`freeze`](Self::freeze).
    pub fn register<H: 'static>(
        &mut self,
        action: ActionTag,
        kind: EntityKind,
        operation: impl Operation<H> + 'static,
    ) -> Result<()> {
        let host_name = type_name::<H>();
        if self.frozen {
            return Err(SimError::RegistryFrozen {
                action: action.to_string(),
                host: host_name.to_owned(),
                kind: kind.to_string(),
            });
        }

        let key = OperationKey {
            action,
            host: TypeId::of::<H>(),
            kind,
        };
        if self.entries.contains_key(&key) {
            return Err(SimError::DuplicateOperation {
                action: action.to_string(),
                host: host_name.to_owned(),
                kind: key.kind.to_string(),
            });
        }

        debug!(%action, kind = %key.kind, host = host_name, "registered entity operation");
        let operation: OperationRef<H> = Arc::new(operation);
        self.entries.insert(
            key,
            Entry {
                host_name,
                operation: Box::new(operation),
            },
        );
        Ok(())
    }

    /// Find the operation for `action` on entities of `kind` hosted by `H`.
    ///
    /// # Errors
    ///
    /// [`SimError::UnsupportedOperation`] when nothing is registered.
    pub fn resolve<H: 'static>(&self, action: ActionTag, kind: &EntityKind) -> Result<OperationRef<H>> {
        let key = OperationKey {
            action,
            host: TypeId::of::<H>(),
            kind: kind.clone(),
        };
        self.entries
            .get(&key)
            .and_then(|entry| entry.operation.downcast_ref::<OperationRef<H>>())
            .map(Arc::clone)
            .ok_or_else(|| SimError::UnsupportedOperation {
                action: action.to_string(),
                host: type_name::<H>().to_owned(),
                kind: kind.to_string(),
            })
    }

    /// Resolve and run the operation for `entity`'s kind.
    ///
    /// When resolution fails nothing is invoked and neither `host` nor
    /// `entity` is touched.
    pub fn apply<H: 'static>(&self, action: ActionTag, host: &mut H, entity: &mut Entity) -> Result<()> {
        let operation = self.resolve::<H>(action, entity.kind())?;
        operation.apply(host, entity)
    }

    /// Whether an operation is registered for the combination.
    #[must_use]
    pub fn supports<H: 'static>(&self, action: ActionTag, kind: &EntityKind) -> bool {
        self.resolve::<H>(action, kind).is_ok()
    }

    /// Forbid further registrations.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the registry is frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze the registry and wrap it for sharing between engines.
    #[must_use]
    pub fn into_shared(mut self) -> Arc<Self> {
        self.freeze();
        Arc::new(self)
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .map(|(key, entry)| format!("{}:{}@{}", key.action, key.kind, entry.host_name))
            .collect();
        keys.sort_unstable();
        f.debug_struct("OperationRegistry")
            .field("frozen", &self.frozen)
            .field("operations", &keys)
            .finish()
    }
}
