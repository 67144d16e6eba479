//! Backend-owned representation of one entity in one engine.

use std::collections::BTreeMap;
use std::fmt;

use hashbrown::HashMap;
use sim_types::{EntityId, Pose, Shape, Twist};

/// A physics model: the body a backend simulates on behalf of one entity.
///
/// Models are only created by an add operation and are owned by their
/// engine. They hold a non-owning handle into the engine's native world
/// (`Self::Backend`), so every method that touches native state borrows that
/// world from the engine. [`release`](Self::release) must run before the
/// native world is dropped.
pub trait PhysicsModel: fmt::Debug {
    /// The backend's native world type.
    type Backend;

    /// Entity this model simulates.
    fn entity_id(&self) -> &EntityId;

    /// Last pose synchronized from the backend, in canonical space.
    fn pose(&self) -> Pose;

    /// Last velocity synchronized from the backend, in canonical space.
    fn twist(&self) -> Twist;

    /// Collision geometry in the entity frame (canonical convention).
    fn shape(&self) -> &Shape;

    /// Pull the authoritative state from the native world into the cache.
    fn sync_from_backend(&mut self, backend: &Self::Backend);

    /// Push the cached state into the native world.
    fn sync_to_backend(&self, backend: &mut Self::Backend);

    /// Restore the state the model was created with.
    fn reset(&mut self, backend: &mut Self::Backend);

    /// Release the native body.
    fn release(self, backend: &mut Self::Backend)
    where
        Self: Sized;
}

/// Models of one engine, keyed by entity id and iterated in insertion order.
///
/// Insertion order is the tie-breaker for spatial queries and the reverse of
/// the release order on destroy.
pub struct ModelMap<M> {
    slots: BTreeMap<u64, (EntityId, M)>,
    index: HashMap<EntityId, u64>,
    next_slot: u64,
}

impl<M> Default for ModelMap<M> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
            index: HashMap::new(),
            next_slot: 0,
        }
    }
}

impl<M> ModelMap<M> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a model. If the id is taken, the map is unchanged and the
    /// model is handed back.
    pub fn insert(&mut self, id: EntityId, model: M) -> std::result::Result<(), M> {
        if self.index.contains_key(&id) {
            return Err(model);
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.index.insert(id.clone(), slot);
        self.slots.insert(slot, (id, model));
        Ok(())
    }

    /// Remove and return the model for `id`.
    pub fn remove(&mut self, id: &EntityId) -> Option<M> {
        let slot = self.index.remove(id)?;
        self.slots.remove(&slot).map(|(_, model)| model)
    }

    /// Get the model for `id`.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&M> {
        let slot = self.index.get(id)?;
        self.slots.get(slot).map(|(_, model)| model)
    }

    /// Get the model for `id` mutably.
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut M> {
        let slot = self.index.get(id)?;
        self.slots.get_mut(slot).map(|(_, model)| model)
    }

    /// Whether a model exists for `id`.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// Number of models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&EntityId, &M)> {
        self.slots.values().map(|(id, model)| (id, model))
    }

    /// Iterate mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = (&EntityId, &mut M)> {
        self.slots.values_mut().map(|(id, model)| (&*id, model))
    }

    /// Entity ids in insertion order.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = &EntityId> {
        self.slots.values().map(|(id, _)| id)
    }

    /// Remove every model, newest first.
    pub fn drain_newest_first(&mut self) -> Vec<M> {
        self.index.clear();
        let slots = std::mem::take(&mut self.slots);
        slots.into_values().rev().map(|(_, model)| model).collect()
    }
}

impl<M: fmt::Debug> fmt::Debug for ModelMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
