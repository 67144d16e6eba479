//! The entity store.
//!
//! The [`World`] owns every entity. Engines reference entities by id and are
//! handed `&mut Entity` only for the duration of an operation.

use std::collections::BTreeMap;

use sim_types::{EntityId, Result, SimError};

use crate::entity::Entity;

/// Container of all entities, iterated in id order.
#[derive(Debug, Default)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity. Fails if the id is taken.
    pub fn insert(&mut self, entity: Entity) -> Result<()> {
        if self.entities.contains_key(entity.id()) {
            return Err(SimError::DuplicateEntity {
                entity: entity.id().to_string(),
            });
        }
        self.entities.insert(entity.id().clone(), entity);
        Ok(())
    }

    /// Remove and return an entity.
    pub fn remove(&mut self, id: &EntityId) -> Result<Entity> {
        self.entities
            .remove(id)
            .ok_or_else(|| SimError::EntityNotFound {
                entity: id.to_string(),
            })
    }

    /// Get an entity by id.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get an entity mutably by id.
    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Get an entity mutably, reporting a missing id as an error.
    pub fn entity_mut(&mut self, id: &EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| SimError::EntityNotFound {
                entity: id.to_string(),
            })
    }

    /// Whether an entity with this id exists.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the world is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over entities.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterate mutably over entities.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }
}
