//! Deferred entity additions and removals.
//!
//! Engines' model maps must not change while a step is iterating them.
//! Add/remove requests raised mid-step (by scripted behaviors, UI handlers)
//! go into a [`CommandQueue`] and are applied at the start of the next step.

use std::collections::VecDeque;

use sim_types::{EngineId, EntityId};

use crate::entity::Entity;

/// A deferred world mutation.
#[derive(Debug)]
pub enum Command {
    /// Add an entity to the world and place it in the engine that contains it.
    AddEntity(Entity),
    /// Add an entity to the world and to the named engines.
    AddEntityTo {
        /// Entity to add.
        entity: Entity,
        /// Engines that should simulate it.
        engines: Vec<EngineId>,
    },
    /// Remove an entity from every engine, then from the world.
    RemoveEntity(EntityId),
}

/// FIFO queue of pending commands.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
}

impl CommandQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command.
    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Queue an entity addition.
    pub fn add_entity(&mut self, entity: Entity) {
        self.push(Command::AddEntity(entity));
    }

    /// Queue an addition to specific engines.
    pub fn add_entity_to(&mut self, entity: Entity, engines: impl IntoIterator<Item = EngineId>) {
        self.push(Command::AddEntityTo {
            entity,
            engines: engines.into_iter().collect(),
        });
    }

    /// Queue an entity removal.
    pub fn remove_entity(&mut self, id: impl Into<EntityId>) {
        self.push(Command::RemoveEntity(id.into()));
    }

    /// Take every pending command, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Command> + '_ {
        self.pending.drain(..)
    }

    /// Put `commands` back at the head of the queue, keeping their order.
    pub fn requeue<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = Command>,
        I::IntoIter: DoubleEndedIterator,
    {
        for command in commands.into_iter().rev() {
            self.pending.push_front(command);
        }
    }

    /// Drop every pending command.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
