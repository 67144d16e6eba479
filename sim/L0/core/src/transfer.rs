//! Moving entities between engines that partition space.
//!
//! When engines own disjoint volumes, an entity that leaves its engine's
//! volume is handed to the first other engine (in configuration order) whose
//! volume contains its canonical position. The hand-off adds a model in the
//! destination before removing the source model, so a failure at either end
//! leaves the entity attached to exactly one engine.

use sim_types::{EngineId, EntityId, Result, SimError};
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::PhysicsEngine;
use crate::world::World;

/// When the driver runs the transfer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TransferTrigger {
    /// After every tick.
    #[default]
    EveryTick,
    /// After every `n`-th tick.
    EveryNTicks(u64),
    /// Only on explicit request.
    Manual,
}

impl TransferTrigger {
    /// Whether the pass runs after `tick` (1-based count of completed ticks).
    #[must_use]
    pub const fn fires(self, tick: u64) -> bool {
        match self {
            Self::EveryTick => true,
            Self::EveryNTicks(n) => n != 0 && tick % n == 0,
            Self::Manual => false,
        }
    }
}

/// One completed hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Entity that moved.
    pub entity: EntityId,
    /// Engine it left.
    pub from: EngineId,
    /// Engine it joined.
    pub to: EngineId,
}

/// Outcome of a transfer pass.
#[derive(Debug, Default)]
pub struct TransferReport {
    /// Completed transfers, in processing order.
    pub transferred: Vec<Transfer>,
    /// Failed transfers; each entity stayed with its source engine.
    pub failures: Vec<SimError>,
}

impl TransferReport {
    /// Whether nothing was attempted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transferred.is_empty() && self.failures.is_empty()
    }
}

/// Run one transfer pass over `engines`.
///
/// Engines that are not live are skipped. Failures are collected in the
/// report rather than returned, since a failed transfer leaves a consistent
/// state.
pub fn transfer_entities(engines: &mut [Box<dyn PhysicsEngine>], world: &mut World) -> TransferReport {
    let mut report = TransferReport::default();

    for source in 0..engines.len() {
        if !engines[source].state().is_live() {
            continue;
        }
        for entity in engines[source].transfer_candidates() {
            match transfer_one(engines, world, source, &entity) {
                Ok(transfer) => {
                    info!(
                        entity = %transfer.entity,
                        from = %transfer.from,
                        to = %transfer.to,
                        "entity transferred"
                    );
                    report.transferred.push(transfer);
                }
                Err(err) => {
                    warn!(entity = %entity, error = %err, "entity transfer failed");
                    report.failures.push(err);
                }
            }
        }
    }

    report
}

fn transfer_one(
    engines: &mut [Box<dyn PhysicsEngine>],
    world: &mut World,
    source: usize,
    entity_id: &EntityId,
) -> Result<Transfer> {
    let from = engines[source].id().clone();
    let fail = |to: &str, reason: String| SimError::transfer_failed(entity_id.as_str(), from.as_str(), to, reason);

    let entity = world
        .get_mut(entity_id)
        .ok_or_else(|| fail("", "entity is not in the world".to_string()))?;

    // Carry the source engine's latest state so the destination starts from
    // the same canonical pose and velocity.
    if let Some(pose) = engines[source].model_pose(entity_id) {
        entity.set_pose(pose);
    }
    if let (Some(twist), Ok(body)) = (engines[source].model_twist(entity_id), entity.body_mut()) {
        body.set_velocity(twist);
    }
    let position = entity.position();

    let destination = (0..engines.len())
        .find(|&index| {
            index != source
                && engines[index].state().is_live()
                && engines[index].is_point_contained(&position)
        })
        .ok_or_else(|| fail("", format!("no engine contains position {position}")))?;

    let (src, dst) = pair_mut(engines, source, destination);
    let to = dst.id().clone();

    let added = if dst.contains_model(entity_id) {
        false
    } else {
        dst.add_entity(entity)
            .map_err(|err| fail(to.as_str(), err.to_string()))?;
        true
    };

    if let Err(err) = src.remove_entity(entity) {
        if added {
            if let Err(rollback) = dst.remove_entity(entity) {
                warn!(entity = %entity_id, engine = %to, error = %rollback, "transfer rollback failed");
            }
        }
        return Err(fail(to.as_str(), err.to_string()));
    }

    debug!(entity = %entity_id, from = %from, to = %to, "source model released");
    Ok(Transfer {
        entity: entity_id.clone(),
        from,
        to,
    })
}

/// Two distinct mutable elements of a slice.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
