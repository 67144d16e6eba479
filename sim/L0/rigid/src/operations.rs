//! Add and Remove operations of the rigid backend.
//!
//! Registered per space convention: a `RigidEngine<YUpLeftHanded>` and a
//! `RigidEngine<Canonical>` are distinct hosts in the registry.

use sim_core::entity::Entity;
use sim_core::{ActionTag, OperationRegistry, PhysicsEngine, SpaceTransform};
use sim_types::{EntityKind, Result, SimError};
use tracing::debug;

use crate::engine::RigidEngine;

/// Entity kinds the rigid backend simulates out of the box.
pub const SUPPORTED_KINDS: [EntityKind; 4] = [
    EntityKind::BOX,
    EntityKind::SPHERE,
    EntityKind::CYLINDER,
    EntityKind::CAPSULE,
];

/// Register Add and Remove for every kind in [`SUPPORTED_KINDS`] on
/// `RigidEngine<S>`.
///
/// # Errors
///
/// `DuplicateOperation` if called twice for the same `S`,
/// `RegistryFrozen` once the registry is frozen.
pub fn register_operations<S: SpaceTransform>(registry: &mut OperationRegistry) -> Result<()> {
    for kind in SUPPORTED_KINDS {
        register_kind::<S>(registry, kind)?;
    }
    Ok(())
}

/// Register Add and Remove for one additional entity kind. The entity must
/// carry a body component; its shape decides the geometry.
///
/// # Errors
///
/// As [`register_operations`].
pub fn register_kind<S: SpaceTransform>(registry: &mut OperationRegistry, kind: EntityKind) -> Result<()> {
    registry.register::<RigidEngine<S>>(ActionTag::ADD, kind.clone(), add_body::<S>)?;
    registry.register::<RigidEngine<S>>(ActionTag::REMOVE, kind, remove_body::<S>)
}

fn add_body<S: SpaceTransform>(engine: &mut RigidEngine<S>, entity: &mut Entity) -> Result<()> {
    if engine.contains_model(entity.id()) {
        return Err(SimError::DuplicateModel {
            engine: engine.id().to_string(),
            entity: entity.id().to_string(),
        });
    }
    let model = engine.create_model(entity)?;
    engine.add_physics_model(model)?;
    if let Ok(body) = entity.body_mut() {
        body.add_physics_model(engine.id().clone());
    }
    debug!(entity = %entity.id(), engine = %engine.id(), "rigid model added");
    Ok(())
}

fn remove_body<S: SpaceTransform>(engine: &mut RigidEngine<S>, entity: &mut Entity) -> Result<()> {
    engine.remove_physics_model(entity.id())?;
    if let Ok(body) = entity.body_mut() {
        body.remove_physics_model(engine.id());
    }
    debug!(entity = %entity.id(), engine = %engine.id(), "rigid model removed");
    Ok(())
}
