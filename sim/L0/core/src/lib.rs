//! Physics-engine abstraction and entity-operation dispatch.
//!
//! This crate binds generic simulated entities to backend-specific physical
//! bodies without either side knowing the other's concrete type. It provides:
//!
//! - [`SpaceTransform`]: conversion between canonical space (right-handed,
//!   Z-up) and a backend's native axis convention
//! - [`OperationRegistry`]: double dispatch keyed by action, host type and
//!   entity kind, populated once by each plugin and then frozen
//! - [`PhysicsModel`] and [`PhysicsEngine`]: the per-entity and per-backend
//!   contracts, with [`EngineCore`] carrying the shared bookkeeping
//! - Spatial queries: point containment and nearest ray hit
//! - The transfer protocol for engines that partition space
//! - [`Simulation`]: the deterministic, single-threaded tick loop
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Simulation                           │
//! │  World (entities) · CommandQueue · engines in config order  │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ add/remove: registry.apply(ADD, engine, entity)
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                PhysicsEngine (per backend)                  │
//! │  EngineCore: state · bounds · ModelMap<M: PhysicsModel>     │
//! │  native world ◀── SpaceTransform ──▶ canonical poses        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. Backends live in
//! their own crates (see `sim-rigid`) and only depend on this one.
//!
//! # Quick Start
//!
//! ```ignore
//! use sim_core::{OperationRegistry, Simulation};
//! use sim_rigid::{register_operations, RigidEngine};
//! use sim_types::EngineConfig;
//!
//! let mut registry = OperationRegistry::new();
//! register_operations::<sim_core::YUpLeftHanded>(&mut registry)?;
//! let registry = registry.into_shared();
//!
//! let mut sim = Simulation::new();
//! sim.add_engine(Box::new(RigidEngine::new("main", registry)), &EngineConfig::default())?;
//! sim.add_entity(crate_box)?;
//! for _ in 0..100 {
//!     sim.step()?;
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/sim-core/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,       // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,           // mul_add style changes aren't always clearer
    clippy::neg_cmp_op_on_partial_ord,  // !(x >= 0.0) is intentional for NaN rejection
    clippy::option_if_let_else,         // if-let is often more readable than map_or_else
    clippy::doc_markdown,               // Not all technical terms need backticks
)]

// Canonical ⇄ native coordinate conventions
pub mod space;

// Entities, components and the entity store
pub mod entity;
pub mod world;

// Double dispatch of entity operations
pub mod registry;

// Backend contracts
pub mod engine;
pub mod model;

// Spatial queries (ray intersection)
pub mod query;

// Driver, deferred commands and multi-engine transfer
pub mod commands;
pub mod simulation;
pub mod transfer;

pub use commands::{Command, CommandQueue};
pub use engine::{EngineCore, PhysicsEngine};
pub use entity::{BODY, EmbodiedComponent, Entity};
pub use model::{ModelMap, PhysicsModel};
pub use query::{RayHit, ShapeHit, nearest_hit, raycast_shape};
pub use registry::{ActionTag, Operation, OperationRef, OperationRegistry};
pub use simulation::{Simulation, SimulationConfig, StepReport};
pub use space::{Canonical, SpaceTransform, YUpLeftHanded, YUpRightHanded};
pub use transfer::{Transfer, TransferReport, TransferTrigger, transfer_entities};
pub use world::World;
