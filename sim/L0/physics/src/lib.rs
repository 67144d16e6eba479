//! Unified physics simulation API.
//!
//! This crate re-exports the complete stack:
//!
//! - [`sim_types`] - Core data types (ids, poses, shapes, configuration, errors)
//! - [`sim_core`] - Engine abstraction (space conversion, operation registry,
//!   engine and model contracts, spatial queries, transfer, driver)
//! - [`sim_rigid`] - Rigid-body backend
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//!
//! - Headless simulation runs
//! - Analysis and planning tools
//! - Integration with other game engines and visualizers
//!
//! # Quick Start
//!
//! ```
//! use sim_physics::prelude::*;
//!
//! // Every plugin registers its operations, then the registry is frozen.
//! let mut registry = OperationRegistry::new();
//! register_operations::<YUpLeftHanded>(&mut registry).unwrap();
//! let registry = registry.into_shared();
//!
//! // One engine owning the whole scene.
//! let mut sim = Simulation::new();
//! sim.add_engine(
//!     Box::new(RigidEngine::<YUpLeftHanded>::new("main", registry)),
//!     &EngineConfig::default(),
//! )
//! .unwrap();
//!
//! // Drop a ball onto the ground plane.
//! sim.add_entity(Entity::embodied(
//!     "ball",
//!     EntityKind::SPHERE,
//!     Pose::from_position(Point3::new(0.0, 0.0, 5.0)),
//!     Shape::sphere(0.5),
//! ))
//! .unwrap();
//!
//! for _ in 0..100 {
//!     sim.step().unwrap();
//! }
//!
//! let pose = sim.pose(&EntityId::from("ball")).unwrap();
//! assert!((pose.position.z - 0.5).abs() < 0.05);
//! ```
//!
//! # Partitioned Space
//!
//! ```
//! use sim_physics::prelude::*;
//!
//! let mut registry = OperationRegistry::new();
//! register_operations::<YUpLeftHanded>(&mut registry).unwrap();
//! let registry = registry.into_shared();
//!
//! let mut sim = Simulation::new();
//! for (id, min_x, max_x) in [("west", -50.0, 0.0), ("east", 0.0, 50.0)] {
//!     let bounds = Aabb::new(Point3::new(min_x, -50.0, -1.0), Point3::new(max_x, 50.0, 50.0));
//!     sim.add_engine(
//!         Box::new(RigidEngine::<YUpLeftHanded>::new(id, registry.clone())),
//!         &EngineConfig::default().with_bounds(bounds),
//!     )
//!     .unwrap();
//! }
//!
//! // Entities are placed in the engine that contains them and handed over
//! // when they cross the boundary.
//! assert_eq!(
//!     sim.engines_containing(Point3::new(10.0, 0.0, 1.0)).next(),
//!     Some(&EngineId::from("east"))
//! );
//! ```
//!
//! # Architecture
//!
//! ```text
//!               ┌─────────────────┐
//!               │   sim-physics   │
//!               │  (this crate)   │
//!               └────────┬────────┘
//!                        │
//!                        ▼
//!               ┌─────────────────┐
//!               │    sim-rigid    │
//!               │ Native backend  │
//!               └────────┬────────┘
//!                        │
//!                        ▼
//!               ┌─────────────────┐
//!               │    sim-core     │
//!               │  Engine traits  │
//!               └────────┬────────┘
//!                        │
//!                        ▼
//!               ┌─────────────────┐
//!               │   sim-types     │
//!               │  Data structs   │
//!               └─────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/sim-physics/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

// Re-export sub-crates
pub use sim_core;
pub use sim_rigid;
pub use sim_types;

// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports.
///
/// Import everything you need with a single line:
///
/// ```
/// use sim_physics::prelude::*;
/// ```
pub mod prelude {
    // ========================================================================
    // Core types from sim-types
    // ========================================================================

    // Identity and kinematics
    pub use sim_types::{EngineId, EntityId, EntityKind, Pose, Twist};

    // Geometry
    pub use sim_types::{Aabb, Ray3, Shape};

    // Configuration and lifecycle
    pub use sim_types::{EngineConfig, EngineState, MaterialConfig};

    // Errors
    pub use sim_types::{ErrorCategory, SimError};

    // ========================================================================
    // Engine abstraction from sim-core
    // ========================================================================

    pub use sim_core::{
        ActionTag, EmbodiedComponent, Entity, OperationRegistry, PhysicsEngine, PhysicsModel,
        RayHit, World,
    };

    // Space conventions
    pub use sim_core::{Canonical, SpaceTransform, YUpLeftHanded, YUpRightHanded};

    // Driver
    pub use sim_core::{
        CommandQueue, Simulation, SimulationConfig, StepReport, TransferReport, TransferTrigger,
    };

    // ========================================================================
    // Rigid-body backend from sim-rigid
    // ========================================================================

    pub use sim_rigid::{RigidEngine, register_kind, register_operations};

    // ========================================================================
    // Math (nalgebra)
    // ========================================================================

    pub use nalgebra::{Point3, UnitQuaternion, Vector3};
}
