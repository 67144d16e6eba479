//! Rigid-body backend for the `sim-core` engine abstraction.
//!
//! [`RigidEngine`] adapts a small self-contained rigid-body scene
//! ([`NativeScene`]) to the [`PhysicsEngine`](sim_core::PhysicsEngine)
//! contract. The scene works in its own axis convention, chosen by the type
//! parameter `S` (left-handed Y-up by default); every pose crossing the
//! engine boundary is converted with `S`.
//!
//! The scene integrates gravity with semi-implicit Euler substeps and
//! resolves contact against an optional static ground plane at canonical
//! z = 0, using the engine's default material for restitution and friction.
//!
//! # Example
//!
//! ```
//! use sim_core::entity::Entity;
//! use sim_core::{OperationRegistry, PhysicsEngine, YUpLeftHanded};
//! use sim_rigid::{register_operations, RigidEngine};
//! use sim_types::{EngineConfig, EntityKind, Pose, Shape};
//! use nalgebra::Point3;
//!
//! let mut registry = OperationRegistry::new();
//! register_operations::<YUpLeftHanded>(&mut registry).unwrap();
//! let registry = registry.into_shared();
//!
//! let mut engine = RigidEngine::<YUpLeftHanded>::new("main", registry);
//! engine.init(&EngineConfig::default()).unwrap();
//!
//! let mut ball = Entity::embodied(
//!     "ball",
//!     EntityKind::SPHERE,
//!     Pose::from_position(Point3::new(0.0, 0.0, 5.0)),
//!     Shape::sphere(0.5),
//! );
//! engine.add_entity(&mut ball).unwrap();
//! engine.update().unwrap();
//!
//! let pose = engine.model_pose(ball.id()).unwrap();
//! assert!(pose.position.z < 5.0);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-rigid/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
)]

pub mod engine;
pub mod model;
pub mod operations;
pub mod scene;

pub use engine::RigidEngine;
pub use model::RigidModel;
pub use operations::{SUPPORTED_KINDS, register_kind, register_operations};
pub use scene::{BodyHandle, NativeBody, NativeScene, SceneDesc, SceneError};
