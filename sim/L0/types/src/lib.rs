//! Core types for the multi-engine physics layer.
//!
//! This crate provides the data vocabulary shared by the physics-engine
//! abstraction and every backend plugged into it:
//!
//! - [`EntityId`], [`EngineId`], [`EntityKind`] - identifiers and type tags
//! - [`Pose`], [`Twist`] - rigid body configuration and velocity
//! - [`Shape`], [`Aabb`], [`Ray3`] - geometry used by spatial queries
//! - [`EngineConfig`], [`MaterialConfig`] - per-engine configuration
//! - [`EngineState`] - the engine lifecycle state machine
//! - [`SimError`] - the error taxonomy
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no backend state and know
//! nothing about any particular physics library. Engines, visualizers and the
//! world all speak in these terms.
//!
//! # Coordinate System
//!
//! Every value in this crate is expressed in **canonical space**:
//!
//! - X: forward (camera axis)
//! - Y: left (screen horizontal)
//! - Z: up (screen vertical)
//! - Right-handed
//!
//! Backends with another convention convert at their boundary.
//!
//! # Example
//!
//! ```
//! use sim_types::{Aabb, Pose};
//! use nalgebra::Point3;
//!
//! let arena = Aabb::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
//! let pose = Pose::from_position(Point3::new(5.0, 5.0, 5.0));
//!
//! assert!(arena.contains(&pose.position));
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,   // Error docs added where non-obvious
)]

mod body;
mod config;
mod error;
mod geometry;
mod ids;
mod shape;
mod state;

pub use body::{Pose, Twist};
pub use config::{EngineConfig, MaterialConfig};
pub use error::{ErrorCategory, SimError};
pub use geometry::{Aabb, Ray3};
pub use ids::{EngineId, EntityId, EntityKind};
pub use shape::Shape;
pub use state::EngineState;

// Re-export math types for convenience
pub use nalgebra::{Point3, UnitQuaternion, UnitVector3, Vector3};

/// Result type for physics-layer operations.
pub type Result<T> = std::result::Result<T, SimError>;
