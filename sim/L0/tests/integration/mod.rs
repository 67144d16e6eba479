//! Integration tests for the sim-* crate ecosystem.
//!
//! These tests verify end-to-end behavior across crates:
//! - Engine contract of the rigid backend (add/remove, queries, lifecycle)
//! - Entity transfer between engines partitioning space
//! - The simulation driver (queued commands, reset, destroy, ray picking)
//! - Visualizer operations sharing the registry with physics backends

mod fixtures;

pub mod engine_contract;
pub mod simulation;
pub mod visualizer;
