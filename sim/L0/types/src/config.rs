//! Per-engine configuration.
//!
//! An [`EngineConfig`] is handed to an engine's `init`. Every recognized
//! option has a default; [`EngineConfig::validate`] rejects out-of-range
//! values with an error naming the engine and the parameter. With the
//! `serde` feature, unrecognized options are rejected at deserialization.

use nalgebra::Vector3;

use crate::{Aabb, Result, SimError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Upper bound on solver iterations accepted by [`EngineConfig::validate`].
pub const MAX_ITERATIONS: u32 = 256;

/// Configuration record consumed by a physics engine's `init`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct EngineConfig {
    /// Gravity acceleration in canonical space (m/s²).
    pub gravity: Vector3<f64>,
    /// Solver iterations (substeps) per update.
    pub iterations: u32,
    /// Duration of one update (seconds).
    pub timestep: f64,
    /// Region of canonical space simulated by this engine. `None` means the
    /// whole space.
    pub bounds: Option<Aabb>,
    /// Whether to create a static ground plane at z = 0.
    pub ground_plane: bool,
    /// Default material for bodies.
    pub material: MaterialConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, 0.0, -9.81),
            iterations: 4,
            timestep: 0.1, // 10 Hz control loop
            bounds: None,
            ground_plane: true,
            material: MaterialConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the gravity vector.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity (zero-G environment).
    #[must_use]
    pub fn zero_gravity(self) -> Self {
        self.with_gravity(Vector3::zeros())
    }

    /// Set the number of solver iterations.
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the update duration.
    #[must_use]
    pub fn with_timestep(mut self, timestep: f64) -> Self {
        self.timestep = timestep;
        self
    }

    /// Restrict the engine to a region of space.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Enable or disable the ground plane.
    #[must_use]
    pub fn with_ground_plane(mut self, enable: bool) -> Self {
        self.ground_plane = enable;
        self
    }

    /// Set the default material.
    #[must_use]
    pub fn with_material(mut self, material: MaterialConfig) -> Self {
        self.material = material;
        self
    }

    /// Validate the configuration for the named engine.
    pub fn validate(&self, engine: &str) -> Result<()> {
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(SimError::invalid_config(
                engine,
                "gravity",
                format!("components must be finite, got {:?}", self.gravity.as_slice()),
            ));
        }

        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(SimError::invalid_config(
                engine,
                "iterations",
                format!("must be in 1..={MAX_ITERATIONS}, got {}", self.iterations),
            ));
        }

        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(SimError::invalid_config(
                engine,
                "timestep",
                format!("must be positive and finite, got {}", self.timestep),
            ));
        }

        if self.timestep > 1.0 {
            return Err(SimError::invalid_config(
                engine,
                "timestep",
                "timestep > 1 second is likely an error",
            ));
        }

        if let Some(bounds) = &self.bounds {
            if !bounds.is_valid() {
                return Err(SimError::invalid_config(
                    engine,
                    "bounds",
                    "corners must be finite with min <= max on every axis",
                ));
            }
        }

        self.material.validate(engine)
    }
}

/// Default surface material of an engine's bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct MaterialConfig {
    /// Static friction coefficient.
    pub static_friction: f64,
    /// Dynamic friction coefficient.
    pub dynamic_friction: f64,
    /// Coefficient of restitution in `[0, 1]`.
    pub restitution: f64,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            static_friction: 0.7,
            dynamic_friction: 0.5,
            restitution: 0.1,
        }
    }
}

impl MaterialConfig {
    /// Validate the material for the named engine.
    pub fn validate(&self, engine: &str) -> Result<()> {
        for (name, value) in [
            ("material.static_friction", self.static_friction),
            ("material.dynamic_friction", self.dynamic_friction),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::invalid_config(
                    engine,
                    name,
                    format!("must be non-negative and finite, got {value}"),
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(SimError::invalid_config(
                engine,
                "material.restitution",
                format!("must be in [0, 1], got {}", self.restitution),
            ));
        }

        Ok(())
    }
}
