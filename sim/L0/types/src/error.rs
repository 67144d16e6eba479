//! Error types for the physics layer.
//!
//! Every error belongs to one [`ErrorCategory`], which decides whether the
//! simulation run can continue.

use thiserror::Error;

/// How an error affects the running simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed engine parameters or geometry. Fatal to the engine instance.
    Configuration,
    /// No operation (or a duplicate one) for an action/entity pair.
    /// Recoverable: nothing was changed.
    Dispatch,
    /// Lifecycle or bookkeeping misuse. Fatal to the run.
    StateMisuse,
    /// An entity could not be moved between engines. Recoverable: the
    /// entity stays attached to its original engine.
    Transfer,
}

/// Errors raised by engines, the operation registry and the driver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Invalid engine configuration parameter.
    #[error("engine '{engine}': invalid parameter '{parameter}': {reason}")]
    InvalidConfig {
        /// Engine being configured.
        engine: String,
        /// Offending parameter.
        parameter: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Entity geometry a backend cannot build a body from.
    #[error("entity '{entity}': invalid shape: {reason}")]
    InvalidShape {
        /// Entity carrying the shape.
        entity: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No operation registered for the requested combination.
    #[error("unsupported operation: no '{action}' registered for entity kind '{kind}' on '{host}'")]
    UnsupportedOperation {
        /// Action tag.
        action: String,
        /// Host type (engine or plugin) the action targets.
        host: String,
        /// Entity kind.
        kind: String,
    },

    /// An operation is already registered for the combination.
    #[error("duplicate operation: '{action}' for entity kind '{kind}' on '{host}' is already registered")]
    DuplicateOperation {
        /// Action tag.
        action: String,
        /// Host type.
        host: String,
        /// Entity kind.
        kind: String,
    },

    /// Registration attempted after the registry was frozen.
    #[error("operation registry is frozen: cannot register '{action}' for '{kind}' on '{host}'")]
    RegistryFrozen {
        /// Action tag.
        action: String,
        /// Host type.
        host: String,
        /// Entity kind.
        kind: String,
    },

    /// The entity has no component with this name (or of the expected type).
    #[error("entity '{entity}' has no '{component}' component")]
    MissingComponent {
        /// Entity queried.
        entity: String,
        /// Component name.
        component: String,
    },

    /// The entity is not in the world.
    #[error("entity not found: {entity}")]
    EntityNotFound {
        /// Missing entity.
        entity: String,
    },

    /// An entity with this id is already in the world.
    #[error("duplicate entity: {entity}")]
    DuplicateEntity {
        /// Conflicting entity id.
        entity: String,
    },

    /// No engine volume contains the entity's position.
    #[error("entity '{entity}' cannot be placed in any physics engine")]
    NoEngineForEntity {
        /// Entity being placed.
        entity: String,
    },

    /// Lifecycle method called in a state that does not allow it.
    #[error("engine '{engine}': cannot {operation} while {state}")]
    InvalidState {
        /// Engine misused.
        engine: String,
        /// Attempted operation.
        operation: String,
        /// Current state.
        state: String,
    },

    /// The engine holds no model for the entity.
    #[error("engine '{engine}' has no model for entity '{entity}'")]
    ModelNotFound {
        /// Engine queried.
        engine: String,
        /// Entity without a model.
        entity: String,
    },

    /// The engine already holds a model for the entity.
    #[error("engine '{engine}' already has a model for entity '{entity}'")]
    DuplicateModel {
        /// Engine queried.
        engine: String,
        /// Entity with an existing model.
        entity: String,
    },

    /// No configured engine has this id.
    #[error("unknown engine: {engine}")]
    UnknownEngine {
        /// Missing engine id.
        engine: String,
    },

    /// An entity could not be moved between engines.
    #[error("transfer of entity '{entity}' from '{from}' to '{to}' failed: {reason}")]
    TransferFailed {
        /// Entity being moved.
        entity: String,
        /// Source engine.
        from: String,
        /// Destination engine (empty when none was found).
        to: String,
        /// Why the transfer failed.
        reason: String,
    },
}

impl SimError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(
        engine: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            engine: engine.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid lifecycle state error.
    #[must_use]
    pub fn invalid_state(
        engine: impl Into<String>,
        operation: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            engine: engine.into(),
            operation: operation.into(),
            state: state.into(),
        }
    }

    /// Create a transfer error.
    #[must_use]
    pub fn transfer_failed(
        entity: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TransferFailed {
            entity: entity.into(),
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }

    /// The category this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. } | Self::InvalidShape { .. } => ErrorCategory::Configuration,
            Self::UnsupportedOperation { .. }
            | Self::DuplicateOperation { .. }
            | Self::RegistryFrozen { .. }
            | Self::MissingComponent { .. }
            | Self::EntityNotFound { .. }
            | Self::DuplicateEntity { .. }
            | Self::NoEngineForEntity { .. } => ErrorCategory::Dispatch,
            Self::InvalidState { .. }
            | Self::ModelNotFound { .. }
            | Self::DuplicateModel { .. }
            | Self::UnknownEngine { .. } => ErrorCategory::StateMisuse,
            Self::TransferFailed { .. } => ErrorCategory::Transfer,
        }
    }

    /// Whether the run must stop: configuration and state-misuse errors leave
    /// physics state that cannot be trusted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::StateMisuse
        )
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::Configuration)
    }

    /// Check if this is a dispatch error.
    #[must_use]
    pub const fn is_dispatch_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::Dispatch)
    }
}
