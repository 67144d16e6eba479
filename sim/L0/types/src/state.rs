//! Engine lifecycle states.

use std::fmt;

/// Lifecycle state of a physics engine instance.
///
/// ```text
/// Uninitialized ──init──▶ Initialized ──update──▶ Running
///                              ▲                     │
///                              └───────reset─────────┘
/// (any state but Destroyed) ──destroy──▶ Destroyed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineState {
    /// Constructed but not yet configured, or `init` failed.
    #[default]
    Uninitialized,
    /// Configured, native world built, not stepped since init or reset.
    Initialized,
    /// Stepped at least once since init or reset.
    Running,
    /// Native world released. Terminal.
    Destroyed,
}

impl EngineState {
    /// Short lowercase name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Destroyed => "destroyed",
        }
    }

    /// Whether the native world exists (stepping, queries and entity
    /// add/remove are allowed).
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Initialized | Self::Running)
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
