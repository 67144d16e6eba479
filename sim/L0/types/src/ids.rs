//! Identifiers and runtime type tags.

use std::borrow::{Borrow, Cow};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable string identifier of an entity in the world.
///
/// Identifiers are unique within a world and never reused while the entity
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct EntityId(String);

impl EntityId {
    /// Create a new entity ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a configured physics engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct EngineId(String);

impl EngineId {
    /// Create a new engine ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EngineId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EngineId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for EngineId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Runtime type tag of an entity.
///
/// The kind selects which backend operation applies to an entity. Kinds form
/// an open set: a plugin may introduce its own (for example a specific robot)
/// without touching any shared enumeration.
///
/// # Example
///
/// ```
/// use sim_types::EntityKind;
///
/// const FOOT_BOT: EntityKind = EntityKind::from_static("foot-bot");
/// assert_eq!(FOOT_BOT.as_str(), "foot-bot");
/// assert_ne!(FOOT_BOT, EntityKind::BOX);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct EntityKind(Cow<'static, str>);

impl EntityKind {
    /// Passive box-shaped obstacle.
    pub const BOX: Self = Self::from_static("box");
    /// Passive spherical object.
    pub const SPHERE: Self = Self::from_static("sphere");
    /// Passive cylinder.
    pub const CYLINDER: Self = Self::from_static("cylinder");
    /// Passive capsule.
    pub const CAPSULE: Self = Self::from_static("capsule");

    /// Create a kind from a static string (usable in constants).
    #[must_use]
    pub const fn from_static(kind: &'static str) -> Self {
        Self(Cow::Borrowed(kind))
    }

    /// Create a kind from a runtime string.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self(Cow::Owned(kind.into()))
    }

    /// Get the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
