//! Entity kinds and identifier-generation modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of provisioned entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A user account.
    User,
    /// A group.
    Group,
}

impl EntityKind {
    /// Get all entity kinds.
    #[must_use]
    pub fn all() -> &'static [EntityKind] {
        &[EntityKind::User, EntityKind::Group]
    }

    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Group => "group",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(EntityKind::User),
            "group" => Ok(EntityKind::Group),
            _ => Err(ParseEntityKindError(s.to_string())),
        }
    }
}

/// Error parsing entity kind from string.
#[derive(Debug, Clone)]
pub struct ParseEntityKindError(String);

impl fmt::Display for ParseEntityKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid entity kind '{}', expected one of: user, group",
            self.0
        )
    }
}

impl std::error::Error for ParseEntityKindError {}

/// Identifier-generation mode, fixed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdMode {
    /// Randomly generated opaque token (UUID v4).
    #[default]
    Random,
    /// Monotonically increasing per-kind counter (users from 100, groups
    /// from 1000).
    Sequential,
}

impl IdMode {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IdMode::Random => "random",
            IdMode::Sequential => "sequential",
        }
    }
}

impl fmt::Display for IdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IdMode {
    type Err = ParseIdModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(IdMode::Random),
            "sequential" => Ok(IdMode::Sequential),
            _ => Err(ParseIdModeError(s.to_string())),
        }
    }
}

/// Error parsing id mode from string.
#[derive(Debug, Clone)]
pub struct ParseIdModeError(String);

impl fmt::Display for ParseIdModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid id mode '{}', expected one of: random, sequential",
            self.0
        )
    }
}

impl std::error::Error for ParseIdModeError {}
