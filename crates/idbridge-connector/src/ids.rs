//! Identifier generation.
//!
//! Two modes, fixed at startup: random opaque tokens (UUID v4, the default)
//! or monotonically increasing per-kind counters.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::types::{EntityKind, IdMode};

/// Base of the sequential user counter.
const USER_ID_BASE: u64 = 100;

/// Base of the sequential group counter.
const GROUP_ID_BASE: u64 = 1000;

/// Generates provider-visible entity identifiers.
///
/// Identifiers are opaque strings; once assigned to an entity they are
/// immutable.
#[derive(Debug)]
pub struct IdGenerator {
    mode: IdMode,
    next_user_id: AtomicU64,
    next_group_id: AtomicU64,
}

impl IdGenerator {
    /// Create a generator for the given mode.
    pub fn new(mode: IdMode) -> Self {
        Self {
            mode,
            next_user_id: AtomicU64::new(USER_ID_BASE),
            next_group_id: AtomicU64::new(GROUP_ID_BASE),
        }
    }

    /// Get the configured mode.
    pub fn mode(&self) -> IdMode {
        self.mode
    }

    /// Generate the next identifier for a kind.
    pub fn next_id(&self, kind: EntityKind) -> String {
        match self.mode {
            IdMode::Random => Uuid::new_v4().to_string(),
            IdMode::Sequential => {
                let counter = match kind {
                    EntityKind::User => &self.next_user_id,
                    EntityKind::Group => &self.next_group_id,
                };
                counter.fetch_add(1, Ordering::SeqCst).to_string()
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(IdMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_are_unique() {
        let ids = IdGenerator::new(IdMode::Random);
        let a = ids.next_id(EntityKind::User);
        let b = ids.next_id(EntityKind::User);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequential_user_ids_start_at_100() {
        let ids = IdGenerator::new(IdMode::Sequential);
        assert_eq!(ids.next_id(EntityKind::User), "100");
        assert_eq!(ids.next_id(EntityKind::User), "101");
    }

    #[test]
    fn test_sequential_group_ids_start_at_1000() {
        let ids = IdGenerator::new(IdMode::Sequential);
        assert_eq!(ids.next_id(EntityKind::Group), "1000");
        assert_eq!(ids.next_id(EntityKind::Group), "1001");
    }

    #[test]
    fn test_sequential_counters_are_independent() {
        let ids = IdGenerator::new(IdMode::Sequential);
        ids.next_id(EntityKind::User);
        assert_eq!(ids.next_id(EntityKind::Group), "1000");
    }
}
