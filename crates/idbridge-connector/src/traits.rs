//! Directory gateway capability trait.

use async_trait::async_trait;

use crate::entry::EntryAttributes;
use crate::error::ConnectorResult;
use crate::types::EntityKind;

/// Capability for mutating and scanning entries in a backing directory.
///
/// The naming value is the entity field that locates the entry: the username
/// for users, the display name for groups. How the location is computed from
/// it (prefix, container, base path) is the implementation's concern.
///
/// Gateway operations are synchronous round-trips to the directory; callers
/// must not hold the entity-index lock across them.
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    /// Create a directory entry for an entity.
    async fn create_entry(
        &self,
        kind: EntityKind,
        naming: &str,
        attrs: &EntryAttributes,
    ) -> ConnectorResult<()>;

    /// Replace an entity's directory entry, possibly under a new naming
    /// value.
    ///
    /// Implemented as delete-then-create, not an atomic rename: a failure
    /// between the two steps leaves the directory without an entry. This is
    /// the connector's accepted failure window.
    async fn replace_entry(
        &self,
        kind: EntityKind,
        old_naming: &str,
        new_naming: &str,
        attrs: &EntryAttributes,
    ) -> ConnectorResult<()>;

    /// Delete an entity's directory entry.
    async fn delete_entry(&self, kind: EntityKind, naming: &str) -> ConnectorResult<()>;

    /// Full scan of all entries of a kind. Used by the startup rebuild.
    async fn search_entries(&self, kind: EntityKind) -> ConnectorResult<Vec<EntryAttributes>>;
}
