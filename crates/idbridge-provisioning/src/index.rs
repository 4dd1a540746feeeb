//! Entity index.
//!
//! The in-memory authoritative store of users and groups, keyed by their
//! assigned identifiers. The directory is the durable store; the index is a
//! cache of it that also serves as the source of truth for reads, so every
//! mutation that touches the directory must update the index in the same
//! logical step.
//!
//! Each method acquires the lock internally and releases it before
//! returning, so callers never hold it across a directory round-trip.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{info, warn};

use idbridge_connector::entry::EntryAttributes;
use idbridge_connector_ldap::codec;
use idbridge_scim::{Group, User};

/// Guarded id→entity maps for users and groups.
#[derive(Debug, Default)]
pub struct EntityIndex {
    users: RwLock<HashMap<String, User>>,
    groups: RwLock<HashMap<String, Group>>,
}

impl EntityIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a user by id.
    pub async fn get_user(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    /// Insert or overwrite a user.
    pub async fn put_user(&self, id: impl Into<String>, user: User) {
        self.users.write().await.insert(id.into(), user);
    }

    /// Remove a user, returning it if present.
    pub async fn remove_user(&self, id: &str) -> Option<User> {
        self.users.write().await.remove(id)
    }

    /// All users, in index iteration order (unspecified).
    pub async fn list_users(&self) -> Vec<User> {
        self.users.read().await.values().cloned().collect()
    }

    /// Number of indexed users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Look up a group by id.
    pub async fn get_group(&self, id: &str) -> Option<Group> {
        self.groups.read().await.get(id).cloned()
    }

    /// Insert or overwrite a group.
    pub async fn put_group(&self, id: impl Into<String>, group: Group) {
        self.groups.write().await.insert(id.into(), group);
    }

    /// Remove a group, returning it if present.
    pub async fn remove_group(&self, id: &str) -> Option<Group> {
        self.groups.write().await.remove(id)
    }

    /// All groups, in index iteration order (unspecified).
    pub async fn list_groups(&self) -> Vec<Group> {
        self.groups.read().await.values().cloned().collect()
    }

    /// Number of indexed groups.
    pub async fn group_count(&self) -> usize {
        self.groups.read().await.len()
    }

    /// Check whether any group already carries this display name, compared
    /// case-insensitively.
    pub async fn group_name_exists(&self, display_name: &str) -> bool {
        self.groups
            .read()
            .await
            .values()
            .any(|g| g.display_name.eq_ignore_ascii_case(display_name))
    }

    /// Clear and repopulate the user map from directory scan results.
    ///
    /// Startup only. Each entry is decoded via the codec; a record that
    /// fails to decode is logged and skipped, never fatal to the rebuild.
    /// Returns the number of users loaded.
    pub async fn rebuild_users(&self, entries: Vec<EntryAttributes>) -> usize {
        let mut loaded = HashMap::new();
        for entry in entries {
            match codec::user_from_attributes(&entry) {
                Ok(user) => {
                    if let Some(id) = user.id.clone() {
                        loaded.insert(id, user);
                    }
                }
                Err(err) => warn!(error = %err, "skipping undecodable user entry during rebuild"),
            }
        }

        let count = loaded.len();
        *self.users.write().await = loaded;
        info!(count, "user index rebuilt from directory");
        count
    }

    /// Clear and repopulate the group map from directory scan results.
    ///
    /// Same per-record failure tolerance as [`rebuild_users`](Self::rebuild_users).
    pub async fn rebuild_groups(&self, entries: Vec<EntryAttributes>) -> usize {
        let mut loaded = HashMap::new();
        for entry in entries {
            match codec::group_from_attributes(&entry) {
                Ok(group) => {
                    if let Some(id) = group.id.clone() {
                        loaded.insert(id, group);
                    }
                }
                Err(err) => warn!(error = %err, "skipping undecodable group entry during rebuild"),
            }
        }

        let count = loaded.len();
        *self.groups.write().await = loaded;
        info!(count, "group index rebuilt from directory");
        count
    }
}
