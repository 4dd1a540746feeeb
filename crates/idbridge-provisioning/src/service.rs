//! Provisioning service façade.
//!
//! The operation surface the provider-facing layer calls into. Each
//! operation validates its preconditions, translates the entity through the
//! codec, performs the directory-side mutation through the gateway, and
//! updates the entity index to match.
//!
//! Directory failures during writes are logged and absorbed: the index
//! mutation proceeds regardless, trading directory/index consistency for
//! availability. The startup rebuild ([`initialize`](ProvisioningService::initialize))
//! is the reconciliation path. Not-found and duplicate errors are part of
//! the operation contract and are always returned to the caller.
//!
//! The index lock is only ever held inside index methods, never across a
//! gateway call; the window between the directory mutation and the index
//! mutation is an accepted read-after-write race.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use idbridge_connector::config::ConnectorSettings;
use idbridge_connector::error::{ConnectorError, ConnectorResult};
use idbridge_connector::ids::IdGenerator;
use idbridge_connector::traits::DirectoryGateway;
use idbridge_connector::types::EntityKind;
use idbridge_connector_ldap::codec;
use idbridge_scim::{Group, GroupQueryResponse, PageRequest, QueryFilter, User, UserQueryResponse};

use crate::filter::FilterEngine;
use crate::index::EntityIndex;

/// Help reference attached to readiness failures.
const STARTUP_HELP_URL: &str = "https://github.com/idbridge/idbridge#startup";

/// The connector's provisioning façade.
pub struct ProvisioningService {
    index: EntityIndex,
    gateway: Arc<dyn DirectoryGateway>,
    ids: IdGenerator,
    engine: FilterEngine,
    ready: AtomicBool,
}

impl ProvisioningService {
    /// Create a service over the given gateway.
    ///
    /// The settings snapshot is validated here and fixed for the process
    /// lifetime. Call [`initialize`](Self::initialize) before serving
    /// operations.
    pub fn new(
        settings: ConnectorSettings,
        gateway: Arc<dyn DirectoryGateway>,
    ) -> ConnectorResult<Self> {
        settings.validate()?;
        Ok(Self {
            index: EntityIndex::new(),
            gateway,
            ids: IdGenerator::new(settings.id_mode),
            engine: FilterEngine::new(settings.extension_urn),
            ready: AtomicBool::new(false),
        })
    }

    /// One-time startup rebuild: scan the directory for both kinds and
    /// repopulate the index.
    ///
    /// A failed scan leaves that kind's index empty and is logged; records
    /// that fail to decode are skipped individually. The service becomes
    /// ready either way — the directory may simply be empty or briefly
    /// unreachable, and the index is rebuilt on the next restart.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        match self.gateway.search_entries(EntityKind::User).await {
            Ok(entries) => {
                self.index.rebuild_users(entries).await;
            }
            Err(err) => error!(error = %err, "user scan failed during startup rebuild"),
        }
        match self.gateway.search_entries(EntityKind::Group).await {
            Ok(entries) => {
                self.index.rebuild_groups(entries).await;
            }
            Err(err) => error!(error = %err, "group scan failed during startup rebuild"),
        }

        self.ready.store(true, Ordering::SeqCst);
        info!(
            users = self.index.user_count().await,
            groups = self.index.group_count().await,
            "provisioning service initialized"
        );
    }

    fn ensure_ready(&self) -> ConnectorResult<()> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ConnectorError::management_with_help(
                "idx-001",
                "entity index unavailable: service not initialized",
                STARTUP_HELP_URL,
            ))
        }
    }

    /// Log and absorb a directory-side write failure.
    fn absorb_directory_failure(operation: &str, kind: EntityKind, naming: &str, err: &ConnectorError) {
        warn!(
            operation,
            kind = %kind,
            naming,
            error = %err,
            "directory write failed; index mutation proceeds (will reconcile on next rebuild)"
        );
    }

    // ---- users ----

    /// Create a user: assign an identifier, write the directory entry, and
    /// insert into the index.
    ///
    /// The index insert happens regardless of the directory outcome.
    #[instrument(skip(self, user), fields(user_name = %user.user_name))]
    pub async fn create_user(&self, mut user: User) -> ConnectorResult<User> {
        self.ensure_ready()?;

        let id = self.ids.next_id(EntityKind::User);
        user.id = Some(id.clone());
        debug!(id = %id, "creating user");

        let attrs = codec::user_to_attributes(&user)?;
        if let Err(err) = self
            .gateway
            .create_entry(EntityKind::User, &user.user_name, &attrs)
            .await
        {
            Self::absorb_directory_failure("create_user", EntityKind::User, &user.user_name, &err);
        }

        self.index.put_user(id, user.clone()).await;
        Ok(user)
    }

    /// Replace a user (full replacement, not a partial patch).
    ///
    /// The directory entry for the old state is destroyed; a fresh entry is
    /// created only when the new state is active. An inactive user keeps its
    /// index entry and simply has no directory entry.
    #[instrument(skip(self, user), fields(id = %id))]
    pub async fn update_user(&self, id: &str, mut user: User) -> ConnectorResult<User> {
        self.ensure_ready()?;

        let existing = self
            .index
            .get_user(id)
            .await
            .ok_or_else(|| ConnectorError::not_found(EntityKind::User, id))?;

        user.id = Some(id.to_string());
        let attrs = codec::user_to_attributes(&user)?;

        if let Err(err) = self
            .gateway
            .delete_entry(EntityKind::User, &existing.user_name)
            .await
        {
            Self::absorb_directory_failure("update_user", EntityKind::User, &existing.user_name, &err);
        }

        if user.active {
            if let Err(err) = self
                .gateway
                .create_entry(EntityKind::User, &user.user_name, &attrs)
                .await
            {
                Self::absorb_directory_failure("update_user", EntityKind::User, &user.user_name, &err);
            }
        } else {
            debug!(id = %id, "user deactivated; no directory entry recreated");
        }

        self.index.put_user(id.to_string(), user.clone()).await;
        Ok(user)
    }

    /// Look up a user by id.
    pub async fn get_user(&self, id: &str) -> ConnectorResult<User> {
        self.ensure_ready()?;
        self.index
            .get_user(id)
            .await
            .ok_or_else(|| ConnectorError::not_found(EntityKind::User, id))
    }

    /// List users, optionally filtered.
    ///
    /// With a filter, delegates to the filter engine and reports the match
    /// count; without one, returns the whole index. No server-side slicing
    /// is applied: all matches are returned regardless of the requested page
    /// size, and the requested start index is only echoed back.
    #[instrument(skip(self, filter))]
    pub async fn list_users(
        &self,
        page: Option<PageRequest>,
        filter: Option<&QueryFilter>,
    ) -> ConnectorResult<UserQueryResponse> {
        self.ensure_ready()?;

        let users = self.index.list_users().await;
        let resources = match filter {
            Some(filter) => self.engine.evaluate(filter, &users),
            None => users,
        };

        Ok(UserQueryResponse {
            total_results: resources.len(),
            start_index: page.map_or(1, |p| p.start_index),
            resources,
        })
    }

    // ---- groups ----

    /// Create a group, rejecting a display name already carried by any
    /// existing group (compared case-insensitively).
    #[instrument(skip(self, group), fields(display_name = %group.display_name))]
    pub async fn create_group(&self, mut group: Group) -> ConnectorResult<Group> {
        self.ensure_ready()?;

        if self.index.group_name_exists(&group.display_name).await {
            return Err(ConnectorError::duplicate_group(&group.display_name));
        }

        let id = self.ids.next_id(EntityKind::Group);
        group.id = Some(id.clone());
        debug!(id = %id, "creating group");

        let attrs = codec::group_to_attributes(&group)?;
        if let Err(err) = self
            .gateway
            .create_entry(EntityKind::Group, &group.display_name, &attrs)
            .await
        {
            Self::absorb_directory_failure("create_group", EntityKind::Group, &group.display_name, &err);
        }

        self.index.put_group(id, group.clone()).await;
        Ok(group)
    }

    /// Replace a group: the directory entry is destroyed under the old
    /// display name and recreated under the new one, then the index entry
    /// is overwritten.
    #[instrument(skip(self, group), fields(id = %id))]
    pub async fn update_group(&self, id: &str, mut group: Group) -> ConnectorResult<Group> {
        self.ensure_ready()?;

        let existing = self
            .index
            .get_group(id)
            .await
            .ok_or_else(|| ConnectorError::not_found(EntityKind::Group, id))?;

        group.id = Some(id.to_string());
        let attrs = codec::group_to_attributes(&group)?;

        if let Err(err) = self
            .gateway
            .replace_entry(
                EntityKind::Group,
                &existing.display_name,
                &group.display_name,
                &attrs,
            )
            .await
        {
            Self::absorb_directory_failure("update_group", EntityKind::Group, &existing.display_name, &err);
        }

        self.index.put_group(id.to_string(), group.clone()).await;
        Ok(group)
    }

    /// Look up a group by id.
    pub async fn get_group(&self, id: &str) -> ConnectorResult<Group> {
        self.ensure_ready()?;
        self.index
            .get_group(id)
            .await
            .ok_or_else(|| ConnectorError::not_found(EntityKind::Group, id))
    }

    /// List all groups. No filter support; no server-side slicing (the
    /// start index is only echoed back).
    #[instrument(skip(self))]
    pub async fn list_groups(
        &self,
        page: Option<PageRequest>,
    ) -> ConnectorResult<GroupQueryResponse> {
        self.ensure_ready()?;

        let resources = self.index.list_groups().await;
        Ok(GroupQueryResponse {
            total_results: resources.len(),
            start_index: page.map_or(1, |p| p.start_index),
            resources,
        })
    }

    /// Delete a group: remove it from the index first, then attempt the
    /// directory delete under the removed group's display name.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_group(&self, id: &str) -> ConnectorResult<()> {
        self.ensure_ready()?;

        let removed = self
            .index
            .remove_group(id)
            .await
            .ok_or_else(|| ConnectorError::not_found(EntityKind::Group, id))?;

        debug!(display_name = %removed.display_name, "group removed from index");

        if let Err(err) = self
            .gateway
            .delete_entry(EntityKind::Group, &removed.display_name)
            .await
        {
            Self::absorb_directory_failure("delete_group", EntityKind::Group, &removed.display_name, &err);
        }

        Ok(())
    }
}

impl std::fmt::Debug for ProvisioningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningService")
            .field("ready", &self.ready.load(Ordering::SeqCst))
            .field("id_mode", &self.ids.mode())
            .finish()
    }
}
