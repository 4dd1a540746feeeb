//! Provisioning service tests.
//!
//! Exercises the service façade end to end against an in-memory mock
//! gateway: id assignment, directory write-through, failure absorption,
//! duplicate checks, filtering, and the startup rebuild.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use idbridge_connector::config::ConnectorSettings;
use idbridge_connector::entry::EntryAttributes;
use idbridge_connector::error::{ConnectorError, ConnectorResult};
use idbridge_connector::traits::DirectoryGateway;
use idbridge_connector::types::{EntityKind, IdMode};
use idbridge_connector_ldap::codec;
use idbridge_provisioning::ProvisioningService;
use idbridge_scim::{Email, Group, Membership, Name, PageRequest, QueryFilter, User};

// =============================================================================
// Mock gateway
// =============================================================================

/// In-memory directory standing in for the LDAP server. Entries are keyed by
/// the kind-qualified naming path, mimicking the DN computation.
#[derive(Default)]
struct MockGateway {
    entries: Mutex<HashMap<String, EntryAttributes>>,
    seed_users: Mutex<Vec<EntryAttributes>>,
    seed_groups: Mutex<Vec<EntryAttributes>>,
    fail_writes: AtomicBool,
    create_calls: AtomicUsize,
    replace_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    last_replace: Mutex<Option<(String, String)>>,
}

impl MockGateway {
    fn new() -> Self {
        Self::default()
    }

    fn key(kind: EntityKind, naming: &str) -> String {
        format!("{kind}:{naming}")
    }

    fn with_seed_users(self, entries: Vec<EntryAttributes>) -> Self {
        *self.seed_users.lock().unwrap() = entries;
        self
    }

    fn with_seed_groups(self, entries: Vec<EntryAttributes>) -> Self {
        *self.seed_groups.lock().unwrap() = entries;
        self
    }

    fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    fn has_entry(&self, kind: EntityKind, naming: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .contains_key(&Self::key(kind, naming))
    }

    fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }

    fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryGateway for MockGateway {
    async fn create_entry(
        &self,
        kind: EntityKind,
        naming: &str,
        attrs: &EntryAttributes,
    ) -> ConnectorResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ConnectorError::directory("directory unreachable"));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(Self::key(kind, naming), attrs.clone());
        Ok(())
    }

    async fn replace_entry(
        &self,
        kind: EntityKind,
        old_naming: &str,
        new_naming: &str,
        attrs: &EntryAttributes,
    ) -> ConnectorResult<()> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ConnectorError::directory("directory unreachable"));
        }
        *self.last_replace.lock().unwrap() =
            Some((old_naming.to_string(), new_naming.to_string()));
        let mut entries = self.entries.lock().unwrap();
        entries.remove(&Self::key(kind, old_naming));
        entries.insert(Self::key(kind, new_naming), attrs.clone());
        Ok(())
    }

    async fn delete_entry(&self, kind: EntityKind, naming: &str) -> ConnectorResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ConnectorError::directory("directory unreachable"));
        }
        match self.entries.lock().unwrap().remove(&Self::key(kind, naming)) {
            Some(_) => Ok(()),
            None => Err(ConnectorError::directory(format!(
                "no such entry: {naming}"
            ))),
        }
    }

    async fn search_entries(&self, kind: EntityKind) -> ConnectorResult<Vec<EntryAttributes>> {
        Ok(match kind {
            EntityKind::User => self.seed_users.lock().unwrap().clone(),
            EntityKind::Group => self.seed_groups.lock().unwrap().clone(),
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn sequential_settings() -> ConnectorSettings {
    ConnectorSettings {
        id_mode: IdMode::Sequential,
        ..ConnectorSettings::default()
    }
}

async fn service_with(gateway: Arc<MockGateway>) -> ProvisioningService {
    let service = ProvisioningService::new(sequential_settings(), gateway).unwrap();
    service.initialize().await;
    service
}

fn sample_user(user_name: &str) -> User {
    let mut user = User::new(user_name);
    user.name = Name::new("Alice Smith", "Alice", "Smith");
    user.emails = vec![Email::new(format!("{user_name}@example.com"), "work", true)];
    user
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn create_user_assigns_id_and_writes_directory_entry() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway.clone()).await;

    let created = service.create_user(sample_user("alice")).await.unwrap();

    assert_eq!(created.id.as_deref(), Some("100"));
    assert!(gateway.has_entry(EntityKind::User, "alice"));
    assert_eq!(service.get_user("100").await.unwrap(), created);
}

#[tokio::test]
async fn create_user_survives_directory_failure() {
    let gateway = Arc::new(MockGateway::new().failing_writes());
    let service = service_with(gateway.clone()).await;

    // The directory write fails, is absorbed, and the index still gains the
    // user: availability over directory/index consistency.
    let created = service.create_user(sample_user("alice")).await.unwrap();

    assert_eq!(gateway.create_calls(), 1);
    assert!(!gateway.has_entry(EntityKind::User, "alice"));
    assert_eq!(service.get_user(created.id.as_deref().unwrap()).await.unwrap(), created);
}

#[tokio::test]
async fn username_uniqueness_is_not_enforced() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    let first = service.create_user(sample_user("alice")).await.unwrap();
    let second = service.create_user(sample_user("alice")).await.unwrap();

    assert_ne!(first.id, second.id);
    let listed = service.list_users(None, None).await.unwrap();
    assert_eq!(listed.total_results, 2);
}

#[tokio::test]
async fn deactivating_a_user_removes_directory_entry_but_keeps_index_entry() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway.clone()).await;

    let created = service.create_user(sample_user("alice")).await.unwrap();
    let id = created.id.clone().unwrap();
    assert!(gateway.has_entry(EntityKind::User, "alice"));

    let mut updated = sample_user("alice");
    updated.active = false;
    let stored = service.update_user(&id, updated).await.unwrap();

    assert!(!gateway.has_entry(EntityKind::User, "alice"));
    assert_eq!(gateway.create_calls(), 1);
    let fetched = service.get_user(&id).await.unwrap();
    assert!(!fetched.active);
    assert_eq!(fetched, stored);
}

#[tokio::test]
async fn reactivating_a_user_recreates_its_directory_entry() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway.clone()).await;

    let id = service
        .create_user(sample_user("alice"))
        .await
        .unwrap()
        .id
        .unwrap();

    let mut inactive = sample_user("alice");
    inactive.active = false;
    service.update_user(&id, inactive).await.unwrap();

    let active = sample_user("alice");
    service.update_user(&id, active).await.unwrap();

    assert!(gateway.has_entry(EntityKind::User, "alice"));
}

#[tokio::test]
async fn renaming_a_user_moves_its_directory_entry() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway.clone()).await;

    let id = service
        .create_user(sample_user("alice"))
        .await
        .unwrap()
        .id
        .unwrap();

    let renamed = sample_user("asmith");
    service.update_user(&id, renamed).await.unwrap();

    assert!(!gateway.has_entry(EntityKind::User, "alice"));
    assert!(gateway.has_entry(EntityKind::User, "asmith"));
}

#[tokio::test]
async fn update_user_preserves_assigned_id() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    let id = service
        .create_user(sample_user("alice"))
        .await
        .unwrap()
        .id
        .unwrap();

    let mut replacement = sample_user("alice");
    replacement.id = Some("forged".to_string());
    let stored = service.update_user(&id, replacement).await.unwrap();

    assert_eq!(stored.id.as_deref(), Some(id.as_str()));
}

#[tokio::test]
async fn update_unknown_user_is_not_found() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    let err = service
        .update_user("missing", sample_user("alice"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn get_user_is_idempotent() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    let id = service
        .create_user(sample_user("alice"))
        .await
        .unwrap()
        .id
        .unwrap();

    let first = service.get_user(&id).await.unwrap();
    let second = service.get_user(&id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn list_users_reports_full_index_without_filter() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    for name in ["alice", "bob", "carol"] {
        service.create_user(sample_user(name)).await.unwrap();
    }

    // Pagination is echoed, never applied: all three come back even though
    // the page asked for one.
    let response = service
        .list_users(Some(PageRequest::new(2, 1)), None)
        .await
        .unwrap();

    assert_eq!(response.total_results, 3);
    assert_eq!(response.resources.len(), 3);
    assert_eq!(response.start_index, 2);
}

#[tokio::test]
async fn list_users_defaults_start_index_to_one() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    let response = service.list_users(None, None).await.unwrap();
    assert_eq!(response.start_index, 1);
    assert_eq!(response.total_results, 0);
}

#[tokio::test]
async fn list_users_with_filter_reports_match_count() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    service.create_user(sample_user("alice")).await.unwrap();
    service.create_user(sample_user("bob")).await.unwrap();

    let filter = QueryFilter::eq("userName", "alice");
    let response = service.list_users(None, Some(&filter)).await.unwrap();

    assert_eq!(response.total_results, 1);
    assert_eq!(response.resources[0].user_name, "alice");
}

#[tokio::test]
async fn or_filter_over_emails_returns_both_users() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    service.create_user(sample_user("alice")).await.unwrap();
    service.create_user(sample_user("bob")).await.unwrap();

    let filter = QueryFilter::or(vec![
        QueryFilter::eq("email", "alice@example.com"),
        QueryFilter::eq("email", "bob@example.com"),
    ]);
    let response = service.list_users(None, Some(&filter)).await.unwrap();

    assert_eq!(response.total_results, 2);
    let mut names: Vec<&str> = response
        .resources
        .iter()
        .map(|u| u.user_name.as_str())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["alice", "bob"]);
}

// =============================================================================
// Groups
// =============================================================================

#[tokio::test]
async fn create_group_assigns_id_and_writes_directory_entry() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway.clone()).await;

    let group = Group::new("engineering").with_member(Membership::new("100", "Alice Smith"));
    let created = service.create_group(group).await.unwrap();

    assert_eq!(created.id.as_deref(), Some("1000"));
    assert!(gateway.has_entry(EntityKind::Group, "engineering"));
}

#[tokio::test]
async fn duplicate_group_display_name_is_rejected_case_insensitively() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    service.create_group(Group::new("Engineering")).await.unwrap();
    let err = service
        .create_group(Group::new("engineering"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "DUPLICATE_GROUP");
    let listed = service.list_groups(None).await.unwrap();
    assert_eq!(listed.total_results, 1);
}

#[tokio::test]
async fn update_group_replaces_entry_under_new_display_name() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway.clone()).await;

    let id = service
        .create_group(Group::new("engineering"))
        .await
        .unwrap()
        .id
        .unwrap();

    let renamed = Group::new("platform");
    let stored = service.update_group(&id, renamed).await.unwrap();

    assert_eq!(gateway.replace_calls(), 1);
    assert_eq!(
        gateway.last_replace.lock().unwrap().clone(),
        Some(("engineering".to_string(), "platform".to_string()))
    );
    assert!(gateway.has_entry(EntityKind::Group, "platform"));
    assert!(!gateway.has_entry(EntityKind::Group, "engineering"));
    assert_eq!(stored.id.as_deref(), Some(id.as_str()));
    assert_eq!(service.get_group(&id).await.unwrap().display_name, "platform");
}

#[tokio::test]
async fn update_unknown_group_is_not_found() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    let err = service
        .update_group("missing", Group::new("platform"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn deleted_group_is_gone_from_index_and_directory() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway.clone()).await;

    let id = service
        .create_group(Group::new("engineering"))
        .await
        .unwrap()
        .id
        .unwrap();

    service.delete_group(&id).await.unwrap();

    assert!(service.get_group(&id).await.unwrap_err().is_not_found());
    assert!(!gateway.has_entry(EntityKind::Group, "engineering"));
    assert_eq!(gateway.delete_calls(), 1);
}

#[tokio::test]
async fn delete_group_succeeds_even_when_directory_delete_fails() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway.clone()).await;

    let id = service
        .create_group(Group::new("engineering"))
        .await
        .unwrap()
        .id
        .unwrap();

    gateway.fail_writes.store(true, Ordering::SeqCst);
    service.delete_group(&id).await.unwrap();

    assert!(service.get_group(&id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_unknown_group_is_not_found() {
    let gateway = Arc::new(MockGateway::new());
    let service = service_with(gateway).await;

    let err = service.delete_group("missing").await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

// =============================================================================
// Startup
// =============================================================================

#[tokio::test]
async fn operations_fail_until_initialized() {
    let gateway = Arc::new(MockGateway::new());
    let service = ProvisioningService::new(sequential_settings(), gateway).unwrap();

    let err = service.create_user(sample_user("alice")).await.unwrap_err();
    assert_eq!(err.error_code(), "MANAGEMENT_ERROR");

    service.initialize().await;
    assert!(service.create_user(sample_user("alice")).await.is_ok());
}

#[tokio::test]
async fn initialize_rebuilds_index_from_directory_scan() {
    let mut seeded_user = sample_user("alice");
    seeded_user.id = Some("7".to_string());
    let mut seeded_group = Group::new("engineering");
    seeded_group.id = Some("1007".to_string());

    // One undecodable user entry rides along and is skipped.
    let mut broken = codec::user_to_attributes(&seeded_user).unwrap();
    broken.remove("uid");

    let gateway = Arc::new(
        MockGateway::new()
            .with_seed_users(vec![
                codec::user_to_attributes(&seeded_user).unwrap(),
                broken,
            ])
            .with_seed_groups(vec![codec::group_to_attributes(&seeded_group).unwrap()]),
    );

    let service = service_with(gateway).await;

    let user = service.get_user("7").await.unwrap();
    assert_eq!(user.user_name, "alice");
    assert_eq!(service.list_users(None, None).await.unwrap().total_results, 1);

    let group = service.get_group("1007").await.unwrap();
    assert_eq!(group.display_name, "engineering");
}
