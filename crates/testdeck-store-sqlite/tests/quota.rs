// testdeck-store-sqlite/tests/quota.rs
// ============================================================================
// Module: Quota Source Tests
// Description: Usage aggregation and eligibility boundaries over SQLite.
// Purpose: Validate OWNER-based counting and the tier ceilings end to end.
// Dependencies: testdeck-store-sqlite, testdeck-core, tempfile
// ============================================================================

//! Quota aggregation tests against real rows.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use testdeck_core::AccessLevel;
use testdeck_core::AclEntry;
use testdeck_core::CreationSubject;
use testdeck_core::ObjectKind;
use testdeck_core::ResourceKind;
use testdeck_core::User;
use testdeck_core::interfaces::AccessControlStore;
use testdeck_core::interfaces::QuotaSource;
use testdeck_core::is_eligible_to_create;
use testdeck_store_sqlite::SqliteStore;
use testdeck_store_sqlite::SqliteStoreConfig;

fn open_store() -> (SqliteStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = SqliteStoreConfig {
        path: dir.path().join("store.db"),
        ..SqliteStoreConfig::default()
    };
    (SqliteStore::open(&config).unwrap(), dir)
}

/// Creates a user on the given tier.
fn user_on_tier(store: &SqliteStore, email: &str, tier: &str) -> User {
    let user = store.create_user("", "", email).unwrap();
    store.set_subscription_tier(&user.id, tier).unwrap();
    user
}

/// Creates `count` projects owned by the user.
fn owned_projects(store: &SqliteStore, user: &User, count: usize) {
    for index in 0..count {
        let project =
            store.create_project(&format!("project-{index}"), "").unwrap();
        store
            .grant(&AclEntry::new(
                project.id.clone().unwrap(),
                ObjectKind::Project,
                user.id.clone(),
                AccessLevel::Owner,
            ))
            .unwrap();
    }
}

#[test]
fn zero_usage_reports_no_rows() {
    let (store, _dir) = open_store();
    let user = user_on_tier(&store, "empty@example.com", "free");
    assert!(store.owned_count(ResourceKind::Project, &user.id).unwrap().is_none());
    assert!(
        is_eligible_to_create(&store, ResourceKind::Project, &CreationSubject::User(user.id))
            .unwrap()
    );
}

#[test]
fn free_user_with_three_projects_is_rejected() {
    let (store, _dir) = open_store();
    let user = user_on_tier(&store, "free@example.com", "free");
    owned_projects(&store, &user, 3);
    let usage = store.owned_count(ResourceKind::Project, &user.id).unwrap().unwrap();
    assert_eq!(usage.count, 3);
    assert!(
        !is_eligible_to_create(&store, ResourceKind::Project, &CreationSubject::User(user.id))
            .unwrap()
    );
}

#[test]
fn standard_user_boundary_is_ten_projects() {
    let (store, _dir) = open_store();
    let user = user_on_tier(&store, "standard@example.com", "standard");
    owned_projects(&store, &user, 9);
    let subject = CreationSubject::User(user.id.clone());
    assert!(is_eligible_to_create(&store, ResourceKind::Project, &subject).unwrap());
    owned_projects(&store, &user, 1);
    assert!(!is_eligible_to_create(&store, ResourceKind::Project, &subject).unwrap());
}

#[test]
fn enterprise_tier_is_unlimited() {
    let (store, _dir) = open_store();
    let user = user_on_tier(&store, "big@example.com", "enterprise");
    owned_projects(&store, &user, 12);
    assert!(
        is_eligible_to_create(&store, ResourceKind::Project, &CreationSubject::User(user.id))
            .unwrap()
    );
}

#[test]
fn soft_deleted_projects_do_not_count() {
    let (store, _dir) = open_store();
    let user = user_on_tier(&store, "free2@example.com", "free");
    owned_projects(&store, &user, 3);
    let projects = store.list_projects(0, 10, &user.id).unwrap();
    store.delete_project(projects[0].id.as_ref().unwrap()).unwrap();
    assert!(
        is_eligible_to_create(&store, ResourceKind::Project, &CreationSubject::User(user.id))
            .unwrap()
    );
}

#[test]
fn scope_quota_accounts_to_the_project_owner() {
    let (store, _dir) = open_store();
    let owner = user_on_tier(&store, "owner@example.com", "free");
    let project = store.create_project("project", "").unwrap();
    let project_id = project.id.unwrap();
    store
        .grant(&AclEntry::new(
            project_id.clone(),
            ObjectKind::Project,
            owner.id.clone(),
            AccessLevel::Owner,
        ))
        .unwrap();
    assert_eq!(store.project_owner(&project_id).unwrap().unwrap(), owner.id);
    for index in 0..10 {
        store.create_scope(&project_id, &format!("scope-{index}")).unwrap();
    }
    let subject = CreationSubject::Project(project_id);
    assert!(!is_eligible_to_create(&store, ResourceKind::Scope, &subject).unwrap());
}

#[test]
fn non_owner_collaborators_do_not_account() {
    // MODIFY rows from accepted invitations never count against quotas.
    let (store, _dir) = open_store();
    let guest = user_on_tier(&store, "guest@example.com", "free");
    let project = store.create_project("project", "").unwrap();
    store
        .grant(&AclEntry::new(
            project.id.unwrap(),
            ObjectKind::Project,
            guest.id.clone(),
            AccessLevel::Modify,
        ))
        .unwrap();
    assert!(store.owned_count(ResourceKind::Project, &guest.id).unwrap().is_none());
}

#[test]
fn usage_snapshot_counts_every_kind() {
    let (store, _dir) = open_store();
    let owner = user_on_tier(&store, "snap@example.com", "standard");
    let project = store.create_project("project", "").unwrap();
    let project_id = project.id.unwrap();
    store
        .grant(&AclEntry::new(
            project_id.clone(),
            ObjectKind::Project,
            owner.id.clone(),
            AccessLevel::Owner,
        ))
        .unwrap();
    let scope = store.create_scope(&project_id, "scope").unwrap();
    store
        .create_scenario(&project_id, scope.id.as_ref().unwrap(), "scenario", &[])
        .unwrap();
    store.create_session(&project_id, &owner.id, "1.0", "", &[]).unwrap();
    let snapshot = store.usage(&owner.id).unwrap();
    assert_eq!(snapshot.subscription_type.as_str(), "standard");
    assert_eq!(snapshot.project, 1);
    assert_eq!(snapshot.scope, 1);
    assert_eq!(snapshot.scenario, 1);
    assert_eq!(snapshot.session, 1);
    assert_eq!(snapshot.test, 0);
}
