// testdeck-store-sqlite/tests/domain.rs
// ============================================================================
// Module: Domain Persistence Tests
// Description: CRUD and cascade behavior for domain entities.
// Purpose: Validate soft-delete cascades and the test-run workflow queries.
// Dependencies: testdeck-store-sqlite, testdeck-core, tempfile
// ============================================================================

//! Domain entity persistence tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use testdeck_core::ObjectId;
use testdeck_core::Step;
use testdeck_core::interfaces::UserDirectory;
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

fn sample_steps() -> Vec<Step> {
    vec![Step {
        step: "open the page".to_string(),
        expectation: "page renders".to_string(),
        passed: false,
    }]
}

#[test]
fn project_round_trips_with_invite_code() {
    let (store, _dir) = open_store();
    let created = store.create_project("alpha", "first project").unwrap();
    let id = created.id.clone().unwrap();
    let found = store.get_project(&id).unwrap().unwrap();
    assert_eq!(found.name, "alpha");
    assert_eq!(found.description, "first project");
    assert!(found.invite_code.is_some());
    let invitation =
        store.invitation_by_code(found.invite_code.as_deref().unwrap()).unwrap().unwrap();
    assert_eq!(invitation.id, id);
}

#[test]
fn unknown_invite_code_misses() {
    let (store, _dir) = open_store();
    assert!(store.invitation_by_code("no-such-code").unwrap().is_none());
}

#[test]
fn project_delete_cascades_to_scopes_and_scenarios() {
    let (store, _dir) = open_store();
    let project = store.create_project("alpha", "").unwrap();
    let project_id = project.id.unwrap();
    let scope = store.create_scope(&project_id, "ui").unwrap();
    let scope_id = scope.id.unwrap();
    let scenario =
        store.create_scenario(&project_id, &scope_id, "login", &sample_steps()).unwrap();
    store.delete_project(&project_id).unwrap();
    assert!(store.get_project(&project_id).unwrap().is_none());
    assert!(store.get_scope(&scope_id).unwrap().is_none());
    assert!(store.get_scenario(scenario.id.as_ref().unwrap()).unwrap().is_none());
}

#[test]
fn scope_delete_cascades_to_scenarios() {
    let (store, _dir) = open_store();
    let project = store.create_project("alpha", "").unwrap();
    let project_id = project.id.unwrap();
    let scope = store.create_scope(&project_id, "ui").unwrap();
    let scope_id = scope.id.unwrap();
    let scenario =
        store.create_scenario(&project_id, &scope_id, "login", &sample_steps()).unwrap();
    store.delete_scope(&scope_id).unwrap();
    assert!(store.get_scope(&scope_id).unwrap().is_none());
    assert!(store.get_scenario(scenario.id.as_ref().unwrap()).unwrap().is_none());
}

#[test]
fn scenario_steps_round_trip() {
    let (store, _dir) = open_store();
    let project = store.create_project("alpha", "").unwrap();
    let project_id = project.id.unwrap();
    let scope = store.create_scope(&project_id, "ui").unwrap();
    let created = store
        .create_scenario(&project_id, scope.id.as_ref().unwrap(), "login", &sample_steps())
        .unwrap();
    let found = store.get_scenario(created.id.as_ref().unwrap()).unwrap().unwrap();
    assert_eq!(found.steps, sample_steps());
}

#[test]
fn session_membership_round_trips() {
    let (store, _dir) = open_store();
    let author = store.resolve_or_create("author@example.com").unwrap();
    let project = store.create_project("alpha", "").unwrap();
    let project_id = project.id.unwrap();
    let member_ids = vec![ObjectId::from("scenario-1"), ObjectId::from("scenario-2")];
    let session = store
        .create_session(&project_id, &author.id, "1.0", "nightly", &member_ids)
        .unwrap();
    let found = store.get_session(session.id.as_ref().unwrap()).unwrap().unwrap();
    assert_eq!(found.scenario_ids, member_ids);
    assert_eq!(found.version, "1.0");
    assert_eq!(found.status, 0);
}

#[test]
fn failed_sessions_are_hidden_from_listing() {
    let (store, _dir) = open_store();
    let author = store.resolve_or_create("author@example.com").unwrap();
    let project = store.create_project("alpha", "").unwrap();
    let project_id = project.id.unwrap();
    let session = store.create_session(&project_id, &author.id, "1.0", "", &[]).unwrap();
    let session_id = session.id.unwrap();
    store.update_session(&session_id, "1.0", "", 3, &[]).unwrap();
    assert!(store.list_sessions(0, 10, &project_id).unwrap().is_empty());
}

#[test]
fn test_run_workflow_queries_see_active_runs_only() {
    let (store, _dir) = open_store();
    let tester = store.resolve_or_create("tester@example.com").unwrap();
    let other = store.resolve_or_create("other@example.com").unwrap();
    let session_id = ObjectId::from("session-1");
    let scenario_id = ObjectId::from("scenario-1");
    store.create_test(&session_id, &other.id, &scenario_id, &sample_steps(), 1).unwrap();

    let held = store
        .active_test_by_other(&session_id, &scenario_id, &tester.id)
        .unwrap()
        .unwrap();
    assert_eq!(held.assignee_id.as_ref().unwrap(), &other.id);
    assert_eq!(held.assignee_name.as_deref(), Some("other@example.com"));

    assert!(
        store
            .active_test_by_assignee(&session_id, &scenario_id, &tester.id)
            .unwrap()
            .is_none()
    );
}

#[test]
fn create_test_retires_the_previous_run() {
    let (store, _dir) = open_store();
    let tester = store.resolve_or_create("tester@example.com").unwrap();
    let session_id = ObjectId::from("session-1");
    let scenario_id = ObjectId::from("scenario-1");
    let first =
        store.create_test(&session_id, &tester.id, &scenario_id, &sample_steps(), 1).unwrap();
    let second =
        store.create_test(&session_id, &tester.id, &scenario_id, &sample_steps(), 1).unwrap();
    assert_ne!(first, second);
    let active = store
        .active_test_by_assignee(&session_id, &scenario_id, &tester.id)
        .unwrap()
        .unwrap();
    assert_eq!(active.id.as_ref().unwrap(), &second);
    assert_eq!(store.list_tests(0, 10, &session_id).unwrap().len(), 1);
}

#[test]
fn reset_session_retires_every_test() {
    let (store, _dir) = open_store();
    let tester = store.resolve_or_create("tester@example.com").unwrap();
    let session_id = ObjectId::from("session-1");
    store
        .create_test(&session_id, &tester.id, &ObjectId::from("scenario-1"), &[], 1)
        .unwrap();
    store
        .create_test(&session_id, &tester.id, &ObjectId::from("scenario-2"), &[], 1)
        .unwrap();
    store.reset_session(&session_id).unwrap();
    assert!(store.list_tests(0, 10, &session_id).unwrap().is_empty());
}

#[test]
fn update_test_persists_assists_and_notes() {
    let (store, _dir) = open_store();
    let tester = store.resolve_or_create("tester@example.com").unwrap();
    let helper = store.resolve_or_create("helper@example.com").unwrap();
    let session_id = ObjectId::from("session-1");
    let id = store
        .create_test(&session_id, &tester.id, &ObjectId::from("scenario-1"), &[], 1)
        .unwrap();
    let mut steps = sample_steps();
    steps[0].passed = true;
    store.update_test(&id, &steps, 2, "looks good", &[helper.id.clone()]).unwrap();
    let found = store.get_test(&id).unwrap().unwrap();
    assert_eq!(found.status, 2);
    assert_eq!(found.notes, "looks good");
    assert_eq!(found.assist_ids, vec![helper.id]);
    assert!(found.steps[0].passed);
}
