// testdeck-api/src/handlers/sessions.rs
// ============================================================================
// Module: Session Handlers
// Description: Session CRUD plus the test-run assignment workflow.
// Purpose: Run sessions over scenario sets and track per-scenario tests.
// Dependencies: testdeck-core, axum
// ============================================================================

//! ## Overview
//! Session creation records the session→scenario hierarchy edges in one
//! atomic batch alongside the OWNER grant. The test-run workflow resolves
//! assignment conflicts: another user's active run is a conflict, the
//! caller's own active run is re-joined, and otherwise the previous run is
//! superseded and a fresh one created from the scenario's steps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Extension;
use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Serialize;
use testdeck_core::AccessLevel;
use testdeck_core::AclEntry;
use testdeck_core::CreationSubject;
use testdeck_core::ObjectId;
use testdeck_core::ObjectKind;
use testdeck_core::ResourceKind;
use testdeck_core::Scenario;
use testdeck_core::Session;
use testdeck_core::TestRun;

use crate::auth::CurrentUser;
use crate::server::AppState;

use super::ApiResponse;
use super::ListParams;
use super::error_response;
use super::internal_error;
use super::json_response;
use super::parse_object_id;
use super::quota_gate;
use super::success_body;
use super::unauthorized;

// ============================================================================
// SECTION: Views
// ============================================================================

/// Detail view of a session with its scenarios and test runs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionDetail {
    /// The session record.
    #[serde(flatten)]
    session: Session,
    /// Member scenarios still present in the store.
    scenarios: Vec<Scenario>,
    /// Test runs recorded for the session.
    tests: Vec<TestRun>,
}

// ============================================================================
// SECTION: Session CRUD
// ============================================================================

/// Lists sessions under a project, excluding failed ones.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResponse {
    let Some(project_id) = params.project_id.as_deref() else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-id");
    };
    let (start, count) = params.window();
    match state.store.list_sessions(start, count, &ObjectId::from(project_id)) {
        Ok(sessions) => json_response(StatusCode::OK, &sessions),
        Err(_) => internal_error(),
    }
}

/// Creates a session, linking its scenario hierarchy atomically.
pub async fn create(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    body: Result<Json<Session>, JsonRejection>,
) -> ApiResponse {
    let Some(Extension(current)) = identity else {
        return unauthorized();
    };
    let Ok(Json(payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    let Some(project_id) = payload.project_id.clone() else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    let subject = CreationSubject::Project(project_id.clone());
    if let Err(rejection) = quota_gate(&state, ResourceKind::Session, &subject) {
        return rejection;
    }
    let created = state.store.create_session(
        &project_id,
        &current.user.id,
        &payload.version,
        &payload.description,
        &payload.scenario_ids,
    );
    let Ok(session) = created else {
        return internal_error();
    };
    let Some(session_id) = session.id.clone() else {
        return internal_error();
    };
    if !payload.scenario_ids.is_empty()
        && state.acl.link_hierarchy(&session_id, &payload.scenario_ids).is_err()
    {
        return internal_error();
    }
    let grant = AclEntry::new(
        session_id,
        ObjectKind::Session,
        current.user.id.clone(),
        AccessLevel::Owner,
    );
    if state.acl.grant(&grant).is_err() {
        return internal_error();
    }
    json_response(StatusCode::CREATED, &session)
}

/// Fetches a session with its scenarios and test runs.
pub async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let session = match state.store.get_session(&id) {
        Ok(Some(session)) => session,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "item-not-found"),
        Err(_) => return internal_error(),
    };
    let Ok(scenarios) = state.store.scenarios_by_ids(&session.scenario_ids) else {
        return internal_error();
    };
    let Ok(tests) = state.store.list_tests(0, 1_000, &id) else {
        return internal_error();
    };
    json_response(
        StatusCode::OK,
        &SessionDetail {
            session,
            scenarios,
            tests,
        },
    )
}

/// Updates a session's metadata, status, and membership.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Session>, JsonRejection>,
) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let Ok(Json(mut payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    let updated = state.store.update_session(
        &id,
        &payload.version,
        &payload.description,
        payload.status,
        &payload.scenario_ids,
    );
    if updated.is_err() {
        return internal_error();
    }
    payload.id = Some(id);
    json_response(StatusCode::OK, &payload)
}

/// Soft-deletes a session.
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.delete_session(&id) {
        Ok(()) => success_body(),
        Err(_) => internal_error(),
    }
}

/// Resets a session by retiring all of its test runs.
pub async fn reset(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.reset_session(&id) {
        Ok(()) => success_body(),
        Err(_) => internal_error(),
    }
}

// ============================================================================
// SECTION: Test Runs
// ============================================================================

/// Starts (or re-joins) a test run for a scenario in a session.
pub async fn create_test(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    body: Result<Json<TestRun>, JsonRejection>,
) -> ApiResponse {
    let Some(Extension(current)) = identity else {
        return unauthorized();
    };
    let Ok(Json(payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    let (Some(session_id), Some(scenario_id)) =
        (payload.session_id.clone(), payload.scenario_id.clone())
    else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };

    // Another user's active run wins the scenario; report the conflict.
    match state.store.active_test_by_other(&session_id, &scenario_id, &current.user.id) {
        Ok(Some(held)) => return json_response(StatusCode::CONFLICT, &held),
        Ok(None) => {}
        Err(_) => return internal_error(),
    }
    // The caller's own active run is simply re-joined.
    match state.store.active_test_by_assignee(&session_id, &scenario_id, &current.user.id) {
        Ok(Some(own)) => return json_response(StatusCode::CREATED, &own),
        Ok(None) => {}
        Err(_) => return internal_error(),
    }

    // Fresh run: copy the step checklist from the scenario.
    let scenario = match state.store.get_scenario(&scenario_id) {
        Ok(Some(scenario)) => scenario,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "item-not-found"),
        Err(_) => return internal_error(),
    };
    let created =
        state.store.create_test(&session_id, &current.user.id, &scenario_id, &scenario.steps, 1);
    let Ok(test_id) = created else {
        return internal_error();
    };
    let grant = AclEntry::new(
        test_id.clone(),
        ObjectKind::Test,
        current.user.id.clone(),
        AccessLevel::Owner,
    );
    if state.acl.grant(&grant).is_err() {
        return internal_error();
    }
    match state.store.get_test(&test_id) {
        Ok(Some(test)) => json_response(StatusCode::CREATED, &test),
        _ => internal_error(),
    }
}

/// Updates a test run's steps, status, notes, and assists.
pub async fn update_test(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TestRun>, JsonRejection>,
) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let Ok(Json(mut payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    let updated = state.store.update_test(
        &id,
        &payload.steps,
        payload.status,
        &payload.notes,
        &payload.assist_ids,
    );
    if updated.is_err() {
        return internal_error();
    }
    payload.id = Some(id);
    json_response(StatusCode::OK, &payload)
}

/// Fails and retires a test run.
pub async fn remove_test(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.delete_test(&id) {
        Ok(()) => success_body(),
        Err(_) => internal_error(),
    }
}
