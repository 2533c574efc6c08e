// testdeck-api/src/handlers/scenarios.rs
// ============================================================================
// Module: Scenario Handlers
// Description: Scenario CRUD with quota-gated creation.
// Purpose: Manage scripted scenarios under projects and scopes.
// Dependencies: testdeck-core, axum
// ============================================================================

//! Scenario CRUD; the listing returns scenarios without their step bodies.

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
use testdeck_core::AccessLevel;
use testdeck_core::AclEntry;
use testdeck_core::CreationSubject;
use testdeck_core::ObjectId;
use testdeck_core::ObjectKind;
use testdeck_core::ResourceKind;
use testdeck_core::Scenario;

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
// SECTION: Handlers
// ============================================================================

/// Lists scenarios under a project.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResponse {
    let Some(project_id) = params.project_id.as_deref() else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-id");
    };
    let (start, count) = params.window();
    match state.store.list_scenarios(start, count, &ObjectId::from(project_id)) {
        Ok(scenarios) => json_response(StatusCode::OK, &scenarios),
        Err(_) => internal_error(),
    }
}

/// Creates a scenario and grants the creator OWNER.
pub async fn create(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    body: Result<Json<Scenario>, JsonRejection>,
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
    if let Err(rejection) = quota_gate(&state, ResourceKind::Scenario, &subject) {
        return rejection;
    }
    let scope_id = payload.scope_id.clone().unwrap_or_else(|| ObjectId::from(""));
    let created =
        state.store.create_scenario(&project_id, &scope_id, &payload.name, &payload.steps);
    let Ok(scenario) = created else {
        return internal_error();
    };
    let Some(scenario_id) = scenario.id.clone() else {
        return internal_error();
    };
    let grant = AclEntry::new(
        scenario_id,
        ObjectKind::Scenario,
        current.user.id.clone(),
        AccessLevel::Owner,
    );
    if state.acl.grant(&grant).is_err() {
        return internal_error();
    }
    json_response(StatusCode::CREATED, &scenario)
}

/// Fetches a scenario with its steps.
pub async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.get_scenario(&id) {
        Ok(Some(scenario)) => json_response(StatusCode::OK, &scenario),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "item-not-found"),
        Err(_) => internal_error(),
    }
}

/// Updates a scenario's name, scope, and steps.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Scenario>, JsonRejection>,
) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let Ok(Json(mut payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    let scope_id = payload.scope_id.clone().unwrap_or_else(|| ObjectId::from(""));
    let updated = state.store.update_scenario(&id, &payload.name, &scope_id, &payload.steps);
    if updated.is_err() {
        return internal_error();
    }
    payload.id = Some(id);
    json_response(StatusCode::OK, &payload)
}

/// Soft-deletes a scenario.
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.delete_scenario(&id) {
        Ok(()) => success_body(),
        Err(_) => internal_error(),
    }
}
