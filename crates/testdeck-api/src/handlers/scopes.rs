// testdeck-api/src/handlers/scopes.rs
// ============================================================================
// Module: Scope Handlers
// Description: Scope CRUD and the project-scoped listing.
// Purpose: Group scenarios under scopes with quota-gated creation.
// Dependencies: testdeck-core, axum
// ============================================================================

//! ## Overview
//! The scope listing addresses a project through a query parameter rather
//! than an `id` path parameter, so the middleware does not evaluate the ACL
//! for it; the handler checks the caller's project access explicitly, the
//! one place outside the middleware that consults the ACL directly.

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
use testdeck_core::Scope;

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
// SECTION: Listing
// ============================================================================

/// Lists a project's scopes with their scenarios attached.
pub async fn list(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    Query(params): Query<ListParams>,
) -> ApiResponse {
    let Some(Extension(current)) = identity else {
        return unauthorized();
    };
    let Some(project_id) = params.project_id.as_deref() else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-id");
    };
    let project_id = ObjectId::from(project_id);
    // The project is addressed by query parameter, so the middleware did not
    // evaluate the ACL; missing access is forbidden here, same as there.
    match state.acl.lookup(&project_id, &current.user.id) {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::FORBIDDEN, "forbidden"),
        Err(_) => return internal_error(),
    }
    let (start, count) = params.window();
    let mut scopes = match state.store.list_scopes(start, count, &project_id) {
        Ok(scopes) => scopes,
        Err(_) => return internal_error(),
    };
    let scenarios = match state.store.list_scenarios(0, 100_000, &project_id) {
        Ok(scenarios) => scenarios,
        Err(_) => return internal_error(),
    };
    for scenario in scenarios {
        let position = scopes
            .iter()
            .position(|scope| scope.id.is_some() && scope.id == scenario.scope_id);
        if let Some(index) = position {
            scopes[index].scenarios.push(scenario);
        } else if let Some(scope_id) = scenario.scope_id.clone() {
            // A scenario whose scope fell outside the page window still
            // surfaces, attached to a freshly fetched scope row.
            match state.store.get_scope(&scope_id) {
                Ok(Some(mut scope)) => {
                    scope.scenarios.push(scenario);
                    scopes.push(scope);
                }
                Ok(None) => {}
                Err(_) => return internal_error(),
            }
        }
    }
    json_response(StatusCode::OK, &scopes)
}

// ============================================================================
// SECTION: CRUD
// ============================================================================

/// Creates a scope and grants the creator OWNER.
pub async fn create(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    body: Result<Json<Scope>, JsonRejection>,
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
    if let Err(rejection) = quota_gate(&state, ResourceKind::Scope, &subject) {
        return rejection;
    }
    let Ok(scope) = state.store.create_scope(&project_id, &payload.name) else {
        return internal_error();
    };
    let Some(scope_id) = scope.id.clone() else {
        return internal_error();
    };
    let grant =
        AclEntry::new(scope_id, ObjectKind::Scope, current.user.id.clone(), AccessLevel::Owner);
    if state.acl.grant(&grant).is_err() {
        return internal_error();
    }
    json_response(StatusCode::CREATED, &scope)
}

/// Fetches a scope by id.
pub async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.get_scope(&id) {
        Ok(Some(scope)) => json_response(StatusCode::OK, &scope),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "item-not-found"),
        Err(_) => internal_error(),
    }
}

/// Renames a scope.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Scope>, JsonRejection>,
) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let Ok(Json(mut payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    if state.store.update_scope(&id, &payload.name).is_err() {
        return internal_error();
    }
    payload.id = Some(id);
    json_response(StatusCode::OK, &payload)
}

/// Soft-deletes a scope and its scenarios.
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.delete_scope(&id) {
        Ok(()) => success_body(),
        Err(_) => internal_error(),
    }
}
