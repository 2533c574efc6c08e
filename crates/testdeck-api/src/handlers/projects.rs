// testdeck-api/src/handlers/projects.rs
// ============================================================================
// Module: Project Handlers
// Description: Project CRUD, invitations, and collaborator management.
// Purpose: Establish ownership at creation and membership via invitations.
// Dependencies: testdeck-core, axum
// ============================================================================

//! ## Overview
//! Project creation runs the quota gate and grants the creator OWNER.
//! Invitations are public-route views of a project by invite code; accepting
//! one grants the caller MODIFY. Revocation deletes the collaborator's
//! project ACL row.

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
use serde_json::Value;
use testdeck_core::AccessLevel;
use testdeck_core::AclEntry;
use testdeck_core::CreationSubject;
use testdeck_core::ObjectKind;
use testdeck_core::Project;
use testdeck_core::ResourceKind;

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
// SECTION: Project CRUD
// ============================================================================

/// Lists projects the caller holds access on.
pub async fn list(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    Query(params): Query<ListParams>,
) -> ApiResponse {
    let Some(Extension(current)) = identity else {
        return unauthorized();
    };
    let (start, count) = params.window();
    match state.store.list_projects(start, count, &current.user.id) {
        Ok(projects) => json_response(StatusCode::OK, &projects),
        Err(_) => internal_error(),
    }
}

/// Creates a project and grants the creator OWNER.
pub async fn create(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    body: Result<Json<Project>, JsonRejection>,
) -> ApiResponse {
    let Some(Extension(current)) = identity else {
        return unauthorized();
    };
    let Ok(Json(payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    let subject = CreationSubject::User(current.user.id.clone());
    if let Err(rejection) = quota_gate(&state, ResourceKind::Project, &subject) {
        return rejection;
    }
    let Ok(project) = state.store.create_project(&payload.name, &payload.description) else {
        return internal_error();
    };
    let Some(project_id) = project.id.clone() else {
        return internal_error();
    };
    let grant = AclEntry::new(
        project_id,
        ObjectKind::Project,
        current.user.id.clone(),
        AccessLevel::Owner,
    );
    if state.acl.grant(&grant).is_err() {
        return internal_error();
    }
    json_response(StatusCode::CREATED, &project)
}

/// Fetches a project by id.
pub async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.get_project(&id) {
        Ok(Some(project)) => json_response(StatusCode::OK, &project),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "item-not-found"),
        Err(_) => internal_error(),
    }
}

/// Updates a project's name and description.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Project>, JsonRejection>,
) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let Ok(Json(mut payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    if state.store.update_project(&id, &payload.name, &payload.description).is_err() {
        return internal_error();
    }
    payload.id = Some(id);
    json_response(StatusCode::OK, &payload)
}

/// Soft-deletes a project and its children.
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.delete_project(&id) {
        Ok(()) => success_body(),
        Err(_) => internal_error(),
    }
}

// ============================================================================
// SECTION: Invitations
// ============================================================================

/// Fetches the invitation view of a project by invite code.
///
/// The route is public; when the request carried a resolved identity the
/// view is enriched with that caller's current access level.
pub async fn fetch_invitation(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> ApiResponse {
    let code = match parse_object_id(&id) {
        Ok(code) => code,
        Err(rejection) => return rejection,
    };
    let mut invitation = match state.store.invitation_by_code(code.as_str()) {
        Ok(Some(invitation)) => invitation,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "item-not-found"),
        Err(_) => return internal_error(),
    };
    if let Some(Extension(current)) = identity {
        match state.acl.lookup(&invitation.id, &current.user.id) {
            Ok(entry) => invitation.access = entry.map(|entry| entry.access),
            Err(_) => return internal_error(),
        }
    }
    json_response(StatusCode::OK, &invitation)
}

/// Accepts an invitation, granting the caller MODIFY on the project.
pub async fn accept_invitation(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> ApiResponse {
    let code = match parse_object_id(&id) {
        Ok(code) => code,
        Err(rejection) => return rejection,
    };
    let Some(Extension(current)) = identity else {
        return unauthorized();
    };
    let invitation = match state.store.invitation_by_code(code.as_str()) {
        Ok(Some(invitation)) => invitation,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "item-not-found"),
        Err(_) => return internal_error(),
    };
    let grant = AclEntry::new(
        invitation.id.clone(),
        ObjectKind::Project,
        current.user.id.clone(),
        AccessLevel::Modify,
    );
    if state.acl.grant(&grant).is_err() {
        return internal_error();
    }
    json_response(StatusCode::OK, &invitation)
}

// ============================================================================
// SECTION: Collaborators
// ============================================================================

/// Lists collaborators on a project.
pub async fn collaborators(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.acl.collaborators(&id) {
        Ok(rows) => json_response(StatusCode::OK, &serde_json::json!({ "data": rows })),
        Err(_) => internal_error(),
    }
}

/// Revokes a collaborator's project access.
pub async fn revoke_collaborator(
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(String, String)>,
) -> ApiResponse {
    let project_id = match parse_object_id(&project_id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let user_id = match parse_object_id(&user_id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let revoked = state.acl.revoke(
        &project_id,
        ObjectKind::Project,
        &testdeck_core::UserId::from(user_id.as_str()),
    );
    match revoked {
        Ok(()) => (StatusCode::OK, Json(Value::Null)),
        Err(_) => internal_error(),
    }
}
