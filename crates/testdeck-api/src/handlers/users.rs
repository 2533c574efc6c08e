// testdeck-api/src/handlers/users.rs
// ============================================================================
// Module: User Handlers
// Description: User CRUD and the current-identity endpoint.
// Purpose: Manage profiles; ownership of a user object covers the user
//          itself and, for delegated creation, the creator.
// Dependencies: testdeck-core, axum
// ============================================================================

//! ## Overview
//! A freshly created user owns itself; when another user performed the
//! creation, that creator is granted OWNER too so it can keep managing the
//! profile. The id-less `GET /api/user` returns the caller's resolved
//! identity with its quota snapshot.

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
use serde::Deserialize;
use testdeck_core::AccessLevel;
use testdeck_core::AclEntry;
use testdeck_core::ObjectKind;
use testdeck_core::UserId;
use testdeck_core::interfaces::UserDirectory;

use crate::auth::CurrentUser;
use crate::server::AppState;

use super::ApiResponse;
use super::ListParams;
use super::error_response;
use super::internal_error;
use super::json_response;
use super::parse_object_id;
use super::success_body;
use super::unauthorized;

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Profile fields accepted on user creation and update.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserPayload {
    /// Display name.
    #[serde(default)]
    full_name: String,
    /// Short handle.
    #[serde(default)]
    user_name: String,
    /// Email address.
    #[serde(default)]
    email_address: String,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Lists users with paging.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResponse {
    let (start, count) = params.window();
    match state.store.list_users(start, count) {
        Ok(users) => json_response(StatusCode::OK, &users),
        Err(_) => internal_error(),
    }
}

/// Returns the caller's resolved identity and quota snapshot.
pub async fn current(identity: Option<Extension<CurrentUser>>) -> ApiResponse {
    identity.map_or_else(unauthorized, |Extension(current)| {
        json_response(StatusCode::OK, &current)
    })
}

/// Creates a user and establishes ownership grants.
pub async fn create(
    State(state): State<AppState>,
    identity: Option<Extension<CurrentUser>>,
    body: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResponse {
    let Some(Extension(current)) = identity else {
        return unauthorized();
    };
    let Ok(Json(payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    let created =
        state.store.create_user(&payload.full_name, &payload.user_name, &payload.email_address);
    let Ok(user) = created else {
        return internal_error();
    };
    // The user owns itself.
    let self_grant = AclEntry::new(
        user.id.as_str(),
        ObjectKind::User,
        user.id.clone(),
        AccessLevel::Owner,
    );
    if state.acl.grant(&self_grant).is_err() {
        return internal_error();
    }
    // Delegated creation: the creator keeps OWNER as well.
    if user.id != current.user.id {
        let creator_grant = AclEntry::new(
            user.id.as_str(),
            ObjectKind::User,
            current.user.id.clone(),
            AccessLevel::Owner,
        );
        if state.acl.grant(&creator_grant).is_err() {
            return internal_error();
        }
    }
    json_response(StatusCode::CREATED, &user)
}

/// Fetches a user by id.
pub async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.find_by_id(&UserId::from(id.as_str())) {
        Ok(Some(user)) => json_response(StatusCode::OK, &user),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "item-not-found"),
        Err(_) => internal_error(),
    }
}

/// Updates a user's profile fields.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let Ok(Json(payload)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "invalid-payload");
    };
    let user_id = UserId::from(id.as_str());
    let updated = state.store.update_user(
        &user_id,
        &payload.full_name,
        &payload.user_name,
        &payload.email_address,
    );
    if updated.is_err() {
        return internal_error();
    }
    match state.store.find_by_id(&user_id) {
        Ok(Some(user)) => json_response(StatusCode::OK, &user),
        _ => internal_error(),
    }
}

/// Soft-deletes a user.
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let id = match parse_object_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match state.store.delete_user(&UserId::from(id.as_str())) {
        Ok(()) => success_body(),
        Err(_) => internal_error(),
    }
}
