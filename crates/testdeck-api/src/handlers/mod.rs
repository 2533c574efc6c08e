// testdeck-api/src/handlers/mod.rs
// ============================================================================
// Module: HTTP Handlers
// Description: Thin persistence handlers behind the authorization middleware.
// Purpose: Map domain CRUD onto routes with quota gates at creation sites.
// Dependencies: testdeck-core, axum, serde_json
// ============================================================================

//! ## Overview
//! Handlers are thin wrappers over the store. Per-object access was already
//! decided by the middleware; handlers only add the creation-site concerns:
//! the quota gate (when the content-creation limiter is enabled) and the
//! OWNER grant on the freshly created object. Infrastructure failures are an
//! opaque `internal-error` body; details never leak to clients.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod projects;
pub mod scenarios;
pub mod scopes;
pub mod sessions;
pub mod users;

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use testdeck_core::CreationSubject;
use testdeck_core::ObjectId;
use testdeck_core::ResourceKind;
use testdeck_core::is_eligible_to_create;
use uuid::Uuid;

use crate::server::AppState;

// ============================================================================
// SECTION: Response Helpers
// ============================================================================

/// Canonical handler response: a status plus a JSON body.
pub(crate) type ApiResponse = (StatusCode, Json<Value>);

/// Builds an error body in the historical `{"error": …}` envelope.
pub(crate) fn error_response(status: StatusCode, message: &str) -> ApiResponse {
    (status, Json(json!({ "error": message })))
}

/// Opaque infrastructure-failure response.
pub(crate) fn internal_error() -> ApiResponse {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal-error")
}

/// Missing-identity response for handlers that require one.
pub(crate) fn unauthorized() -> ApiResponse {
    error_response(StatusCode::UNAUTHORIZED, "unauthorized")
}

/// Serializes a payload into a JSON response.
pub(crate) fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> ApiResponse {
    serde_json::to_value(payload).map_or_else(|_| internal_error(), |value| (status, Json(value)))
}

/// The historical success body for deletions and resets.
pub(crate) fn success_body() -> ApiResponse {
    (StatusCode::OK, Json(json!({ "result": "success" })))
}

// ============================================================================
// SECTION: Request Helpers
// ============================================================================

/// Common list-window and project-filter query parameters.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    /// Requested page size.
    #[serde(default)]
    pub(crate) count: Option<u32>,
    /// Requested offset.
    #[serde(default)]
    pub(crate) start: Option<u32>,
    /// Project filter for scoped listings.
    #[serde(default, rename = "projectId")]
    pub(crate) project_id: Option<String>,
}

impl ListParams {
    /// Clamps the window to the historical bounds.
    pub(crate) fn window(&self) -> (u32, u32) {
        let count = match self.count {
            Some(count) if (1..=10).contains(&count) => count,
            _ => 10,
        };
        (self.start.unwrap_or(0), count)
    }
}

/// Validates a path id as a UUID and wraps it.
pub(crate) fn parse_object_id(raw: &str) -> Result<ObjectId, ApiResponse> {
    Uuid::parse_str(raw)
        .map(|_| ObjectId::from(raw))
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "invalid-id"))
}

// ============================================================================
// SECTION: Quota Gate
// ============================================================================

/// Per-kind quota rejection message.
const fn quota_message(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Project => "too-many-projects",
        ResourceKind::Scope => "too-many-scopes",
        ResourceKind::Scenario => "too-many-scenarios",
        ResourceKind::Session => "too-many-sessions",
        ResourceKind::Test => "too-many-tests",
    }
}

/// Runs the creation quota gate when the limiter flag is enabled.
///
/// The flag itself belongs to an external collaborator; only its boolean
/// lands here. With the limiter off every creation is eligible.
pub(crate) fn quota_gate(
    state: &AppState,
    kind: ResourceKind,
    subject: &CreationSubject,
) -> Result<(), ApiResponse> {
    if !state.features.content_creation_limiter {
        return Ok(());
    }
    match is_eligible_to_create(state.quotas.as_ref(), kind, subject) {
        Ok(true) => Ok(()),
        Ok(false) => Err(error_response(StatusCode::TOO_MANY_REQUESTS, quota_message(kind))),
        Err(_) => Err(internal_error()),
    }
}

// ============================================================================
// SECTION: Health
// ============================================================================

/// Public liveness probe.
pub async fn health() -> ApiResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
