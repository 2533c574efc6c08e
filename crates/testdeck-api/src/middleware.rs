// testdeck-api/src/middleware.rs
// ============================================================================
// Module: Authorization Middleware
// Description: Per-request authorization decision and enforcement.
// Purpose: Gate every route behind identity resolution and ACL evaluation.
// Dependencies: testdeck-core, axum
// ============================================================================

//! ## Overview
//! Every inbound request runs the same decision sequence: resolve the
//! bearer credential to an identity (failures degrade to anonymous, never a
//! hard stop), classify the route, and for object-addressed methods evaluate
//! the ACL entry. Public routes pass regardless of resolution outcome; a
//! private route without identity is unauthorized; ADMIN bypasses ACL
//! evaluation entirely. ACL evaluation happens first and only then may the
//! exempt-prefix list suppress a forbidden verdict. The decision core is a
//! plain async function so the whole matrix is testable without HTTP
//! plumbing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::extract::RawPathParams;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::json;
use testdeck_core::AccessVerdict;
use testdeck_core::ObjectId;
use testdeck_core::RequestMethod;
use testdeck_core::Role;
use testdeck_core::RouteClass;
use testdeck_core::acceptable_levels;
use testdeck_core::apply_exemption;
use testdeck_core::classify_route;
use testdeck_core::evaluate_access;
use testdeck_core::extract_credential;

use crate::audit::RequestAuditEvent;
use crate::auth::CurrentUser;
use crate::server::AppState;

// ============================================================================
// SECTION: Decision Types
// ============================================================================

/// Inputs to one authorization decision.
#[derive(Debug, Clone, Copy)]
pub struct AuthzRequest<'a> {
    /// HTTP method name.
    pub method: &'a str,
    /// Request path.
    pub path: &'a str,
    /// Value of the `id` path parameter, when the route carries one.
    pub object_id: Option<&'a str>,
    /// Raw `Authorization` header value.
    pub auth_header: Option<&'a str>,
}

/// Outcome of one authorization decision.
#[derive(Debug)]
pub enum AuthzOutcome {
    /// Proceed to the handler, with the identity when one resolved.
    Pass {
        /// Resolved identity to attach to the request, if any.
        identity: Option<CurrentUser>,
    },
    /// Short-circuit with a status; the handler never runs.
    Deny {
        /// Response status.
        status: StatusCode,
        /// Response error label.
        message: &'static str,
        /// Audit reason label.
        reason: String,
    },
}

// ============================================================================
// SECTION: Decision Core
// ============================================================================

/// Runs the authorization state machine for one request.
pub async fn authorize_request(state: &AppState, request: AuthzRequest<'_>) -> AuthzOutcome {
    // Identity resolution never hard-stops here; failures surface later,
    // and only on private routes.
    let mut resolution_failure: Option<String> = None;
    let identity = match extract_credential(request.auth_header) {
        None => None,
        Some(raw) => match state.authenticator.resolve(raw).await {
            Ok(current) => Some(current),
            Err(err) => {
                resolution_failure = Some(err.to_string());
                None
            }
        },
    };

    if classify_route(request.path, &state.routes.public_prefixes) == RouteClass::Public {
        // Credential errors never surface on public routes; an identity is
        // attached when one resolved.
        return AuthzOutcome::Pass {
            identity,
        };
    }

    let Some(identity) = identity else {
        return AuthzOutcome::Deny {
            status: StatusCode::UNAUTHORIZED,
            message: "unauthorized",
            reason: resolution_failure.unwrap_or_else(|| "no credential".to_string()),
        };
    };

    if identity.user.role == Role::Admin {
        return AuthzOutcome::Pass {
            identity: Some(identity),
        };
    }

    let method = RequestMethod::from_name(request.method);
    if let (Some(object_id), Some(_)) = (request.object_id, acceptable_levels(method)) {
        let object_id = ObjectId::from(object_id);
        let entry = match state.acl.lookup(&object_id, &identity.user.id) {
            Ok(entry) => entry,
            Err(err) => {
                return AuthzOutcome::Deny {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "internal-error",
                    reason: err.to_string(),
                };
            }
        };
        let verdict = evaluate_access(method, entry.as_ref());
        let verdict = apply_exemption(verdict, request.path, &state.routes.acl_exempt_prefixes);
        if verdict == AccessVerdict::Forbidden {
            return AuthzOutcome::Deny {
                status: StatusCode::FORBIDDEN,
                message: "forbidden",
                reason: "insufficient access level".to_string(),
            };
        }
    }

    AuthzOutcome::Pass {
        identity: Some(identity),
    }
}

// ============================================================================
// SECTION: Axum Middleware
// ============================================================================

/// Axum middleware wrapping [`authorize_request`].
pub async fn authorize(
    State(state): State<AppState>,
    params: RawPathParams,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let object_id = params
        .iter()
        .find(|(name, _)| *name == "id")
        .map(|(_, value)| value.to_string());

    let outcome = authorize_request(
        &state,
        AuthzRequest {
            method: &method,
            path: &path,
            object_id: object_id.as_deref(),
            auth_header: auth_header.as_deref(),
        },
    )
    .await;

    match outcome {
        AuthzOutcome::Pass {
            identity,
        } => {
            state.audit.record(&RequestAuditEvent::allowed(
                &method,
                &path,
                identity.as_ref().map(|current| current.user.email_address.clone()),
                identity.as_ref().map(|current| current.user.role.as_str()),
            ));
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        AuthzOutcome::Deny {
            status,
            message,
            reason,
        } => {
            state.audit.record(&RequestAuditEvent::denied(
                &method,
                &path,
                None,
                status.as_u16(),
                reason,
            ));
            (status, Json(json!({ "error": message }))).into_response()
        }
    }
}
