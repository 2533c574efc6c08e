// testdeck-api/src/lib.rs
// ============================================================================
// Module: Testdeck API Library
// Description: HTTP service surface for the Testdeck service.
// Purpose: Wire the authorization pipeline into an axum application.
// Dependencies: testdeck-core, testdeck-config, testdeck-store-sqlite, axum
// ============================================================================

//! ## Overview
//! The API crate hosts the per-request authorization middleware, the
//! identity-resolution pipeline, the HTTP identity-provider verifier, audit
//! sinks, and the thin CRUD handlers. Every inbound request passes through
//! the middleware before any handler runs; allowed requests carry the
//! resolved identity in request extensions.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod server;
pub mod verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::StderrAuditSink;
pub use auth::AuthError;
pub use auth::Authenticator;
pub use auth::CurrentUser;
pub use mailer::Mailer;
pub use mailer::NoopMailer;
pub use middleware::AuthzOutcome;
pub use middleware::AuthzRequest;
pub use middleware::authorize_request;
pub use server::AppState;
pub use server::ServeError;
pub use server::build_router;
pub use server::serve;
pub use verifier::HttpIdentityVerifier;
