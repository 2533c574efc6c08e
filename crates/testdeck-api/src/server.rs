// testdeck-api/src/server.rs
// ============================================================================
// Module: API Server
// Description: Application state, router assembly, and the serve loop.
// Purpose: Wire stores, verifier, and middleware into the HTTP application.
// Dependencies: testdeck-core, testdeck-config, testdeck-store-sqlite, axum
// ============================================================================

//! ## Overview
//! The application state is an explicit dependency-injected context: every
//! component receives its collaborators at construction and nothing lives in
//! process-wide singletons. The router attaches the authorization middleware
//! as a route layer so path parameters are resolved before the decision
//! runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use testdeck_config::FeatureConfig;
use testdeck_config::RouteConfig;
use testdeck_config::TestdeckConfig;
use testdeck_core::interfaces::AccessControlStore;
use testdeck_core::interfaces::IdentityVerifier;
use testdeck_core::interfaces::QuotaSource;
use testdeck_core::interfaces::VerifyError;
use testdeck_store_sqlite::SqliteStore;
use testdeck_store_sqlite::SqliteStoreError;
use thiserror::Error;

use crate::audit::AuditSink;
use crate::audit::StderrAuditSink;
use crate::auth::Authenticator;
use crate::handlers;
use crate::mailer::Mailer;
use crate::mailer::NoopMailer;
use crate::middleware::authorize;
use crate::verifier::HttpIdentityVerifier;

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Domain persistence store.
    pub store: SqliteStore,
    /// Identity-resolution pipeline.
    pub authenticator: Arc<Authenticator>,
    /// Access-control store used by the middleware and handlers.
    pub acl: Arc<dyn AccessControlStore>,
    /// Quota aggregation source used by creation handlers.
    pub quotas: Arc<dyn QuotaSource>,
    /// Route-classification prefix lists.
    pub routes: RouteConfig,
    /// Feature gates.
    pub features: FeatureConfig,
    /// Audit sink for authorization decisions.
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    /// Builds application state over a store and injected collaborators.
    #[must_use]
    pub fn new(
        store: SqliteStore,
        verifier: Arc<dyn IdentityVerifier>,
        mailer: Arc<dyn Mailer>,
        audit: Arc<dyn AuditSink>,
        routes: RouteConfig,
        features: FeatureConfig,
        provider_label: impl Into<String>,
    ) -> Self {
        let shared = Arc::new(store.clone());
        let authenticator = Arc::new(Authenticator::new(
            verifier,
            shared.clone(),
            shared.clone(),
            shared.clone(),
            mailer,
            provider_label,
        ));
        Self {
            store,
            authenticator,
            acl: shared.clone(),
            quotas: shared,
            routes,
            features,
            audit,
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Assembles the application router with the authorization middleware.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        // Projects
        .route("/api/projects", get(handlers::projects::list))
        .route("/api/project", post(handlers::projects::create))
        .route(
            "/api/project/{id}",
            get(handlers::projects::fetch)
                .put(handlers::projects::update)
                .delete(handlers::projects::remove),
        )
        .route(
            "/api/invite/{id}",
            get(handlers::projects::fetch_invitation).put(handlers::projects::accept_invitation),
        )
        .route("/api/collaborators/{id}", get(handlers::projects::collaborators))
        .route(
            "/api/revoke/{project_id}/{user_id}",
            put(handlers::projects::revoke_collaborator),
        )
        // Scopes
        .route("/api/scopes", get(handlers::scopes::list))
        .route("/api/scope", post(handlers::scopes::create))
        .route(
            "/api/scope/{id}",
            get(handlers::scopes::fetch)
                .put(handlers::scopes::update)
                .delete(handlers::scopes::remove),
        )
        // Scenarios
        .route("/api/scenarios", get(handlers::scenarios::list))
        .route("/api/scenario", post(handlers::scenarios::create))
        .route(
            "/api/scenario/{id}",
            get(handlers::scenarios::fetch)
                .put(handlers::scenarios::update)
                .delete(handlers::scenarios::remove),
        )
        // Sessions and test runs
        .route("/api/sessions", get(handlers::sessions::list))
        .route("/api/session", post(handlers::sessions::create))
        .route(
            "/api/session/{id}",
            get(handlers::sessions::fetch)
                .put(handlers::sessions::update)
                .delete(handlers::sessions::remove),
        )
        .route("/api/reset-session/{id}", put(handlers::sessions::reset))
        .route("/api/test", post(handlers::sessions::create_test))
        .route(
            "/api/test/{id}",
            put(handlers::sessions::update_test).delete(handlers::sessions::remove_test),
        )
        // Users
        .route("/api/users", get(handlers::users::list))
        .route("/api/user", post(handlers::users::create).get(handlers::users::current))
        .route(
            "/api/user/{id}",
            get(handlers::users::fetch)
                .put(handlers::users::update)
                .delete(handlers::users::remove),
        )
        .route_layer(from_fn_with_state(state.clone(), authorize))
        .with_state(state)
}

// ============================================================================
// SECTION: Serve
// ============================================================================

/// Server bootstrap errors.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Store could not be opened.
    #[error("store error: {0}")]
    Store(#[from] SqliteStoreError),
    /// Identity verifier could not be constructed.
    #[error("verifier error: {0}")]
    Verifier(#[from] VerifyError),
    /// Listener or connection I/O failure.
    #[error("io error: {0}")]
    Io(String),
}

/// Runs the HTTP service until the listener fails.
///
/// # Errors
///
/// Returns [`ServeError`] when bootstrap or the listener fails.
pub async fn serve(config: TestdeckConfig) -> Result<(), ServeError> {
    let store = SqliteStore::open(&config.database)?;
    let verifier = Arc::new(HttpIdentityVerifier::from_config(&config.identity)?);
    let state = AppState::new(
        store,
        verifier,
        Arc::new(NoopMailer),
        Arc::new(StderrAuditSink),
        config.routes.clone(),
        config.features.clone(),
        config.identity.provider_label.clone(),
    );
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .map_err(|err| ServeError::Io(err.to_string()))?;
    axum::serve(listener, router).await.map_err(|err| ServeError::Io(err.to_string()))
}
