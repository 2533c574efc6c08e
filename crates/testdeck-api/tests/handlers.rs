// testdeck-api/tests/handlers.rs
// ============================================================================
// Module: Handler Tests
// Description: Creation-site quota gates and ownership grants.
// Purpose: Pin quota rejections, OWNER grants, and the invitation flow.
// Dependencies: testdeck-api, testdeck-core, testdeck-store-sqlite, tempfile
// ============================================================================

//! Handler-level tests driven without HTTP plumbing.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Extension;
use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use testdeck_api::AppState;
use testdeck_api::CurrentUser;
use testdeck_api::NoopAuditSink;
use testdeck_api::NoopMailer;
use testdeck_api::handlers;
use testdeck_config::FeatureConfig;
use testdeck_config::RouteConfig;
use testdeck_core::AccessLevel;
use testdeck_core::ObjectId;
use testdeck_core::Project;
use testdeck_core::QuotaSnapshot;
use testdeck_core::SubscriptionTier;
use testdeck_core::TestRun;
use testdeck_core::User;
use testdeck_core::VerifiedIdentity;
use testdeck_core::interfaces::AccessControlStore;
use testdeck_core::interfaces::IdentityVerifier;
use testdeck_core::interfaces::UserDirectory;
use testdeck_core::interfaces::VerifyError;
use testdeck_store_sqlite::SqliteStore;
use testdeck_store_sqlite::SqliteStoreConfig;

/// Verifier that rejects everything; handler tests bypass resolution.
struct RejectAllVerifier;

#[async_trait]
impl IdentityVerifier for RejectAllVerifier {
    async fn verify(&self, _raw_credential: &str) -> Result<VerifiedIdentity, VerifyError> {
        Err(VerifyError::InvalidCredential("unused".to_string()))
    }
}

/// Builds state with the content-creation limiter toggled.
fn build_state(limiter: bool) -> (AppState, SqliteStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = SqliteStoreConfig {
        path: dir.path().join("store.db"),
        ..SqliteStoreConfig::default()
    };
    let store = SqliteStore::open(&config).unwrap();
    let state = AppState::new(
        store.clone(),
        Arc::new(RejectAllVerifier),
        Arc::new(NoopMailer),
        Arc::new(NoopAuditSink),
        RouteConfig::default(),
        FeatureConfig {
            content_creation_limiter: limiter,
        },
        "google",
    );
    (state, store, dir)
}

/// Registers a user on a tier and wraps it as the current identity.
fn identity_on_tier(store: &SqliteStore, email: &str, tier: &str) -> CurrentUser {
    let user = store.resolve_or_create(email).unwrap();
    store.set_subscription_tier(&user.id, tier).unwrap();
    let user = User {
        subscription_type: SubscriptionTier::from(tier.to_string()),
        ..user
    };
    CurrentUser {
        quotas: QuotaSnapshot::empty(SubscriptionTier::from(tier.to_string())),
        user,
    }
}

/// Creates one project through the handler, returning the response status
/// and the created id when present.
async fn create_project(
    state: &AppState,
    current: &CurrentUser,
    name: &str,
) -> (StatusCode, Option<String>) {
    let payload = Project {
        name: name.to_string(),
        ..Project::default()
    };
    let (status, Json(body)) = handlers::projects::create(
        State(state.clone()),
        Some(Extension(current.clone())),
        Ok(Json(payload)),
    )
    .await;
    let id = body.get("id").and_then(|value| value.as_str()).map(ToString::to_string);
    (status, id)
}

#[tokio::test]
async fn project_creation_grants_owner() {
    let (state, store, _dir) = build_state(false);
    let current = identity_on_tier(&store, "owner@example.com", "free");
    let (status, id) = create_project(&state, &current, "alpha").await;
    assert_eq!(status, StatusCode::CREATED);
    let entry = store
        .lookup(&ObjectId::from(id.unwrap().as_str()), &current.user.id)
        .unwrap()
        .unwrap();
    assert_eq!(entry.access, AccessLevel::Owner);
}

#[tokio::test]
async fn free_tier_fourth_project_is_rejected() {
    let (state, store, _dir) = build_state(true);
    let current = identity_on_tier(&store, "free@example.com", "free");
    for index in 0..3 {
        let (status, _) = create_project(&state, &current, &format!("p{index}")).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = create_project(&state, &current, "p3").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn standard_tier_boundary_is_ten() {
    let (state, store, _dir) = build_state(true);
    let current = identity_on_tier(&store, "standard@example.com", "standard");
    for index in 0..9 {
        let (status, _) = create_project(&state, &current, &format!("p{index}")).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    // Nine existing: still eligible.
    let (status, _) = create_project(&state, &current, "p9").await;
    assert_eq!(status, StatusCode::CREATED);
    // Ten existing: rejected.
    let (status, _) = create_project(&state, &current, "p10").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn disabled_limiter_never_rejects() {
    let (state, store, _dir) = build_state(false);
    let current = identity_on_tier(&store, "free@example.com", "free");
    for index in 0..5 {
        let (status, _) = create_project(&state, &current, &format!("p{index}")).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn accepting_an_invitation_grants_modify() {
    let (state, store, _dir) = build_state(false);
    let owner = identity_on_tier(&store, "owner@example.com", "free");
    let (_, id) = create_project(&state, &owner, "alpha").await;
    let project = store.get_project(&ObjectId::from(id.unwrap().as_str())).unwrap().unwrap();
    let code = project.invite_code.unwrap();

    let invitee = identity_on_tier(&store, "guest@example.com", "free");
    let (status, _) = handlers::projects::accept_invitation(
        State(state.clone()),
        Some(Extension(invitee.clone())),
        Path(code),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entry = store.lookup(project.id.as_ref().unwrap(), &invitee.user.id).unwrap().unwrap();
    assert_eq!(entry.access, AccessLevel::Modify);
}

#[tokio::test]
async fn test_runs_conflict_across_users() {
    let (state, store, _dir) = build_state(false);
    let first = identity_on_tier(&store, "first@example.com", "free");
    let second = identity_on_tier(&store, "second@example.com", "free");

    let project = store.create_project("alpha", "").unwrap();
    let project_id = project.id.unwrap();
    let scope = store.create_scope(&project_id, "ui").unwrap();
    let scenario = store
        .create_scenario(&project_id, scope.id.as_ref().unwrap(), "login", &[])
        .unwrap();
    let session = store.create_session(&project_id, &first.user.id, "1.0", "", &[]).unwrap();

    let payload = TestRun {
        session_id: session.id.clone(),
        scenario_id: scenario.id.clone(),
        ..TestRun::default()
    };
    let (status, _) = handlers::sessions::create_test(
        State(state.clone()),
        Some(Extension(first.clone())),
        Ok(Json(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // The other user's attempt reports the conflict.
    let (status, _) = handlers::sessions::create_test(
        State(state.clone()),
        Some(Extension(second.clone())),
        Ok(Json(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The first user re-joins its own active run.
    let (status, body) = handlers::sessions::create_test(
        State(state.clone()),
        Some(Extension(first.clone())),
        Ok(Json(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.0.get("id").is_some());
}
