// testdeck-api/tests/authorization.rs
// ============================================================================
// Module: Authorization Pipeline Tests
// Description: End-to-end decision tests over a real store and stub verifier.
// Purpose: Pin caching, role bypass, the method matrix, and route leniency.
// Dependencies: testdeck-api, testdeck-core, testdeck-store-sqlite, tempfile
// ============================================================================

//! Authorization state-machine tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use axum::http::StatusCode;
use testdeck_api::AppState;
use testdeck_api::AuthzOutcome;
use testdeck_api::AuthzRequest;
use testdeck_api::NoopAuditSink;
use testdeck_api::NoopMailer;
use testdeck_api::authorize_request;
use testdeck_config::FeatureConfig;
use testdeck_config::RouteConfig;
use testdeck_core::AccessLevel;
use testdeck_core::AclEntry;
use testdeck_core::ObjectKind;
use testdeck_core::VerifiedIdentity;
use testdeck_core::interfaces::AccessControlStore;
use testdeck_core::interfaces::IdentityVerifier;
use testdeck_core::interfaces::UserDirectory;
use testdeck_core::interfaces::VerifyError;
use testdeck_store_sqlite::SqliteStore;
use testdeck_store_sqlite::SqliteStoreConfig;

/// Object id used by the matrix tests.
const OBJECT_ID: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

/// Verifier mapping fixed tokens to emails, counting provider calls.
struct StubVerifier {
    /// Provider invocation count.
    calls: AtomicUsize,
    /// Token-to-email map; unknown tokens are invalid credentials.
    emails: HashMap<String, String>,
}

impl StubVerifier {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            emails: pairs
                .iter()
                .map(|(token, email)| ((*token).to_string(), (*email).to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, raw_credential: &str) -> Result<VerifiedIdentity, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.emails.get(raw_credential).cloned().map_or_else(
            || Err(VerifyError::InvalidCredential("unknown token".to_string())),
            |email| {
                Ok(VerifiedIdentity {
                    email_address: email,
                })
            },
        )
    }
}

/// Builds state over a fresh store and the given verifier.
fn build_state(verifier: Arc<StubVerifier>) -> (AppState, SqliteStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = SqliteStoreConfig {
        path: dir.path().join("store.db"),
        ..SqliteStoreConfig::default()
    };
    let store = SqliteStore::open(&config).unwrap();
    let state = AppState::new(
        store.clone(),
        verifier,
        Arc::new(NoopMailer),
        Arc::new(NoopAuditSink),
        RouteConfig::default(),
        FeatureConfig::default(),
        "google",
    );
    (state, store, dir)
}

/// Runs one decision.
async fn decide(
    state: &AppState,
    method: &str,
    path: &str,
    object_id: Option<&str>,
    auth_header: Option<&str>,
) -> AuthzOutcome {
    authorize_request(
        state,
        AuthzRequest {
            method,
            path,
            object_id,
            auth_header,
        },
    )
    .await
}

/// Asserts a deny outcome with the given status.
fn assert_denied(outcome: &AuthzOutcome, expected: StatusCode) {
    match outcome {
        AuthzOutcome::Deny {
            status, ..
        } => assert_eq!(*status, expected),
        AuthzOutcome::Pass {
            ..
        } => panic!("expected deny with {expected}, got pass"),
    }
}

/// Asserts a pass outcome, returning whether an identity was attached.
fn assert_passed(outcome: &AuthzOutcome) -> bool {
    match outcome {
        AuthzOutcome::Pass {
            identity,
        } => identity.is_some(),
        AuthzOutcome::Deny {
            status, ..
        } => panic!("expected pass, got deny with {status}"),
    }
}

#[tokio::test]
async fn same_credential_is_verified_once() {
    let verifier = Arc::new(StubVerifier::new(&[("tok-1", "tester@example.com")]));
    let (state, _store, _dir) = build_state(verifier.clone());
    let first = state.authenticator.resolve("tok-1").await.unwrap();
    let second = state.authenticator.resolve("tok-1").await.unwrap();
    assert_eq!(first.user.id, second.user.id);
    assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn distinct_credentials_for_one_email_share_the_user() {
    let verifier = Arc::new(StubVerifier::new(&[
        ("tok-1", "tester@example.com"),
        ("tok-2", "tester@example.com"),
    ]));
    let (state, _store, _dir) = build_state(verifier);
    let first = state.authenticator.resolve("tok-1").await.unwrap();
    let second = state.authenticator.resolve("tok-2").await.unwrap();
    assert_eq!(first.user.id, second.user.id);
}

#[tokio::test]
async fn admin_bypasses_acl_for_every_method() {
    let verifier = Arc::new(StubVerifier::new(&[("admin-tok", "admin@example.com")]));
    let (state, store, _dir) = build_state(verifier);
    let admin = store.resolve_or_create("admin@example.com").unwrap();
    store.set_role(&admin.id, "ADMIN").unwrap();
    for method in ["GET", "PUT", "DELETE"] {
        let outcome = decide(
            &state,
            method,
            &format!("/api/project/{OBJECT_ID}"),
            Some(OBJECT_ID),
            Some("Bearer admin-tok"),
        )
        .await;
        assert!(assert_passed(&outcome), "{method} must pass for ADMIN");
    }
}

#[tokio::test]
async fn method_matrix_follows_held_level() {
    let matrix = [
        (AccessLevel::Read, [true, false, false]),
        (AccessLevel::Modify, [true, true, false]),
        (AccessLevel::Owner, [true, true, true]),
    ];
    for (level, allowed) in matrix {
        let verifier = Arc::new(StubVerifier::new(&[("tok-1", "tester@example.com")]));
        let (state, store, _dir) = build_state(verifier);
        let user = store.resolve_or_create("tester@example.com").unwrap();
        store
            .grant(&AclEntry::new(OBJECT_ID, ObjectKind::Project, user.id.clone(), level))
            .unwrap();
        for (method, method_allowed) in ["GET", "PUT", "DELETE"].into_iter().zip(allowed) {
            let outcome = decide(
                &state,
                method,
                &format!("/api/project/{OBJECT_ID}"),
                Some(OBJECT_ID),
                Some("Bearer tok-1"),
            )
            .await;
            if method_allowed {
                assert!(assert_passed(&outcome), "{method} must pass holding {level}");
            } else {
                assert_denied(&outcome, StatusCode::FORBIDDEN);
            }
        }
    }
}

#[tokio::test]
async fn missing_entry_is_forbidden_not_missing() {
    let verifier = Arc::new(StubVerifier::new(&[("tok-1", "tester@example.com")]));
    let (state, _store, _dir) = build_state(verifier);
    for method in ["GET", "PUT", "DELETE"] {
        let outcome = decide(
            &state,
            method,
            &format!("/api/project/{OBJECT_ID}"),
            Some(OBJECT_ID),
            Some("Bearer tok-1"),
        )
        .await;
        assert_denied(&outcome, StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn private_route_without_identity_is_unauthorized() {
    let verifier = Arc::new(StubVerifier::new(&[]));
    let (state, _store, _dir) = build_state(verifier);
    let missing = decide(&state, "GET", "/api/projects", None, None).await;
    assert_denied(&missing, StatusCode::UNAUTHORIZED);
    let invalid = decide(&state, "GET", "/api/projects", None, Some("Bearer bogus")).await;
    assert_denied(&invalid, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_routes_tolerate_credential_failures() {
    let verifier = Arc::new(StubVerifier::new(&[("tok-1", "tester@example.com")]));
    let (state, _store, _dir) = build_state(verifier);
    // No credential at all.
    let anonymous = decide(&state, "GET", "/healthz", None, None).await;
    assert!(!assert_passed(&anonymous));
    // Invalid credential: never surfaces as an error on a public route.
    let invalid = decide(&state, "GET", "/healthz", None, Some("Bearer bogus")).await;
    assert!(!assert_passed(&invalid));
    // A valid credential attaches the identity.
    let identified = decide(&state, "GET", "/healthz", None, Some("Bearer tok-1")).await;
    assert!(assert_passed(&identified));
}

#[tokio::test]
async fn exempt_prefix_suppresses_forbidden_after_acl_evaluation() {
    let verifier = Arc::new(StubVerifier::new(&[("tok-1", "tester@example.com")]));
    let (state, _store, _dir) = build_state(verifier);
    // PUT with an id and no ACL row computes forbidden; but /api/invite is
    // public by default, so force the private path with a custom state.
    let routes = RouteConfig {
        public_prefixes: vec!["/healthz".to_string()],
        ..RouteConfig::default()
    };
    let state = AppState {
        routes,
        ..state
    };
    let outcome = decide(
        &state,
        "PUT",
        &format!("/api/invite/{OBJECT_ID}"),
        Some(OBJECT_ID),
        Some("Bearer tok-1"),
    )
    .await;
    assert!(assert_passed(&outcome), "exempt prefix must suppress the forbidden verdict");
    // The same request outside the exempt list stays forbidden.
    let outside = decide(
        &state,
        "PUT",
        &format!("/api/project/{OBJECT_ID}"),
        Some(OBJECT_ID),
        Some("Bearer tok-1"),
    )
    .await;
    assert_denied(&outside, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn revoked_credential_resolves_anonymous() {
    let verifier = Arc::new(StubVerifier::new(&[("tok-1", "tester@example.com")]));
    let (state, store, _dir) = build_state(verifier);
    state.authenticator.resolve("tok-1").await.unwrap();
    let fingerprint = testdeck_core::fingerprint_credential("tok-1");
    testdeck_core::interfaces::CredentialCache::invalidate(&store, &fingerprint).unwrap();
    let outcome = decide(&state, "GET", "/api/projects", None, Some("Bearer tok-1")).await;
    assert_denied(&outcome, StatusCode::UNAUTHORIZED);
}
