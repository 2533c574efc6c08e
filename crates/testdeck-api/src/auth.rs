// testdeck-api/src/auth.rs
// ============================================================================
// Module: Identity Pipeline
// Description: Credential-to-identity resolution with cache short-circuit.
// Purpose: Resolve each distinct credential through the provider once.
// Dependencies: testdeck-core, async-trait
// ============================================================================

//! ## Overview
//! The authenticator drives the identity pipeline: fingerprint the raw
//! credential, consult the cache, and on a miss verify with the provider,
//! resolve the user directory, and write the cache row. The resolved
//! identity carries the user and its quota snapshot into request extensions.
//!
//! A cached fingerprint short-circuits verification for the lifetime of the
//! row, independent of any expiry embedded in the credential itself;
//! revocation is an explicit cache invalidation, and a revoked credential
//! stays unusable (the next provider login issues fresh credential bytes and
//! therefore a fresh fingerprint).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use testdeck_core::CachedCredential;
use testdeck_core::QuotaSnapshot;
use testdeck_core::User;
use testdeck_core::fingerprint_credential;
use testdeck_core::interfaces::CredentialCache;
use testdeck_core::interfaces::IdentityVerifier;
use testdeck_core::interfaces::QuotaSource;
use testdeck_core::interfaces::StoreError;
use testdeck_core::interfaces::UserDirectory;
use testdeck_core::interfaces::VerifyError;
use thiserror::Error;

use crate::mailer::Mailer;

// ============================================================================
// SECTION: Current User
// ============================================================================

/// Resolved identity attached to allowed requests.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    /// The resolved user record.
    #[serde(flatten)]
    pub user: User,
    /// Per-kind usage snapshot computed at resolution time.
    pub quotas: QuotaSnapshot,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identity resolution errors.
///
/// The middleware collapses every variant into an anonymous outcome; the
/// variant only feeds the audit reason label.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The credential failed verification.
    #[error(transparent)]
    Credential(#[from] VerifyError),
    /// Datastore failure along the pipeline.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A cached credential points at a user row that no longer resolves.
    #[error("no user row for cached credential subject {0}")]
    UnknownUser(String),
}

// ============================================================================
// SECTION: Authenticator
// ============================================================================

/// Drives credential resolution against injected collaborators.
pub struct Authenticator {
    /// External identity verifier.
    verifier: Arc<dyn IdentityVerifier>,
    /// Credential cache store.
    cache: Arc<dyn CredentialCache>,
    /// User directory store.
    directory: Arc<dyn UserDirectory>,
    /// Quota usage source.
    quotas: Arc<dyn QuotaSource>,
    /// Welcome-mail seam.
    mailer: Arc<dyn Mailer>,
    /// Provider label recorded on cache rows.
    provider_label: String,
}

impl Authenticator {
    /// Builds an authenticator over its collaborators.
    #[must_use]
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        cache: Arc<dyn CredentialCache>,
        directory: Arc<dyn UserDirectory>,
        quotas: Arc<dyn QuotaSource>,
        mailer: Arc<dyn Mailer>,
        provider_label: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            cache,
            directory,
            quotas,
            mailer,
            provider_label: provider_label.into(),
        }
    }

    /// Resolves a raw bearer credential into the current user.
    ///
    /// The provider is consulted only on a cache miss; the write-back makes
    /// the second resolution of the same credential a pure cache read.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when verification or any store step fails.
    pub async fn resolve(&self, raw_credential: &str) -> Result<CurrentUser, AuthError> {
        if raw_credential.is_empty() {
            return Err(VerifyError::InvalidCredential("empty credential".to_string()).into());
        }
        let fingerprint = fingerprint_credential(raw_credential);
        let user = if let Some(cached) = self.cache.lookup(&fingerprint)? {
            self.directory
                .find_by_email(&cached.email_address)?
                .ok_or_else(|| AuthError::UnknownUser(cached.email_address.clone()))?
        } else {
            let verified = self.verifier.verify(raw_credential).await?;
            let user = self.directory.resolve_or_create(&verified.email_address)?;
            // Best effort; a mail failure must not block resolution.
            self.mailer.send(
                &[user.email_address.clone()],
                "Thank you for signing up.",
                "Thank you for signing up at Testdeck.",
            );
            self.cache.store(&CachedCredential {
                fingerprint,
                user_id: user.id.clone(),
                email_address: user.email_address.clone(),
                provider: self.provider_label.clone(),
            })?;
            user
        };
        let quotas = self.quotas.usage(&user.id)?;
        Ok(CurrentUser {
            user,
            quotas,
        })
    }
}
