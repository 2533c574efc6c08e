// testdeck-core/src/interfaces/mod.rs
// ============================================================================
// Module: Testdeck Interfaces
// Description: Backend-agnostic interfaces for identity, ACLs, and quotas.
// Purpose: Define the contract surfaces used by the authorization pipeline.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the authorization core integrates with the identity
//! provider and the datastore without embedding backend-specific details.
//! Absence is always `Ok(None)`, a policy input rather than an error, while
//! infrastructure failures surface as explicit error values that callers
//! escalate to the request boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::access::AclEntry;
use crate::core::access::ObjectKind;
use crate::core::domain::Collaborator;
use crate::core::identifiers::CredentialFingerprint;
use crate::core::identifiers::ObjectId;
use crate::core::identifiers::UserId;
use crate::core::identity::CachedCredential;
use crate::core::identity::User;
use crate::core::identity::VerifiedIdentity;
use crate::core::quota::QuotaSnapshot;
use crate::core::quota::ResourceKind;
use crate::core::quota::TierUsage;

// ============================================================================
// SECTION: Identity Verifier
// ============================================================================

/// Identity verification errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The provider rejected the credential (malformed token, expired
    /// signature, unknown issuer).
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    /// The provider could not be reached or failed internally.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// External identity-provider verification.
///
/// Implementations must be pure verification: no caching, no persistence,
/// and no retries; the caller fails the current request and relies on
/// client-level retry.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Validates a raw bearer credential and extracts the verified email.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidCredential`] when the provider rejects
    /// the credential and [`VerifyError::Unavailable`] on transport failure.
    async fn verify(&self, raw_credential: &str) -> Result<VerifiedIdentity, VerifyError>;
}

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Datastore infrastructure errors.
///
/// # Invariants
/// - Messages avoid embedding credential material or payload bodies.
/// - "No row" outcomes are never represented here; they are `Ok(None)` on
///   the querying method.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying database engine error.
    #[error("store db error: {0}")]
    Db(String),
    /// Store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Stored data failed validation on read or write.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Credential Cache
// ============================================================================

/// Keyed store mapping credential fingerprints to resolved identities.
pub trait CredentialCache: Send + Sync {
    /// Looks up a cached credential by fingerprint, excluding revoked rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn lookup(
        &self,
        fingerprint: &CredentialFingerprint,
    ) -> Result<Option<CachedCredential>, StoreError>;

    /// Inserts a freshly resolved credential.
    ///
    /// Duplicate fingerprints are not expected (the key is derived from the
    /// credential content); when one occurs the failure is surfaced rather
    /// than silently overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure, including duplicates.
    fn store(&self, entry: &CachedCredential) -> Result<(), StoreError>;

    /// Revokes a cached credential by fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn invalidate(&self, fingerprint: &CredentialFingerprint) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: User Directory
// ============================================================================

/// Resolution of verified emails to stable user records.
pub trait UserDirectory: Send + Sync {
    /// Returns the user for the email, creating one on first sight.
    ///
    /// The operation must be idempotent under concurrent first-logins for
    /// the same email: attempt the insert, and on the store's uniqueness
    /// violation re-read the existing row. The uniqueness constraint is the
    /// serialization point; implementations must not substitute an
    /// in-process lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for any non-uniqueness failure, unchanged.
    fn resolve_or_create(&self, email_address: &str) -> Result<User, StoreError>;

    /// Finds a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// Finds a user by email address.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn find_by_email(&self, email_address: &str) -> Result<Option<User>, StoreError>;
}

// ============================================================================
// SECTION: Access Control Store
// ============================================================================

/// CRUD over access-control-list rows; the single source of truth for who
/// may touch an object.
pub trait AccessControlStore: Send + Sync {
    /// Inserts an ACL row.
    ///
    /// The access level is already typed; wire values are validated before
    /// an entry can be constructed, so an invalid level never reaches the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn grant(&self, entry: &AclEntry) -> Result<(), StoreError>;

    /// Deletes matching ACL rows; succeeds when none match.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn revoke(
        &self,
        object_id: &ObjectId,
        object_type: ObjectKind,
        user_id: &UserId,
    ) -> Result<(), StoreError>;

    /// Returns the first ACL row for the (object, user) pair.
    ///
    /// The lookup is deliberately not filtered by object type: object ids
    /// are minted as v4 UUIDs and therefore unique across kinds. Two kinds
    /// sharing an id value would make this lookup ambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn lookup(
        &self,
        object_id: &ObjectId,
        user_id: &UserId,
    ) -> Result<Option<AclEntry>, StoreError>;

    /// Inserts all parent/child edges in a single transaction.
    ///
    /// Any single insert failure rolls the whole batch back; the edges for a
    /// parent become visible atomically or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the transaction fails.
    fn link_hierarchy(&self, parent: &ObjectId, children: &[ObjectId]) -> Result<(), StoreError>;

    /// Lists users holding access on an object, with their levels.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn collaborators(&self, object_id: &ObjectId) -> Result<Vec<Collaborator>, StoreError>;
}

// ============================================================================
// SECTION: Quota Source
// ============================================================================

/// Read-only aggregation feeding the quota-eligibility decision.
pub trait QuotaSource: Send + Sync {
    /// Returns the subscription tier and owned-resource count for a user and
    /// kind, or `None` when the aggregate produces no rows (zero usage).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn owned_count(
        &self,
        kind: ResourceKind,
        user_id: &UserId,
    ) -> Result<Option<TierUsage>, StoreError>;

    /// Resolves the OWNER user of a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn project_owner(&self, project_id: &ObjectId) -> Result<Option<UserId>, StoreError>;

    /// Computes the full per-kind usage snapshot for a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on datastore failure.
    fn usage(&self, user_id: &UserId) -> Result<QuotaSnapshot, StoreError>;
}
