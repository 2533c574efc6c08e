// testdeck-core/src/core/mod.rs
// ============================================================================
// Module: Testdeck Core Types
// Description: Canonical Testdeck domain and access-control structures.
// Purpose: Provide stable, serializable types for identities, ACLs, and quotas.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! Core types define the identities, access-control entries, quota policy,
//! and domain entities persisted by the Testdeck service. These types are the
//! canonical source of truth for the HTTP surface and the store schema.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod access;
pub mod domain;
pub mod hashing;
pub mod identifiers;
pub mod identity;
pub mod quota;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AccessLevel;
pub use access::AccessLevelParseError;
pub use access::AclEntry;
pub use access::HierarchyLink;
pub use access::ObjectKind;
pub use domain::Collaborator;
pub use domain::Invitation;
pub use domain::Project;
pub use domain::Scenario;
pub use domain::Scope;
pub use domain::Session;
pub use domain::Step;
pub use domain::TestRun;
pub use hashing::fingerprint_credential;
pub use hashing::hash_bytes;
pub use identifiers::CredentialFingerprint;
pub use identifiers::ObjectId;
pub use identifiers::UserId;
pub use identity::CachedCredential;
pub use identity::Role;
pub use identity::SubscriptionTier;
pub use identity::User;
pub use identity::VerifiedIdentity;
pub use quota::CreationSubject;
pub use quota::QuotaError;
pub use quota::QuotaSnapshot;
pub use quota::ResourceKind;
pub use quota::TierUsage;
pub use quota::is_eligible_to_create;
pub use quota::tier_limit;
