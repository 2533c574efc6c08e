// testdeck-core/src/core/identity.rs
// ============================================================================
// Module: Testdeck Identity Types
// Description: Users, roles, subscription tiers, and cached credentials.
// Purpose: Provide the identity records produced by credential resolution.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identity resolution turns an opaque bearer credential into a stable
//! [`User`] record. The [`CachedCredential`] row pins a credential
//! fingerprint to the user it resolved to so the identity provider is
//! consulted at most once per distinct credential value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::identifiers::CredentialFingerprint;
use super::identifiers::UserId;

// ============================================================================
// SECTION: Role
// ============================================================================

/// Coarse privilege flag on a user.
///
/// # Invariants
/// - `Admin` bypasses per-object ACL evaluation entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular user subject to ACL evaluation.
    User,
    /// Administrator with unconditional access.
    Admin,
}

impl Role {
    /// Returns the canonical wire tag for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Subscription Tier
// ============================================================================

/// Subscription tier controlling creation quotas.
///
/// The tier set is open-ended upstream: `free` and `standard` carry numeric
/// ceilings, any other tier label is unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionTier {
    /// Free tier with the tightest creation ceilings.
    Free,
    /// Paid standard tier with raised ceilings.
    Standard,
    /// Any other tier label; treated as unlimited.
    Other(String),
}

impl SubscriptionTier {
    /// Returns the wire label for the tier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for SubscriptionTier {
    fn from(value: String) -> Self {
        match value.as_str() {
            "free" => Self::Free,
            "standard" => Self::Standard,
            _ => Self::Other(value),
        }
    }
}

impl From<SubscriptionTier> for String {
    fn from(value: SubscriptionTier) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: User
// ============================================================================

/// Stable user record shared between the authorization core and the rest of
/// the service.
///
/// # Invariants
/// - `email_address` is unique; the directory relies on that constraint as
///   its race-resolution point.
/// - The authorization core only ever creates or reads user rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque stable identifier.
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
    /// Short handle.
    #[serde(default)]
    pub user_name: String,
    /// Verified email address (unique).
    pub email_address: String,
    /// Coarse privilege flag.
    pub role: Role,
    /// Subscription tier for quota decisions.
    pub subscription_type: SubscriptionTier,
}

// ============================================================================
// SECTION: Verified Identity
// ============================================================================

/// Outcome of a successful identity-provider verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Email address asserted by the provider.
    pub email_address: String,
}

// ============================================================================
// SECTION: Cached Credential
// ============================================================================

/// One resolved credential, keyed by fingerprint.
///
/// # Invariants
/// - Immutable once written; revocation is a soft-delete by fingerprint, not
///   an update.
/// - Valid for the lifetime of the row regardless of any expiry embedded in
///   the credential itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCredential {
    /// Content hash of the raw credential.
    pub fingerprint: CredentialFingerprint,
    /// User the credential resolved to.
    pub user_id: UserId,
    /// Email address the provider asserted.
    pub email_address: String,
    /// Identity-provider label (for example `google`).
    pub provider: String,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    //! Wire-form checks for roles and tiers.
    #![allow(clippy::unwrap_used, reason = "Test-only assertions use unwrap for clarity.")]

    use super::Role;
    use super::SubscriptionTier;

    #[test]
    fn roles_serialize_as_upper_tags() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"USER\"");
    }

    #[test]
    fn tiers_round_trip_through_labels() {
        for label in ["free", "standard", "enterprise"] {
            let tier: SubscriptionTier = serde_json::from_str(&format!("\"{label}\"")).unwrap();
            assert_eq!(tier.as_str(), label);
            assert_eq!(serde_json::to_string(&tier).unwrap(), format!("\"{label}\""));
        }
        assert_eq!(SubscriptionTier::from("free".to_string()), SubscriptionTier::Free);
        assert_eq!(SubscriptionTier::from("standard".to_string()), SubscriptionTier::Standard);
    }
}
