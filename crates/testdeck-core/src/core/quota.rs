// testdeck-core/src/core/quota.rs
// ============================================================================
// Module: Testdeck Quota Engine
// Description: Subscription-tier creation ceilings and eligibility decisions.
// Purpose: Decide whether a user may create one more resource of a kind.
// Dependencies: crate::interfaces, serde, thiserror
// ============================================================================

//! ## Overview
//! The quota engine is pure numeric policy over a [`QuotaSource`]: resolve
//! the accountable owner, read the owned-resource count for the kind, and
//! compare it against the tier table. A user with no resource rows at all is
//! eligible by definition. The gate is only consulted when the caller's
//! content-creation limiter flag is enabled; that flag belongs to an
//! external collaborator and arrives here as a plain boolean at the call
//! site.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::interfaces::QuotaSource;
use crate::interfaces::StoreError;

use super::identifiers::ObjectId;
use super::identifiers::UserId;
use super::identity::SubscriptionTier;

// ============================================================================
// SECTION: Resource Kind
// ============================================================================

/// Resource kinds subject to creation accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Top-level project.
    Project,
    /// Scope within a project.
    Scope,
    /// Scenario within a project.
    Scenario,
    /// Session within a project.
    Session,
    /// Test run; counted in snapshots but never gated.
    Test,
}

impl ResourceKind {
    /// Returns the canonical kind tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Scope => "scope",
            Self::Scenario => "scenario",
            Self::Session => "session",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tier Table
// ============================================================================

/// Returns the creation ceiling for a kind under a tier.
///
/// `None` means unlimited: every tier other than `free` and `standard`, and
/// the `test` kind under every tier (no gate is implemented for it).
#[must_use]
pub fn tier_limit(kind: ResourceKind, tier: &SubscriptionTier) -> Option<u64> {
    match (kind, tier) {
        (ResourceKind::Project, SubscriptionTier::Free) => Some(3),
        (ResourceKind::Project, SubscriptionTier::Standard) => Some(10),
        (ResourceKind::Scope, SubscriptionTier::Free) => Some(10),
        (ResourceKind::Scope, SubscriptionTier::Standard) => Some(100),
        (ResourceKind::Scenario | ResourceKind::Session, SubscriptionTier::Free) => Some(50),
        (ResourceKind::Scenario | ResourceKind::Session, SubscriptionTier::Standard) => Some(1000),
        (ResourceKind::Test, _) | (_, SubscriptionTier::Other(_)) => None,
    }
}

// ============================================================================
// SECTION: Usage Records
// ============================================================================

/// Tier and owned-resource count for one user and kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierUsage {
    /// Subscription tier of the accountable user.
    pub tier: SubscriptionTier,
    /// Count of non-deleted owned resources of the kind.
    pub count: u64,
}

/// Per-user usage snapshot attached to each resolved identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Subscription tier of the user.
    pub subscription_type: SubscriptionTier,
    /// Owned project count.
    pub project: u64,
    /// Owned scope count.
    pub scope: u64,
    /// Owned scenario count.
    pub scenario: u64,
    /// Owned session count.
    pub session: u64,
    /// Owned test count.
    pub test: u64,
}

impl QuotaSnapshot {
    /// Builds an all-zero snapshot for a tier.
    #[must_use]
    pub const fn empty(subscription_type: SubscriptionTier) -> Self {
        Self {
            subscription_type,
            project: 0,
            scope: 0,
            scenario: 0,
            session: 0,
            test: 0,
        }
    }
}

// ============================================================================
// SECTION: Eligibility
// ============================================================================

/// Accountable subject of a creation attempt.
///
/// Project creation is accounted to the creating user directly; scope,
/// scenario, and session creation is accounted to the OWNER of the target
/// project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationSubject {
    /// Account against this user.
    User(UserId),
    /// Account against the OWNER of this project.
    Project(ObjectId),
}

/// Quota evaluation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuotaError {
    /// Datastore failure while aggregating usage.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The target project has no resolvable OWNER.
    #[error("project {0} has no owner")]
    MissingProjectOwner(ObjectId),
}

/// Decides whether one more resource of `kind` may be created.
///
/// # Errors
///
/// Returns [`QuotaError::Store`] on aggregation failure and
/// [`QuotaError::MissingProjectOwner`] when a project subject cannot be
/// resolved to an OWNER user.
pub fn is_eligible_to_create(
    source: &dyn QuotaSource,
    kind: ResourceKind,
    subject: &CreationSubject,
) -> Result<bool, QuotaError> {
    if matches!(kind, ResourceKind::Test) {
        return Ok(true);
    }
    let owner = match subject {
        CreationSubject::User(user_id) => user_id.clone(),
        CreationSubject::Project(project_id) => source
            .project_owner(project_id)?
            .ok_or_else(|| QuotaError::MissingProjectOwner(project_id.clone()))?,
    };
    let Some(TierUsage { tier, count }) = source.owned_count(kind, &owner)? else {
        // Zero usage: eligible by definition.
        return Ok(true);
    };
    Ok(tier_limit(kind, &tier).is_none_or(|limit| count < limit))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
