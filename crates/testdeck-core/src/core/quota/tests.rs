// testdeck-core/src/core/quota/tests.rs
// ============================================================================
// Module: Quota Engine Unit Tests
// Description: Tier-table and eligibility checks over an in-memory source.
// Purpose: Pin the creation ceilings and the zero-usage rule.
// Dependencies: testdeck-core
// ============================================================================

//! Quota policy tests with a stub [`QuotaSource`].

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use crate::core::identifiers::ObjectId;
use crate::core::identifiers::UserId;
use crate::core::identity::SubscriptionTier;
use crate::interfaces::QuotaSource;
use crate::interfaces::StoreError;

use super::CreationSubject;
use super::QuotaError;
use super::QuotaSnapshot;
use super::ResourceKind;
use super::TierUsage;
use super::is_eligible_to_create;
use super::tier_limit;

/// Stub source returning fixed tier/count pairs.
struct FixedSource {
    /// Usage returned for every `owned_count` call, `None` for no rows.
    usage: Option<TierUsage>,
    /// Owner returned for every `project_owner` call.
    owner: Option<UserId>,
}

impl QuotaSource for FixedSource {
    fn owned_count(
        &self,
        _kind: ResourceKind,
        _user_id: &UserId,
    ) -> Result<Option<TierUsage>, StoreError> {
        Ok(self.usage.clone())
    }

    fn project_owner(&self, _project_id: &ObjectId) -> Result<Option<UserId>, StoreError> {
        Ok(self.owner.clone())
    }

    fn usage(&self, _user_id: &UserId) -> Result<QuotaSnapshot, StoreError> {
        Ok(QuotaSnapshot::empty(SubscriptionTier::Free))
    }
}

fn source_with(tier: SubscriptionTier, count: u64) -> FixedSource {
    FixedSource {
        usage: Some(TierUsage {
            tier,
            count,
        }),
        owner: Some(UserId::from("owner-1")),
    }
}

#[test]
fn tier_table_matches_policy() {
    assert_eq!(tier_limit(ResourceKind::Project, &SubscriptionTier::Free), Some(3));
    assert_eq!(tier_limit(ResourceKind::Project, &SubscriptionTier::Standard), Some(10));
    assert_eq!(tier_limit(ResourceKind::Scope, &SubscriptionTier::Free), Some(10));
    assert_eq!(tier_limit(ResourceKind::Scope, &SubscriptionTier::Standard), Some(100));
    assert_eq!(tier_limit(ResourceKind::Scenario, &SubscriptionTier::Free), Some(50));
    assert_eq!(tier_limit(ResourceKind::Scenario, &SubscriptionTier::Standard), Some(1000));
    assert_eq!(tier_limit(ResourceKind::Session, &SubscriptionTier::Free), Some(50));
    assert_eq!(tier_limit(ResourceKind::Session, &SubscriptionTier::Standard), Some(1000));
}

#[test]
fn enterprise_tiers_are_unlimited() {
    let tier = SubscriptionTier::Other("enterprise".to_string());
    for kind in [
        ResourceKind::Project,
        ResourceKind::Scope,
        ResourceKind::Scenario,
        ResourceKind::Session,
    ] {
        assert_eq!(tier_limit(kind, &tier), None);
    }
}

#[test]
fn test_kind_is_never_gated() {
    assert_eq!(tier_limit(ResourceKind::Test, &SubscriptionTier::Free), None);
    let source = source_with(SubscriptionTier::Free, 1_000_000);
    let subject = CreationSubject::User(UserId::from("user-1"));
    assert!(is_eligible_to_create(&source, ResourceKind::Test, &subject).unwrap());
}

#[test]
fn zero_usage_is_eligible() {
    let source = FixedSource {
        usage: None,
        owner: None,
    };
    let subject = CreationSubject::User(UserId::from("user-1"));
    assert!(is_eligible_to_create(&source, ResourceKind::Project, &subject).unwrap());
}

#[test]
fn free_tier_project_ceiling_is_three() {
    let subject = CreationSubject::User(UserId::from("user-1"));
    let under = source_with(SubscriptionTier::Free, 2);
    assert!(is_eligible_to_create(&under, ResourceKind::Project, &subject).unwrap());
    let at = source_with(SubscriptionTier::Free, 3);
    assert!(!is_eligible_to_create(&at, ResourceKind::Project, &subject).unwrap());
}

#[test]
fn standard_tier_project_ceiling_is_ten() {
    let subject = CreationSubject::User(UserId::from("user-1"));
    let under = source_with(SubscriptionTier::Standard, 9);
    assert!(is_eligible_to_create(&under, ResourceKind::Project, &subject).unwrap());
    let at = source_with(SubscriptionTier::Standard, 10);
    assert!(!is_eligible_to_create(&at, ResourceKind::Project, &subject).unwrap());
}

#[test]
fn scope_subject_resolves_project_owner() {
    let source = source_with(SubscriptionTier::Free, 10);
    let subject = CreationSubject::Project(ObjectId::from("project-1"));
    assert!(!is_eligible_to_create(&source, ResourceKind::Scope, &subject).unwrap());
}

#[test]
fn missing_project_owner_is_an_error() {
    let source = FixedSource {
        usage: None,
        owner: None,
    };
    let subject = CreationSubject::Project(ObjectId::from("project-1"));
    let err = is_eligible_to_create(&source, ResourceKind::Scope, &subject).unwrap_err();
    assert!(matches!(err, QuotaError::MissingProjectOwner(_)));
}
