// testdeck-store-sqlite/src/quota.rs
// ============================================================================
// Module: SQLite Quota Source
// Description: Read-only usage aggregation for quota decisions.
// Purpose: Count owned resources per kind against OWNER ACL rows.
// Dependencies: testdeck-core, rusqlite
// ============================================================================

//! ## Overview
//! Quota aggregation joins OWNER ACL rows with the non-soft-deleted domain
//! table for each kind. Project counts account OWNER rows on the projects
//! themselves; scope, scenario, session, and test counts account resources
//! under projects the user owns. An aggregate returning no rows is reported
//! as `None`; the engine treats that as zero usage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::params;
use testdeck_core::ObjectId;
use testdeck_core::QuotaSnapshot;
use testdeck_core::ResourceKind;
use testdeck_core::StoreError;
use testdeck_core::TierUsage;
use testdeck_core::UserId;
use testdeck_core::interfaces::QuotaSource;

use crate::store::SqliteStore;
use crate::store::db_err;

// ============================================================================
// SECTION: Aggregation SQL
// ============================================================================

/// Tier + owned-project count for a user.
const PROJECT_COUNT_SQL: &str = "
SELECT u.subscription_type, COUNT(*)
FROM projects p, access_control_lists acl, users u
WHERE p.id = acl.object_id AND u.id = acl.user_id
  AND acl.object_type = 'project' AND acl.access = 'OWNER'
  AND p.deleted_at IS NULL AND u.id = ?1
GROUP BY u.id";

/// Tier + scope count under projects the user owns.
const SCOPE_COUNT_SQL: &str = "
SELECT u.subscription_type, COUNT(s.id)
FROM scopes s, projects p, access_control_lists acl, users u
WHERE s.project_id = p.id AND acl.object_id = p.id
  AND acl.object_type = 'project' AND acl.access = 'OWNER'
  AND acl.user_id = u.id AND u.id = ?1 AND s.deleted_at IS NULL
GROUP BY u.id";

/// Tier + scenario count under projects the user owns.
const SCENARIO_COUNT_SQL: &str = "
SELECT u.subscription_type, COUNT(sc.id)
FROM scenarios sc, projects p, access_control_lists acl, users u
WHERE sc.project_id = p.id AND acl.object_id = p.id
  AND acl.object_type = 'project' AND acl.access = 'OWNER'
  AND acl.user_id = u.id AND u.id = ?1 AND sc.deleted_at IS NULL
GROUP BY u.id";

/// Tier + session count under projects the user owns.
const SESSION_COUNT_SQL: &str = "
SELECT u.subscription_type, COUNT(se.id)
FROM sessions se, projects p, access_control_lists acl, users u
WHERE se.project_id = p.id AND acl.object_id = p.id
  AND acl.object_type = 'project' AND acl.access = 'OWNER'
  AND acl.user_id = u.id AND u.id = ?1 AND se.deleted_at IS NULL
GROUP BY u.id";

/// Tier + test count under projects the user owns.
const TEST_COUNT_SQL: &str = "
SELECT u.subscription_type, COUNT(t.id)
FROM tests t, sessions se, projects p, access_control_lists acl, users u
WHERE t.session_id = se.id AND se.project_id = p.id AND acl.object_id = p.id
  AND acl.object_type = 'project' AND acl.access = 'OWNER'
  AND acl.user_id = u.id AND u.id = ?1 AND t.deleted_at IS NULL
GROUP BY u.id";

/// OWNER user of a project.
const PROJECT_OWNER_SQL: &str = "
SELECT u.id
FROM projects p, access_control_lists acl, users u
WHERE p.id = acl.object_id AND u.id = acl.user_id
  AND acl.object_type = 'project' AND acl.access = 'OWNER'
  AND p.deleted_at IS NULL AND p.id = ?1
LIMIT 1";

/// Returns the aggregation SQL for a kind.
const fn count_sql(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Project => PROJECT_COUNT_SQL,
        ResourceKind::Scope => SCOPE_COUNT_SQL,
        ResourceKind::Scenario => SCENARIO_COUNT_SQL,
        ResourceKind::Session => SESSION_COUNT_SQL,
        ResourceKind::Test => TEST_COUNT_SQL,
    }
}

// ============================================================================
// SECTION: Quota Source
// ============================================================================

impl QuotaSource for SqliteStore {
    fn owned_count(
        &self,
        kind: ResourceKind,
        user_id: &UserId,
    ) -> Result<Option<TierUsage>, StoreError> {
        let guard = self.conn()?;
        let row = guard
            .query_row(count_sql(kind), params![user_id.as_str()], |row| {
                let tier: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((tier, count as u64))
            })
            .optional()
            .map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(row.map(|(tier, count)| TierUsage {
            tier: tier.into(),
            count,
        }))
    }

    fn project_owner(&self, project_id: &ObjectId) -> Result<Option<UserId>, StoreError> {
        let guard = self.conn()?;
        let owner = guard
            .query_row(PROJECT_OWNER_SQL, params![project_id.as_str()], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(owner.map(UserId::new))
    }

    fn usage(&self, user_id: &UserId) -> Result<QuotaSnapshot, StoreError> {
        let tier: String = {
            let guard = self.conn()?;
            guard
                .query_row(
                    "SELECT subscription_type FROM users WHERE id = ?1 AND deleted_at IS NULL",
                    params![user_id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| StoreError::from(db_err(&err)))?
                .ok_or_else(|| {
                    StoreError::Invalid(format!("no user row for {}", user_id.as_str()))
                })?
        };
        let mut snapshot = QuotaSnapshot::empty(tier.into());
        for kind in [
            ResourceKind::Project,
            ResourceKind::Scope,
            ResourceKind::Scenario,
            ResourceKind::Session,
            ResourceKind::Test,
        ] {
            let count = self.owned_count(kind, user_id)?.map_or(0, |usage| usage.count);
            match kind {
                ResourceKind::Project => snapshot.project = count,
                ResourceKind::Scope => snapshot.scope = count,
                ResourceKind::Scenario => snapshot.scenario = count,
                ResourceKind::Session => snapshot.session = count,
                ResourceKind::Test => snapshot.test = count,
            }
        }
        Ok(snapshot)
    }
}
