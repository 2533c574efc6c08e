// testdeck-store-sqlite/src/acl.rs
// ============================================================================
// Module: SQLite Access Control Store
// Description: ACL rows and hierarchy edges over SQLite.
// Purpose: Persist the single source of truth for per-object access.
// Dependencies: testdeck-core, rusqlite
// ============================================================================

//! ## Overview
//! ACL rows carry typed levels; the wire boundary has already rejected
//! anything outside the closed set, and the schema CHECK constraint backs
//! that up. Lookups return the first row for an (object, user) pair without
//! filtering by object type, since object ids are UUID-unique across kinds.
//! Hierarchy edges are inserted in one transaction, all-or-nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::params;
use testdeck_core::AccessLevel;
use testdeck_core::AclEntry;
use testdeck_core::Collaborator;
use testdeck_core::ObjectId;
use testdeck_core::ObjectKind;
use testdeck_core::StoreError;
use testdeck_core::UserId;
use testdeck_core::interfaces::AccessControlStore;

use crate::store::SqliteStore;
use crate::store::db_err;

// ============================================================================
// SECTION: Level Mapping
// ============================================================================

/// Parses a stored level tag, failing closed on unknown values.
///
/// The CHECK constraint makes this unreachable for rows written through the
/// store; it guards against out-of-band writes.
fn level_from_tag(tag: &str) -> Result<AccessLevel, StoreError> {
    AccessLevel::parse(tag).map_err(|err| StoreError::Invalid(err.to_string()))
}

// ============================================================================
// SECTION: Access Control Store
// ============================================================================

impl AccessControlStore for SqliteStore {
    fn grant(&self, entry: &AclEntry) -> Result<(), StoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "INSERT INTO access_control_lists (object_id, object_type, user_id, access) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    entry.object_id.as_str(),
                    entry.object_type.as_str(),
                    entry.user_id.as_str(),
                    entry.access.as_str()
                ],
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(())
    }

    fn revoke(
        &self,
        object_id: &ObjectId,
        object_type: ObjectKind,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "DELETE FROM access_control_lists \
                 WHERE object_id = ?1 AND object_type = ?2 AND user_id = ?3",
                params![object_id.as_str(), object_type.as_str(), user_id.as_str()],
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(())
    }

    fn lookup(
        &self,
        object_id: &ObjectId,
        user_id: &UserId,
    ) -> Result<Option<AclEntry>, StoreError> {
        let guard = self.conn()?;
        let row = guard
            .query_row(
                "SELECT object_type, access FROM access_control_lists \
                 WHERE object_id = ?1 AND user_id = ?2",
                params![object_id.as_str(), user_id.as_str()],
                |row| {
                    let object_type: String = row.get(0)?;
                    let access: String = row.get(1)?;
                    Ok((object_type, access))
                },
            )
            .optional()
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let Some((object_type, access)) = row else {
            return Ok(None);
        };
        let object_type = kind_from_tag(&object_type)?;
        Ok(Some(AclEntry {
            object_id: object_id.clone(),
            object_type,
            user_id: user_id.clone(),
            access: level_from_tag(&access)?,
        }))
    }

    fn link_hierarchy(&self, parent: &ObjectId, children: &[ObjectId]) -> Result<(), StoreError> {
        let mut guard = self.conn()?;
        let tx = guard.transaction().map_err(|err| StoreError::from(db_err(&err)))?;
        for child in children {
            tx.execute(
                "INSERT INTO parent_childs (parent, child) VALUES (?1, ?2)",
                params![parent.as_str(), child.as_str()],
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        }
        tx.commit().map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(())
    }

    fn collaborators(&self, object_id: &ObjectId) -> Result<Vec<Collaborator>, StoreError> {
        let guard = self.conn()?;
        let mut stmt = guard
            .prepare(
                "SELECT u.id, u.user_name, u.email_address, acl.access, acl.created_at \
                 FROM users u, access_control_lists acl \
                 WHERE u.id = acl.user_id AND acl.object_id = ?1 \
                 ORDER BY acl.created_at, acl.rowid",
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let rows = stmt
            .query_map(params![object_id.as_str()], |row| {
                let id: String = row.get(0)?;
                let username: String = row.get(1)?;
                let email_address: String = row.get(2)?;
                let access: String = row.get(3)?;
                let created_at: String = row.get(4)?;
                Ok((id, username, email_address, access, created_at))
            })
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let mut collaborators = Vec::new();
        for row in rows {
            let (id, username, email_address, access, created_at) =
                row.map_err(|err| StoreError::from(db_err(&err)))?;
            collaborators.push(Collaborator {
                id: UserId::new(id),
                username,
                email_address,
                access: level_from_tag(&access)?,
                created_at,
            });
        }
        Ok(collaborators)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a stored object-kind tag.
fn kind_from_tag(tag: &str) -> Result<ObjectKind, StoreError> {
    match tag {
        "project" => Ok(ObjectKind::Project),
        "scope" => Ok(ObjectKind::Scope),
        "scenario" => Ok(ObjectKind::Scenario),
        "session" => Ok(ObjectKind::Session),
        "test" => Ok(ObjectKind::Test),
        "user" => Ok(ObjectKind::User),
        other => Err(StoreError::Invalid(format!("unknown object type: {other}"))),
    }
}
