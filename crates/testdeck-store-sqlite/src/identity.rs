// testdeck-store-sqlite/src/identity.rs
// ============================================================================
// Module: SQLite Identity Store
// Description: Credential cache and user directory over SQLite.
// Purpose: Persist resolved credentials and user rows for identity lookup.
// Dependencies: testdeck-core, rusqlite
// ============================================================================

//! ## Overview
//! The credential cache maps fingerprints to previously resolved identities;
//! revocation is a soft delete by fingerprint. The user directory creates
//! user rows on first sight of an email and resolves duplicate-insert races
//! by re-reading: the UNIQUE index on `email_address` is the serialization
//! point, enforced atomically by the engine across every process sharing the
//! database.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use testdeck_core::CachedCredential;
use testdeck_core::CredentialFingerprint;
use testdeck_core::StoreError;
use testdeck_core::User;
use testdeck_core::UserId;
use testdeck_core::interfaces::CredentialCache;
use testdeck_core::interfaces::UserDirectory;

use crate::store::SqliteStore;
use crate::store::SqliteStoreError;
use crate::store::db_err;
use crate::store::is_unique_violation;

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Columns selected for every user read.
const USER_COLUMNS: &str = "id, full_name, user_name, email_address, role, subscription_type";

/// Maps a user row into the core record.
fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    let role = match role.as_str() {
        "ADMIN" => testdeck_core::Role::Admin,
        _ => testdeck_core::Role::User,
    };
    let tier: String = row.get(5)?;
    Ok(User {
        id: UserId::new(row.get::<_, String>(0)?),
        full_name: row.get(1)?,
        user_name: row.get(2)?,
        email_address: row.get(3)?,
        role,
        subscription_type: tier.into(),
    })
}

// ============================================================================
// SECTION: Credential Cache
// ============================================================================

impl CredentialCache for SqliteStore {
    fn lookup(
        &self,
        fingerprint: &CredentialFingerprint,
    ) -> Result<Option<CachedCredential>, StoreError> {
        let guard = self.conn()?;
        let row = guard
            .query_row(
                "SELECT user_id, email_address, auth_provider FROM credentials \
                 WHERE fingerprint = ?1 AND deleted_at IS NULL",
                params![fingerprint.as_str()],
                |row| {
                    Ok(CachedCredential {
                        fingerprint: fingerprint.clone(),
                        user_id: UserId::new(row.get::<_, String>(0)?),
                        email_address: row.get(1)?,
                        provider: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(row)
    }

    fn store(&self, entry: &CachedCredential) -> Result<(), StoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "INSERT INTO credentials (fingerprint, user_id, email_address, auth_provider) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    entry.fingerprint.as_str(),
                    entry.user_id.as_str(),
                    entry.email_address,
                    entry.provider
                ],
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(())
    }

    fn invalidate(&self, fingerprint: &CredentialFingerprint) -> Result<(), StoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE credentials SET deleted_at = datetime('now') \
                 WHERE fingerprint = ?1 AND deleted_at IS NULL",
                params![fingerprint.as_str()],
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: User Directory
// ============================================================================

impl UserDirectory for SqliteStore {
    fn resolve_or_create(&self, email_address: &str) -> Result<User, StoreError> {
        let id = Self::mint_id();
        let inserted = {
            let guard = self.conn()?;
            guard.execute(
                "INSERT INTO users (id, email_address) VALUES (?1, ?2)",
                params![id, email_address],
            )
        };
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                // Lost the race (or the user already existed): the existing
                // row is authoritative.
            }
            Err(err) => return Err(db_err(&err).into()),
        }
        self.find_by_email(email_address)?.ok_or_else(|| {
            StoreError::Invalid(format!("user row missing after insert for {email_address}"))
        })
    }

    fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let guard = self.conn()?;
        guard
            .query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND deleted_at IS NULL"
                ),
                params![id.as_str()],
                user_from_row,
            )
            .optional()
            .map_err(|err| StoreError::from(db_err(&err)))
    }

    fn find_by_email(&self, email_address: &str) -> Result<Option<User>, StoreError> {
        let guard = self.conn()?;
        guard
            .query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE email_address = ?1 AND deleted_at IS NULL"
                ),
                params![email_address],
                user_from_row,
            )
            .optional()
            .map_err(|err| StoreError::from(db_err(&err)))
    }
}

// ============================================================================
// SECTION: User Administration
// ============================================================================

impl SqliteStore {
    /// Creates a user row with explicit profile fields.
    ///
    /// Used by the user-creation endpoint; first-login resolution goes
    /// through [`UserDirectory::resolve_or_create`] instead. Follows the
    /// same insert-then-read-on-conflict pattern.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn create_user(
        &self,
        full_name: &str,
        user_name: &str,
        email_address: &str,
    ) -> Result<User, SqliteStoreError> {
        let id = Self::mint_id();
        let inserted = {
            let guard = self.conn()?;
            guard.execute(
                "INSERT INTO users (id, full_name, user_name, email_address) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, full_name, user_name, email_address],
            )
        };
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(db_err(&err)),
        }
        self.find_by_email(email_address)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?
            .ok_or_else(|| {
                SqliteStoreError::Invalid(format!(
                    "user row missing after insert for {email_address}"
                ))
            })
    }

    /// Lists users with paging.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn list_users(&self, start: u32, count: u32) -> Result<Vec<User>, SqliteStoreError> {
        let guard = self.conn()?;
        let mut stmt = guard
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL \
                 LIMIT ?1 OFFSET ?2"
            ))
            .map_err(|err| db_err(&err))?;
        let rows = stmt
            .query_map(params![count, start], user_from_row)
            .map_err(|err| db_err(&err))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| db_err(&err))
    }

    /// Updates a user's profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn update_user(
        &self,
        id: &UserId,
        full_name: &str,
        user_name: &str,
        email_address: &str,
    ) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE users SET full_name = ?1, user_name = ?2, email_address = ?3, \
                 updated_at = datetime('now') WHERE id = ?4",
                params![full_name, user_name, email_address, id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Soft-deletes a user row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn delete_user(&self, id: &UserId) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE users SET deleted_at = datetime('now') WHERE id = ?1",
                params![id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Sets a user's subscription tier.
    ///
    /// Quota tests and the (out-of-scope) payment callback both need this
    /// seam; it never touches identity fields.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn set_subscription_tier(
        &self,
        id: &UserId,
        tier: &str,
    ) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE users SET subscription_type = ?1, updated_at = datetime('now') \
                 WHERE id = ?2",
                params![tier, id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Sets a user's role.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn set_role(&self, id: &UserId, role: &str) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE users SET role = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![role, id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }
}
