// testdeck-core/src/core/access.rs
// ============================================================================
// Module: Testdeck Access Model
// Description: Access levels, object kinds, and access-control entries.
// Purpose: Provide the closed access-level set enforced at every write site.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The access model is a flat per-object ACL: one row grants one user one
//! level on one object. Levels form a closed three-value set; anything else
//! is rejected at the wire boundary before the store is touched. Object kinds
//! are tags carried on ACL rows for revocation and reporting; the lookup path
//! deliberately ignores them because object ids are unique across kinds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::identifiers::ObjectId;
use super::identifiers::UserId;

// ============================================================================
// SECTION: Access Level
// ============================================================================

/// Permission a user holds on a specific object.
///
/// # Invariants
/// - The set is closed; wire values outside it fail [`AccessLevel::parse`].
/// - Levels are not ordered. Each operation names its acceptable set
///   explicitly rather than comparing levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    /// Full control, including deletion and collaborator revocation.
    Owner,
    /// Read and write, but not deletion.
    Modify,
    /// Read-only access.
    Read,
}

impl AccessLevel {
    /// Returns the canonical wire tag for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Modify => "MODIFY",
            Self::Read => "READ",
        }
    }

    /// Parses a wire tag into a level.
    ///
    /// # Errors
    ///
    /// Returns [`AccessLevelParseError`] for any value outside the closed
    /// set. Callers must reject the request without mutating any store.
    pub fn parse(value: &str) -> Result<Self, AccessLevelParseError> {
        match value {
            "OWNER" => Ok(Self::Owner),
            "MODIFY" => Ok(Self::Modify),
            "READ" => Ok(Self::Read),
            other => Err(AccessLevelParseError {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected access-level tag.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid access level: {value}")]
pub struct AccessLevelParseError {
    /// The rejected wire value.
    pub value: String,
}

// ============================================================================
// SECTION: Object Kind
// ============================================================================

/// Kind tag recorded on ACL rows.
///
/// The kind set is closed in this system, so kinds are enumerated rather than
/// carried as free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Top-level project container.
    Project,
    /// Scope grouping scenarios within a project.
    Scope,
    /// Test scenario definition.
    Scenario,
    /// Test session over a set of scenarios.
    Session,
    /// Individual test run inside a session.
    Test,
    /// User profile object.
    User,
}

impl ObjectKind {
    /// Returns the canonical tag stored in ACL rows.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Scope => "scope",
            Self::Scenario => "scenario",
            Self::Session => "session",
            Self::Test => "test",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: ACL Entry
// ============================================================================

/// One user's rights on one object.
///
/// # Invariants
/// - Entries are never updated in place; level changes are a revoke followed
///   by a fresh grant.
/// - No composite uniqueness is enforced; reads take the first match for an
///   (object, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// Object the entry grants access to.
    pub object_id: ObjectId,
    /// Kind tag of the object.
    pub object_type: ObjectKind,
    /// User the entry grants access to.
    pub user_id: UserId,
    /// Granted access level.
    pub access: AccessLevel,
}

impl AclEntry {
    /// Builds a new entry.
    #[must_use]
    pub fn new(
        object_id: impl Into<ObjectId>,
        object_type: ObjectKind,
        user_id: impl Into<UserId>,
        access: AccessLevel,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            object_type,
            user_id: user_id.into(),
            access,
        }
    }
}

// ============================================================================
// SECTION: Hierarchy Link
// ============================================================================

/// Parent/child grouping edges inserted atomically as one batch.
///
/// Hierarchy edges record structural grouping (a session and its member
/// scenarios). They are not consulted by the authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLink {
    /// Parent object identifier.
    pub parent: ObjectId,
    /// Child object identifiers.
    pub children: Vec<ObjectId>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    //! Closed-set parse checks for access levels.
    #![allow(clippy::unwrap_used, reason = "Test-only assertions use unwrap for clarity.")]

    use super::AccessLevel;

    #[test]
    fn parse_accepts_closed_set() {
        assert_eq!(AccessLevel::parse("OWNER").unwrap(), AccessLevel::Owner);
        assert_eq!(AccessLevel::parse("MODIFY").unwrap(), AccessLevel::Modify);
        assert_eq!(AccessLevel::parse("READ").unwrap(), AccessLevel::Read);
    }

    #[test]
    fn parse_rejects_unknown_levels() {
        assert!(AccessLevel::parse("SUPER").is_err());
        assert!(AccessLevel::parse("owner").is_err());
        assert!(AccessLevel::parse("").is_err());
    }

    #[test]
    fn wire_tags_round_trip() {
        for level in [AccessLevel::Owner, AccessLevel::Modify, AccessLevel::Read] {
            assert_eq!(AccessLevel::parse(level.as_str()).unwrap(), level);
        }
    }
}
