// testdeck-core/src/core/domain.rs
// ============================================================================
// Module: Testdeck Domain Entities
// Description: Projects, scopes, scenarios, sessions, and test runs.
// Purpose: Provide the serializable entities behind the thin CRUD surface.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Domain entities are thin persistence records. All per-object access rules
//! live in the ACL rows, not here; the entities only carry the fields the
//! HTTP surface exchanges. Wire names follow the historical camelCase forms
//! except for user-facing payloads, which stay snake_case.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use super::access::AccessLevel;
use super::identifiers::ObjectId;
use super::identifiers::UserId;

// ============================================================================
// SECTION: Project
// ============================================================================

/// Top-level project container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project identifier.
    #[serde(default)]
    pub id: Option<ObjectId>,
    /// Project name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Shareable invitation code.
    #[serde(default)]
    pub invite_code: Option<String>,
    /// Creation timestamp (wire string).
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Invitation view of a project, optionally enriched with the caller's
/// access level when the request carried a resolved identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    /// Project identifier.
    pub id: ObjectId,
    /// Project name.
    pub name: String,
    /// Invitation code the lookup was keyed by.
    pub invite_code: String,
    /// Caller's current access on the project, when identified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessLevel>,
}

/// One collaborator row for a project listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    /// Collaborating user identifier.
    pub id: UserId,
    /// Collaborator handle.
    pub username: String,
    /// Collaborator email address.
    pub email_address: String,
    /// Access level held on the project.
    pub access: AccessLevel,
    /// Grant timestamp (wire string).
    pub created_at: String,
}

// ============================================================================
// SECTION: Scope
// ============================================================================

/// Scope grouping scenarios within a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Scope identifier.
    #[serde(default)]
    pub id: Option<ObjectId>,
    /// Owning project identifier.
    #[serde(default)]
    pub project_id: Option<ObjectId>,
    /// Owning project name (listing enrichment).
    #[serde(default)]
    pub project_name: Option<String>,
    /// Scope name.
    #[serde(default)]
    pub name: String,
    /// Scenarios grouped under the scope (listing enrichment).
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// One step of a scenario script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Action to perform.
    #[serde(default)]
    pub step: String,
    /// Expected outcome.
    #[serde(default)]
    pub expectation: String,
    /// Whether the step passed during a run.
    #[serde(default)]
    pub passed: bool,
}

/// Test scenario definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Scenario identifier.
    #[serde(default)]
    pub id: Option<ObjectId>,
    /// Owning project identifier.
    #[serde(default)]
    pub project_id: Option<ObjectId>,
    /// Owning scope identifier.
    #[serde(default)]
    pub scope_id: Option<ObjectId>,
    /// Scenario name.
    #[serde(default)]
    pub name: String,
    /// Scripted steps.
    #[serde(default)]
    pub steps: Vec<Step>,
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Test session over a set of scenarios.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session identifier.
    #[serde(default)]
    pub id: Option<ObjectId>,
    /// Owning project identifier.
    #[serde(default)]
    pub project_id: Option<ObjectId>,
    /// Authoring user identifier.
    #[serde(default)]
    pub author_id: Option<UserId>,
    /// Version label under test.
    #[serde(default)]
    pub version: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Workflow status (0 unassigned, 1 on test, 2 passed, 3 failed).
    #[serde(default)]
    pub status: i64,
    /// Identifiers of the member scenarios.
    #[serde(default)]
    pub scenario_ids: Vec<ObjectId>,
    /// Creation timestamp (wire string).
    #[serde(default)]
    pub created_at: Option<String>,
}

// ============================================================================
// SECTION: Test Run
// ============================================================================

/// Individual test run of one scenario inside a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    /// Test identifier.
    #[serde(default)]
    pub id: Option<ObjectId>,
    /// Owning session identifier.
    #[serde(default)]
    pub session_id: Option<ObjectId>,
    /// Assigned tester.
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    /// Assignee email (listing enrichment).
    #[serde(default)]
    pub assignee_name: Option<String>,
    /// Scenario under test.
    #[serde(default)]
    pub scenario_id: Option<ObjectId>,
    /// Step checklist copied from the scenario at creation.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Workflow status (0 unassigned, 1 on test, 2 passed, 3 failed).
    #[serde(default)]
    pub status: i64,
    /// Tester notes.
    #[serde(default)]
    pub notes: String,
    /// Users assisting on the run.
    #[serde(default)]
    pub assist_ids: Vec<UserId>,
    /// Creation timestamp (wire string).
    #[serde(default)]
    pub created_at: Option<String>,
}
