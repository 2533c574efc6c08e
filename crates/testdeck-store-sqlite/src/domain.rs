// testdeck-store-sqlite/src/domain.rs
// ============================================================================
// Module: SQLite Domain Persistence
// Description: Thin CRUD over projects, scopes, scenarios, sessions, tests.
// Purpose: Persist domain entities behind the authorization core.
// Dependencies: testdeck-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Domain persistence is deliberately thin: per-object access rules live in
//! the ACL rows and are enforced before a handler runs. Deletion is always a
//! soft delete; project and scope deletion cascade to their children inside
//! one transaction. Scenario steps and session membership are stored as JSON
//! columns.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use testdeck_core::Invitation;
use testdeck_core::ObjectId;
use testdeck_core::Project;
use testdeck_core::Scenario;
use testdeck_core::Scope;
use testdeck_core::Session;
use testdeck_core::Step;
use testdeck_core::TestRun;
use testdeck_core::UserId;

use crate::store::SqliteStore;
use crate::store::SqliteStoreError;
use crate::store::db_err;

// ============================================================================
// SECTION: JSON Columns
// ============================================================================

/// Serializes steps into the JSON column form.
fn steps_to_json(steps: &[Step]) -> Result<String, SqliteStoreError> {
    serde_json::to_string(steps).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Parses the steps JSON column.
fn steps_from_json(raw: &str) -> Result<Vec<Step>, SqliteStoreError> {
    serde_json::from_str(raw).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Serializes an identifier list into the JSON column form.
fn ids_to_json<T: AsRef<str>>(ids: &[T]) -> Result<String, SqliteStoreError> {
    let raw: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
    serde_json::to_string(&raw).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Parses an identifier list JSON column.
fn ids_from_json(raw: &str) -> Result<Vec<String>, SqliteStoreError> {
    serde_json::from_str(raw).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

// ============================================================================
// SECTION: Projects
// ============================================================================

/// Maps a project row (id, name, description, invite_code, created_at).
fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: Some(ObjectId::new(row.get::<_, String>(0)?)),
        name: row.get(1)?,
        description: row.get(2)?,
        invite_code: Some(row.get(3)?),
        created_at: row.get(4)?,
    })
}

impl SqliteStore {
    /// Creates a project with a fresh invite code.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn create_project(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Project, SqliteStoreError> {
        let id = Self::mint_id();
        let invite_code = Self::mint_id();
        let guard = self.conn()?;
        guard
            .execute(
                "INSERT INTO projects (id, name, description, invite_code) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, name, description, invite_code],
            )
            .map_err(|err| db_err(&err))?;
        drop(guard);
        self.get_project(&ObjectId::new(id.clone()))?.ok_or_else(|| {
            SqliteStoreError::Invalid(format!("project row missing after insert for {id}"))
        })
    }

    /// Fetches a project by id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn get_project(&self, id: &ObjectId) -> Result<Option<Project>, SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .query_row(
                "SELECT id, name, description, invite_code, created_at FROM projects \
                 WHERE id = ?1 AND deleted_at IS NULL",
                params![id.as_str()],
                project_from_row,
            )
            .optional()
            .map_err(|err| db_err(&err))
    }

    /// Lists projects the user holds any project ACL row on.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn list_projects(
        &self,
        start: u32,
        count: u32,
        user_id: &UserId,
    ) -> Result<Vec<Project>, SqliteStoreError> {
        let guard = self.conn()?;
        let mut stmt = guard
            .prepare(
                "SELECT p.id, p.name, p.description, p.invite_code, p.created_at \
                 FROM projects p, access_control_lists acl \
                 WHERE p.deleted_at IS NULL AND p.id = acl.object_id \
                   AND acl.object_type = 'project' AND acl.user_id = ?3 \
                 GROUP BY p.id ORDER BY p.created_at ASC \
                 LIMIT ?1 OFFSET ?2",
            )
            .map_err(|err| db_err(&err))?;
        let rows = stmt
            .query_map(params![count, start, user_id.as_str()], project_from_row)
            .map_err(|err| db_err(&err))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| db_err(&err))
    }

    /// Updates a project's name and description.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn update_project(
        &self,
        id: &ObjectId,
        name: &str,
        description: &str,
    ) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE projects SET name = ?1, description = ?2, updated_at = datetime('now') \
                 WHERE id = ?3",
                params![name, description, id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Soft-deletes a project and cascades to its scopes and scenarios.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the transaction fails.
    pub fn delete_project(&self, id: &ObjectId) -> Result<(), SqliteStoreError> {
        let mut guard = self.conn()?;
        let tx = guard.transaction().map_err(|err| db_err(&err))?;
        tx.execute(
            "UPDATE projects SET deleted_at = datetime('now') WHERE id = ?1",
            params![id.as_str()],
        )
        .map_err(|err| db_err(&err))?;
        tx.execute(
            "UPDATE scopes SET deleted_at = datetime('now') WHERE project_id = ?1",
            params![id.as_str()],
        )
        .map_err(|err| db_err(&err))?;
        tx.execute(
            "UPDATE scenarios SET deleted_at = datetime('now') WHERE project_id = ?1",
            params![id.as_str()],
        )
        .map_err(|err| db_err(&err))?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Fetches the invitation view of a project by invite code.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn invitation_by_code(
        &self,
        invite_code: &str,
    ) -> Result<Option<Invitation>, SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .query_row(
                "SELECT id, name, invite_code FROM projects \
                 WHERE invite_code = ?1 AND deleted_at IS NULL",
                params![invite_code],
                |row| {
                    Ok(Invitation {
                        id: ObjectId::new(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                        invite_code: row.get(2)?,
                        access: None,
                    })
                },
            )
            .optional()
            .map_err(|err| db_err(&err))
    }
}

// ============================================================================
// SECTION: Scopes
// ============================================================================

impl SqliteStore {
    /// Creates a scope under a project.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn create_scope(
        &self,
        project_id: &ObjectId,
        name: &str,
    ) -> Result<Scope, SqliteStoreError> {
        let id = Self::mint_id();
        let guard = self.conn()?;
        guard
            .execute(
                "INSERT INTO scopes (id, project_id, name) VALUES (?1, ?2, ?3)",
                params![id, project_id.as_str(), name],
            )
            .map_err(|err| db_err(&err))?;
        Ok(Scope {
            id: Some(ObjectId::new(id)),
            project_id: Some(project_id.clone()),
            project_name: None,
            name: name.to_string(),
            scenarios: Vec::new(),
        })
    }

    /// Fetches a scope with its project name.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn get_scope(&self, id: &ObjectId) -> Result<Option<Scope>, SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .query_row(
                "SELECT s.id, s.project_id, s.name, p.name \
                 FROM scopes s, projects p \
                 WHERE s.id = ?1 AND s.project_id = p.id AND s.deleted_at IS NULL",
                params![id.as_str()],
                |row| {
                    Ok(Scope {
                        id: Some(ObjectId::new(row.get::<_, String>(0)?)),
                        project_id: Some(ObjectId::new(row.get::<_, String>(1)?)),
                        name: row.get(2)?,
                        project_name: Some(row.get(3)?),
                        scenarios: Vec::new(),
                    })
                },
            )
            .optional()
            .map_err(|err| db_err(&err))
    }

    /// Lists scopes under a project.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn list_scopes(
        &self,
        start: u32,
        count: u32,
        project_id: &ObjectId,
    ) -> Result<Vec<Scope>, SqliteStoreError> {
        let guard = self.conn()?;
        let mut stmt = guard
            .prepare(
                "SELECT id, project_id, name FROM scopes \
                 WHERE deleted_at IS NULL AND project_id = ?3 \
                 ORDER BY name ASC LIMIT ?1 OFFSET ?2",
            )
            .map_err(|err| db_err(&err))?;
        let rows = stmt
            .query_map(params![count, start, project_id.as_str()], |row| {
                Ok(Scope {
                    id: Some(ObjectId::new(row.get::<_, String>(0)?)),
                    project_id: Some(ObjectId::new(row.get::<_, String>(1)?)),
                    name: row.get(2)?,
                    project_name: None,
                    scenarios: Vec::new(),
                })
            })
            .map_err(|err| db_err(&err))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| db_err(&err))
    }

    /// Renames a scope.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn update_scope(&self, id: &ObjectId, name: &str) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE scopes SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![name, id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Soft-deletes a scope and cascades to its scenarios.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the transaction fails.
    pub fn delete_scope(&self, id: &ObjectId) -> Result<(), SqliteStoreError> {
        let mut guard = self.conn()?;
        let tx = guard.transaction().map_err(|err| db_err(&err))?;
        tx.execute(
            "UPDATE scopes SET deleted_at = datetime('now') WHERE id = ?1",
            params![id.as_str()],
        )
        .map_err(|err| db_err(&err))?;
        tx.execute(
            "UPDATE scenarios SET deleted_at = datetime('now') WHERE scope_id = ?1",
            params![id.as_str()],
        )
        .map_err(|err| db_err(&err))?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// Maps a scenario row (id, project_id, scope_id, name, steps).
fn scenario_from_row(row: &Row<'_>) -> rusqlite::Result<(Scenario, String)> {
    let scenario = Scenario {
        id: Some(ObjectId::new(row.get::<_, String>(0)?)),
        project_id: Some(ObjectId::new(row.get::<_, String>(1)?)),
        scope_id: Some(ObjectId::new(row.get::<_, String>(2)?)),
        name: row.get(3)?,
        steps: Vec::new(),
    };
    let steps_json: String = row.get(4)?;
    Ok((scenario, steps_json))
}

impl SqliteStore {
    /// Creates a scenario.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn create_scenario(
        &self,
        project_id: &ObjectId,
        scope_id: &ObjectId,
        name: &str,
        steps: &[Step],
    ) -> Result<Scenario, SqliteStoreError> {
        let id = Self::mint_id();
        let steps_json = steps_to_json(steps)?;
        let guard = self.conn()?;
        guard
            .execute(
                "INSERT INTO scenarios (id, project_id, scope_id, name, steps) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, project_id.as_str(), scope_id.as_str(), name, steps_json],
            )
            .map_err(|err| db_err(&err))?;
        Ok(Scenario {
            id: Some(ObjectId::new(id)),
            project_id: Some(project_id.clone()),
            scope_id: Some(scope_id.clone()),
            name: name.to_string(),
            steps: steps.to_vec(),
        })
    }

    /// Fetches a scenario with its steps.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn get_scenario(&self, id: &ObjectId) -> Result<Option<Scenario>, SqliteStoreError> {
        let row = {
            let guard = self.conn()?;
            guard
                .query_row(
                    "SELECT id, project_id, scope_id, name, steps FROM scenarios \
                     WHERE id = ?1 AND deleted_at IS NULL",
                    params![id.as_str()],
                    scenario_from_row,
                )
                .optional()
                .map_err(|err| db_err(&err))?
        };
        let Some((mut scenario, steps_json)) = row else {
            return Ok(None);
        };
        scenario.steps = steps_from_json(&steps_json)?;
        Ok(Some(scenario))
    }

    /// Lists scenarios under a project (without steps).
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn list_scenarios(
        &self,
        start: u32,
        count: u32,
        project_id: &ObjectId,
    ) -> Result<Vec<Scenario>, SqliteStoreError> {
        let guard = self.conn()?;
        let mut stmt = guard
            .prepare(
                "SELECT id, project_id, scope_id, name, steps FROM scenarios \
                 WHERE deleted_at IS NULL AND project_id = ?3 \
                 ORDER BY name ASC LIMIT ?1 OFFSET ?2",
            )
            .map_err(|err| db_err(&err))?;
        let rows = stmt
            .query_map(params![count, start, project_id.as_str()], scenario_from_row)
            .map_err(|err| db_err(&err))?;
        let mut scenarios = Vec::new();
        for row in rows {
            let (scenario, _steps_json) = row.map_err(|err| db_err(&err))?;
            scenarios.push(scenario);
        }
        Ok(scenarios)
    }

    /// Fetches the scenarios with the given ids, skipping deleted rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn scenarios_by_ids(
        &self,
        ids: &[ObjectId],
    ) -> Result<Vec<Scenario>, SqliteStoreError> {
        let mut scenarios = Vec::new();
        for id in ids {
            if let Some(scenario) = self.get_scenario(id)? {
                scenarios.push(scenario);
            }
        }
        Ok(scenarios)
    }

    /// Updates a scenario's name, scope, and steps.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn update_scenario(
        &self,
        id: &ObjectId,
        name: &str,
        scope_id: &ObjectId,
        steps: &[Step],
    ) -> Result<(), SqliteStoreError> {
        let steps_json = steps_to_json(steps)?;
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE scenarios SET name = ?1, steps = ?2, scope_id = ?3, \
                 updated_at = datetime('now') WHERE id = ?4",
                params![name, steps_json, scope_id.as_str(), id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Soft-deletes a scenario.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn delete_scenario(&self, id: &ObjectId) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE scenarios SET deleted_at = datetime('now') WHERE id = ?1",
                params![id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

/// Maps a session row (id, project_id, author_id, version, description,
/// status, scenarios, created_at).
fn session_from_row(row: &Row<'_>) -> rusqlite::Result<(Session, String)> {
    let session = Session {
        id: Some(ObjectId::new(row.get::<_, String>(0)?)),
        project_id: Some(ObjectId::new(row.get::<_, String>(1)?)),
        author_id: Some(UserId::new(row.get::<_, String>(2)?)),
        version: row.get(3)?,
        description: row.get(4)?,
        status: row.get(5)?,
        scenario_ids: Vec::new(),
        created_at: row.get(7)?,
    };
    let ids_json: String = row.get(6)?;
    Ok((session, ids_json))
}

/// Session columns selected for every read.
const SESSION_COLUMNS: &str =
    "id, project_id, author_id, version, description, status, scenarios, created_at";

impl SqliteStore {
    /// Creates a session over a set of scenarios.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn create_session(
        &self,
        project_id: &ObjectId,
        author_id: &UserId,
        version: &str,
        description: &str,
        scenario_ids: &[ObjectId],
    ) -> Result<Session, SqliteStoreError> {
        let id = Self::mint_id();
        let refs: Vec<&str> = scenario_ids.iter().map(ObjectId::as_str).collect();
        let ids_json = ids_to_json(&refs)?;
        let guard = self.conn()?;
        guard
            .execute(
                "INSERT INTO sessions (id, project_id, author_id, version, description, \
                 scenarios) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    project_id.as_str(),
                    author_id.as_str(),
                    version,
                    description,
                    ids_json
                ],
            )
            .map_err(|err| db_err(&err))?;
        drop(guard);
        self.get_session(&ObjectId::new(id.clone()))?.ok_or_else(|| {
            SqliteStoreError::Invalid(format!("session row missing after insert for {id}"))
        })
    }

    /// Fetches a session.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn get_session(&self, id: &ObjectId) -> Result<Option<Session>, SqliteStoreError> {
        let row = {
            let guard = self.conn()?;
            guard
                .query_row(
                    &format!(
                        "SELECT {SESSION_COLUMNS} FROM sessions \
                         WHERE id = ?1 AND deleted_at IS NULL"
                    ),
                    params![id.as_str()],
                    session_from_row,
                )
                .optional()
                .map_err(|err| db_err(&err))?
        };
        let Some((mut session, ids_json)) = row else {
            return Ok(None);
        };
        session.scenario_ids = ids_from_json(&ids_json)?.into_iter().map(ObjectId::new).collect();
        Ok(Some(session))
    }

    /// Lists sessions under a project, excluding failed ones.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn list_sessions(
        &self,
        start: u32,
        count: u32,
        project_id: &ObjectId,
    ) -> Result<Vec<Session>, SqliteStoreError> {
        let rows = {
            let guard = self.conn()?;
            let mut stmt = guard
                .prepare(&format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions \
                     WHERE deleted_at IS NULL AND project_id = ?3 AND status != 3 \
                     ORDER BY created_at ASC LIMIT ?1 OFFSET ?2"
                ))
                .map_err(|err| db_err(&err))?;
            let mapped = stmt
                .query_map(params![count, start, project_id.as_str()], session_from_row)
                .map_err(|err| db_err(&err))?;
            mapped.collect::<Result<Vec<_>, _>>().map_err(|err| db_err(&err))?
        };
        let mut sessions = Vec::new();
        for (mut session, ids_json) in rows {
            session.scenario_ids =
                ids_from_json(&ids_json)?.into_iter().map(ObjectId::new).collect();
            sessions.push(session);
        }
        Ok(sessions)
    }

    /// Updates a session's metadata, status, and membership.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn update_session(
        &self,
        id: &ObjectId,
        version: &str,
        description: &str,
        status: i64,
        scenario_ids: &[ObjectId],
    ) -> Result<(), SqliteStoreError> {
        let refs: Vec<&str> = scenario_ids.iter().map(ObjectId::as_str).collect();
        let ids_json = ids_to_json(&refs)?;
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE sessions SET version = ?1, description = ?2, status = ?3, \
                 scenarios = ?4, updated_at = datetime('now') WHERE id = ?5",
                params![version, description, status, ids_json, id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Soft-deletes a session.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn delete_session(&self, id: &ObjectId) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE sessions SET deleted_at = datetime('now') WHERE id = ?1",
                params![id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Resets a session by failing and retiring all of its tests.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn reset_session(&self, id: &ObjectId) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE tests SET status = 3, deleted_at = datetime('now') \
                 WHERE session_id = ?1",
                params![id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Test Runs
// ============================================================================

/// Maps a test row (id, assignee_id, assignee email, scenario_id, steps,
/// status, notes, assists, created_at).
fn test_from_row(row: &Row<'_>) -> rusqlite::Result<(TestRun, String, String)> {
    let test = TestRun {
        id: Some(ObjectId::new(row.get::<_, String>(0)?)),
        session_id: None,
        assignee_id: Some(UserId::new(row.get::<_, String>(1)?)),
        assignee_name: Some(row.get(2)?),
        scenario_id: Some(ObjectId::new(row.get::<_, String>(3)?)),
        steps: Vec::new(),
        status: row.get(5)?,
        notes: row.get(6)?,
        assist_ids: Vec::new(),
        created_at: row.get(8)?,
    };
    let steps_json: String = row.get(4)?;
    let assists_json: String = row.get(7)?;
    Ok((test, steps_json, assists_json))
}

/// Test columns (joined with the assignee's user row).
const TEST_COLUMNS: &str = "t.id, u.id, u.email_address, t.scenario_id, t.steps, t.status, \
                            t.notes, t.assists, t.created_at";

/// Hydrates the JSON columns of a mapped test row.
fn hydrate_test(
    (mut test, steps_json, assists_json): (TestRun, String, String),
    session_id: &ObjectId,
) -> Result<TestRun, SqliteStoreError> {
    test.session_id = Some(session_id.clone());
    test.steps = steps_from_json(&steps_json)?;
    test.assist_ids = ids_from_json(&assists_json)?.into_iter().map(UserId::new).collect();
    Ok(test)
}

impl SqliteStore {
    /// Creates a test run, retiring the assignee's previous run for the same
    /// scenario and session in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the transaction fails.
    pub fn create_test(
        &self,
        session_id: &ObjectId,
        assignee_id: &UserId,
        scenario_id: &ObjectId,
        steps: &[Step],
        status: i64,
    ) -> Result<ObjectId, SqliteStoreError> {
        let id = Self::mint_id();
        let steps_json = steps_to_json(steps)?;
        let mut guard = self.conn()?;
        let tx = guard.transaction().map_err(|err| db_err(&err))?;
        tx.execute(
            "UPDATE tests SET status = 3, deleted_at = datetime('now') \
             WHERE assignee_id = ?1 AND scenario_id = ?2 AND session_id = ?3",
            params![assignee_id.as_str(), scenario_id.as_str(), session_id.as_str()],
        )
        .map_err(|err| db_err(&err))?;
        tx.execute(
            "INSERT INTO tests (id, session_id, assignee_id, scenario_id, steps, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                session_id.as_str(),
                assignee_id.as_str(),
                scenario_id.as_str(),
                steps_json,
                status
            ],
        )
        .map_err(|err| db_err(&err))?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(ObjectId::new(id))
    }

    /// Fetches a test run by id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn get_test(&self, id: &ObjectId) -> Result<Option<TestRun>, SqliteStoreError> {
        let row = {
            let guard = self.conn()?;
            guard
                .query_row(
                    &format!(
                        "SELECT {TEST_COLUMNS}, t.session_id FROM users u, tests t \
                         WHERE u.id = t.assignee_id AND t.id = ?1 AND t.deleted_at IS NULL"
                    ),
                    params![id.as_str()],
                    |row| {
                        let mapped = test_from_row(row)?;
                        let session_id: String = row.get(9)?;
                        Ok((mapped, session_id))
                    },
                )
                .optional()
                .map_err(|err| db_err(&err))?
        };
        let Some((mapped, session_id)) = row else {
            return Ok(None);
        };
        Ok(Some(hydrate_test(mapped, &ObjectId::new(session_id))?))
    }

    /// Finds another user's active run for a scenario in a session.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn active_test_by_other(
        &self,
        session_id: &ObjectId,
        scenario_id: &ObjectId,
        assignee_id: &UserId,
    ) -> Result<Option<TestRun>, SqliteStoreError> {
        let row = {
            let guard = self.conn()?;
            guard
                .query_row(
                    &format!(
                        "SELECT {TEST_COLUMNS} FROM users u, tests t \
                         WHERE u.id = t.assignee_id AND t.scenario_id = ?1 AND u.id != ?2 \
                           AND t.status = 1 AND t.session_id = ?3 AND t.deleted_at IS NULL"
                    ),
                    params![scenario_id.as_str(), assignee_id.as_str(), session_id.as_str()],
                    test_from_row,
                )
                .optional()
                .map_err(|err| db_err(&err))?
        };
        row.map(|mapped| hydrate_test(mapped, session_id)).transpose()
    }

    /// Finds the assignee's own active run for a scenario in a session.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn active_test_by_assignee(
        &self,
        session_id: &ObjectId,
        scenario_id: &ObjectId,
        assignee_id: &UserId,
    ) -> Result<Option<TestRun>, SqliteStoreError> {
        let row = {
            let guard = self.conn()?;
            guard
                .query_row(
                    &format!(
                        "SELECT {TEST_COLUMNS} FROM users u, tests t \
                         WHERE u.id = t.assignee_id AND t.scenario_id = ?1 AND u.id = ?2 \
                           AND t.status = 1 AND t.session_id = ?3 AND t.deleted_at IS NULL"
                    ),
                    params![scenario_id.as_str(), assignee_id.as_str(), session_id.as_str()],
                    test_from_row,
                )
                .optional()
                .map_err(|err| db_err(&err))?
        };
        row.map(|mapped| hydrate_test(mapped, session_id)).transpose()
    }

    /// Lists the test runs of a session with assignee emails.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn list_tests(
        &self,
        start: u32,
        count: u32,
        session_id: &ObjectId,
    ) -> Result<Vec<TestRun>, SqliteStoreError> {
        let rows = {
            let guard = self.conn()?;
            let mut stmt = guard
                .prepare(&format!(
                    "SELECT {TEST_COLUMNS} FROM users u, tests t \
                     WHERE u.id = t.assignee_id AND t.session_id = ?3 \
                       AND t.deleted_at IS NULL \
                     LIMIT ?1 OFFSET ?2"
                ))
                .map_err(|err| db_err(&err))?;
            let mapped = stmt
                .query_map(params![count, start, session_id.as_str()], test_from_row)
                .map_err(|err| db_err(&err))?;
            mapped.collect::<Result<Vec<_>, _>>().map_err(|err| db_err(&err))?
        };
        rows.into_iter().map(|mapped| hydrate_test(mapped, session_id)).collect()
    }

    /// Updates a test run's steps, status, notes, and assists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn update_test(
        &self,
        id: &ObjectId,
        steps: &[Step],
        status: i64,
        notes: &str,
        assist_ids: &[UserId],
    ) -> Result<(), SqliteStoreError> {
        let steps_json = steps_to_json(steps)?;
        let assists: Vec<&str> = assist_ids.iter().map(UserId::as_str).collect();
        let assists_json = ids_to_json(&assists)?;
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE tests SET steps = ?1, status = ?2, notes = ?3, assists = ?4, \
                 updated_at = datetime('now') WHERE id = ?5",
                params![steps_json, status, notes, assists_json, id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Fails and retires a test run.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on datastore failure.
    pub fn delete_test(&self, id: &ObjectId) -> Result<(), SqliteStoreError> {
        let guard = self.conn()?;
        guard
            .execute(
                "UPDATE tests SET status = 3, deleted_at = datetime('now') WHERE id = ?1",
                params![id.as_str()],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }
}
