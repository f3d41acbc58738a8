//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users (global scope, profile only; credentials live elsewhere)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Companies (global scope)
-- =======================================================================
DEFINE TABLE company SCHEMAFULL;
DEFINE FIELD name ON TABLE company TYPE string;
DEFINE FIELD status ON TABLE company TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD created_at ON TABLE company TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE company TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Employees (a user's membership within one company)
-- =======================================================================
DEFINE TABLE employee SCHEMAFULL;
DEFINE FIELD user_id ON TABLE employee TYPE string;
DEFINE FIELD company_id ON TABLE employee TYPE string;
DEFINE FIELD status ON TABLE employee TYPE string \
    ASSERT $value IN ['Active', 'Invited', 'Inactive'];
DEFINE FIELD is_admin ON TABLE employee TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_employee_user_company ON TABLE employee \
    COLUMNS user_id, company_id UNIQUE;
DEFINE INDEX idx_employee_user ON TABLE employee COLUMNS user_id;

-- =======================================================================
-- Workflow templates (immutable catalog)
-- =======================================================================
DEFINE TABLE workflow_template SCHEMAFULL;
DEFINE FIELD name ON TABLE workflow_template TYPE string;
DEFINE FIELD structure ON TABLE workflow_template TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD thumbnail ON TABLE workflow_template TYPE string;
DEFINE FIELD created_at ON TABLE workflow_template TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Workflows (owned by their creator's company through the creator)
-- =======================================================================
DEFINE TABLE workflow SCHEMAFULL;
DEFINE FIELD template_id ON TABLE workflow TYPE string;
DEFINE FIELD name ON TABLE workflow TYPE string;
DEFINE FIELD creator_id ON TABLE workflow TYPE string;
DEFINE FIELD start_at ON TABLE workflow TYPE datetime;
DEFINE FIELD complete_at ON TABLE workflow TYPE option<datetime>;
DEFINE FIELD duration_secs ON TABLE workflow TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE workflow TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE workflow TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_workflow_creator ON TABLE workflow COLUMNS creator_id;

-- =======================================================================
-- Tasks (singly-linked chain within a workflow)
-- =======================================================================
DEFINE TABLE task SCHEMAFULL;
DEFINE FIELD workflow_id ON TABLE task TYPE string;
DEFINE FIELD title ON TABLE task TYPE string;
DEFINE FIELD description ON TABLE task TYPE string DEFAULT '';
DEFINE FIELD parent_task_id ON TABLE task TYPE option<string>;
DEFINE FIELD position ON TABLE task TYPE int;
DEFINE FIELD assignee_id ON TABLE task TYPE string;
DEFINE FIELD completed_at ON TABLE task TYPE option<datetime>;
DEFINE FIELD start_delta_secs ON TABLE task TYPE int DEFAULT 0;
DEFINE FIELD status ON TABLE task TYPE string \
    ASSERT $value IN ['Upcoming', 'InProgress', 'Completed'] \
    DEFAULT 'Upcoming';
DEFINE FIELD created_at ON TABLE task TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE task TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_task_workflow ON TABLE task COLUMNS workflow_id;
DEFINE INDEX idx_task_assignee ON TABLE task COLUMNS assignee_id;

-- =======================================================================
-- Workflow access grants (read / read-write sharing)
-- =======================================================================
DEFINE TABLE workflow_access SCHEMAFULL;
DEFINE FIELD workflow_id ON TABLE workflow_access TYPE string;
DEFINE FIELD employee_id ON TABLE workflow_access TYPE string;
DEFINE FIELD permission ON TABLE workflow_access TYPE string \
    ASSERT $value IN ['Read', 'ReadWrite'] DEFAULT 'Read';
DEFINE FIELD created_at ON TABLE workflow_access TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE workflow_access TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_access_employee_workflow ON TABLE workflow_access \
    COLUMNS employee_id, workflow_id UNIQUE;
DEFINE INDEX idx_access_workflow ON TABLE workflow_access \
    COLUMNS workflow_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
