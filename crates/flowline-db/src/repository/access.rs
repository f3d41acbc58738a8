//! SurrealDB implementation of [`WorkflowAccessRepository`].
//!
//! One grant per (employee, workflow); creation checks for an existing
//! record first, with the unique index as backstop.

use chrono::{DateTime, Utc};
use flowline_core::error::FlowlineResult;
use flowline_core::models::access::{
    CreateWorkflowAccess, Permission, UpdateWorkflowAccess, WorkflowAccess,
};
use flowline_core::repository::WorkflowAccessRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AccessRow {
    workflow_id: String,
    employee_id: String,
    permission: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AccessRowWithId {
    record_id: String,
    workflow_id: String,
    employee_id: String,
    permission: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_permission(s: &str) -> Result<Permission, DbError> {
    match s {
        "Read" => Ok(Permission::Read),
        "ReadWrite" => Ok(Permission::ReadWrite),
        other => Err(DbError::Migration(format!("unknown permission: {other}"))),
    }
}

fn permission_to_string(p: &Permission) -> &'static str {
    match p {
        Permission::Read => "Read",
        Permission::ReadWrite => "ReadWrite",
    }
}

impl AccessRow {
    fn into_access(self, id: Uuid) -> Result<WorkflowAccess, DbError> {
        let workflow_id = Uuid::parse_str(&self.workflow_id)
            .map_err(|e| DbError::Migration(format!("invalid workflow UUID: {e}")))?;
        let employee_id = Uuid::parse_str(&self.employee_id)
            .map_err(|e| DbError::Migration(format!("invalid employee UUID: {e}")))?;
        Ok(WorkflowAccess {
            id,
            workflow_id,
            employee_id,
            permission: parse_permission(&self.permission)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl AccessRowWithId {
    fn try_into_access(self) -> Result<WorkflowAccess, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = AccessRow {
            workflow_id: self.workflow_id,
            employee_id: self.employee_id,
            permission: self.permission,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_access(id)
    }
}

/// SurrealDB implementation of the workflow access repository.
#[derive(Clone)]
pub struct SurrealWorkflowAccessRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkflowAccessRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> WorkflowAccessRepository for SurrealWorkflowAccessRepository<C> {
    async fn create(&self, input: CreateWorkflowAccess) -> FlowlineResult<WorkflowAccess> {
        let workflow_id_str = input.workflow_id.to_string();
        let employee_id_str = input.employee_id.to_string();

        // One grant per (employee, workflow); the unique index backstops
        // this check.
        let mut existing = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workflow_access \
                 WHERE workflow_id = $workflow_id \
                 AND employee_id = $employee_id",
            )
            .bind(("workflow_id", workflow_id_str.clone()))
            .bind(("employee_id", employee_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<AccessRowWithId> = existing.take(0).map_err(DbError::from)?;
        if !rows.is_empty() {
            return Err(DbError::AlreadyExists {
                entity: "workflow_access".into(),
            }
            .into());
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('workflow_access', $id) SET \
                 workflow_id = $workflow_id, \
                 employee_id = $employee_id, \
                 permission = $permission",
            )
            .bind(("id", id_str.clone()))
            .bind(("workflow_id", workflow_id_str))
            .bind(("employee_id", employee_id_str))
            .bind((
                "permission",
                permission_to_string(&input.permission).to_string(),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<AccessRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow_access".into(),
            id: id_str,
        })?;

        Ok(row.into_access(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> FlowlineResult<WorkflowAccess> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('workflow_access', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow_access".into(),
            id: id_str,
        })?;

        Ok(row.into_access(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateWorkflowAccess) -> FlowlineResult<WorkflowAccess> {
        let id_str = id.to_string();

        // Only the permission is mutable; workflow and employee are
        // fixed at grant time.
        let mut sets = Vec::new();
        if input.permission.is_some() {
            sets.push("permission = $permission");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('workflow_access', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(ref permission) = input.permission {
            builder = builder.bind(("permission", permission_to_string(permission).to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<AccessRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow_access".into(),
            id: id_str,
        })?;

        Ok(row.into_access(id)?)
    }

    async fn list_by_workflow(&self, workflow_id: Uuid) -> FlowlineResult<Vec<WorkflowAccess>> {
        let workflow_id_str = workflow_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workflow_access \
                 WHERE workflow_id = $workflow_id \
                 ORDER BY created_at ASC",
            )
            .bind(("workflow_id", workflow_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessRowWithId> = result.take(0).map_err(DbError::from)?;

        let grants = rows
            .into_iter()
            .map(|row| row.try_into_access())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(grants)
    }

    async fn get_by_workflow_and_employee(
        &self,
        workflow_id: Uuid,
        employee_id: Uuid,
    ) -> FlowlineResult<WorkflowAccess> {
        let workflow_id_str = workflow_id.to_string();
        let employee_id_str = employee_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workflow_access \
                 WHERE workflow_id = $workflow_id \
                 AND employee_id = $employee_id",
            )
            .bind(("workflow_id", workflow_id_str.clone()))
            .bind(("employee_id", employee_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow_access".into(),
            id: format!("workflow={workflow_id_str} employee={employee_id_str}"),
        })?;

        Ok(row.try_into_access()?)
    }
}
