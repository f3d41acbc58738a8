//! SurrealDB implementation of [`WorkflowRepository`].
//!
//! Aggregate creation (workflow + ordered task chain + access grants)
//! is issued as a single BEGIN/COMMIT TRANSACTION batch. All record
//! ids are generated in Rust up front so each task's `parent_task_id`
//! can reference the previous task before anything is written; a
//! failure anywhere in the batch rolls back the whole aggregate.

use chrono::{DateTime, Utc};
use flowline_core::error::FlowlineResult;
use flowline_core::models::access::WorkflowAccess;
use flowline_core::models::task::{Task, TaskStatus};
use flowline_core::models::workflow::{CreateWorkflowAggregate, UpdateWorkflow, Workflow};
use flowline_core::repository::WorkflowRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct WorkflowRow {
    template_id: String,
    name: String,
    creator_id: String,
    start_at: DateTime<Utc>,
    complete_at: Option<DateTime<Utc>>,
    duration_secs: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WorkflowRow {
    fn into_workflow(self, id: Uuid) -> Result<Workflow, DbError> {
        let template_id = Uuid::parse_str(&self.template_id)
            .map_err(|e| DbError::Migration(format!("invalid template UUID: {e}")))?;
        let creator_id = Uuid::parse_str(&self.creator_id)
            .map_err(|e| DbError::Migration(format!("invalid creator UUID: {e}")))?;
        Ok(Workflow {
            id,
            template_id,
            name: self.name,
            creator_id,
            start_at: self.start_at,
            complete_at: self.complete_at,
            duration_secs: self.duration_secs,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Task row for aggregate re-reads (the task repository owns the
/// general-purpose queries).
#[derive(Debug, SurrealValue)]
struct TaskRow {
    workflow_id: String,
    title: String,
    description: String,
    parent_task_id: Option<String>,
    position: u32,
    assignee_id: String,
    completed_at: Option<DateTime<Utc>>,
    start_delta_secs: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_task_status(s: &str) -> Result<TaskStatus, DbError> {
    match s {
        "Upcoming" => Ok(TaskStatus::Upcoming),
        "InProgress" => Ok(TaskStatus::InProgress),
        "Completed" => Ok(TaskStatus::Completed),
        other => Err(DbError::Migration(format!("unknown task status: {other}"))),
    }
}

impl TaskRow {
    fn into_task(self, id: Uuid) -> Result<Task, DbError> {
        let workflow_id = Uuid::parse_str(&self.workflow_id)
            .map_err(|e| DbError::Migration(format!("invalid workflow UUID: {e}")))?;
        let assignee_id = Uuid::parse_str(&self.assignee_id)
            .map_err(|e| DbError::Migration(format!("invalid assignee UUID: {e}")))?;
        let parent_task_id = self
            .parent_task_id
            .map(|v| {
                Uuid::parse_str(&v)
                    .map_err(|e| DbError::Migration(format!("invalid parent task UUID: {e}")))
            })
            .transpose()?;
        Ok(Task {
            id,
            workflow_id,
            title: self.title,
            description: self.description,
            parent_task_id,
            position: self.position,
            assignee_id,
            completed_at: self.completed_at,
            start_delta_secs: self.start_delta_secs,
            status: parse_task_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Access row for aggregate re-reads.
#[derive(Debug, SurrealValue)]
struct AccessRow {
    workflow_id: String,
    employee_id: String,
    permission: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccessRow {
    fn into_access(self, id: Uuid) -> Result<WorkflowAccess, DbError> {
        let workflow_id = Uuid::parse_str(&self.workflow_id)
            .map_err(|e| DbError::Migration(format!("invalid workflow UUID: {e}")))?;
        let employee_id = Uuid::parse_str(&self.employee_id)
            .map_err(|e| DbError::Migration(format!("invalid employee UUID: {e}")))?;
        let permission = match self.permission.as_str() {
            "Read" => flowline_core::models::access::Permission::Read,
            "ReadWrite" => flowline_core::models::access::Permission::ReadWrite,
            other => {
                return Err(DbError::Migration(format!("unknown permission: {other}")));
            }
        };
        Ok(WorkflowAccess {
            id,
            workflow_id,
            employee_id,
            permission,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Workflow repository.
#[derive(Clone)]
pub struct SurrealWorkflowRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkflowRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch_task(&self, id: Uuid) -> Result<Task, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('task', $id)")
            .bind(("id", id_str.clone()))
            .await?;
        let rows: Vec<TaskRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;
        row.into_task(id)
    }

    async fn fetch_access(&self, id: Uuid) -> Result<WorkflowAccess, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('workflow_access', $id)")
            .bind(("id", id_str.clone()))
            .await?;
        let rows: Vec<AccessRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow_access".into(),
            id: id_str,
        })?;
        row.into_access(id)
    }
}

impl<C: Connection> WorkflowRepository for SurrealWorkflowRepository<C> {
    async fn create_aggregate(
        &self,
        input: CreateWorkflowAggregate,
    ) -> FlowlineResult<(Workflow, Vec<Task>, Vec<WorkflowAccess>)> {
        let workflow_id = Uuid::new_v4();
        let task_ids: Vec<Uuid> = input.tasks.iter().map(|_| Uuid::new_v4()).collect();
        let access_ids: Vec<Uuid> = input.accessors.iter().map(|_| Uuid::new_v4()).collect();

        // Assemble the whole aggregate as one transaction. Every CREATE
        // uses RETURN NONE; rows are re-read after the commit.
        let mut query = String::from("BEGIN TRANSACTION;\n");
        query.push_str(
            "CREATE type::record('workflow', $workflow_id) SET \
             template_id = $template_id, name = $name, \
             creator_id = $creator_id, start_at = $start_at, \
             complete_at = NONE, duration_secs = $duration_secs \
             RETURN NONE;\n",
        );
        for (i, _) in input.tasks.iter().enumerate() {
            // Chain link: each task points at the previously created
            // task; the first has no parent.
            let parent = if i == 0 {
                "NONE".to_string()
            } else {
                format!("$task_{}_id", i - 1)
            };
            query.push_str(&format!(
                "CREATE type::record('task', $task_{i}_id) SET \
                 workflow_id = $workflow_id, title = $task_{i}_title, \
                 description = $task_{i}_description, \
                 parent_task_id = {parent}, position = {i}, \
                 assignee_id = $task_{i}_assignee_id, \
                 completed_at = NONE, \
                 start_delta_secs = $task_{i}_start_delta_secs, \
                 status = 'Upcoming' RETURN NONE;\n",
            ));
        }
        for (i, _) in input.accessors.iter().enumerate() {
            query.push_str(&format!(
                "CREATE type::record('workflow_access', $access_{i}_id) SET \
                 workflow_id = $workflow_id, \
                 employee_id = $access_{i}_employee_id, \
                 permission = $access_{i}_permission RETURN NONE;\n",
            ));
        }
        query.push_str("COMMIT TRANSACTION;");

        let mut builder = self
            .db
            .query(query)
            .bind(("workflow_id", workflow_id.to_string()))
            .bind(("template_id", input.workflow.template_id.to_string()))
            .bind(("name", input.workflow.name))
            .bind(("creator_id", input.workflow.creator_id.to_string()))
            .bind(("start_at", input.workflow.start_at))
            .bind(("duration_secs", input.workflow.duration_secs));

        for (i, task) in input.tasks.into_iter().enumerate() {
            builder = builder
                .bind((format!("task_{i}_id"), task_ids[i].to_string()))
                .bind((format!("task_{i}_title"), task.title))
                .bind((format!("task_{i}_description"), task.description))
                .bind((
                    format!("task_{i}_assignee_id"),
                    task.assignee_id.to_string(),
                ))
                .bind((format!("task_{i}_start_delta_secs"), task.start_delta_secs));
        }
        for (i, accessor) in input.accessors.into_iter().enumerate() {
            let permission = match accessor.permission {
                flowline_core::models::access::Permission::Read => "Read",
                flowline_core::models::access::Permission::ReadWrite => "ReadWrite",
            };
            builder = builder
                .bind((format!("access_{i}_id"), access_ids[i].to_string()))
                .bind((
                    format!("access_{i}_employee_id"),
                    accessor.employee_id.to_string(),
                ))
                .bind((format!("access_{i}_permission"), permission.to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        // Re-read the committed rows, preserving submitted order.
        let workflow = self.get_by_id(workflow_id).await?;
        let mut tasks = Vec::with_capacity(task_ids.len());
        for id in task_ids {
            tasks.push(self.fetch_task(id).await?);
        }
        let mut grants = Vec::with_capacity(access_ids.len());
        for id in access_ids {
            grants.push(self.fetch_access(id).await?);
        }

        Ok((workflow, tasks, grants))
    }

    async fn get_by_id(&self, id: Uuid) -> FlowlineResult<Workflow> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('workflow', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkflowRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow".into(),
            id: id_str,
        })?;

        Ok(row.into_workflow(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateWorkflow) -> FlowlineResult<Workflow> {
        let id_str = id.to_string();

        // template_id and creator_id are never part of the SET clause;
        // both are immutable after creation.
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.start_at.is_some() {
            sets.push("start_at = $start_at");
        }
        if input.complete_at.is_some() {
            sets.push("complete_at = $complete_at");
        }
        if input.duration_secs.is_some() {
            sets.push("duration_secs = $duration_secs");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('workflow', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(start_at) = input.start_at {
            builder = builder.bind(("start_at", start_at));
        }
        if let Some(complete_at) = input.complete_at {
            // complete_at is Option<Option<..>>: Some(Some(v)) = set,
            // Some(None) = clear
            builder = builder.bind(("complete_at", complete_at));
        }
        if let Some(duration_secs) = input.duration_secs {
            builder = builder.bind(("duration_secs", duration_secs));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<WorkflowRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow".into(),
            id: id_str,
        })?;

        Ok(row.into_workflow(id)?)
    }
}
