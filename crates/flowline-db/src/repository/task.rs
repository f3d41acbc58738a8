//! SurrealDB implementation of [`TaskRepository`].
//!
//! Tasks are only ever created through the workflow aggregate
//! transaction; this repository covers lookup and field updates.

use chrono::{DateTime, Utc};
use flowline_core::error::FlowlineResult;
use flowline_core::models::task::{Task, TaskStatus, UpdateTask};
use flowline_core::repository::TaskRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
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

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TaskRowWithId {
    record_id: String,
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

fn parse_status(s: &str) -> Result<TaskStatus, DbError> {
    match s {
        "Upcoming" => Ok(TaskStatus::Upcoming),
        "InProgress" => Ok(TaskStatus::InProgress),
        "Completed" => Ok(TaskStatus::Completed),
        other => Err(DbError::Migration(format!("unknown task status: {other}"))),
    }
}

fn parse_optional_uuid(s: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(&v).map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
    })
    .transpose()
}

impl TaskRow {
    fn into_task(self, id: Uuid) -> Result<Task, DbError> {
        let workflow_id = Uuid::parse_str(&self.workflow_id)
            .map_err(|e| DbError::Migration(format!("invalid workflow UUID: {e}")))?;
        let assignee_id = Uuid::parse_str(&self.assignee_id)
            .map_err(|e| DbError::Migration(format!("invalid assignee UUID: {e}")))?;
        Ok(Task {
            id,
            workflow_id,
            title: self.title,
            description: self.description,
            parent_task_id: parse_optional_uuid(self.parent_task_id, "parent task")?,
            position: self.position,
            assignee_id,
            completed_at: self.completed_at,
            start_delta_secs: self.start_delta_secs,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TaskRowWithId {
    fn try_into_task(self) -> Result<Task, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let row = TaskRow {
            workflow_id: self.workflow_id,
            title: self.title,
            description: self.description,
            parent_task_id: self.parent_task_id,
            position: self.position,
            assignee_id: self.assignee_id,
            completed_at: self.completed_at,
            start_delta_secs: self.start_delta_secs,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_task(id)
    }
}

/// SurrealDB implementation of the Task repository.
#[derive(Clone)]
pub struct SurrealTaskRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTaskRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TaskRepository for SurrealTaskRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> FlowlineResult<Task> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('task', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateTask) -> FlowlineResult<Task> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.assignee_id.is_some() {
            sets.push("assignee_id = $assignee_id");
        }
        if input.start_delta_secs.is_some() {
            sets.push("start_delta_secs = $start_delta_secs");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('task', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(assignee_id) = input.assignee_id {
            builder = builder.bind(("assignee_id", assignee_id.to_string()));
        }
        if let Some(start_delta_secs) = input.start_delta_secs {
            builder = builder.bind(("start_delta_secs", start_delta_secs));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn list_by_workflow(&self, workflow_id: Uuid) -> FlowlineResult<Vec<Task>> {
        let workflow_id_str = workflow_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM task \
                 WHERE workflow_id = $workflow_id \
                 ORDER BY position ASC",
            )
            .bind(("workflow_id", workflow_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRowWithId> = result.take(0).map_err(DbError::from)?;

        let tasks = rows
            .into_iter()
            .map(|row| row.try_into_task())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(tasks)
    }
}
