//! SurrealDB implementation of [`TemplateRepository`].
//!
//! Templates are an immutable catalog: create and read only.

use chrono::{DateTime, Utc};
use flowline_core::error::FlowlineResult;
use flowline_core::models::template::{CreateWorkflowTemplate, WorkflowTemplate};
use flowline_core::repository::{PaginatedResult, Pagination, TemplateRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TemplateRow {
    name: String,
    structure: serde_json::Value,
    thumbnail: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TemplateRowWithId {
    record_id: String,
    name: String,
    structure: serde_json::Value,
    thumbnail: String,
    created_at: DateTime<Utc>,
}

impl TemplateRow {
    fn into_template(self, id: Uuid) -> WorkflowTemplate {
        WorkflowTemplate {
            id,
            name: self.name,
            structure: self.structure,
            thumbnail: self.thumbnail,
            created_at: self.created_at,
        }
    }
}

impl TemplateRowWithId {
    fn try_into_template(self) -> Result<WorkflowTemplate, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(WorkflowTemplate {
            id,
            name: self.name,
            structure: self.structure,
            thumbnail: self.thumbnail,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the template catalog repository.
#[derive(Clone)]
pub struct SurrealTemplateRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTemplateRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TemplateRepository for SurrealTemplateRepository<C> {
    async fn create(&self, input: CreateWorkflowTemplate) -> FlowlineResult<WorkflowTemplate> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('workflow_template', $id) SET \
                 name = $name, structure = $structure, \
                 thumbnail = $thumbnail",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("structure", input.structure))
            .bind(("thumbnail", input.thumbnail))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TemplateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow_template".into(),
            id: id_str,
        })?;

        Ok(row.into_template(id))
    }

    async fn get_by_id(&self, id: Uuid) -> FlowlineResult<WorkflowTemplate> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('workflow_template', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TemplateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "workflow_template".into(),
            id: id_str,
        })?;

        Ok(row.into_template(id))
    }

    async fn list(
        &self,
        pagination: Pagination,
    ) -> FlowlineResult<PaginatedResult<WorkflowTemplate>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM workflow_template GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM workflow_template \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TemplateRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_template())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
