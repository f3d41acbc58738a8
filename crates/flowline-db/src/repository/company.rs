//! SurrealDB implementation of [`CompanyRepository`].

use chrono::{DateTime, Utc};
use flowline_core::error::FlowlineResult;
use flowline_core::models::company::{Company, CompanyStatus, CreateCompany, UpdateCompany};
use flowline_core::repository::CompanyRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CompanyRow {
    name: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<CompanyStatus, DbError> {
    match s {
        "Active" => Ok(CompanyStatus::Active),
        "Inactive" => Ok(CompanyStatus::Inactive),
        other => Err(DbError::Migration(format!(
            "unknown company status: {other}"
        ))),
    }
}

fn status_to_string(s: &CompanyStatus) -> &'static str {
    match s {
        CompanyStatus::Active => "Active",
        CompanyStatus::Inactive => "Inactive",
    }
}

impl CompanyRow {
    fn into_company(self, id: Uuid) -> Result<Company, DbError> {
        Ok(Company {
            id,
            name: self.name,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Company repository.
#[derive(Clone)]
pub struct SurrealCompanyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCompanyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CompanyRepository for SurrealCompanyRepository<C> {
    async fn create(&self, input: CreateCompany) -> FlowlineResult<Company> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // New companies start Active.
        let result = self
            .db
            .query(
                "CREATE type::record('company', $id) SET \
                 name = $name, status = 'Active'",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "company".into(),
            id: id_str,
        })?;

        Ok(row.into_company(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> FlowlineResult<Company> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('company', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "company".into(),
            id: id_str,
        })?;

        Ok(row.into_company(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateCompany) -> FlowlineResult<Company> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('company', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "company".into(),
            id: id_str,
        })?;

        Ok(row.into_company(id)?)
    }
}
