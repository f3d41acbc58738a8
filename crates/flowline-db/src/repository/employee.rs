//! SurrealDB implementation of [`EmployeeRepository`].
//!
//! A user holds at most one membership per company; creation checks
//! for an existing record first, with the unique index as backstop.

use chrono::{DateTime, Utc};
use flowline_core::error::FlowlineResult;
use flowline_core::models::employee::{CreateEmployee, Employee, EmployeeStatus, UpdateEmployee};
use flowline_core::repository::EmployeeRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct EmployeeRow {
    user_id: String,
    company_id: String,
    status: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct EmployeeRowWithId {
    record_id: String,
    user_id: String,
    company_id: String,
    status: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<EmployeeStatus, DbError> {
    match s {
        "Active" => Ok(EmployeeStatus::Active),
        "Invited" => Ok(EmployeeStatus::Invited),
        "Inactive" => Ok(EmployeeStatus::Inactive),
        other => Err(DbError::Migration(format!(
            "unknown employee status: {other}"
        ))),
    }
}

fn status_to_string(s: &EmployeeStatus) -> &'static str {
    match s {
        EmployeeStatus::Active => "Active",
        EmployeeStatus::Invited => "Invited",
        EmployeeStatus::Inactive => "Inactive",
    }
}

impl EmployeeRow {
    fn into_employee(self, id: Uuid) -> Result<Employee, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        let company_id = Uuid::parse_str(&self.company_id)
            .map_err(|e| DbError::Migration(format!("invalid company UUID: {e}")))?;
        Ok(Employee {
            id,
            user_id,
            company_id,
            status: parse_status(&self.status)?,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl EmployeeRowWithId {
    fn try_into_employee(self) -> Result<Employee, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        let company_id = Uuid::parse_str(&self.company_id)
            .map_err(|e| DbError::Migration(format!("invalid company UUID: {e}")))?;
        Ok(Employee {
            id,
            user_id,
            company_id,
            status: parse_status(&self.status)?,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Employee repository.
#[derive(Clone)]
pub struct SurrealEmployeeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEmployeeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> EmployeeRepository for SurrealEmployeeRepository<C> {
    async fn create(&self, input: CreateEmployee) -> FlowlineResult<Employee> {
        let user_id_str = input.user_id.to_string();
        let company_id_str = input.company_id.to_string();

        // One membership per (user, company); the unique index backstops
        // this check.
        let mut existing = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM employee \
                 WHERE user_id = $user_id AND company_id = $company_id",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("company_id", company_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<EmployeeRowWithId> = existing.take(0).map_err(DbError::from)?;
        if !rows.is_empty() {
            return Err(DbError::AlreadyExists {
                entity: "employee".into(),
            }
            .into());
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('employee', $id) SET \
                 user_id = $user_id, company_id = $company_id, \
                 status = $status, is_admin = $is_admin",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", user_id_str))
            .bind(("company_id", company_id_str))
            .bind(("status", status_to_string(&input.status).to_string()))
            .bind(("is_admin", input.is_admin))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        Ok(row.into_employee(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> FlowlineResult<Employee> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('employee', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        Ok(row.into_employee(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateEmployee) -> FlowlineResult<Employee> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.is_admin.is_some() {
            sets.push("is_admin = $is_admin");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('employee', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(is_admin) = input.is_admin {
            builder = builder.bind(("is_admin", is_admin));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        Ok(row.into_employee(id)?)
    }

    async fn list_for_user(&self, user_id: Uuid) -> FlowlineResult<Vec<Employee>> {
        let user_id_str = user_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM employee \
                 WHERE user_id = $user_id \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRowWithId> = result.take(0).map_err(DbError::from)?;

        let memberships = rows
            .into_iter()
            .map(|row| row.try_into_employee())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(memberships)
    }

    async fn get_by_user_and_company(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> FlowlineResult<Employee> {
        let user_id_str = user_id.to_string();
        let company_id_str = company_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM employee \
                 WHERE user_id = $user_id AND company_id = $company_id",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("company_id", company_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: format!("user={user_id_str}"),
        })?;

        Ok(row.try_into_employee()?)
    }
}
