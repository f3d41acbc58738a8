//! Employee domain model.
//!
//! An employee is a user's membership record within one company,
//! carrying status and the admin flag. Lifecycle: created `Invited` on
//! invite, `Active` on acceptance, `Inactive` on removal. A user holds
//! at most one membership per company (unique index).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmployeeStatus {
    Active,
    Invited,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub status: EmployeeStatus,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new employee membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployee {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub status: EmployeeStatus,
    pub is_admin: bool,
}

/// Fields that can be updated on an existing employee membership.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateEmployee {
    pub status: Option<EmployeeStatus>,
    pub is_admin: Option<bool>,
}
