//! Workflow access grant domain model.
//!
//! A grant gives one employee read or read-write visibility of one
//! workflow. Unique per (employee, workflow); the creator never holds a
//! grant on their own workflow, since creator rights are implicit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Permission {
    Read,
    ReadWrite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowAccess {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub employee_id: Uuid,
    pub permission: Permission,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new access grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflowAccess {
    pub workflow_id: Uuid,
    pub employee_id: Uuid,
    pub permission: Permission,
}

/// Fields that can be updated on an existing access grant.
///
/// `workflow_id` and `employee_id` are immutable after grant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateWorkflowAccess {
    pub permission: Option<Permission>,
}
