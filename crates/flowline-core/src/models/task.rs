//! Task domain model.
//!
//! Tasks form a singly-linked chain within their workflow: each task
//! has at most one parent, set at creation to the previously created
//! task. `position` stores declaration order explicitly so listings do
//! not need to walk the chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Upcoming,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub title: String,
    pub description: String,
    /// The immediately preceding task in the chain; `None` for the
    /// first task of a workflow.
    pub parent_task_id: Option<Uuid>,
    /// 0-based declaration order within the workflow.
    pub position: u32,
    /// The employee this task is assigned to.
    pub assignee_id: Uuid,
    pub completed_at: Option<DateTime<Utc>>,
    /// Delay between completion of the parent task and start of this
    /// one, in whole seconds.
    pub start_delta_secs: i64,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields that can be updated on an existing task.
///
/// The chain shape (`workflow_id`, `parent_task_id`, `position`) and
/// the scheduling outputs (`completed_at`, `status`) are read-only
/// through this path.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub start_delta_secs: Option<i64>,
}
