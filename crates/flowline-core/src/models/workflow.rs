//! Workflow domain model.
//!
//! A workflow is an instantiated unit of work derived from a template,
//! composed of an ordered task chain and access grants. The workflow
//! owns its tasks and grants (cascade delete); the template is
//! referenced, never owned. Template and creator are immutable after
//! creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::access::Permission;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    /// The template this workflow was instantiated from.
    pub template_id: Uuid,
    pub name: String,
    /// The employee who created the workflow.
    pub creator_id: Uuid,
    pub start_at: DateTime<Utc>,
    /// Time when the workflow completed.
    pub complete_at: Option<DateTime<Utc>>,
    /// Expected completion duration in whole seconds.
    pub duration_secs: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new workflow row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflow {
    pub template_id: Uuid,
    pub name: String,
    pub creator_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub duration_secs: i64,
}

/// Fields that can be updated on an existing workflow.
///
/// `template_id` and `creator_id` are deliberately absent; both are
/// immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateWorkflow {
    pub name: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub complete_at: Option<Option<DateTime<Utc>>>,
    pub duration_secs: Option<i64>,
}

/// A task descriptor inside an aggregate-create request.
///
/// Chain links and positions are derived from list order by the
/// storage layer: task `i` gets `parent_task_id` = task `i-1` (none for
/// the first) and `position = i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAggregateTask {
    pub title: String,
    pub description: String,
    pub assignee_id: Uuid,
    /// Delay between completion of the parent task and start of this
    /// one, in whole seconds.
    pub start_delta_secs: i64,
}

/// An access descriptor inside an aggregate-create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAggregateAccess {
    pub employee_id: Uuid,
    pub permission: Permission,
}

/// The full input of an atomic workflow-aggregate creation: one
/// workflow row, its ordered task chain, and its access grants.
#[derive(Debug, Clone)]
pub struct CreateWorkflowAggregate {
    pub workflow: CreateWorkflow,
    pub tasks: Vec<CreateAggregateTask>,
    pub accessors: Vec<CreateAggregateAccess>,
}
