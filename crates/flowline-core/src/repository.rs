//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Lookups return
//! [`FlowlineError::NotFound`](crate::error::FlowlineError) when no row
//! matches; callers that treat absence as a normal outcome match on
//! that variant.

use uuid::Uuid;

use crate::error::FlowlineResult;
use crate::models::{
    access::{CreateWorkflowAccess, UpdateWorkflowAccess, WorkflowAccess},
    company::{Company, CreateCompany, UpdateCompany},
    employee::{CreateEmployee, Employee, UpdateEmployee},
    task::{Task, UpdateTask},
    template::{CreateWorkflowTemplate, WorkflowTemplate},
    user::{CreateUser, User},
    workflow::{CreateWorkflowAggregate, UpdateWorkflow, Workflow},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Identity & membership
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = FlowlineResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FlowlineResult<User>> + Send;
}

pub trait CompanyRepository: Send + Sync {
    fn create(&self, input: CreateCompany) -> impl Future<Output = FlowlineResult<Company>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FlowlineResult<Company>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateCompany,
    ) -> impl Future<Output = FlowlineResult<Company>> + Send;
}

pub trait EmployeeRepository: Send + Sync {
    /// Create a membership. Fails with `AlreadyExists` when the user
    /// already has a membership in the same company.
    fn create(
        &self,
        input: CreateEmployee,
    ) -> impl Future<Output = FlowlineResult<Employee>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FlowlineResult<Employee>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateEmployee,
    ) -> impl Future<Output = FlowlineResult<Employee>> + Send;
    /// All membership records of one user, across companies.
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = FlowlineResult<Vec<Employee>>> + Send;
    /// The single membership of a user within one company.
    fn get_by_user_and_company(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> impl Future<Output = FlowlineResult<Employee>> + Send;
}

// ---------------------------------------------------------------------------
// Template catalog
// ---------------------------------------------------------------------------

pub trait TemplateRepository: Send + Sync {
    /// Create a catalog entry. Administrative tooling only: there is
    /// no update or delete, and templates referenced by workflows are
    /// protected.
    fn create(
        &self,
        input: CreateWorkflowTemplate,
    ) -> impl Future<Output = FlowlineResult<WorkflowTemplate>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FlowlineResult<WorkflowTemplate>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = FlowlineResult<PaginatedResult<WorkflowTemplate>>> + Send;
}

// ---------------------------------------------------------------------------
// Workflow aggregate
// ---------------------------------------------------------------------------

pub trait WorkflowRepository: Send + Sync {
    /// Persist a workflow, its ordered task chain, and its access
    /// grants as one all-or-nothing transaction.
    ///
    /// Tasks are created in list order: task `i` gets
    /// `parent_task_id` = task `i-1` (`None` for the first) and
    /// `position = i`. Returned tasks and grants preserve the
    /// submitted order.
    fn create_aggregate(
        &self,
        input: CreateWorkflowAggregate,
    ) -> impl Future<Output = FlowlineResult<(Workflow, Vec<Task>, Vec<WorkflowAccess>)>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FlowlineResult<Workflow>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateWorkflow,
    ) -> impl Future<Output = FlowlineResult<Workflow>> + Send;
}

pub trait TaskRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FlowlineResult<Task>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTask,
    ) -> impl Future<Output = FlowlineResult<Task>> + Send;
    /// All tasks of a workflow, ordered by chain position.
    fn list_by_workflow(
        &self,
        workflow_id: Uuid,
    ) -> impl Future<Output = FlowlineResult<Vec<Task>>> + Send;
}

pub trait WorkflowAccessRepository: Send + Sync {
    /// Create a grant. Fails with `AlreadyExists` when the employee
    /// already holds a grant on the same workflow.
    fn create(
        &self,
        input: CreateWorkflowAccess,
    ) -> impl Future<Output = FlowlineResult<WorkflowAccess>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FlowlineResult<WorkflowAccess>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateWorkflowAccess,
    ) -> impl Future<Output = FlowlineResult<WorkflowAccess>> + Send;
    fn list_by_workflow(
        &self,
        workflow_id: Uuid,
    ) -> impl Future<Output = FlowlineResult<Vec<WorkflowAccess>>> + Send;
    /// The grant held by one employee on one workflow.
    fn get_by_workflow_and_employee(
        &self,
        workflow_id: Uuid,
        employee_id: Uuid,
    ) -> impl Future<Output = FlowlineResult<WorkflowAccess>> + Send;
}
