//! Workflow aggregate orchestration — creation and update flows.
//!
//! The caller (the HTTP collaborator) resolves the requesting identity
//! to an active employee via [`AccessGuard`](crate::access::AccessGuard)
//! before calling in; every method here takes that resolved employee.
//!
//! All same-company validation happens before any write, so a rejected
//! request leaves no partial state. Notification dispatch runs after
//! the data transaction has committed and never fails the mutation.

use chrono::{DateTime, Utc};
use flowline_core::error::{FlowlineError, FlowlineResult};
use flowline_core::models::access::{
    CreateWorkflowAccess, Permission, UpdateWorkflowAccess, WorkflowAccess,
};
use flowline_core::models::employee::Employee;
use flowline_core::models::task::{Task, UpdateTask};
use flowline_core::models::workflow::{
    CreateAggregateAccess, CreateAggregateTask, CreateWorkflow, CreateWorkflowAggregate,
    UpdateWorkflow, Workflow,
};
use flowline_core::repository::{
    EmployeeRepository, TaskRepository, TemplateRepository, UserRepository,
    WorkflowAccessRepository, WorkflowRepository,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::notify::{MailContext, Mailer, NotificationEvent, build_participants};

/// Input for workflow creation: the workflow fields plus its ordered
/// task descriptors and access descriptors.
#[derive(Debug, Clone)]
pub struct CreateWorkflowInput {
    pub template_id: Uuid,
    pub name: String,
    pub start_at: DateTime<Utc>,
    pub duration_secs: i64,
    pub tasks: Vec<CreateAggregateTask>,
    pub accessors: Vec<CreateAggregateAccess>,
}

/// A created workflow with its nested structure.
#[derive(Debug, Clone)]
pub struct WorkflowAggregate {
    pub workflow: Workflow,
    pub tasks: Vec<Task>,
    pub accessors: Vec<WorkflowAccess>,
}

/// Workflow orchestration service.
///
/// Generic over repository implementations and the mail transport so
/// the orchestration has no dependency on the database crate.
pub struct WorkflowService<W, T, A, E, U, P, M>
where
    W: WorkflowRepository,
    T: TaskRepository,
    A: WorkflowAccessRepository,
    E: EmployeeRepository,
    U: UserRepository,
    P: TemplateRepository,
    M: Mailer,
{
    workflow_repo: W,
    task_repo: T,
    access_repo: A,
    employee_repo: E,
    user_repo: U,
    template_repo: P,
    mailer: M,
}

impl<W, T, A, E, U, P, M> WorkflowService<W, T, A, E, U, P, M>
where
    W: WorkflowRepository,
    T: TaskRepository,
    A: WorkflowAccessRepository,
    E: EmployeeRepository,
    U: UserRepository,
    P: TemplateRepository,
    M: Mailer,
{
    pub fn new(
        workflow_repo: W,
        task_repo: T,
        access_repo: A,
        employee_repo: E,
        user_repo: U,
        template_repo: P,
        mailer: M,
    ) -> Self {
        Self {
            workflow_repo,
            task_repo,
            access_repo,
            employee_repo,
            user_repo,
            template_repo,
            mailer,
        }
    }

    /// Create a workflow with its nested task chain and access grants.
    ///
    /// The creator is the caller's resolved active employee. Tasks are
    /// chained in submitted order; access entries naming the creator
    /// are skipped (creator rights are implicit).
    pub async fn create_workflow(
        &self,
        creator: &Employee,
        input: CreateWorkflowInput,
    ) -> FlowlineResult<WorkflowAggregate> {
        // 1. The referenced template must exist.
        self.template_repo.get_by_id(input.template_id).await?;

        // 2. Validate company invariants before any write: every
        //    assignee and every grantee must share the creator's
        //    company.
        for task in &input.tasks {
            let assignee = self.employee_repo.get_by_id(task.assignee_id).await?;
            if assignee.company_id != creator.company_id {
                return Err(WorkflowError::ForeignEmployee.into());
            }
        }

        let mut accessors = Vec::with_capacity(input.accessors.len());
        for accessor in input.accessors {
            if accessor.employee_id == creator.id {
                // Do not add the creator to the accessor list.
                continue;
            }
            let grantee = self.employee_repo.get_by_id(accessor.employee_id).await?;
            if grantee.company_id != creator.company_id {
                return Err(WorkflowError::ForeignEmployee.into());
            }
            accessors.push(accessor);
        }

        // 3. Persist the whole aggregate in one transaction.
        let (workflow, tasks, grants) = self
            .workflow_repo
            .create_aggregate(CreateWorkflowAggregate {
                workflow: CreateWorkflow {
                    template_id: input.template_id,
                    name: input.name,
                    creator_id: creator.id,
                    start_at: input.start_at,
                    duration_secs: input.duration_secs,
                },
                tasks: input.tasks,
                accessors,
            })
            .await?;

        // 4. Notify every participant.
        let participants = build_participants(creator.id, &tasks, &grants);
        self.notify(NotificationEvent::WorkflowCreated {
            workflow: workflow.clone(),
            participants,
        })
        .await;

        Ok(WorkflowAggregate {
            workflow,
            tasks,
            accessors: grants,
        })
    }

    /// Update a workflow's mutable fields (name, start/complete time,
    /// duration). Template and creator never change.
    ///
    /// Every current participant is re-notified, whether or not their
    /// own data changed.
    pub async fn update_workflow(
        &self,
        actor: &Employee,
        workflow_id: Uuid,
        input: UpdateWorkflow,
    ) -> FlowlineResult<Workflow> {
        // 1. The workflow must belong to the caller's company.
        let workflow = self.workflow_repo.get_by_id(workflow_id).await?;
        let creator = self.employee_repo.get_by_id(workflow.creator_id).await?;
        if creator.company_id != actor.company_id {
            return Err(WorkflowError::ForeignWorkflow.into());
        }

        // 2. Editing requires creator, admin, or a read-write grant.
        let can_edit = actor.id == creator.id
            || actor.is_admin
            || self.has_write_grant(workflow.id, actor.id).await?;
        if !can_edit {
            return Err(FlowlineError::AuthorizationDenied {
                reason: "read-write access to the workflow required".into(),
            });
        }

        // 3. Persist.
        let workflow = self.workflow_repo.update(workflow_id, input).await?;

        // 4. Recompute the full participant map from current state and
        //    re-notify everyone.
        let tasks = self.task_repo.list_by_workflow(workflow.id).await?;
        let grants = self.access_repo.list_by_workflow(workflow.id).await?;
        let participants = build_participants(workflow.creator_id, &tasks, &grants);
        self.notify(NotificationEvent::WorkflowUpdated {
            workflow: workflow.clone(),
            participants,
        })
        .await;

        Ok(workflow)
    }

    /// Update a task's mutable fields.
    ///
    /// A non-privileged assignee (not admin, no read-write grant)
    /// cannot reassign their own task: an `assignee_id` in the payload
    /// is silently dropped.
    pub async fn update_task(
        &self,
        actor: &Employee,
        task_id: Uuid,
        mut input: UpdateTask,
    ) -> FlowlineResult<Task> {
        let task = self.task_repo.get_by_id(task_id).await?;
        let workflow = self.workflow_repo.get_by_id(task.workflow_id).await?;
        let creator = self.employee_repo.get_by_id(workflow.creator_id).await?;
        if creator.company_id != actor.company_id {
            return Err(WorkflowError::ForeignWorkflow.into());
        }

        let is_assignee = task.assignee_id == actor.id;
        let has_write = self.has_write_grant(workflow.id, actor.id).await?;

        // Task access requires assignment or elevated permission.
        if !(is_assignee || actor.id == creator.id || actor.is_admin || has_write) {
            return Err(FlowlineError::AuthorizationDenied {
                reason: "task update requires assignment or elevated permission".into(),
            });
        }

        if is_assignee && !actor.is_admin && !has_write && input.assignee_id.is_some() {
            debug!(task = %task.id, "Dropping assignee change from non-privileged assignee");
            input.assignee_id = None;
        }

        let task = self.task_repo.update(task_id, input).await?;

        self.notify(NotificationEvent::TaskAssigned {
            workflow,
            task: task.clone(),
            is_new: false,
        })
        .await;

        Ok(task)
    }

    /// Grant an employee access to an existing workflow.
    pub async fn grant_access(
        &self,
        actor: &Employee,
        input: CreateWorkflowAccess,
    ) -> FlowlineResult<WorkflowAccess> {
        // 1. The workflow must belong to the caller's company.
        let workflow = self.workflow_repo.get_by_id(input.workflow_id).await?;
        let creator = self.employee_repo.get_by_id(workflow.creator_id).await?;
        if creator.company_id != actor.company_id {
            return Err(WorkflowError::ForeignWorkflow.into());
        }

        // 2. The grantee must be of the same company.
        let grantee = self.employee_repo.get_by_id(input.employee_id).await?;
        if grantee.company_id != creator.company_id {
            return Err(WorkflowError::ForeignEmployee.into());
        }

        // 3. The creator never holds an explicit grant.
        if input.employee_id == creator.id {
            return Err(WorkflowError::CreatorGrant.into());
        }

        let access = self.access_repo.create(input).await?;

        self.notify(NotificationEvent::AccessGranted {
            workflow,
            access: access.clone(),
            is_updated: false,
        })
        .await;

        Ok(access)
    }

    /// Change the permission of an existing grant. Workflow and
    /// employee are immutable after grant.
    pub async fn update_access(
        &self,
        actor: &Employee,
        access_id: Uuid,
        input: UpdateWorkflowAccess,
    ) -> FlowlineResult<WorkflowAccess> {
        let access = self.access_repo.get_by_id(access_id).await?;
        let workflow = self.workflow_repo.get_by_id(access.workflow_id).await?;
        let creator = self.employee_repo.get_by_id(workflow.creator_id).await?;
        if creator.company_id != actor.company_id {
            return Err(WorkflowError::ForeignWorkflow.into());
        }

        let access = self.access_repo.update(access_id, input).await?;

        self.notify(NotificationEvent::AccessGranted {
            workflow,
            access: access.clone(),
            is_updated: true,
        })
        .await;

        Ok(access)
    }

    /// Whether the employee holds a read-write grant on the workflow.
    async fn has_write_grant(&self, workflow_id: Uuid, employee_id: Uuid) -> FlowlineResult<bool> {
        match self
            .access_repo
            .get_by_workflow_and_employee(workflow_id, employee_id)
            .await
        {
            Ok(access) => Ok(access.permission == Permission::ReadWrite),
            Err(FlowlineError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Dispatch one email per recipient of the event. Best-effort:
    /// lookup and transport failures are logged and swallowed so they
    /// can never roll back the persisted mutation.
    async fn notify(&self, event: NotificationEvent) {
        for ctx in event.recipient_contexts() {
            let employee = match self.employee_repo.get_by_id(ctx.employee_id).await {
                Ok(employee) => employee,
                Err(e) => {
                    warn!(employee = %ctx.employee_id, error = %e, "Skipping notification: employee lookup failed");
                    continue;
                }
            };
            let user = match self.user_repo.get_by_id(employee.user_id).await {
                Ok(user) => user,
                Err(e) => {
                    warn!(user = %employee.user_id, error = %e, "Skipping notification: user lookup failed");
                    continue;
                }
            };

            let mail = MailContext {
                recipient_name: user.name,
                recipient_email: user.email,
                workflow_name: ctx.workflow_name,
                task_list: ctx.task_list,
                write_permission: ctx.write_permission,
                is_updated: ctx.is_updated,
                is_creator: ctx.is_creator,
            };

            if let Err(e) = self.mailer.send(mail).await {
                warn!(error = %e, "Notification email failed; continuing");
            }
        }
    }
}
