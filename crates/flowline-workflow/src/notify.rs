//! Notification dispatch.
//!
//! Every workflow mutation notifies its participants: the creator,
//! each task assignee, and each access grantee, one email per distinct
//! employee. The event kind is an explicit tagged variant and each
//! kind has its own context builder; no dynamic dispatch.
//!
//! Transport is behind the [`Mailer`] trait (the email system is an
//! external collaborator). Delivery is best-effort: the dispatcher
//! runs after the data transaction has committed, and send failures
//! are logged and swallowed, never surfaced to the caller.

use flowline_core::models::access::{Permission, WorkflowAccess};
use flowline_core::models::task::Task;
use flowline_core::models::workflow::Workflow;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::NotifyConfig;

/// Mail transport error.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),
}

/// One employee touched by a workflow mutation, with the role flags
/// accumulated across every role they fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub employee_id: Uuid,
    pub is_creator: bool,
    pub is_shared: bool,
    pub write_permission: bool,
    /// Titles of the tasks assigned to this employee, in chain order.
    pub task_list: Vec<String>,
}

impl Participant {
    fn new(employee_id: Uuid) -> Self {
        Self {
            employee_id,
            is_creator: false,
            is_shared: false,
            write_permission: false,
            task_list: Vec::new(),
        }
    }
}

/// Build the participant map for a workflow: creator first, then task
/// assignees in chain order, then access grantees. An employee filling
/// several roles gets one entry with merged flags.
pub fn build_participants(
    creator_id: Uuid,
    tasks: &[Task],
    grants: &[WorkflowAccess],
) -> Vec<Participant> {
    let mut participants: Vec<Participant> = Vec::new();

    fn entry(participants: &mut Vec<Participant>, employee_id: Uuid) -> &mut Participant {
        let idx = match participants.iter().position(|p| p.employee_id == employee_id) {
            Some(pos) => pos,
            None => {
                participants.push(Participant::new(employee_id));
                participants.len() - 1
            }
        };
        &mut participants[idx]
    }

    entry(&mut participants, creator_id).is_creator = true;

    for task in tasks {
        entry(&mut participants, task.assignee_id)
            .task_list
            .push(task.title.clone());
    }

    for grant in grants {
        let person = entry(&mut participants, grant.employee_id);
        person.is_shared = true;
        person.write_permission = grant.permission == Permission::ReadWrite;
    }

    participants
}

/// A workflow mutation that triggers notification email.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    WorkflowCreated {
        workflow: Workflow,
        participants: Vec<Participant>,
    },
    WorkflowUpdated {
        workflow: Workflow,
        participants: Vec<Participant>,
    },
    TaskAssigned {
        workflow: Workflow,
        task: Task,
        is_new: bool,
    },
    AccessGranted {
        workflow: Workflow,
        access: WorkflowAccess,
        is_updated: bool,
    },
}

/// Rendered notification context for one recipient. The external mail
/// collaborator turns this into a concrete message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailContext {
    pub recipient_name: String,
    pub recipient_email: String,
    pub workflow_name: String,
    /// Titles of the tasks assigned to the recipient, in chain order.
    pub task_list: Vec<String>,
    /// True when the recipient holds read-write access or is the
    /// creator.
    pub write_permission: bool,
    pub is_updated: bool,
    pub is_creator: bool,
}

/// Per-recipient context before the recipient's profile is resolved.
#[derive(Debug, Clone)]
pub struct RecipientContext {
    pub employee_id: Uuid,
    pub workflow_name: String,
    pub task_list: Vec<String>,
    pub write_permission: bool,
    pub is_updated: bool,
    pub is_creator: bool,
}

impl NotificationEvent {
    /// Expand the event into one context per recipient. Each variant
    /// has its own builder.
    pub fn recipient_contexts(&self) -> Vec<RecipientContext> {
        match self {
            NotificationEvent::WorkflowCreated {
                workflow,
                participants,
            } => participant_contexts(workflow, participants, false),
            NotificationEvent::WorkflowUpdated {
                workflow,
                participants,
            } => participant_contexts(workflow, participants, true),
            NotificationEvent::TaskAssigned {
                workflow,
                task,
                is_new,
            } => vec![RecipientContext {
                employee_id: task.assignee_id,
                workflow_name: workflow.name.clone(),
                task_list: vec![task.title.clone()],
                write_permission: false,
                is_updated: !is_new,
                is_creator: false,
            }],
            NotificationEvent::AccessGranted {
                workflow,
                access,
                is_updated,
            } => vec![RecipientContext {
                employee_id: access.employee_id,
                workflow_name: workflow.name.clone(),
                task_list: Vec::new(),
                write_permission: access.permission == Permission::ReadWrite,
                is_updated: *is_updated,
                is_creator: false,
            }],
        }
    }
}

fn participant_contexts(
    workflow: &Workflow,
    participants: &[Participant],
    is_updated: bool,
) -> Vec<RecipientContext> {
    participants
        .iter()
        .map(|p| RecipientContext {
            employee_id: p.employee_id,
            workflow_name: workflow.name.clone(),
            task_list: p.task_list.clone(),
            // Creators always get edit rights in the rendered mail.
            write_permission: p.write_permission || p.is_creator,
            is_updated,
            is_creator: p.is_creator,
        })
        .collect()
}

/// Mail transport seam.
pub trait Mailer: Send + Sync {
    fn send(&self, context: MailContext) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Transport stand-in that logs instead of sending. Used by the server
/// binary until a real transport is wired in.
#[derive(Debug, Clone)]
pub struct LogMailer {
    config: NotifyConfig,
}

impl LogMailer {
    pub fn new(config: NotifyConfig) -> Self {
        Self { config }
    }
}

impl Mailer for LogMailer {
    async fn send(&self, context: MailContext) -> Result<(), MailError> {
        info!(
            from = %self.config.from_address,
            to = %context.recipient_email,
            workflow = %context.workflow_name,
            is_updated = context.is_updated,
            "Dispatching notification email"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use flowline_core::models::task::TaskStatus;

    fn workflow(creator_id: Uuid) -> Workflow {
        Workflow {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            name: "Onboarding".into(),
            creator_id,
            start_at: Utc::now(),
            complete_at: None,
            duration_secs: 3600,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(workflow_id: Uuid, title: &str, assignee_id: Uuid, position: u32) -> Task {
        Task {
            id: Uuid::new_v4(),
            workflow_id,
            title: title.into(),
            description: String::new(),
            parent_task_id: None,
            position,
            assignee_id,
            completed_at: None,
            start_delta_secs: 0,
            status: TaskStatus::Upcoming,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn grant(workflow_id: Uuid, employee_id: Uuid, permission: Permission) -> WorkflowAccess {
        WorkflowAccess {
            id: Uuid::new_v4(),
            workflow_id,
            employee_id,
            permission,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn creator_is_always_a_participant() {
        let creator = Uuid::new_v4();
        let participants = build_participants(creator, &[], &[]);
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].employee_id, creator);
        assert!(participants[0].is_creator);
        assert!(participants[0].task_list.is_empty());
    }

    #[test]
    fn multi_role_flags_merge_onto_one_entry() {
        // Workflow with tasks [("A", E1), ("B", E2)] and grant
        // (E1, ReadWrite): E1 gets one entry with both roles.
        let creator = Uuid::new_v4();
        let e1 = Uuid::new_v4();
        let e2 = Uuid::new_v4();
        let wf = workflow(creator);

        let tasks = vec![task(wf.id, "A", e1, 0), task(wf.id, "B", e2, 1)];
        let grants = vec![grant(wf.id, e1, Permission::ReadWrite)];

        let participants = build_participants(creator, &tasks, &grants);
        assert_eq!(participants.len(), 3);

        let p_creator = &participants[0];
        assert!(p_creator.is_creator);
        assert!(!p_creator.is_shared);

        let p1 = participants.iter().find(|p| p.employee_id == e1).unwrap();
        assert_eq!(p1.task_list, vec!["A".to_string()]);
        assert!(p1.is_shared);
        assert!(p1.write_permission);

        let p2 = participants.iter().find(|p| p.employee_id == e2).unwrap();
        assert_eq!(p2.task_list, vec!["B".to_string()]);
        assert!(!p2.is_shared);
        assert!(!p2.write_permission);
    }

    #[test]
    fn assignee_of_many_tasks_accumulates_titles_in_order() {
        let creator = Uuid::new_v4();
        let e1 = Uuid::new_v4();
        let wf = workflow(creator);

        let tasks = vec![
            task(wf.id, "first", e1, 0),
            task(wf.id, "second", e1, 1),
            task(wf.id, "third", e1, 2),
        ];

        let participants = build_participants(creator, &tasks, &[]);
        let p1 = participants.iter().find(|p| p.employee_id == e1).unwrap();
        assert_eq!(p1.task_list, vec!["first", "second", "third"]);
    }

    #[test]
    fn read_grant_does_not_confer_write_permission() {
        let creator = Uuid::new_v4();
        let e1 = Uuid::new_v4();
        let wf = workflow(creator);

        let grants = vec![grant(wf.id, e1, Permission::Read)];
        let participants = build_participants(creator, &[], &grants);
        let p1 = participants.iter().find(|p| p.employee_id == e1).unwrap();
        assert!(p1.is_shared);
        assert!(!p1.write_permission);
    }

    #[test]
    fn creator_context_carries_write_permission() {
        let creator = Uuid::new_v4();
        let wf = workflow(creator);
        let participants = build_participants(creator, &[], &[]);

        let event = NotificationEvent::WorkflowCreated {
            workflow: wf,
            participants,
        };
        let contexts = event.recipient_contexts();
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].write_permission);
        assert!(contexts[0].is_creator);
        assert!(!contexts[0].is_updated);
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = LogMailer::new(NotifyConfig::default());
        let context = MailContext {
            recipient_name: "Alice".into(),
            recipient_email: "alice@example.com".into(),
            workflow_name: "Onboarding".into(),
            task_list: vec![],
            write_permission: false,
            is_updated: false,
            is_creator: false,
        };
        mailer.send(context).await.unwrap();
    }

    #[test]
    fn task_assigned_context_targets_the_assignee() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let wf = workflow(creator);
        let t = task(wf.id, "review", assignee, 0);

        let event = NotificationEvent::TaskAssigned {
            workflow: wf,
            task: t,
            is_new: false,
        };
        let contexts = event.recipient_contexts();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].employee_id, assignee);
        assert_eq!(contexts[0].task_list, vec!["review"]);
        assert!(contexts[0].is_updated);
    }
}
