//! Domain validation error types.

use flowline_core::error::FlowlineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow does not belong to your company")]
    ForeignWorkflow,

    #[error("Employee must be of the same company")]
    ForeignEmployee,

    #[error("creator already has full access to the workflow")]
    CreatorGrant,

    #[error("membership is not awaiting acceptance")]
    NotInvited,

    #[error("admins cannot deactivate themselves")]
    SelfDeactivation,
}

impl From<WorkflowError> for FlowlineError {
    fn from(err: WorkflowError) -> Self {
        FlowlineError::Validation {
            message: err.to_string(),
        }
    }
}
