//! Company and membership lifecycle orchestration.

use flowline_core::error::{FlowlineError, FlowlineResult};
use flowline_core::models::company::{Company, CreateCompany};
use flowline_core::models::employee::{
    CreateEmployee, Employee, EmployeeStatus, UpdateEmployee,
};
use flowline_core::repository::{CompanyRepository, EmployeeRepository, UserRepository};
use uuid::Uuid;

use crate::access::{AccessGuard, Identity};
use crate::error::WorkflowError;

/// Company/membership service.
///
/// Generic over repository implementations so the lifecycle logic has
/// no dependency on the database crate. Invitation email is handled by
/// the external onboarding collaborator.
pub struct CompanyService<C, E, U>
where
    C: CompanyRepository + Clone,
    E: EmployeeRepository + Clone,
    U: UserRepository,
{
    company_repo: C,
    employee_repo: E,
    user_repo: U,
    guard: AccessGuard<E, C>,
}

impl<C, E, U> CompanyService<C, E, U>
where
    C: CompanyRepository + Clone,
    E: EmployeeRepository + Clone,
    U: UserRepository,
{
    pub fn new(company_repo: C, employee_repo: E, user_repo: U) -> Self {
        let guard = AccessGuard::new(employee_repo.clone(), company_repo.clone());
        Self {
            company_repo,
            employee_repo,
            user_repo,
            guard,
        }
    }

    /// Create a company. Open only to users with no existing active or
    /// invited membership; the founder becomes the company's first
    /// active admin.
    pub async fn create_company(
        &self,
        identity: Option<&Identity>,
        input: CreateCompany,
    ) -> FlowlineResult<(Company, Employee)> {
        let identity = self.guard.require_inactive_employee(identity).await?;

        let company = self.company_repo.create(input).await?;
        let founder = self
            .employee_repo
            .create(CreateEmployee {
                user_id: identity.user_id,
                company_id: company.id,
                status: EmployeeStatus::Active,
                is_admin: true,
            })
            .await?;

        Ok((company, founder))
    }

    /// Invite a user into the caller's company. Requires active-admin;
    /// the new membership starts `Invited`, non-admin.
    pub async fn invite_employee(
        &self,
        identity: Option<&Identity>,
        user_id: Uuid,
    ) -> FlowlineResult<Employee> {
        let admin = self.guard.require_active_admin(identity).await?;

        // Reject unknown users before touching memberships.
        self.user_repo.get_by_id(user_id).await?;

        let invited = self
            .employee_repo
            .create(CreateEmployee {
                user_id,
                company_id: admin.company_id,
                status: EmployeeStatus::Invited,
                is_admin: false,
            })
            .await?;

        Ok(invited)
    }

    /// Accept a pending invite into the given company, activating the
    /// membership.
    pub async fn accept_invite(
        &self,
        identity: Option<&Identity>,
        company_id: Uuid,
    ) -> FlowlineResult<Employee> {
        let identity = identity.ok_or_else(|| FlowlineError::AuthenticationFailed {
            reason: "authentication required".into(),
        })?;

        let membership = self
            .employee_repo
            .get_by_user_and_company(identity.user_id, company_id)
            .await?;
        if membership.status != EmployeeStatus::Invited {
            return Err(WorkflowError::NotInvited.into());
        }

        self.employee_repo
            .update(
                membership.id,
                UpdateEmployee {
                    status: Some(EmployeeStatus::Active),
                    ..Default::default()
                },
            )
            .await
    }

    /// Deactivate an employee of the caller's company. Requires
    /// active-admin; admins cannot deactivate themselves.
    pub async fn deactivate_employee(
        &self,
        identity: Option<&Identity>,
        employee_id: Uuid,
    ) -> FlowlineResult<Employee> {
        let admin = self.guard.require_active_admin(identity).await?;

        let target = self.employee_repo.get_by_id(employee_id).await?;
        if target.company_id != admin.company_id {
            return Err(WorkflowError::ForeignEmployee.into());
        }
        if target.id == admin.id {
            return Err(WorkflowError::SelfDeactivation.into());
        }

        self.employee_repo
            .update(
                target.id,
                UpdateEmployee {
                    status: Some(EmployeeStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
    }
}
