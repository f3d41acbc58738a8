//! Access predicate evaluation.
//!
//! Three checks gate every inbound operation: inactive-employee (for
//! join/create-company actions), active-employee, and active-admin.
//! Each is a pure boolean function of the identity's membership and
//! company records; [`AccessGuard`] performs the repository lookups
//! and maps a false predicate to `AuthorizationDenied`.
//!
//! Absent authentication is an error. A missing membership record is
//! not; it simply makes the predicate false.

use flowline_core::error::{FlowlineError, FlowlineResult};
use flowline_core::models::company::{Company, CompanyStatus};
use flowline_core::models::employee::{Employee, EmployeeStatus};
use flowline_core::repository::{CompanyRepository, EmployeeRepository};
use uuid::Uuid;

/// A successfully authenticated identity, produced by the external
/// auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
}

/// True when the user has no `Active` or `Invited` membership in any
/// company.
pub fn has_no_active_affiliation(memberships: &[Employee]) -> bool {
    !memberships.iter().any(|m| {
        matches!(
            m.status,
            EmployeeStatus::Active | EmployeeStatus::Invited
        )
    })
}

/// True when the membership is `Active` and its company is `Active`.
pub fn is_active_member(membership: &Employee, company: &Company) -> bool {
    membership.status == EmployeeStatus::Active && company.status == CompanyStatus::Active
}

/// True when [`is_active_member`] holds and the membership carries the
/// admin flag.
pub fn is_active_admin(membership: &Employee, company: &Company) -> bool {
    is_active_member(membership, company) && membership.is_admin
}

/// Evaluates access predicates against stored membership records.
pub struct AccessGuard<E: EmployeeRepository, C: CompanyRepository> {
    employee_repo: E,
    company_repo: C,
}

impl<E: EmployeeRepository, C: CompanyRepository> AccessGuard<E, C> {
    pub fn new(employee_repo: E, company_repo: C) -> Self {
        Self {
            employee_repo,
            company_repo,
        }
    }

    fn authenticated(identity: Option<&Identity>) -> FlowlineResult<&Identity> {
        identity.ok_or_else(|| FlowlineError::AuthenticationFailed {
            reason: "authentication required".into(),
        })
    }

    /// Resolve the company of a membership, treating a dangling
    /// company reference as a non-match rather than a hard failure.
    async fn company_of(&self, membership: &Employee) -> FlowlineResult<Option<Company>> {
        match self.company_repo.get_by_id(membership.company_id).await {
            Ok(company) => Ok(Some(company)),
            Err(FlowlineError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Pass when the identity has no active-or-invited membership
    /// anywhere. Gates join/create-company actions.
    pub async fn require_inactive_employee(
        &self,
        identity: Option<&Identity>,
    ) -> FlowlineResult<Identity> {
        let identity = Self::authenticated(identity)?;
        let memberships = self.employee_repo.list_for_user(identity.user_id).await?;
        if has_no_active_affiliation(&memberships) {
            Ok(*identity)
        } else {
            Err(FlowlineError::AuthorizationDenied {
                reason: "user already belongs to a company".into(),
            })
        }
    }

    /// Pass when the identity holds an active membership in an active
    /// company; returns that membership (the caller's "active
    /// employee").
    pub async fn require_active_employee(
        &self,
        identity: Option<&Identity>,
    ) -> FlowlineResult<Employee> {
        let identity = Self::authenticated(identity)?;
        let memberships = self.employee_repo.list_for_user(identity.user_id).await?;
        for membership in &memberships {
            if let Some(company) = self.company_of(membership).await? {
                if is_active_member(membership, &company) {
                    return Ok(membership.clone());
                }
            }
        }
        Err(FlowlineError::AuthorizationDenied {
            reason: "no active membership in an active company".into(),
        })
    }

    /// Pass when the identity holds an active admin membership in an
    /// active company; returns that membership.
    pub async fn require_active_admin(
        &self,
        identity: Option<&Identity>,
    ) -> FlowlineResult<Employee> {
        let identity = Self::authenticated(identity)?;
        let memberships = self.employee_repo.list_for_user(identity.user_id).await?;
        for membership in &memberships {
            if let Some(company) = self.company_of(membership).await? {
                if is_active_admin(membership, &company) {
                    return Ok(membership.clone());
                }
            }
        }
        Err(FlowlineError::AuthorizationDenied {
            reason: "admin privileges required".into(),
        })
    }
}
