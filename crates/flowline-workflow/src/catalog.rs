//! Template catalog access.
//!
//! Read-only: list and retrieve, both restricted to active company
//! admins. Catalog entries are created by administrative tooling
//! through the repository directly.

use flowline_core::error::FlowlineResult;
use flowline_core::models::template::WorkflowTemplate;
use flowline_core::repository::{
    CompanyRepository, EmployeeRepository, PaginatedResult, Pagination, TemplateRepository,
};
use uuid::Uuid;

use crate::access::{AccessGuard, Identity};

/// Admin-gated view over the template catalog.
pub struct TemplateCatalog<P, E, C>
where
    P: TemplateRepository,
    E: EmployeeRepository,
    C: CompanyRepository,
{
    template_repo: P,
    guard: AccessGuard<E, C>,
}

impl<P, E, C> TemplateCatalog<P, E, C>
where
    P: TemplateRepository,
    E: EmployeeRepository,
    C: CompanyRepository,
{
    pub fn new(template_repo: P, guard: AccessGuard<E, C>) -> Self {
        Self {
            template_repo,
            guard,
        }
    }

    /// List all templates.
    pub async fn list(
        &self,
        identity: Option<&Identity>,
        pagination: Pagination,
    ) -> FlowlineResult<PaginatedResult<WorkflowTemplate>> {
        self.guard.require_active_admin(identity).await?;
        self.template_repo.list(pagination).await
    }

    /// Retrieve a single template by id.
    pub async fn get(
        &self,
        identity: Option<&Identity>,
        id: Uuid,
    ) -> FlowlineResult<WorkflowTemplate> {
        self.guard.require_active_admin(identity).await?;
        self.template_repo.get_by_id(id).await
    }
}
