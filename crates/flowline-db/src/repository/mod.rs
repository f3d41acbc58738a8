//! SurrealDB repository implementations.

mod access;
mod company;
mod employee;
mod task;
mod template;
mod user;
mod workflow;

pub use access::SurrealWorkflowAccessRepository;
pub use company::SurrealCompanyRepository;
pub use employee::SurrealEmployeeRepository;
pub use task::SurrealTaskRepository;
pub use template::SurrealTemplateRepository;
pub use user::SurrealUserRepository;
pub use workflow::SurrealWorkflowRepository;
