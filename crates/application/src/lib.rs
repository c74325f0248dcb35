//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_service;
mod bootstrap_service;
mod enforcement_gateway;
mod role_ports;
mod role_service;
mod scope_resolver;
mod scope_service;
mod store_timeout;
mod token_service;

#[cfg(test)]
mod test_support;

pub use assignment_service::AssignmentService;
pub use bootstrap_service::{BootstrapReport, BootstrapService};
pub use enforcement_gateway::{EnforcementGateway, EnforcementStage};
pub use role_ports::{
    AssignmentQuery, AuditEvent, AuditRepository, CreateRoleInput, GrantInput, RoleChanges,
    RoleRepository, TokenRepository, UpdateRoleInput,
};
pub use role_service::RoleService;
pub use scope_resolver::{InheritanceMode, ScopeResolver};
pub use scope_service::ScopeService;
pub use store_timeout::StoreTimeout;
pub use token_service::{IssueTokenInput, TokenService};
