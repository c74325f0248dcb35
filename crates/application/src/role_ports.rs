mod audit;
mod inputs;
mod repositories;

pub use audit::{AuditEvent, AuditRepository};
pub use inputs::{AssignmentQuery, CreateRoleInput, GrantInput, RoleChanges, UpdateRoleInput};
pub use repositories::{RoleRepository, TokenRepository};
