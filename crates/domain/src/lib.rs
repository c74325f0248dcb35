//! Domain entities, invariants and the policy rule engine.

#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod decision;
mod operation;
mod policy;
mod role;
mod scope;
mod token;

pub use assignment::{ActorId, Assignment, EffectiveAssignment};
pub use audit::AuditAction;
pub use decision::{Decision, DenyReason, ResolvedContext, ScopeEnforcement};
pub use operation::Operation;
pub use policy::{Clause, PolicyDocument, PolicyRule, PolicySet};
pub use role::{ADMIN_ROLE_NAME, MEMBER_ROLE_NAME, READER_ROLE_NAME, Role, RoleId};
pub use scope::{DEFAULT_DOMAIN_ID, DomainId, ProjectId, ScopeKind, ScopeTarget};
pub use token::{Token, TokenId};
