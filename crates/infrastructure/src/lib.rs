//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_role_repository;
mod in_memory_token_repository;
mod policy_file;
mod postgres_audit_repository;
mod postgres_role_repository;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use in_memory_token_repository::InMemoryTokenRepository;
pub use policy_file::{load_policy_set, parse_policy};
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_role_repository::PostgresRoleRepository;
