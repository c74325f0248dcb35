use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by administrative use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role's name or description changes.
    RoleUpdated,
    /// Emitted when a role and its assignments are deleted.
    RoleDeleted,
    /// Emitted when a role is granted to an actor.
    RoleGranted,
    /// Emitted when a role grant is revoked.
    RoleRevoked,
    /// Emitted when a domain is registered.
    DomainRegistered,
    /// Emitted when a project is registered.
    ProjectRegistered,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "identity.role.created",
            Self::RoleUpdated => "identity.role.updated",
            Self::RoleDeleted => "identity.role.deleted",
            Self::RoleGranted => "identity.role.granted",
            Self::RoleRevoked => "identity.role.revoked",
            Self::DomainRegistered => "identity.domain.registered",
            Self::ProjectRegistered => "identity.project.registered",
        }
    }
}
