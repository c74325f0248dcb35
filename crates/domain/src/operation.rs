use std::str::FromStr;

use keygate_core::AppError;
use serde::{Deserialize, Serialize};

/// API operations guarded by a policy rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `GET /v3/roles`.
    ListRoles,
    /// `GET /v3/roles/{id}`.
    GetRole,
    /// `POST /v3/roles`.
    CreateRole,
    /// `PATCH /v3/roles/{id}`.
    UpdateRole,
    /// `DELETE /v3/roles/{id}`.
    DeleteRole,
    /// Deployment-wide assignment listing.
    ListRoleAssignments,
    /// Listing the assignments of one user.
    ListUserRoleAssignments,
    /// Granting a role at any scope.
    CreateGrant,
    /// Revoking a role at any scope.
    RevokeGrant,
    /// `PUT /v3/domains/{domain_id}`.
    CreateDomain,
    /// `PUT /v3/projects/{project_id}`.
    CreateProject,
}

impl Operation {
    /// Returns the rule name guarding this operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListRoles => "identity:list_roles",
            Self::GetRole => "identity:get_role",
            Self::CreateRole => "identity:create_role",
            Self::UpdateRole => "identity:update_role",
            Self::DeleteRole => "identity:delete_role",
            Self::ListRoleAssignments => "identity:list_role_assignments",
            Self::ListUserRoleAssignments => "identity:list_user_role_assignments",
            Self::CreateGrant => "identity:create_grant",
            Self::RevokeGrant => "identity:revoke_grant",
            Self::CreateDomain => "identity:create_domain",
            Self::CreateProject => "identity:create_project",
        }
    }

    /// Returns all known operations.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Operation] = &[
            Operation::ListRoles,
            Operation::GetRole,
            Operation::CreateRole,
            Operation::UpdateRole,
            Operation::DeleteRole,
            Operation::ListRoleAssignments,
            Operation::ListUserRoleAssignments,
            Operation::CreateGrant,
            Operation::RevokeGrant,
            Operation::CreateDomain,
            Operation::CreateProject,
        ];

        ALL
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|operation| operation.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown operation '{value}'")))
    }
}
