use keygate_domain::Role;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Role fields accepted on creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/new-role-request.ts"
)]
pub struct NewRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub role: NewRoleRequest,
}

/// Role fields accepted on partial update.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-patch-request.ts"
)]
pub struct RolePatchRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Incoming payload for role updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub role: RolePatchRequest,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
            description: value.description().map(str::to_owned),
        }
    }
}

/// Single-role response envelope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-envelope-response.ts"
)]
pub struct RoleEnvelopeResponse {
    pub role: RoleResponse,
}

/// Role listing response envelope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-list-response.ts"
)]
pub struct RoleListResponse {
    pub roles: Vec<RoleResponse>,
}
