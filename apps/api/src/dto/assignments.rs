use keygate_domain::EffectiveAssignment;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Query-string filters for assignment listings.
#[derive(Debug, Default, Deserialize)]
pub struct RoleAssignmentQueryParams {
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub role_id: Option<String>,
    /// `system`, `domain:<id>` or `project:<id>`.
    pub scope: Option<String>,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub actor_type: String,
    pub actor_id: String,
    pub role_id: String,
    pub role_name: String,
    pub scope_kind: String,
    pub scope_id: Option<String>,
}

impl From<EffectiveAssignment> for RoleAssignmentResponse {
    fn from(value: EffectiveAssignment) -> Self {
        let assignment = value.assignment;
        Self {
            actor_type: assignment.actor.type_str().to_owned(),
            actor_id: assignment.actor.id().to_owned(),
            role_id: assignment.role_id.to_string(),
            role_name: value.role_name,
            scope_kind: assignment.scope.kind().as_str().to_owned(),
            scope_id: assignment.scope.target_id().map(str::to_owned),
        }
    }
}

/// Assignment listing response envelope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-assignment-list-response.ts"
)]
pub struct RoleAssignmentListResponse {
    pub role_assignments: Vec<RoleAssignmentResponse>,
}
