mod assignments;
mod common;
mod roles;
mod scopes;
mod tokens;

pub use assignments::{
    RoleAssignmentListResponse, RoleAssignmentQueryParams, RoleAssignmentResponse,
};
pub use common::HealthResponse;
pub use roles::{
    CreateRoleRequest, NewRoleRequest, RoleEnvelopeResponse, RoleListResponse, RolePatchRequest,
    RoleResponse, UpdateRoleRequest,
};
pub use scopes::{
    DomainEnvelopeResponse, DomainRegistration, DomainResponse, ProjectEnvelopeResponse,
    ProjectRegistration, ProjectResponse, RegisterDomainRequest, RegisterProjectRequest,
};
pub use tokens::{
    IssueTokenAuthRequest, IssueTokenRequest, TokenEnvelopeResponse, TokenResponse,
};
