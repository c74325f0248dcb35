use keygate_application::{AssignmentService, RoleService, ScopeService, TokenService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub role_service: RoleService,
    pub assignment_service: AssignmentService,
    pub scope_service: ScopeService,
    pub token_service: TokenService,
    pub bootstrap_token: String,
}
