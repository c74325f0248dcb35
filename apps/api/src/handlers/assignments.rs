use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use keygate_application::{AssignmentQuery, GrantInput};
use keygate_core::{AppError, AppResult};
use keygate_domain::{ActorId, DomainId, ProjectId, RoleId, ScopeTarget, Token};

use super::parse_scope;
use crate::dto::{RoleAssignmentListResponse, RoleAssignmentQueryParams, RoleAssignmentResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_role_assignments_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Query(params): Query<RoleAssignmentQueryParams>,
) -> ApiResult<Json<RoleAssignmentListResponse>> {
    let query = assignment_query(params)?;
    let role_assignments = state
        .assignment_service
        .list_role_assignments(&token, query)
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(RoleAssignmentListResponse { role_assignments }))
}

pub async fn list_user_role_assignments_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<RoleAssignmentListResponse>> {
    let role_assignments = state
        .assignment_service
        .list_user_role_assignments(&token, &user_id)
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(RoleAssignmentListResponse { role_assignments }))
}

pub async fn grant_system_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((actor_kind, actor_id, role_id)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let input = grant_input(ScopeTarget::System, &actor_kind, actor_id, role_id)?;
    state.assignment_service.grant(&token, input).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_system_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((actor_kind, actor_id, role_id)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let input = grant_input(ScopeTarget::System, &actor_kind, actor_id, role_id)?;
    state.assignment_service.revoke(&token, input).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_domain_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((domain_id, actor_kind, actor_id, role_id)): Path<(String, String, String, String)>,
) -> ApiResult<StatusCode> {
    let scope = ScopeTarget::Domain(DomainId::new(domain_id)?);
    let input = grant_input(scope, &actor_kind, actor_id, role_id)?;
    state.assignment_service.grant(&token, input).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_domain_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((domain_id, actor_kind, actor_id, role_id)): Path<(String, String, String, String)>,
) -> ApiResult<StatusCode> {
    let scope = ScopeTarget::Domain(DomainId::new(domain_id)?);
    let input = grant_input(scope, &actor_kind, actor_id, role_id)?;
    state.assignment_service.revoke(&token, input).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_project_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((project_id, actor_kind, actor_id, role_id)): Path<(String, String, String, String)>,
) -> ApiResult<StatusCode> {
    let scope = ScopeTarget::Project(ProjectId::new(project_id)?);
    let input = grant_input(scope, &actor_kind, actor_id, role_id)?;
    state.assignment_service.grant(&token, input).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_project_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((project_id, actor_kind, actor_id, role_id)): Path<(String, String, String, String)>,
) -> ApiResult<StatusCode> {
    let scope = ScopeTarget::Project(ProjectId::new(project_id)?);
    let input = grant_input(scope, &actor_kind, actor_id, role_id)?;
    state.assignment_service.revoke(&token, input).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn grant_input(
    scope: ScopeTarget,
    actor_kind: &str,
    actor_id: String,
    role_id: String,
) -> AppResult<GrantInput> {
    let actor = match actor_kind {
        "users" => ActorId::user(actor_id)?,
        "groups" => ActorId::group(actor_id)?,
        other => {
            return Err(AppError::NotFound(format!(
                "unknown actor collection '{other}'"
            )));
        }
    };

    Ok(GrantInput {
        actor,
        role_id,
        scope,
    })
}

fn assignment_query(params: RoleAssignmentQueryParams) -> AppResult<AssignmentQuery> {
    let actor = match (params.user_id, params.group_id) {
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "filter by user_id or group_id, not both".to_owned(),
            ));
        }
        (Some(user_id), None) => Some(ActorId::user(user_id)?),
        (None, Some(group_id)) => Some(ActorId::group(group_id)?),
        (None, None) => None,
    };
    let role_id = params
        .role_id
        .map(|value| {
            RoleId::from_str(value.trim())
                .map_err(|_| AppError::Validation(format!("invalid role_id filter '{value}'")))
        })
        .transpose()?;
    let scope = params.scope.as_deref().map(parse_scope).transpose()?;

    Ok(AssignmentQuery {
        actor,
        role_id,
        scope,
    })
}
