use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use keygate_application::{CreateRoleInput, UpdateRoleInput};
use keygate_domain::Token;

use crate::dto::{
    CreateRoleRequest, RoleEnvelopeResponse, RoleListResponse, RoleResponse, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
) -> ApiResult<Json<RoleListResponse>> {
    let roles = state
        .role_service
        .list_roles(&token)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(RoleListResponse { roles }))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleEnvelopeResponse>> {
    let role = state.role_service.get_role(&token, &role_id).await?;

    Ok(Json(RoleEnvelopeResponse {
        role: RoleResponse::from(role),
    }))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleEnvelopeResponse>)> {
    let role = state
        .role_service
        .create_role(
            &token,
            CreateRoleInput {
                name: payload.role.name,
                description: payload.role.description,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleEnvelopeResponse {
            role: RoleResponse::from(role),
        }),
    ))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleEnvelopeResponse>> {
    let role = state
        .role_service
        .update_role(
            &token,
            &role_id,
            UpdateRoleInput {
                name: payload.role.name,
                description: payload.role.description,
            },
        )
        .await?;

    Ok(Json(RoleEnvelopeResponse {
        role: RoleResponse::from(role),
    }))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.role_service.delete_role(&token, &role_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
