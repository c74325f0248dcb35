use axum::Json;
use axum::extract::{Extension, Path, State};
use keygate_domain::Token;

use crate::dto::{
    DomainEnvelopeResponse, DomainResponse, ProjectEnvelopeResponse, ProjectResponse,
    RegisterDomainRequest, RegisterProjectRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn register_domain_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path(domain_id): Path<String>,
    Json(payload): Json<RegisterDomainRequest>,
) -> ApiResult<Json<DomainEnvelopeResponse>> {
    let parent_id = payload.domain.parent_id;
    let domain_id = state
        .scope_service
        .register_domain(&token, &domain_id, parent_id.as_deref())
        .await?;

    Ok(Json(DomainEnvelopeResponse {
        domain: DomainResponse {
            id: domain_id.as_str().to_owned(),
            parent_id: parent_id.map(|parent_id| parent_id.trim().to_owned()),
        },
    }))
}

pub async fn register_project_handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path(project_id): Path<String>,
    Json(payload): Json<RegisterProjectRequest>,
) -> ApiResult<Json<ProjectEnvelopeResponse>> {
    let domain_id = payload.project.domain_id;
    let project_id = state
        .scope_service
        .register_project(&token, &project_id, &domain_id)
        .await?;

    Ok(Json(ProjectEnvelopeResponse {
        project: ProjectResponse {
            id: project_id.as_str().to_owned(),
            domain_id: domain_id.trim().to_owned(),
        },
    }))
}
