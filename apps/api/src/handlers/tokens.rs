use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use chrono::Utc;
use keygate_application::IssueTokenInput;
use keygate_core::AppError;
use subtle::ConstantTimeEq;

use super::parse_scope;
use crate::dto::{IssueTokenRequest, TokenEnvelopeResponse, TokenResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the deployment's bootstrap secret.
pub const BOOTSTRAP_TOKEN_HEADER: &str = "x-bootstrap-token";
/// Response header carrying the issued token.
pub const SUBJECT_TOKEN_HEADER: &str = "x-subject-token";

pub async fn issue_token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<IssueTokenRequest>,
) -> ApiResult<(StatusCode, [(HeaderName, HeaderValue); 1], Json<TokenEnvelopeResponse>)> {
    let presented = headers
        .get(BOOTSTRAP_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !bootstrap_secret_matches(presented, &state.bootstrap_token) {
        return Err(AppError::Unauthenticated("invalid bootstrap token".to_owned()).into());
    }

    let scope = parse_scope(payload.auth.scope.as_str())?;
    let token = state
        .token_service
        .issue(IssueTokenInput {
            subject: payload.auth.subject,
            groups: payload.auth.groups,
            scope,
        })
        .await?;
    let context = state.token_service.resolver().resolve(&token, Utc::now())?;

    let header_value = HeaderValue::from_str(token.id().as_str())
        .map_err(|error| AppError::Internal(format!("issued token is not a valid header: {error}")))?;

    Ok((
        StatusCode::CREATED,
        [(HeaderName::from_static(SUBJECT_TOKEN_HEADER), header_value)],
        Json(TokenEnvelopeResponse {
            token: TokenResponse::from_resolved(&token, &context),
        }),
    ))
}

/// Compares the presented bootstrap secret in constant time.
fn bootstrap_secret_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
