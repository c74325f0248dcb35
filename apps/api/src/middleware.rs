use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use keygate_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the caller's token on every protected request.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Resolves `X-Auth-Token` to an issued token before any handler runs.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let presented = request
        .headers()
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthenticated("authentication required".to_owned()))?;

    let token = state.token_service.validate(presented).await?;

    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}
