use keygate_core::{AppError, AppResult};
use keygate_domain::{ScopeKind, ScopeTarget};

pub mod assignments;
pub mod health;
pub mod roles;
pub mod scopes;
pub mod tokens;

/// Parses `system`, `domain:<id>` or `project:<id>`.
fn parse_scope(value: &str) -> AppResult<ScopeTarget> {
    let value = value.trim();
    let (kind, target_id) = match value.split_once(':') {
        Some((kind, target_id)) => (kind, Some(target_id)),
        None => (value, None),
    };
    let kind = kind.parse::<ScopeKind>()?;

    ScopeTarget::from_parts(kind, target_id).map_err(|error| match error {
        AppError::Validation(message) => {
            AppError::Validation(format!("invalid scope '{value}': {message}"))
        }
        other => other,
    })
}
