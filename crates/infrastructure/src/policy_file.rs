use std::path::Path;

use keygate_core::{AppError, AppResult};
use keygate_domain::{Operation, PolicyDocument, PolicySet};

/// Loads the policy set used by the enforcement gateway.
///
/// Without a path the built-in rules apply. A policy file replaces them
/// entirely and must cover every known operation.
pub async fn load_policy_set(path: Option<&Path>) -> AppResult<PolicySet> {
    let policy = match path {
        None => PolicySet::defaults(),
        Some(path) => {
            let contents = tokio::fs::read_to_string(path).await.map_err(|error| {
                AppError::Misconfigured(format!(
                    "failed to read policy file '{}': {error}",
                    path.display()
                ))
            })?;
            parse_policy(contents.as_str())?
        }
    };

    policy.ensure_covers(Operation::all())?;
    tracing::info!(
        rules = policy.len(),
        source = path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "built-in".to_owned()),
        "policy loaded"
    );

    Ok(policy)
}

/// Parses a JSON policy document into a validated policy set.
pub fn parse_policy(contents: &str) -> AppResult<PolicySet> {
    let document: PolicyDocument = serde_json::from_str(contents)
        .map_err(|error| AppError::Misconfigured(format!("invalid policy file: {error}")))?;

    PolicySet::from_document(document)
}

#[cfg(test)]
mod tests {
    use keygate_core::AppError;
    use keygate_domain::Operation;

    use super::{load_policy_set, parse_policy};

    fn full_policy(list_roles_clauses: &str) -> String {
        let rules = Operation::all()
            .iter()
            .map(|operation| {
                let clauses = if *operation == Operation::ListRoles {
                    list_roles_clauses.to_owned()
                } else {
                    r#"[{"has_any_role": ["admin"]}, {"scope_is": "system"}]"#.to_owned()
                };
                format!(r#""{}": {clauses}"#, operation.as_str())
            })
            .collect::<Vec<_>>()
            .join(",");
        format!(r#"{{"rules": {{{rules}}}}}"#)
    }

    #[tokio::test]
    async fn defaults_apply_without_a_file() {
        let policy = load_policy_set(None).await;
        assert!(policy.is_ok_and(|policy| policy.len() == Operation::all().len()));
    }

    #[test]
    fn complete_policy_document_parses() {
        let policy = parse_policy(&full_policy(
            r#"[{"has_any_role": ["auditor"]}, "resource_owner_matches_subject"]"#,
        ));
        let Ok(policy) = policy else {
            panic!("policy should parse");
        };
        assert!(policy.rule("identity:list_roles").is_some());
    }

    #[test]
    fn empty_clause_lists_are_rejected() {
        let policy = parse_policy(&full_policy("[]"));
        assert!(matches!(policy, Err(AppError::Misconfigured(_))));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let policy = parse_policy(r#"{"rules": {"identity:list_roles": [{"is_admin": true}]}}"#);
        assert!(matches!(policy, Err(AppError::Misconfigured(_))));
    }

    #[tokio::test]
    async fn file_missing_an_operation_fails_to_load() {
        let path = std::env::temp_dir().join(format!(
            "keygate-policy-{}.json",
            uuid::Uuid::new_v4().simple()
        ));
        let written = std::fs::write(
            &path,
            r#"{"rules": {"identity:list_roles": [{"scope_is": "system"}]}}"#,
        );
        assert!(written.is_ok());

        let policy = load_policy_set(Some(path.as_path())).await;
        let _ = std::fs::remove_file(&path);
        assert!(matches!(policy, Err(AppError::Misconfigured(_))));
    }

    #[tokio::test]
    async fn unreadable_file_is_a_misconfiguration() {
        let path = std::env::temp_dir().join("keygate-policy-does-not-exist.json");
        let policy = load_policy_set(Some(path.as_path())).await;
        assert!(matches!(policy, Err(AppError::Misconfigured(_))));
    }
}
