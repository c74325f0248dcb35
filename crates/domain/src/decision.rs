use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ScopeKind, ScopeTarget};

/// Whether scope-kind clauses participate in evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeEnforcement {
    /// `scope_is` clauses are checked.
    #[default]
    Enforced,
    /// `scope_is` clauses always hold (pre-scope deployments).
    Legacy,
}

/// Caller scope and roles after filtering a token's assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    /// Token subject.
    pub subject: String,
    /// Scope claim of the token.
    pub scope: ScopeTarget,
    /// Role names effective at that scope.
    pub role_names: BTreeSet<String>,
    /// Strategy inherited from the resolver that built this context.
    pub scope_enforcement: ScopeEnforcement,
}

impl ResolvedContext {
    /// Returns the kind of the token's scope.
    #[must_use]
    pub fn scope_kind(&self) -> ScopeKind {
        self.scope.kind()
    }

    /// Returns the scope target id, `None` for system scope.
    #[must_use]
    pub fn scope_target(&self) -> Option<&str> {
        self.scope.target_id()
    }
}

/// Reason attached to a denial, naming the first failing check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No rule is registered under the requested name.
    UnknownRule {
        /// Requested rule name.
        rule: String,
    },
    /// The caller holds none of the required roles.
    MissingRole {
        /// Roles that would satisfy the clause.
        required: BTreeSet<String>,
    },
    /// The token scope kind differs from the required one.
    ScopeMismatch {
        /// Required kind.
        required: ScopeKind,
        /// Kind carried by the token.
        actual: ScopeKind,
    },
    /// The resource is absent or owned by someone else.
    OwnerMismatch {
        /// Owner supplied by the caller, if any.
        owner: Option<String>,
    },
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRule { rule } => write!(formatter, "no rule registered for '{rule}'"),
            Self::MissingRole { required } => {
                let required = required.iter().cloned().collect::<Vec<_>>().join(",");
                write!(formatter, "has_any_role({required}) failed")
            }
            Self::ScopeMismatch { required, actual } => {
                write!(formatter, "scope_is({required}) failed, token scope is {actual}")
            }
            Self::OwnerMismatch { owner } => match owner {
                Some(owner) => write!(
                    formatter,
                    "resource_owner_matches_subject failed, owner is '{owner}'"
                ),
                None => formatter
                    .write_str("resource_owner_matches_subject failed, resource has no owner"),
            },
        }
    }
}

/// Outcome of evaluating one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Every clause held.
    Allow,
    /// At least one clause failed or the rule is unknown.
    Deny(DenyReason),
}

impl Decision {
    /// Returns whether the decision allows the operation.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}
