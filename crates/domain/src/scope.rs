use std::str::FromStr;

use keygate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Identifier of the domain created by bootstrap.
pub const DEFAULT_DOMAIN_ID: &str = "default";

/// Identifier of a domain, the tenant-grouping scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainId(NonEmptyString);

impl DomainId {
    /// Creates a validated domain identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value).map(Self)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identifier of a project, the single-tenant scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(NonEmptyString);

impl ProjectId {
    /// Creates a validated project identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value).map(Self)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Breadth at which a token or a grant applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// The whole deployment.
    System,
    /// A tenant grouping.
    Domain,
    /// A single tenant.
    Project,
}

impl ScopeKind {
    /// Returns a stable storage value for this scope kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Domain => "domain",
            Self::Project => "project",
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ScopeKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Self::System),
            "domain" => Ok(Self::Domain),
            "project" => Ok(Self::Project),
            _ => Err(AppError::Validation(format!(
                "unknown scope kind '{value}'"
            ))),
        }
    }
}

/// Concrete scope a token is bound to or a grant applies at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScopeTarget {
    /// Deployment-wide scope.
    System,
    /// Scope of one domain.
    Domain(DomainId),
    /// Scope of one project.
    Project(ProjectId),
}

impl ScopeTarget {
    /// Returns the kind of this scope.
    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::System => ScopeKind::System,
            Self::Domain(_) => ScopeKind::Domain,
            Self::Project(_) => ScopeKind::Project,
        }
    }

    /// Returns the target identifier, `None` for the system scope.
    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::System => None,
            Self::Domain(domain_id) => Some(domain_id.as_str()),
            Self::Project(project_id) => Some(project_id.as_str()),
        }
    }

    /// Builds a scope from its storage kind and optional target id.
    pub fn from_parts(kind: ScopeKind, target_id: Option<&str>) -> AppResult<Self> {
        match (kind, target_id) {
            (ScopeKind::System, None) => Ok(Self::System),
            (ScopeKind::Domain, Some(value)) => DomainId::new(value).map(Self::Domain),
            (ScopeKind::Project, Some(value)) => ProjectId::new(value).map(Self::Project),
            (ScopeKind::System, Some(value)) => Err(AppError::Validation(format!(
                "system scope does not take a target id, got '{value}'"
            ))),
            (kind, None) => Err(AppError::Validation(format!(
                "{kind} scope requires a target id"
            ))),
        }
    }
}

impl std::fmt::Display for ScopeTarget {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.target_id() {
            Some(target_id) => write!(formatter, "{}:{target_id}", self.kind()),
            None => formatter.write_str(self.kind().as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{ScopeKind, ScopeTarget};

    #[test]
    fn scope_kind_roundtrip_storage_value() {
        for kind in [ScopeKind::System, ScopeKind::Domain, ScopeKind::Project] {
            let restored = ScopeKind::from_str(kind.as_str());
            assert_eq!(restored.unwrap_or(ScopeKind::System), kind);
        }
    }

    #[test]
    fn system_scope_rejects_target_id() {
        let result = ScopeTarget::from_parts(ScopeKind::System, Some("default"));
        assert!(result.is_err());
    }

    #[test]
    fn project_scope_requires_target_id() {
        let result = ScopeTarget::from_parts(ScopeKind::Project, None);
        assert!(result.is_err());
    }

    #[test]
    fn scope_target_display_includes_id() {
        let scope = ScopeTarget::from_parts(ScopeKind::Domain, Some("default"))
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(scope.to_string(), "domain:default");
        assert_eq!(ScopeTarget::System.to_string(), "system");
    }
}
