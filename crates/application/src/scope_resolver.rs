use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use keygate_core::{AppError, AppResult};
use keygate_domain::{DomainId, ResolvedContext, ScopeEnforcement, ScopeTarget, Token};

/// How domain grants propagate to scopes beneath the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InheritanceMode {
    /// Grants apply only at the exact scope they were made on.
    #[default]
    Disabled,
    /// A project also receives roles granted on its owning domain.
    SingleLevel,
    /// Projects and domains receive roles granted on every ancestor domain.
    Transitive,
}

impl InheritanceMode {
    /// Returns the configuration value for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::SingleLevel => "single_level",
            Self::Transitive => "transitive",
        }
    }
}

impl FromStr for InheritanceMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "false" => Ok(Self::Disabled),
            "single_level" => Ok(Self::SingleLevel),
            "transitive" => Ok(Self::Transitive),
            other => Err(AppError::Validation(format!(
                "inheritance mode must be 'disabled', 'single_level' or 'transitive', got '{other}'"
            ))),
        }
    }
}

/// Turns a validated token into the role names effective at its scope.
///
/// Both strategies are fixed at construction; every context produced by one
/// resolver carries the same scope enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeResolver {
    enforcement: ScopeEnforcement,
    inheritance: InheritanceMode,
}

impl ScopeResolver {
    /// Creates a resolver with fixed strategies.
    #[must_use]
    pub fn new(enforcement: ScopeEnforcement, inheritance: InheritanceMode) -> Self {
        Self {
            enforcement,
            inheritance,
        }
    }

    /// Returns the scope enforcement strategy.
    #[must_use]
    pub fn enforcement(&self) -> ScopeEnforcement {
        self.enforcement
    }

    /// Returns the inheritance mode.
    #[must_use]
    pub fn inheritance(&self) -> InheritanceMode {
        self.inheritance
    }

    /// Resolves the caller context of `token` at `now`.
    pub fn resolve(&self, token: &Token, now: DateTime<Utc>) -> AppResult<ResolvedContext> {
        ensure_well_formed(token)?;
        if token.is_expired_at(now) {
            return Err(AppError::Unauthenticated("token has expired".to_owned()));
        }

        let inherited = self.inherited_domains(token);
        let role_names = token
            .assignments()
            .iter()
            .filter(|effective| {
                let scope = &effective.assignment.scope;
                scope == token.scope()
                    || matches!(scope, ScopeTarget::Domain(domain_id) if inherited.contains(domain_id))
            })
            .map(|effective| effective.role_name.clone())
            .collect::<BTreeSet<_>>();

        Ok(ResolvedContext {
            subject: token.subject().to_owned(),
            scope: token.scope().clone(),
            role_names,
            scope_enforcement: self.enforcement,
        })
    }

    fn inherited_domains<'token>(&self, token: &'token Token) -> &'token [DomainId] {
        let lineage = token.scope_lineage();
        match (self.inheritance, token.scope()) {
            (InheritanceMode::Disabled, _) | (_, ScopeTarget::System) => &[],
            (InheritanceMode::SingleLevel, ScopeTarget::Project(_)) => {
                &lineage[..lineage.len().min(1)]
            }
            (InheritanceMode::SingleLevel, ScopeTarget::Domain(_)) => &[],
            (InheritanceMode::Transitive, _) => lineage,
        }
    }
}

fn ensure_well_formed(token: &Token) -> AppResult<()> {
    if token.subject().trim().is_empty() {
        return Err(AppError::Unauthenticated(
            "token carries no subject".to_owned(),
        ));
    }
    if token.expires_at() <= token.issued_at() {
        return Err(AppError::Unauthenticated(
            "token expiry precedes issuance".to_owned(),
        ));
    }
    if matches!(token.scope(), ScopeTarget::System) && !token.scope_lineage().is_empty() {
        return Err(AppError::Unauthenticated(
            "system-scoped token carries a domain lineage".to_owned(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests;
