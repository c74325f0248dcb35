//! Policy rules and their evaluation.
//!
//! A rule is a conjunction of clauses. Evaluation is a pure function of the
//! rule set, the resolved caller context and the optional resource owner, so
//! a [`PolicySet`] can be shared freely between concurrent requests.

use std::collections::{BTreeMap, BTreeSet};

use keygate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{
    ADMIN_ROLE_NAME, Decision, DenyReason, MEMBER_ROLE_NAME, Operation, READER_ROLE_NAME,
    ResolvedContext, ScopeEnforcement, ScopeKind,
};

/// Single predicate inside a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    /// Holds when the caller has at least one of the named roles.
    HasAnyRole(BTreeSet<String>),
    /// Holds when the token scope is of the given kind.
    ScopeIs(ScopeKind),
    /// Holds when the resource owner equals the token subject.
    ResourceOwnerMatchesSubject,
}

impl Clause {
    /// Convenience constructor for [`Clause::HasAnyRole`].
    #[must_use]
    pub fn has_any_role(names: &[&str]) -> Self {
        Self::HasAnyRole(names.iter().map(|name| (*name).to_owned()).collect())
    }

    fn check(&self, context: &ResolvedContext, resource_owner: Option<&str>) -> Result<(), DenyReason> {
        match self {
            Self::HasAnyRole(required) => {
                if required.iter().any(|name| context.role_names.contains(name)) {
                    Ok(())
                } else {
                    Err(DenyReason::MissingRole {
                        required: required.clone(),
                    })
                }
            }
            Self::ScopeIs(required) => {
                if context.scope_enforcement == ScopeEnforcement::Legacy
                    || context.scope_kind() == *required
                {
                    Ok(())
                } else {
                    Err(DenyReason::ScopeMismatch {
                        required: *required,
                        actual: context.scope_kind(),
                    })
                }
            }
            Self::ResourceOwnerMatchesSubject => match resource_owner {
                Some(owner) if owner == context.subject => Ok(()),
                owner => Err(DenyReason::OwnerMismatch {
                    owner: owner.map(str::to_owned),
                }),
            },
        }
    }

    fn validate(&self, rule_name: &str) -> AppResult<()> {
        match self {
            Self::HasAnyRole(names) if names.is_empty() => Err(AppError::Misconfigured(format!(
                "rule '{rule_name}' has a has_any_role clause without roles"
            ))),
            Self::HasAnyRole(names) if names.iter().any(|name| name.trim().is_empty()) => {
                Err(AppError::Misconfigured(format!(
                    "rule '{rule_name}' names a blank role"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Named policy predicate guarding one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    name: String,
    clauses: Vec<Clause>,
}

impl PolicyRule {
    /// Creates a validated rule.
    pub fn new(name: impl Into<String>, clauses: Vec<Clause>) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Misconfigured(
                "policy rule name must not be empty".to_owned(),
            ));
        }
        if clauses.is_empty() {
            return Err(AppError::Misconfigured(format!(
                "rule '{name}' must declare at least one clause"
            )));
        }
        for clause in &clauses {
            clause.validate(name.as_str())?;
        }

        Ok(Self { name, clauses })
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the clauses in evaluation order.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        self.clauses.as_slice()
    }

    fn evaluate(&self, context: &ResolvedContext, resource_owner: Option<&str>) -> Decision {
        for clause in &self.clauses {
            if let Err(reason) = clause.check(context, resource_owner) {
                return Decision::Deny(reason);
            }
        }

        Decision::Allow
    }
}

/// Serialized form of a policy file: rule name to clause list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    /// Rules keyed by operation name.
    pub rules: BTreeMap<String, Vec<Clause>>,
}

/// Immutable set of rules loaded at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySet {
    rules: BTreeMap<String, PolicyRule>,
}

impl PolicySet {
    /// Builds a policy set, rejecting duplicate rule names.
    pub fn from_rules(rules: impl IntoIterator<Item = PolicyRule>) -> AppResult<Self> {
        let mut by_name = BTreeMap::new();
        for rule in rules {
            let name = rule.name.clone();
            if by_name.insert(name.clone(), rule).is_some() {
                return Err(AppError::Misconfigured(format!(
                    "rule '{name}' is declared more than once"
                )));
            }
        }

        Ok(Self { rules: by_name })
    }

    /// Builds a policy set from a parsed policy document.
    pub fn from_document(document: PolicyDocument) -> AppResult<Self> {
        let rules = document
            .rules
            .into_iter()
            .map(|(name, clauses)| PolicyRule::new(name, clauses))
            .collect::<AppResult<Vec<_>>>()?;

        Self::from_rules(rules)
    }

    /// Returns the built-in rules for every known operation.
    #[must_use]
    pub fn defaults() -> Self {
        let any_role = Clause::has_any_role(&[READER_ROLE_NAME, MEMBER_ROLE_NAME, ADMIN_ROLE_NAME]);
        let admin = Clause::has_any_role(&[ADMIN_ROLE_NAME]);
        let system = Clause::ScopeIs(ScopeKind::System);

        let rules = Operation::all()
            .iter()
            .map(|operation| {
                let clauses = match operation {
                    Operation::ListRoles
                    | Operation::GetRole
                    | Operation::ListRoleAssignments => vec![any_role.clone(), system.clone()],
                    Operation::CreateRole
                    | Operation::UpdateRole
                    | Operation::DeleteRole
                    | Operation::CreateGrant
                    | Operation::RevokeGrant
                    | Operation::CreateDomain
                    | Operation::CreateProject => vec![admin.clone(), system.clone()],
                    Operation::ListUserRoleAssignments => {
                        vec![Clause::ResourceOwnerMatchesSubject]
                    }
                };
                (
                    operation.as_str().to_owned(),
                    PolicyRule {
                        name: operation.as_str().to_owned(),
                        clauses,
                    },
                )
            })
            .collect();

        Self { rules }
    }

    /// Fails with `Misconfigured` when any of `operations` has no rule.
    pub fn ensure_covers(&self, operations: &[Operation]) -> AppResult<()> {
        let missing = operations
            .iter()
            .filter(|operation| !self.rules.contains_key(operation.as_str()))
            .map(|operation| operation.as_str())
            .collect::<Vec<_>>();

        if missing.is_empty() {
            return Ok(());
        }

        Err(AppError::Misconfigured(format!(
            "policy has no rule for: {}",
            missing.join(", ")
        )))
    }

    /// Returns the rule registered under `name`.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&PolicyRule> {
        self.rules.get(name)
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates a rule; an unknown rule name always denies.
    #[must_use]
    pub fn evaluate(
        &self,
        rule_name: &str,
        context: &ResolvedContext,
        resource_owner: Option<&str>,
    ) -> Decision {
        match self.rules.get(rule_name) {
            Some(rule) => rule.evaluate(context, resource_owner),
            None => Decision::Deny(DenyReason::UnknownRule {
                rule: rule_name.to_owned(),
            }),
        }
    }
}
