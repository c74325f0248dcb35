use keygate_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{RoleId, ScopeTarget};

/// Subject a role can be granted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ActorId {
    /// An individual user.
    User(NonEmptyString),
    /// A group of users.
    Group(NonEmptyString),
}

impl ActorId {
    /// Creates a validated user actor.
    pub fn user(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value).map(Self::User)
    }

    /// Creates a validated group actor.
    pub fn group(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value).map(Self::Group)
    }

    /// Returns the raw actor identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::User(value) | Self::Group(value) => value.as_str(),
        }
    }

    /// Returns `"user"` or `"group"`.
    #[must_use]
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Group(_) => "group",
        }
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.type_str(), self.id())
    }
}

/// Binding of a role to an actor at a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Assignment {
    /// Actor receiving the role.
    pub actor: ActorId,
    /// Granted role.
    pub role_id: RoleId,
    /// Scope the role applies at.
    pub scope: ScopeTarget,
}

impl Assignment {
    /// Creates an assignment tuple.
    #[must_use]
    pub fn new(actor: ActorId, role_id: RoleId, scope: ScopeTarget) -> Self {
        Self {
            actor,
            role_id,
            scope,
        }
    }
}

/// Assignment joined with the role name it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectiveAssignment {
    /// Underlying assignment tuple.
    pub assignment: Assignment,
    /// Role name at the time the assignment was read.
    pub role_name: String,
}
