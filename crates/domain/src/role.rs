use std::str::FromStr;

use keygate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the bootstrap role granting full administration.
pub const ADMIN_ROLE_NAME: &str = "admin";
/// Name of the bootstrap role for regular members.
pub const MEMBER_ROLE_NAME: &str = "member";
/// Name of the bootstrap read-only role.
pub const READER_ROLE_NAME: &str = "reader";

/// Unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.simple())
    }
}

impl FromStr for RoleId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| AppError::NotFound(format!("role '{value}' was not found")))
    }
}

/// Named permission bundle assignable to actors at a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    description: Option<String>,
}

impl Role {
    /// Creates a role with a fresh identifier.
    pub fn new(name: impl Into<String>, description: Option<String>) -> AppResult<Self> {
        Ok(Self {
            id: RoleId::new(),
            name: NonEmptyString::new(name)?,
            description,
        })
    }

    /// Rehydrates a stored role.
    #[must_use]
    pub fn from_parts(id: RoleId, name: NonEmptyString, description: Option<String>) -> Self {
        Self {
            id,
            name,
            description,
        }
    }

    /// Returns the stable identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the unique role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns a copy with the given changes applied; the identifier never changes.
    #[must_use]
    pub fn with_changes(
        &self,
        name: Option<NonEmptyString>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: self.id,
            name: name.unwrap_or_else(|| self.name.clone()),
            description: description.or_else(|| self.description.clone()),
        }
    }
}
