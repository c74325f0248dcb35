use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DomainId, EffectiveAssignment, ScopeTarget};

/// Opaque token identifier presented by callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    /// Creates a random token identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()))
    }

    /// Wraps a presented token value.
    #[must_use]
    pub fn from_presented(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Validated, immutable token as produced by issuance.
///
/// Assignments and the scope lineage are snapshots taken at issuance time.
/// Validation narrows the assignments to the ones still held; later grants
/// only apply to newly issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    id: TokenId,
    subject: String,
    assignments: Vec<EffectiveAssignment>,
    scope: ScopeTarget,
    scope_lineage: Vec<DomainId>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Token {
    /// Assembles a token from issuance data.
    #[must_use]
    pub fn new(
        id: TokenId,
        subject: impl Into<String>,
        assignments: Vec<EffectiveAssignment>,
        scope: ScopeTarget,
        scope_lineage: Vec<DomainId>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            assignments,
            scope,
            scope_lineage,
            issued_at,
            expires_at,
        }
    }

    /// Replaces the assignment snapshot, keeping every other claim.
    #[must_use]
    pub fn with_assignments(self, assignments: Vec<EffectiveAssignment>) -> Self {
        Self {
            assignments,
            ..self
        }
    }

    /// Returns the token identifier.
    #[must_use]
    pub fn id(&self) -> &TokenId {
        &self.id
    }

    /// Returns the user id the token was issued to.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the assignments effective at issuance.
    #[must_use]
    pub fn assignments(&self) -> &[EffectiveAssignment] {
        self.assignments.as_slice()
    }

    /// Returns the scope claim.
    #[must_use]
    pub fn scope(&self) -> &ScopeTarget {
        &self.scope
    }

    /// Returns the ancestor domains of the scoped target, nearest first.
    #[must_use]
    pub fn scope_lineage(&self) -> &[DomainId] {
        self.scope_lineage.as_slice()
    }

    /// Returns the issuance timestamp.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the expiry timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns whether the token is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
