use keygate_core::NonEmptyString;
use keygate_domain::{ActorId, RoleId, ScopeTarget};

/// Input payload for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
}

/// Input payload for partial role updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New role name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Validated role changes handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChanges {
    /// New role name.
    pub name: Option<NonEmptyString>,
    /// New description.
    pub description: Option<String>,
}

/// Input payload for granting or revoking a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantInput {
    /// Actor receiving or losing the role.
    pub actor: ActorId,
    /// Role identifier as presented by the caller.
    pub role_id: String,
    /// Scope of the grant.
    pub scope: ScopeTarget,
}

/// Filters for assignment listings; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentQuery {
    /// Only assignments held by this actor.
    pub actor: Option<ActorId>,
    /// Only assignments of this role.
    pub role_id: Option<RoleId>,
    /// Only assignments at this scope.
    pub scope: Option<ScopeTarget>,
}

impl AssignmentQuery {
    /// Returns whether `assignment` passes every set filter.
    #[must_use]
    pub fn matches(&self, assignment: &keygate_domain::Assignment) -> bool {
        self.actor
            .as_ref()
            .is_none_or(|actor| actor == &assignment.actor)
            && self
                .role_id
                .is_none_or(|role_id| role_id == assignment.role_id)
            && self
                .scope
                .as_ref()
                .is_none_or(|scope| scope == &assignment.scope)
    }
}
