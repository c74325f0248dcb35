use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keygate_core::AppResult;
use keygate_domain::{
    ActorId, Assignment, DomainId, EffectiveAssignment, ProjectId, Role, RoleId, ScopeTarget,
    Token, TokenId,
};

use super::{AssignmentQuery, RoleChanges};

/// Repository port for roles, assignments and the scope targets they refer to.
///
/// Every mutation is atomic with respect to concurrent readers. In particular
/// `delete_role` removes the role and all of its assignments as one unit.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a new role; `Conflict` when the name is taken.
    async fn create_role(&self, role: Role) -> AppResult<Role>;

    /// Finds a role by identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by its unique name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Applies changes to a role; `NotFound` for unknown ids, `Conflict` on rename clashes.
    async fn update_role(&self, role_id: RoleId, changes: RoleChanges) -> AppResult<Role>;

    /// Deletes a role and every assignment referencing it.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Lists roles ordered by name, then id.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Grants a role; granting an existing tuple is a no-op.
    async fn grant(&self, assignment: Assignment) -> AppResult<()>;

    /// Revokes a role; revoking an absent tuple is a no-op.
    async fn revoke(&self, assignment: &Assignment) -> AppResult<()>;

    /// Lists the assignments held directly by one actor.
    async fn assignments_for(&self, actor: &ActorId) -> AppResult<Vec<EffectiveAssignment>>;

    /// Lists assignments matching a query, in stable order.
    async fn list_assignments(&self, query: AssignmentQuery)
    -> AppResult<Vec<EffectiveAssignment>>;

    /// Registers a domain; re-registering with the same parent is a no-op.
    async fn register_domain(&self, domain_id: DomainId, parent: Option<DomainId>)
    -> AppResult<()>;

    /// Registers a project under an existing domain.
    async fn register_project(&self, project_id: ProjectId, domain_id: DomainId)
    -> AppResult<()>;

    /// Returns the ancestor domains of a scope target, nearest first.
    ///
    /// A project's lineage starts with its owning domain. `NotFound` when the
    /// target is not registered.
    async fn scope_lineage(&self, scope: &ScopeTarget) -> AppResult<Vec<DomainId>>;
}

/// Repository port for issued tokens.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Stores an issued token.
    async fn save_token(&self, token: Token) -> AppResult<()>;

    /// Finds a token by its identifier.
    async fn find_token(&self, token_id: &TokenId) -> AppResult<Option<Token>>;

    /// Drops tokens expired at `now`, returning how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<usize>;
}
