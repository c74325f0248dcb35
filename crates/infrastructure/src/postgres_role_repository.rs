use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use keygate_application::{AssignmentQuery, RoleChanges, RoleRepository};
use keygate_core::{AppError, AppResult, NonEmptyString};
use keygate_domain::{
    ActorId, Assignment, DomainId, EffectiveAssignment, ProjectId, Role, RoleId, ScopeKind,
    ScopeTarget,
};

mod assignments;
mod roles;
mod scopes;

/// Upper bound on domain nesting followed when computing a lineage.
const MAX_DOMAIN_DEPTH: i32 = 64;

/// PostgreSQL-backed role, assignment and scope registry.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    name: String,
    description: Option<String>,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let name = NonEmptyString::new(row.name).map_err(|error| {
            AppError::Internal(format!("stored role '{}' has an invalid name: {error}", row.id))
        })?;
        Ok(Role::from_parts(
            RoleId::from_uuid(row.id),
            name,
            row.description,
        ))
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    actor_type: String,
    actor_id: String,
    role_id: uuid::Uuid,
    role_name: String,
    scope_kind: String,
    scope_id: String,
}

impl TryFrom<AssignmentRow> for EffectiveAssignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let actor = match row.actor_type.as_str() {
            "user" => ActorId::user(row.actor_id),
            "group" => ActorId::group(row.actor_id),
            other => {
                return Err(AppError::Internal(format!(
                    "stored assignment has unknown actor type '{other}'"
                )));
            }
        }?;
        let kind = ScopeKind::from_str(row.scope_kind.as_str())?;
        let target_id = (!row.scope_id.is_empty()).then_some(row.scope_id.as_str());
        let scope = ScopeTarget::from_parts(kind, target_id)?;

        Ok(EffectiveAssignment {
            assignment: Assignment::new(actor, RoleId::from_uuid(row.role_id), scope),
            role_name: row.role_name,
        })
    }
}

/// Columns identifying one assignment row.
struct AssignmentKey<'a> {
    actor_type: &'static str,
    actor_id: &'a str,
    role_id: uuid::Uuid,
    scope_kind: &'static str,
    scope_id: &'a str,
}

impl<'a> From<&'a Assignment> for AssignmentKey<'a> {
    fn from(assignment: &'a Assignment) -> Self {
        Self {
            actor_type: assignment.actor.type_str(),
            actor_id: assignment.actor.id(),
            role_id: assignment.role_id.as_uuid(),
            scope_kind: assignment.scope.kind().as_str(),
            scope_id: assignment.scope.target_id().unwrap_or_default(),
        }
    }
}

fn map_role_conflict(error: sqlx::Error, role_name: &str, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to {context}: {error}"))
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn create_role(&self, role: Role) -> AppResult<Role> {
        self.create_role_impl(role).await
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.find_role_impl(role_id).await
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        self.find_role_by_name_impl(name).await
    }

    async fn update_role(&self, role_id: RoleId, changes: RoleChanges) -> AppResult<Role> {
        self.update_role_impl(role_id, changes).await
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.delete_role_impl(role_id).await
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.list_roles_impl().await
    }

    async fn grant(&self, assignment: Assignment) -> AppResult<()> {
        self.grant_impl(assignment).await
    }

    async fn revoke(&self, assignment: &Assignment) -> AppResult<()> {
        self.revoke_impl(assignment).await
    }

    async fn assignments_for(&self, actor: &ActorId) -> AppResult<Vec<EffectiveAssignment>> {
        self.list_assignments_impl(AssignmentQuery {
            actor: Some(actor.clone()),
            ..AssignmentQuery::default()
        })
        .await
    }

    async fn list_assignments(
        &self,
        query: AssignmentQuery,
    ) -> AppResult<Vec<EffectiveAssignment>> {
        self.list_assignments_impl(query).await
    }

    async fn register_domain(
        &self,
        domain_id: DomainId,
        parent: Option<DomainId>,
    ) -> AppResult<()> {
        self.register_domain_impl(domain_id, parent).await
    }

    async fn register_project(&self, project_id: ProjectId, domain_id: DomainId) -> AppResult<()> {
        self.register_project_impl(project_id, domain_id).await
    }

    async fn scope_lineage(&self, scope: &ScopeTarget) -> AppResult<Vec<DomainId>> {
        self.scope_lineage_impl(scope).await
    }
}

#[cfg(test)]
mod tests;
