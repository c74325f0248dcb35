use std::str::FromStr;
use std::sync::Arc;

use keygate_core::{AppError, AppResult};
use keygate_domain::{
    ActorId, Assignment, AuditAction, EffectiveAssignment, Operation, RoleId, Token,
};

use crate::{
    AssignmentQuery, AuditEvent, AuditRepository, EnforcementGateway, GrantInput, RoleRepository,
    StoreTimeout,
};

/// Application service for granting, revoking and listing role assignments.
#[derive(Clone)]
pub struct AssignmentService {
    gateway: EnforcementGateway,
    repository: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    store_timeout: StoreTimeout,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        gateway: EnforcementGateway,
        repository: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        store_timeout: StoreTimeout,
    ) -> Self {
        Self {
            gateway,
            repository,
            audit_repository,
            store_timeout,
        }
    }

    /// Grants a role to a user or group at a scope.
    pub async fn grant(&self, token: &Token, input: GrantInput) -> AppResult<()> {
        self.gateway.enforce(Operation::CreateGrant, token, None)?;

        let assignment = self.resolve_assignment(input).await?;
        self.store_timeout
            .run("scope_lineage", self.repository.scope_lineage(&assignment.scope))
            .await?;
        self.store_timeout
            .run("grant", self.repository.grant(assignment.clone()))
            .await?;

        self.audit(token, AuditAction::RoleGranted, &assignment).await
    }

    /// Revokes a role; revoking a grant that does not exist succeeds quietly.
    pub async fn revoke(&self, token: &Token, input: GrantInput) -> AppResult<()> {
        self.gateway.enforce(Operation::RevokeGrant, token, None)?;

        let assignment = self.resolve_assignment(input).await?;
        self.store_timeout
            .run("revoke", self.repository.revoke(&assignment))
            .await?;

        self.audit(token, AuditAction::RoleRevoked, &assignment).await
    }

    /// Lists assignments across the deployment matching the query.
    pub async fn list_role_assignments(
        &self,
        token: &Token,
        query: AssignmentQuery,
    ) -> AppResult<Vec<EffectiveAssignment>> {
        self.gateway
            .enforce(Operation::ListRoleAssignments, token, None)?;

        self.store_timeout
            .run("list_assignments", self.repository.list_assignments(query))
            .await
    }

    /// Lists the direct assignments of one user; only that user may ask.
    pub async fn list_user_role_assignments(
        &self,
        token: &Token,
        user_id: &str,
    ) -> AppResult<Vec<EffectiveAssignment>> {
        self.gateway
            .enforce(Operation::ListUserRoleAssignments, token, Some(user_id))?;

        let actor = ActorId::user(user_id)?;
        self.store_timeout
            .run("assignments_for", self.repository.assignments_for(&actor))
            .await
    }

    async fn resolve_assignment(&self, input: GrantInput) -> AppResult<Assignment> {
        let role_id = RoleId::from_str(&input.role_id)?;
        let role = self
            .store_timeout
            .run("find_role", self.repository.find_role(role_id))
            .await?;
        if role.is_none() {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                input.role_id
            )));
        }

        Ok(Assignment::new(input.actor, role_id, input.scope))
    }

    async fn audit(
        &self,
        token: &Token,
        action: AuditAction,
        assignment: &Assignment,
    ) -> AppResult<()> {
        self.store_timeout
            .run(
                "append_audit_event",
                self.audit_repository.append_event(AuditEvent {
                    subject: token.subject().to_owned(),
                    action,
                    resource_type: "role_assignment".to_owned(),
                    resource_id: assignment.role_id.to_string(),
                    detail: Some(format!("{} at {}", assignment.actor, assignment.scope)),
                }),
            )
            .await
    }
}
