use std::str::FromStr;
use std::sync::Arc;

use keygate_core::{AppError, AppResult, NonEmptyString};
use keygate_domain::{AuditAction, Operation, Role, RoleId, Token};

use crate::{
    AuditEvent, AuditRepository, CreateRoleInput, EnforcementGateway, RoleChanges, RoleRepository,
    StoreTimeout, UpdateRoleInput,
};

/// Application service for role CRUD.
///
/// Every method authorizes through the gateway before the repository is
/// touched, so callers without access never learn whether a role exists.
#[derive(Clone)]
pub struct RoleService {
    gateway: EnforcementGateway,
    repository: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    store_timeout: StoreTimeout,
}

impl RoleService {
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

    /// Lists every role in the deployment.
    pub async fn list_roles(&self, token: &Token) -> AppResult<Vec<Role>> {
        self.gateway.enforce(Operation::ListRoles, token, None)?;

        self.store_timeout
            .run("list_roles", self.repository.list_roles())
            .await
    }

    /// Returns one role by identifier.
    pub async fn get_role(&self, token: &Token, role_id: &str) -> AppResult<Role> {
        self.gateway.enforce(Operation::GetRole, token, None)?;

        let role_id = RoleId::from_str(role_id)?;
        self.store_timeout
            .run("find_role", self.repository.find_role(role_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Creates a role and emits an audit event.
    pub async fn create_role(&self, token: &Token, input: CreateRoleInput) -> AppResult<Role> {
        self.gateway.enforce(Operation::CreateRole, token, None)?;

        let role = Role::new(input.name, normalize_description(input.description))?;
        let role = self
            .store_timeout
            .run("create_role", self.repository.create_role(role))
            .await?;

        self.audit(
            token,
            AuditAction::RoleCreated,
            &role,
            format!("created role '{}'", role.name()),
        )
        .await?;

        Ok(role)
    }

    /// Applies a partial update to a role and emits an audit event.
    pub async fn update_role(
        &self,
        token: &Token,
        role_id: &str,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        self.gateway.enforce(Operation::UpdateRole, token, None)?;

        let role_id = RoleId::from_str(role_id)?;
        if input.name.is_none() && input.description.is_none() {
            return Err(AppError::Validation(
                "role update must change the name or the description".to_owned(),
            ));
        }
        let changes = RoleChanges {
            name: input.name.map(NonEmptyString::new).transpose()?,
            description: normalize_description(input.description),
        };

        let role = self
            .store_timeout
            .run("update_role", self.repository.update_role(role_id, changes))
            .await?;

        self.audit(
            token,
            AuditAction::RoleUpdated,
            &role,
            format!("updated role '{}'", role.name()),
        )
        .await?;

        Ok(role)
    }

    /// Deletes a role together with all assignments referencing it.
    pub async fn delete_role(&self, token: &Token, role_id: &str) -> AppResult<()> {
        self.gateway.enforce(Operation::DeleteRole, token, None)?;

        let role_id = RoleId::from_str(role_id)?;
        let role = self
            .store_timeout
            .run("find_role", self.repository.find_role(role_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        self.store_timeout
            .run("delete_role", self.repository.delete_role(role_id))
            .await?;

        self.audit(
            token,
            AuditAction::RoleDeleted,
            &role,
            format!("deleted role '{}' and its assignments", role.name()),
        )
        .await
    }

    async fn audit(
        &self,
        token: &Token,
        action: AuditAction,
        role: &Role,
        detail: String,
    ) -> AppResult<()> {
        self.store_timeout
            .run(
                "append_audit_event",
                self.audit_repository.append_event(AuditEvent {
                    subject: token.subject().to_owned(),
                    action,
                    resource_type: "role".to_owned(),
                    resource_id: role.id().to_string(),
                    detail: Some(detail),
                }),
            )
            .await
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.map(|value| value.trim().to_owned())
}
