use std::sync::Arc;

use keygate_core::{AppError, AppResult};
use keygate_domain::{
    ADMIN_ROLE_NAME, ActorId, Assignment, DEFAULT_DOMAIN_ID, DomainId, MEMBER_ROLE_NAME,
    READER_ROLE_NAME, Role, RoleId, ScopeTarget,
};

use crate::{RoleRepository, StoreTimeout};

/// Identifiers produced by a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// The `admin` role.
    pub admin_role_id: RoleId,
    /// The `member` role.
    pub member_role_id: RoleId,
    /// The `reader` role.
    pub reader_role_id: RoleId,
    /// Subject granted `admin` at system scope, when one was configured.
    pub admin_subject: Option<String>,
}

/// Seeds a fresh deployment with its default domain and built-in roles.
///
/// Running it against an already seeded store changes nothing.
#[derive(Clone)]
pub struct BootstrapService {
    repository: Arc<dyn RoleRepository>,
    store_timeout: StoreTimeout,
}

impl BootstrapService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>, store_timeout: StoreTimeout) -> Self {
        Self {
            repository,
            store_timeout,
        }
    }

    /// Ensures the default domain, the built-in roles, and the optional admin grant.
    pub async fn run(&self, admin_subject: Option<&str>) -> AppResult<BootstrapReport> {
        let default_domain = DomainId::new(DEFAULT_DOMAIN_ID)?;
        self.store_timeout
            .run(
                "register_domain",
                self.repository.register_domain(default_domain, None),
            )
            .await?;

        let admin_role_id = self
            .ensure_role(ADMIN_ROLE_NAME, "Full control over identity resources")
            .await?;
        let member_role_id = self
            .ensure_role(MEMBER_ROLE_NAME, "Standard access to identity resources")
            .await?;
        let reader_role_id = self
            .ensure_role(READER_ROLE_NAME, "Read-only access to identity resources")
            .await?;

        let admin_subject = match admin_subject.map(str::trim) {
            Some(subject) if !subject.is_empty() => {
                let assignment =
                    Assignment::new(ActorId::user(subject)?, admin_role_id, ScopeTarget::System);
                self.store_timeout
                    .run("grant", self.repository.grant(assignment))
                    .await?;
                tracing::info!(subject, "bootstrap admin granted at system scope");
                Some(subject.to_owned())
            }
            _ => None,
        };

        tracing::info!(
            admin_role_id = %admin_role_id,
            member_role_id = %member_role_id,
            reader_role_id = %reader_role_id,
            "bootstrap completed"
        );

        Ok(BootstrapReport {
            admin_role_id,
            member_role_id,
            reader_role_id,
            admin_subject,
        })
    }

    async fn ensure_role(&self, name: &str, description: &str) -> AppResult<RoleId> {
        if let Some(role) = self.find_by_name(name).await? {
            return Ok(role.id());
        }

        let role = Role::new(name, Some(description.to_owned()))?;
        match self
            .store_timeout
            .run("create_role", self.repository.create_role(role))
            .await
        {
            Ok(role) => {
                tracing::info!(role = name, role_id = %role.id(), "built-in role created");
                Ok(role.id())
            }
            // Another instance created it between the lookup and the insert.
            Err(AppError::Conflict(_)) => self
                .find_by_name(name)
                .await?
                .map(|role| role.id())
                .ok_or_else(|| {
                    AppError::Internal(format!("built-in role '{name}' vanished during bootstrap"))
                }),
            Err(error) => Err(error),
        }
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        self.store_timeout
            .run("find_role_by_name", self.repository.find_role_by_name(name))
            .await
    }
}
