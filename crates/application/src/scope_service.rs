use std::sync::Arc;

use keygate_core::AppResult;
use keygate_domain::{AuditAction, DomainId, Operation, ProjectId, Token};

use crate::{AuditEvent, AuditRepository, EnforcementGateway, RoleRepository, StoreTimeout};

/// Application service registering the domains and projects grants refer to.
#[derive(Clone)]
pub struct ScopeService {
    gateway: EnforcementGateway,
    repository: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    store_timeout: StoreTimeout,
}

impl ScopeService {
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

    /// Registers a domain, optionally nested under an existing parent.
    ///
    /// Repeating a registration with the same parent succeeds; a different
    /// parent is a `Conflict`.
    pub async fn register_domain(
        &self,
        token: &Token,
        domain_id: &str,
        parent_id: Option<&str>,
    ) -> AppResult<DomainId> {
        self.gateway.enforce(Operation::CreateDomain, token, None)?;

        let domain_id = DomainId::new(domain_id)?;
        let parent = parent_id.map(DomainId::new).transpose()?;
        self.store_timeout
            .run(
                "register_domain",
                self.repository
                    .register_domain(domain_id.clone(), parent.clone()),
            )
            .await?;

        self.audit(
            token,
            AuditAction::DomainRegistered,
            "domain",
            domain_id.as_str(),
            parent.map(|parent| format!("parent {parent}")),
        )
        .await?;

        Ok(domain_id)
    }

    /// Registers a project under an existing domain.
    pub async fn register_project(
        &self,
        token: &Token,
        project_id: &str,
        domain_id: &str,
    ) -> AppResult<ProjectId> {
        self.gateway.enforce(Operation::CreateProject, token, None)?;

        let project_id = ProjectId::new(project_id)?;
        let domain_id = DomainId::new(domain_id)?;
        self.store_timeout
            .run(
                "register_project",
                self.repository
                    .register_project(project_id.clone(), domain_id.clone()),
            )
            .await?;

        self.audit(
            token,
            AuditAction::ProjectRegistered,
            "project",
            project_id.as_str(),
            Some(format!("domain {domain_id}")),
        )
        .await?;

        Ok(project_id)
    }

    async fn audit(
        &self,
        token: &Token,
        action: AuditAction,
        resource_type: &str,
        resource_id: &str,
        detail: Option<String>,
    ) -> AppResult<()> {
        self.store_timeout
            .run(
                "append_audit_event",
                self.audit_repository.append_event(AuditEvent {
                    subject: token.subject().to_owned(),
                    action,
                    resource_type: resource_type.to_owned(),
                    resource_id: resource_id.to_owned(),
                    detail,
                }),
            )
            .await
    }
}
