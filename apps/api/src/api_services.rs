use std::sync::Arc;

use keygate_application::{
    AssignmentService, AuditRepository, BootstrapService, EnforcementGateway, RoleRepository,
    RoleService, ScopeResolver, ScopeService, StoreTimeout, TokenService,
};
use keygate_core::AppError;
use keygate_infrastructure::{
    InMemoryAuditRepository, InMemoryRoleRepository, InMemoryTokenRepository,
    PostgresAuditRepository, PostgresRoleRepository, load_policy_set,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Repositories backing the services, chosen by configuration.
pub struct Stores {
    pub role_repository: Arc<dyn RoleRepository>,
    pub audit_repository: Arc<dyn AuditRepository>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            role_repository: Arc::new(PostgresRoleRepository::new(pool.clone())),
            audit_repository: Arc::new(PostgresAuditRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            role_repository: Arc::new(InMemoryRoleRepository::new()),
            audit_repository: Arc::new(InMemoryAuditRepository::new()),
        }
    }
}

pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

pub async fn build_app_state(config: &ApiConfig, stores: Stores) -> Result<AppState, AppError> {
    let policy = load_policy_set(config.policy_file.as_deref()).await?;
    let resolver = ScopeResolver::new(config.scope_enforcement, config.inheritance);
    let gateway = EnforcementGateway::new(resolver, Arc::new(policy));
    let store_timeout = StoreTimeout::new(config.store_timeout);

    BootstrapService::new(stores.role_repository.clone(), store_timeout)
        .run(config.bootstrap_admin_subject.as_deref())
        .await?;

    Ok(AppState {
        role_service: RoleService::new(
            gateway.clone(),
            stores.role_repository.clone(),
            stores.audit_repository.clone(),
            store_timeout,
        ),
        assignment_service: AssignmentService::new(
            gateway.clone(),
            stores.role_repository.clone(),
            stores.audit_repository.clone(),
            store_timeout,
        ),
        scope_service: ScopeService::new(
            gateway,
            stores.role_repository.clone(),
            stores.audit_repository,
            store_timeout,
        ),
        token_service: TokenService::new(
            resolver,
            stores.role_repository,
            Arc::new(InMemoryTokenRepository::new()),
            store_timeout,
            config.token_ttl,
        ),
        bootstrap_token: config.bootstrap_token.clone(),
    })
}
