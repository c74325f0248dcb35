//! Keygate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use keygate_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_services::{Stores, build_app_state, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let stores = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = connect_and_migrate(database_url).await?;
            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }
            Stores::postgres(pool)
        }
        None if config.migrate_only => {
            return Err(AppError::Misconfigured(
                "DATABASE_URL is required to run migrations".to_owned(),
            ));
        }
        None => {
            info!("DATABASE_URL not set, using in-memory stores");
            Stores::in_memory()
        }
    };

    let app_state = build_app_state(&config, stores).await?;

    let token_service = app_state.token_service.clone();
    let purge_interval = config.token_purge_interval;
    tokio::spawn(async move { token_service.purge_expired_every(purge_interval).await });
    let app = api_router::build_router(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "keygate api listening");
    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}
