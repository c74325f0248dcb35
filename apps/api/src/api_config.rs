use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use keygate_application::InheritanceMode;
use keygate_core::AppError;
use keygate_domain::ScopeEnforcement;
use tracing_subscriber::EnvFilter;

const MIN_BOOTSTRAP_TOKEN_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub database_url: Option<String>,
    pub bootstrap_token: String,
    pub bootstrap_admin_subject: Option<String>,
    pub scope_enforcement: ScopeEnforcement,
    pub inheritance: InheritanceMode,
    pub token_ttl: chrono::Duration,
    pub store_timeout: Duration,
    pub token_purge_interval: Duration,
    pub policy_file: Option<PathBuf>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parsed_env("API_PORT", 5000_u16)?;
        let database_url = optional_env("DATABASE_URL");

        let bootstrap_token = required_non_empty_env("BOOTSTRAP_TOKEN")?;
        if bootstrap_token.len() < MIN_BOOTSTRAP_TOKEN_LEN {
            return Err(AppError::Misconfigured(format!(
                "BOOTSTRAP_TOKEN must be at least {MIN_BOOTSTRAP_TOKEN_LEN} characters"
            )));
        }
        let bootstrap_admin_subject = optional_env("BOOTSTRAP_ADMIN_SUBJECT");

        let scope_enforcement = if parsed_bool_env("ENFORCE_SCOPE", true)? {
            ScopeEnforcement::Enforced
        } else {
            ScopeEnforcement::Legacy
        };
        let inheritance = match optional_env("HIERARCHY_INHERITANCE") {
            Some(value) => InheritanceMode::from_str(value.as_str())
                .map_err(|error| AppError::Misconfigured(format!("HIERARCHY_INHERITANCE: {error}")))?,
            None => InheritanceMode::default(),
        };

        let token_ttl_seconds = parsed_env("TOKEN_TTL_SECONDS", 3600_i64)?;
        if token_ttl_seconds <= 0 {
            return Err(AppError::Misconfigured(
                "TOKEN_TTL_SECONDS must be positive".to_owned(),
            ));
        }
        let store_timeout_ms = parsed_env("STORE_TIMEOUT_MS", 2000_u64)?;
        let token_purge_interval_seconds = parsed_env("TOKEN_PURGE_INTERVAL_SECONDS", 60_u64)?;
        if token_purge_interval_seconds == 0 {
            return Err(AppError::Misconfigured(
                "TOKEN_PURGE_INTERVAL_SECONDS must be positive".to_owned(),
            ));
        }
        let policy_file = optional_env("POLICY_FILE").map(PathBuf::from);

        Ok(Self {
            migrate_only,
            api_host,
            api_port,
            database_url,
            bootstrap_token,
            bootstrap_admin_subject,
            scope_enforcement,
            inheritance,
            token_ttl: chrono::Duration::seconds(token_ttl_seconds),
            store_timeout: Duration::from_millis(store_timeout_ms),
            token_purge_interval: Duration::from_secs(token_purge_interval_seconds),
            policy_file,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Misconfigured(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .compact()
        .init();
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    optional_env(name).ok_or_else(|| AppError::Misconfigured(format!("{name} is required")))
}

fn parsed_env<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(name) {
        Some(value) => value
            .parse::<T>()
            .map_err(|error| AppError::Misconfigured(format!("invalid {name} '{value}': {error}"))),
        None => Ok(default),
    }
}

fn parsed_bool_env(name: &str, default: bool) -> Result<bool, AppError> {
    match optional_env(name).map(|value| value.to_ascii_lowercase()) {
        None => Ok(default),
        Some(value) => match value.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(AppError::Misconfigured(format!(
                "{name} must be a boolean, got '{value}'"
            ))),
        },
    }
}
