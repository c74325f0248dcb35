use std::future::Future;
use std::time::Duration;

use keygate_core::{AppError, AppResult};

/// Upper bound applied to every store call made by application services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeout(Duration);

impl StoreTimeout {
    /// Creates a timeout; zero durations are raised to one millisecond.
    #[must_use]
    pub fn new(limit: Duration) -> Self {
        Self(limit.max(Duration::from_millis(1)))
    }

    /// Returns the configured limit.
    #[must_use]
    pub fn limit(&self) -> Duration {
        self.0
    }

    /// Runs a store call, mapping expiry to `AppError::Unavailable`.
    pub async fn run<T, F>(&self, operation: &'static str, future: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.0, future).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    limit_ms = self.0.as_millis() as u64,
                    "store call timed out"
                );
                Err(AppError::Unavailable(format!(
                    "store did not complete '{operation}' within {}ms",
                    self.0.as_millis()
                )))
            }
        }
    }
}

impl Default for StoreTimeout {
    fn default() -> Self {
        Self(Duration::from_secs(2))
    }
}
