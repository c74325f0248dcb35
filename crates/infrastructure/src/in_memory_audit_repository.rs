use async_trait::async_trait;
use keygate_application::{AuditEvent, AuditRepository};
use keygate_core::AppResult;
use tokio::sync::RwLock;

/// Audit sink used when no database is configured.
///
/// Events are kept in memory and mirrored to the `keygate::audit` log target.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded event in append order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        tracing::info!(
            target: "keygate::audit",
            subject = %event.subject,
            action = event.action.as_str(),
            resource_type = %event.resource_type,
            resource_id = %event.resource_id,
            detail = event.detail.as_deref().unwrap_or_default(),
            "audit event recorded"
        );
        self.events.write().await.push(event);
        Ok(())
    }
}
