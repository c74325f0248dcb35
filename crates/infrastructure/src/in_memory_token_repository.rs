use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keygate_application::TokenRepository;
use keygate_core::AppResult;
use keygate_domain::{Token, TokenId};
use tokio::sync::RwLock;

/// In-memory store for issued tokens.
#[derive(Debug, Default)]
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<TokenId, Token>>,
}

impl InMemoryTokenRepository {
    /// Creates an empty token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn save_token(&self, token: Token) -> AppResult<()> {
        self.tokens.write().await.insert(token.id().clone(), token);
        Ok(())
    }

    async fn find_token(&self, token_id: &TokenId) -> AppResult<Option<Token>> {
        Ok(self.tokens.read().await.get(token_id).cloned())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired_at(now));
        Ok(before - tokens.len())
    }
}
