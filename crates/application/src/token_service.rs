use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use keygate_core::{AppError, AppResult, NonEmptyString};
use keygate_domain::{ActorId, Assignment, EffectiveAssignment, ScopeTarget, Token, TokenId};

use crate::{RoleRepository, ScopeResolver, StoreTimeout, TokenRepository};

/// Input payload for token issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueTokenInput {
    /// User the token is issued to.
    pub subject: String,
    /// Groups the user belongs to; their grants are included too.
    pub groups: Vec<String>,
    /// Scope claim the token is bound to.
    pub scope: ScopeTarget,
}

/// Issues and validates opaque bearer tokens.
///
/// A token snapshots the subject's assignments at issuance time. Validation
/// drops every snapshotted assignment that was since revoked or whose role was
/// deleted, so revocations apply to live tokens. Later grants only take
/// effect for tokens issued afterwards.
#[derive(Clone)]
pub struct TokenService {
    resolver: ScopeResolver,
    role_repository: Arc<dyn RoleRepository>,
    token_repository: Arc<dyn TokenRepository>,
    store_timeout: StoreTimeout,
    ttl: Duration,
}

impl TokenService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        resolver: ScopeResolver,
        role_repository: Arc<dyn RoleRepository>,
        token_repository: Arc<dyn TokenRepository>,
        store_timeout: StoreTimeout,
        ttl: Duration,
    ) -> Self {
        Self {
            resolver,
            role_repository,
            token_repository,
            store_timeout,
            ttl,
        }
    }

    /// Returns the resolver applied at issuance.
    #[must_use]
    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    /// Issues a token for the subject at the requested scope.
    pub async fn issue(&self, input: IssueTokenInput) -> AppResult<Token> {
        self.issue_at(input, Utc::now()).await
    }

    /// Issues a token as if the current time were `now`.
    pub async fn issue_at(&self, input: IssueTokenInput, now: DateTime<Utc>) -> AppResult<Token> {
        let subject = NonEmptyString::new(input.subject)
            .map_err(|_| AppError::Unauthenticated("token subject is required".to_owned()))?;

        let mut actors = vec![ActorId::User(subject.clone())];
        for group in input.groups {
            actors.push(ActorId::group(group)?);
        }

        let mut assignments = BTreeSet::new();
        for actor in &actors {
            let held = self
                .store_timeout
                .run("assignments_for", self.role_repository.assignments_for(actor))
                .await?;
            assignments.extend(held);
        }

        let scope_lineage = match self
            .store_timeout
            .run("scope_lineage", self.role_repository.scope_lineage(&input.scope))
            .await
        {
            Ok(lineage) => lineage,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Unauthenticated(format!(
                    "scope '{}' is not registered",
                    input.scope
                )));
            }
            Err(error) => return Err(error),
        };

        let token = Token::new(
            TokenId::generate(),
            subject.as_str(),
            assignments.into_iter().collect(),
            input.scope,
            scope_lineage,
            now,
            now + self.ttl,
        );

        let context = self.resolver.resolve(&token, now)?;
        if context.role_names.is_empty() {
            tracing::warn!(
                subject = %subject,
                scope = %token.scope(),
                "token issuance refused: no roles at requested scope"
            );
            return Err(AppError::Unauthenticated(format!(
                "subject has no roles at scope '{}'",
                token.scope()
            )));
        }

        self.store_timeout
            .run("save_token", self.token_repository.save_token(token.clone()))
            .await?;

        tracing::info!(
            subject = %subject,
            scope = %token.scope(),
            roles = ?context.role_names,
            expires_at = %token.expires_at(),
            "token issued"
        );

        Ok(token)
    }

    /// Looks up a presented token and checks that it is still valid.
    pub async fn validate(&self, presented: &str) -> AppResult<Token> {
        self.validate_at(presented, Utc::now()).await
    }

    /// Validates a presented token against the given time.
    pub async fn validate_at(&self, presented: &str, now: DateTime<Utc>) -> AppResult<Token> {
        let token_id = TokenId::from_presented(presented.trim());
        if token_id.as_str().is_empty() {
            return Err(AppError::Unauthenticated(
                "authentication token is required".to_owned(),
            ));
        }

        let token = self
            .store_timeout
            .run("find_token", self.token_repository.find_token(&token_id))
            .await?
            .ok_or_else(|| AppError::Unauthenticated("token is not recognized".to_owned()))?;

        if token.is_expired_at(now) {
            return Err(AppError::Unauthenticated("token has expired".to_owned()));
        }

        let current = self.current_assignments(&token).await?;
        if current.len() != token.assignments().len() {
            tracing::info!(
                subject = token.subject(),
                scope = %token.scope(),
                dropped = token.assignments().len() - current.len(),
                "token assignments narrowed to those still held"
            );
        }

        Ok(token.with_assignments(current))
    }

    /// Returns the snapshotted assignments that the store still holds, with
    /// their current role names.
    async fn current_assignments(&self, token: &Token) -> AppResult<Vec<EffectiveAssignment>> {
        let actors = token
            .assignments()
            .iter()
            .map(|effective| &effective.assignment.actor)
            .collect::<BTreeSet<_>>();

        let mut held: BTreeMap<Assignment, String> = BTreeMap::new();
        for actor in actors {
            let current = self
                .store_timeout
                .run("assignments_for", self.role_repository.assignments_for(actor))
                .await?;
            held.extend(
                current
                    .into_iter()
                    .map(|effective| (effective.assignment, effective.role_name)),
            );
        }

        Ok(token
            .assignments()
            .iter()
            .filter_map(|snapshot| {
                held.get(&snapshot.assignment)
                    .map(|role_name| EffectiveAssignment {
                        assignment: snapshot.assignment.clone(),
                        role_name: role_name.clone(),
                    })
            })
            .collect())
    }

    /// Removes expired tokens from storage.
    pub async fn purge_expired(&self) -> AppResult<usize> {
        self.store_timeout
            .run(
                "purge_expired_tokens",
                self.token_repository.purge_expired(Utc::now()),
            )
            .await
    }

    /// Purges expired tokens once per `period`, forever.
    ///
    /// Failed sweeps are logged and retried on the next tick.
    pub async fn purge_expired_every(&self, period: std::time::Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "expired tokens purged"),
                Err(error) => tracing::warn!(%error, "expired token purge failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests;
