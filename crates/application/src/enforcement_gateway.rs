use std::sync::Arc;

use chrono::{DateTime, Utc};
use keygate_core::{AppError, AppResult};
use keygate_domain::{Decision, Operation, PolicySet, ResolvedContext, Token};
use tracing::{debug, info, warn};

use crate::ScopeResolver;

/// Message returned to callers on every denial; details only go to logs.
const FORBIDDEN_MESSAGE: &str = "you are not authorized to perform the requested action";

/// Steps a single authorization request passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementStage {
    /// The request reached the gateway.
    Received,
    /// The token was turned into a caller context.
    ScopeResolved,
    /// The operation's rule produced a decision.
    RuleEvaluated,
    /// Terminal: control passes to business logic.
    Delegated,
    /// Terminal: the request is refused with no further processing.
    Rejected,
}

impl EnforcementStage {
    /// Returns the log value for this stage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::ScopeResolved => "scope_resolved",
            Self::RuleEvaluated => "rule_evaluated",
            Self::Delegated => "delegated",
            Self::Rejected => "rejected",
        }
    }
}

/// Entry point every operation passes through before touching state.
///
/// The gateway owns no mutable state: the resolver is a copyable strategy and
/// the policy set is shared read-only, so one instance serves all requests.
#[derive(Debug, Clone)]
pub struct EnforcementGateway {
    resolver: ScopeResolver,
    policy: Arc<PolicySet>,
}

impl EnforcementGateway {
    /// Creates a gateway over a resolver and a loaded policy set.
    #[must_use]
    pub fn new(resolver: ScopeResolver, policy: Arc<PolicySet>) -> Self {
        Self { resolver, policy }
    }

    /// Returns the resolver used for every request.
    #[must_use]
    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    /// Returns the loaded policy set.
    #[must_use]
    pub fn policy(&self) -> &PolicySet {
        self.policy.as_ref()
    }

    /// Allows the operation or fails with `Forbidden` / `Unauthenticated`.
    pub fn enforce(
        &self,
        operation: Operation,
        token: &Token,
        resource_owner: Option<&str>,
    ) -> AppResult<()> {
        match self.decide_at(operation, token, resource_owner, Utc::now())? {
            Decision::Allow => Ok(()),
            Decision::Deny(_) => Err(AppError::Forbidden(FORBIDDEN_MESSAGE.to_owned())),
        }
    }

    /// Returns the decision for the operation at the current time.
    pub fn decide(
        &self,
        operation: Operation,
        token: &Token,
        resource_owner: Option<&str>,
    ) -> AppResult<Decision> {
        self.decide_at(operation, token, resource_owner, Utc::now())
    }

    /// Returns the decision for the operation at `now`.
    pub fn decide_at(
        &self,
        operation: Operation,
        token: &Token,
        resource_owner: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Decision> {
        debug!(
            operation = operation.as_str(),
            stage = EnforcementStage::Received.as_str(),
            "authorization requested"
        );

        let context = match self.resolver.resolve(token, now) {
            Ok(context) => context,
            Err(error) => {
                warn!(
                    operation = operation.as_str(),
                    stage = EnforcementStage::Rejected.as_str(),
                    subject = token.subject(),
                    %error,
                    "token rejected before rule evaluation"
                );
                return Err(error);
            }
        };
        debug!(
            operation = operation.as_str(),
            stage = EnforcementStage::ScopeResolved.as_str(),
            subject = context.subject.as_str(),
            scope = %context.scope,
            roles = ?context.role_names,
            "scope resolved"
        );

        let decision = self
            .policy
            .evaluate(operation.as_str(), &context, resource_owner);
        debug!(
            operation = operation.as_str(),
            stage = EnforcementStage::RuleEvaluated.as_str(),
            allowed = decision.is_allow(),
            "rule evaluated"
        );

        record_decision(operation, &context, resource_owner, &decision);
        Ok(decision)
    }
}

fn record_decision(
    operation: Operation,
    context: &ResolvedContext,
    resource_owner: Option<&str>,
    decision: &Decision,
) {
    match decision {
        Decision::Allow => info!(
            target: "keygate::audit",
            operation = operation.as_str(),
            stage = EnforcementStage::Delegated.as_str(),
            subject = context.subject.as_str(),
            scope = %context.scope,
            resource_owner,
            "authorization allowed"
        ),
        Decision::Deny(reason) => warn!(
            target: "keygate::audit",
            operation = operation.as_str(),
            stage = EnforcementStage::Rejected.as_str(),
            subject = context.subject.as_str(),
            scope = %context.scope,
            resource_owner,
            %reason,
            "authorization denied"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use keygate_core::AppError;
    use keygate_domain::{
        ActorId, Assignment, Decision, DenyReason, EffectiveAssignment, Operation, PolicySet,
        RoleId, ScopeTarget, Token, TokenId,
    };

    use super::EnforcementGateway;
    use crate::ScopeResolver;

    fn system_token(role_name: &str) -> Token {
        let issued_at = Utc::now();
        Token::new(
            TokenId::generate(),
            "alice",
            vec![EffectiveAssignment {
                assignment: Assignment::new(
                    ActorId::user("alice").unwrap_or_else(|_| unreachable!()),
                    RoleId::new(),
                    ScopeTarget::System,
                ),
                role_name: role_name.to_owned(),
            }],
            ScopeTarget::System,
            Vec::new(),
            issued_at,
            issued_at + Duration::hours(1),
        )
    }

    fn gateway(policy: PolicySet) -> EnforcementGateway {
        EnforcementGateway::new(ScopeResolver::default(), Arc::new(policy))
    }

    #[test]
    fn system_reader_is_delegated_for_reads_only() {
        let gateway = gateway(PolicySet::defaults());
        let token = system_token("reader");

        assert!(gateway.enforce(Operation::ListRoles, &token, None).is_ok());
        assert!(gateway.enforce(Operation::GetRole, &token, None).is_ok());
        assert!(matches!(
            gateway.enforce(Operation::CreateRole, &token, None),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            gateway.enforce(Operation::UpdateRole, &token, None),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            gateway.enforce(Operation::DeleteRole, &token, None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn forbidden_message_does_not_leak_reason() {
        let gateway = gateway(PolicySet::defaults());
        let result = gateway.enforce(Operation::CreateRole, &system_token("reader"), None);

        let Err(AppError::Forbidden(message)) = result else {
            panic!("expected forbidden");
        };
        assert!(!message.contains("admin"));
    }

    #[test]
    fn expired_token_fails_before_evaluation() {
        let gateway = gateway(PolicySet::defaults());
        let token = system_token("admin");

        let result = gateway.decide_at(
            Operation::ListRoles,
            &token,
            None,
            Utc::now() + Duration::hours(3),
        );
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn missing_rule_fails_closed_for_every_operation() {
        let gateway = gateway(PolicySet::default());
        let token = system_token("admin");

        for operation in Operation::all() {
            let decision = gateway.decide(*operation, &token, Some("alice"));
            assert!(matches!(
                decision,
                Ok(Decision::Deny(DenyReason::UnknownRule { .. }))
            ));
            assert!(gateway.enforce(*operation, &token, Some("alice")).is_err());
        }
    }
}
