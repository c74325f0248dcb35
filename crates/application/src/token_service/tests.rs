use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use keygate_core::AppError;
use keygate_domain::{ActorId, Assignment, DomainId, ProjectId, ScopeEnforcement, ScopeTarget};

use super::{IssueTokenInput, TokenService};
use crate::test_support::{FakeRoleRepository, FakeTokenRepository};
use crate::{
    BootstrapReport, BootstrapService, InheritanceMode, RoleRepository, ScopeResolver,
    StoreTimeout, TokenRepository,
};

struct Harness {
    service: TokenService,
    repository: Arc<FakeRoleRepository>,
    report: BootstrapReport,
}

async fn bootstrapped(inheritance: InheritanceMode) -> Harness {
    let repository = Arc::new(FakeRoleRepository::default());
    let report = BootstrapService::new(repository.clone(), StoreTimeout::default())
        .run(Some("root"))
        .await
        .unwrap_or_else(|_| unreachable!());

    Harness {
        service: TokenService::new(
            ScopeResolver::new(ScopeEnforcement::Enforced, inheritance),
            repository.clone(),
            Arc::new(FakeTokenRepository::default()),
            StoreTimeout::default(),
            Duration::minutes(30),
        ),
        repository,
        report,
    }
}

fn input(subject: &str, groups: &[&str], scope: ScopeTarget) -> IssueTokenInput {
    IssueTokenInput {
        subject: subject.to_owned(),
        groups: groups.iter().map(|group| (*group).to_owned()).collect(),
        scope,
    }
}

fn default_domain() -> DomainId {
    DomainId::new("default").unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn issued_token_snapshots_roles_and_validates() {
    let harness = bootstrapped(InheritanceMode::Disabled).await;

    let issued = harness
        .service
        .issue(input("root", &[], ScopeTarget::System))
        .await;
    let Ok(issued) = issued else {
        panic!("bootstrap admin should obtain a system token");
    };
    assert_eq!(issued.subject(), "root");
    assert_eq!(issued.assignments().len(), 1);
    assert_eq!(issued.expires_at() - issued.issued_at(), Duration::minutes(30));

    let validated = harness.service.validate(issued.id().as_str()).await;
    assert!(validated.is_ok_and(|token| token == issued));
}

#[tokio::test]
async fn group_grants_are_included() {
    let harness = bootstrapped(InheritanceMode::Disabled).await;
    let group = ActorId::group("operators").unwrap_or_else(|_| unreachable!());
    assert!(
        harness
            .repository
            .grant(Assignment::new(
                group,
                harness.report.reader_role_id,
                ScopeTarget::System,
            ))
            .await
            .is_ok()
    );

    let issued = harness
        .service
        .issue(input("bob", &["operators"], ScopeTarget::System))
        .await;
    assert!(issued.is_ok_and(|token| token.assignments()[0].role_name == "reader"));
}

#[tokio::test]
async fn issuance_without_roles_at_scope_is_refused() {
    let harness = bootstrapped(InheritanceMode::Disabled).await;

    let no_roles = harness
        .service
        .issue(input("root", &[], ScopeTarget::Domain(default_domain())))
        .await;
    let unknown_scope = harness
        .service
        .issue(input(
            "root",
            &[],
            ScopeTarget::Domain(DomainId::new("ghost").unwrap_or_else(|_| unreachable!())),
        ))
        .await;
    let blank_subject = harness
        .service
        .issue(input("  ", &[], ScopeTarget::System))
        .await;

    assert!(matches!(no_roles, Err(AppError::Unauthenticated(_))));
    assert!(matches!(unknown_scope, Err(AppError::Unauthenticated(_))));
    assert!(matches!(blank_subject, Err(AppError::Unauthenticated(_))));
}

#[tokio::test]
async fn project_token_inherits_domain_roles_when_enabled() {
    let harness = bootstrapped(InheritanceMode::SingleLevel).await;
    let project = ProjectId::new("apollo").unwrap_or_else(|_| unreachable!());
    assert!(
        harness
            .repository
            .register_project(project.clone(), default_domain())
            .await
            .is_ok()
    );
    assert!(
        harness
            .repository
            .grant(Assignment::new(
                ActorId::user("carol").unwrap_or_else(|_| unreachable!()),
                harness.report.member_role_id,
                ScopeTarget::Domain(default_domain()),
            ))
            .await
            .is_ok()
    );

    let issued = harness
        .service
        .issue(input("carol", &[], ScopeTarget::Project(project)))
        .await;
    assert!(issued.is_ok_and(|token| token.scope_lineage() == [default_domain()]));
}

#[tokio::test]
async fn unknown_and_expired_tokens_are_rejected() {
    let harness = bootstrapped(InheritanceMode::Disabled).await;
    let Ok(issued) = harness
        .service
        .issue(input("root", &[], ScopeTarget::System))
        .await
    else {
        panic!("bootstrap admin should obtain a system token");
    };

    let unknown = harness.service.validate("not-a-token").await;
    let empty = harness.service.validate("   ").await;
    let expired = harness
        .service
        .validate_at(issued.id().as_str(), Utc::now() + Duration::hours(1))
        .await;

    assert!(matches!(unknown, Err(AppError::Unauthenticated(_))));
    assert!(matches!(empty, Err(AppError::Unauthenticated(_))));
    assert!(matches!(expired, Err(AppError::Unauthenticated(_))));
}

#[tokio::test]
async fn validation_drops_revoked_and_deleted_assignments() {
    let harness = bootstrapped(InheritanceMode::Disabled).await;
    let viewer = ActorId::user("viewer").unwrap_or_else(|_| unreachable!());
    let reader_grant = Assignment::new(
        viewer.clone(),
        harness.report.reader_role_id,
        ScopeTarget::System,
    );
    let member_grant = Assignment::new(viewer, harness.report.member_role_id, ScopeTarget::System);
    assert!(harness.repository.grant(reader_grant.clone()).await.is_ok());
    assert!(harness.repository.grant(member_grant).await.is_ok());

    let Ok(issued) = harness
        .service
        .issue(input("viewer", &[], ScopeTarget::System))
        .await
    else {
        panic!("viewer should obtain a system token");
    };
    assert_eq!(issued.assignments().len(), 2);

    assert!(harness.repository.revoke(&reader_grant).await.is_ok());
    let after_revoke = harness.service.validate(issued.id().as_str()).await;
    assert!(after_revoke.is_ok_and(|token| {
        token.assignments().len() == 1 && token.assignments()[0].role_name == "member"
    }));

    assert!(
        harness
            .repository
            .delete_role(harness.report.member_role_id)
            .await
            .is_ok()
    );
    let after_delete = harness.service.validate(issued.id().as_str()).await;
    assert!(after_delete.is_ok_and(|token| token.assignments().is_empty()));
}

#[tokio::test]
async fn purge_removes_only_expired_tokens() {
    let tokens = Arc::new(FakeTokenRepository::default());
    let repository = Arc::new(FakeRoleRepository::default());
    assert!(
        BootstrapService::new(repository.clone(), StoreTimeout::default())
            .run(Some("root"))
            .await
            .is_ok()
    );
    let service = TokenService::new(
        ScopeResolver::default(),
        repository,
        tokens.clone(),
        StoreTimeout::default(),
        Duration::minutes(30),
    );

    let stale = service
        .issue_at(input("root", &[], ScopeTarget::System), Utc::now() - Duration::hours(2))
        .await;
    let fresh = service.issue(input("root", &[], ScopeTarget::System)).await;
    let (Ok(stale), Ok(fresh)) = (stale, fresh) else {
        panic!("both tokens should be issued");
    };

    assert_eq!(service.purge_expired().await.unwrap_or_default(), 1);
    assert!(tokens.find_token(stale.id()).await.is_ok_and(|found| found.is_none()));
    assert!(tokens.find_token(fresh.id()).await.is_ok_and(|found| found.is_some()));
}

#[tokio::test(start_paused = true)]
async fn purge_loop_sweeps_on_each_tick() {
    let tokens = Arc::new(FakeTokenRepository::default());
    let repository = Arc::new(FakeRoleRepository::default());
    assert!(
        BootstrapService::new(repository.clone(), StoreTimeout::default())
            .run(Some("root"))
            .await
            .is_ok()
    );
    let service = TokenService::new(
        ScopeResolver::default(),
        repository,
        tokens.clone(),
        StoreTimeout::default(),
        Duration::minutes(30),
    );
    let Ok(stale) = service
        .issue_at(input("root", &[], ScopeTarget::System), Utc::now() - Duration::hours(2))
        .await
    else {
        panic!("token should be issued");
    };

    let sweeper = tokio::spawn({
        let service = service.clone();
        async move { service.purge_expired_every(StdDuration::from_secs(60)).await }
    });
    tokio::time::sleep(StdDuration::from_secs(61)).await;
    sweeper.abort();

    assert!(tokens.find_token(stale.id()).await.is_ok_and(|found| found.is_none()));
}
