use chrono::{Duration, Utc};
use keygate_core::AppError;
use keygate_domain::{
    ActorId, Assignment, DomainId, EffectiveAssignment, ProjectId, RoleId, ScopeEnforcement,
    ScopeTarget, Token, TokenId,
};

use super::{InheritanceMode, ScopeResolver};

fn domain(value: &str) -> DomainId {
    DomainId::new(value).unwrap_or_else(|_| unreachable!())
}

fn project(value: &str) -> ProjectId {
    ProjectId::new(value).unwrap_or_else(|_| unreachable!())
}

fn grant(role_name: &str, scope: ScopeTarget) -> EffectiveAssignment {
    EffectiveAssignment {
        assignment: Assignment::new(
            ActorId::user("alice").unwrap_or_else(|_| unreachable!()),
            RoleId::new(),
            scope,
        ),
        role_name: role_name.to_owned(),
    }
}

fn token(scope: ScopeTarget, lineage: Vec<DomainId>, grants: Vec<EffectiveAssignment>) -> Token {
    let issued_at = Utc::now();
    Token::new(
        TokenId::generate(),
        "alice",
        grants,
        scope,
        lineage,
        issued_at,
        issued_at + Duration::hours(1),
    )
}

fn nested_project_token() -> Token {
    token(
        ScopeTarget::Project(project("web")),
        vec![domain("engineering"), domain("corp")],
        vec![
            grant("member", ScopeTarget::Project(project("web"))),
            grant("reader", ScopeTarget::Domain(domain("engineering"))),
            grant("admin", ScopeTarget::Domain(domain("corp"))),
            grant("auditor", ScopeTarget::System),
        ],
    )
}

#[test]
fn system_token_only_sees_system_assignments() {
    let resolver = ScopeResolver::default();
    let token = token(
        ScopeTarget::System,
        Vec::new(),
        vec![
            grant("reader", ScopeTarget::System),
            grant("admin", ScopeTarget::Project(project("web"))),
        ],
    );

    let context = resolver.resolve(&token, Utc::now());
    assert!(context.is_ok());
    let context = context.unwrap_or_else(|_| unreachable!());
    assert_eq!(
        context.role_names.into_iter().collect::<Vec<_>>(),
        vec!["reader".to_owned()]
    );
}

#[test]
fn disabled_inheritance_ignores_domain_grants_for_projects() {
    let resolver = ScopeResolver::new(ScopeEnforcement::Enforced, InheritanceMode::Disabled);
    let context = resolver
        .resolve(&nested_project_token(), Utc::now())
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        context.role_names.into_iter().collect::<Vec<_>>(),
        vec!["member".to_owned()]
    );
}

#[test]
fn single_level_inheritance_applies_owning_domain_only() {
    let resolver = ScopeResolver::new(ScopeEnforcement::Enforced, InheritanceMode::SingleLevel);
    let context = resolver
        .resolve(&nested_project_token(), Utc::now())
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        context.role_names.into_iter().collect::<Vec<_>>(),
        vec!["member".to_owned(), "reader".to_owned()]
    );
}

#[test]
fn transitive_inheritance_applies_every_ancestor() {
    let resolver = ScopeResolver::new(ScopeEnforcement::Enforced, InheritanceMode::Transitive);
    let context = resolver
        .resolve(&nested_project_token(), Utc::now())
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        context.role_names.into_iter().collect::<Vec<_>>(),
        vec!["admin".to_owned(), "member".to_owned(), "reader".to_owned()]
    );
}

#[test]
fn single_level_inheritance_does_not_lift_parent_domain_into_child_domain() {
    let resolver = ScopeResolver::new(ScopeEnforcement::Enforced, InheritanceMode::SingleLevel);
    let token = token(
        ScopeTarget::Domain(domain("engineering")),
        vec![domain("corp")],
        vec![grant("admin", ScopeTarget::Domain(domain("corp")))],
    );

    let context = resolver
        .resolve(&token, Utc::now())
        .unwrap_or_else(|_| unreachable!());
    assert!(context.role_names.is_empty());
}

#[test]
fn expired_token_is_unauthenticated() {
    let resolver = ScopeResolver::default();
    let token = token(ScopeTarget::System, Vec::new(), Vec::new());

    let result = resolver.resolve(&token, Utc::now() + Duration::hours(2));
    assert!(matches!(result, Err(AppError::Unauthenticated(_))));
}

#[test]
fn token_expiring_before_issuance_is_malformed() {
    let resolver = ScopeResolver::default();
    let issued_at = Utc::now();
    let token = Token::new(
        TokenId::generate(),
        "alice",
        Vec::new(),
        ScopeTarget::System,
        Vec::new(),
        issued_at,
        issued_at - Duration::seconds(1),
    );

    let result = resolver.resolve(&token, issued_at - Duration::seconds(5));
    assert!(matches!(result, Err(AppError::Unauthenticated(_))));
}

#[test]
fn context_carries_resolver_enforcement() {
    let resolver = ScopeResolver::new(ScopeEnforcement::Legacy, InheritanceMode::Disabled);
    let context = resolver
        .resolve(&nested_project_token(), Utc::now())
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(context.scope_enforcement, ScopeEnforcement::Legacy);
}

#[test]
fn inheritance_mode_parses_configuration_values() {
    assert_eq!(
        "transitive".parse::<InheritanceMode>().unwrap_or_default(),
        InheritanceMode::Transitive
    );
    assert_eq!(
        "single_level".parse::<InheritanceMode>().unwrap_or_default(),
        InheritanceMode::SingleLevel
    );
    assert!("sideways".parse::<InheritanceMode>().is_err());
}
