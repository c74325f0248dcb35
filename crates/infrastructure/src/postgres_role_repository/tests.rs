use keygate_application::{AssignmentQuery, RoleChanges, RoleRepository};
use keygate_core::{AppError, NonEmptyString};
use keygate_domain::{ActorId, Assignment, DomainId, ProjectId, Role, RoleId, ScopeTarget};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresRoleRepository;
use super::assignments::insert_assignment;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres role tests: {error}");
    }

    Some(pool)
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

fn role(name: &str) -> Role {
    Role::new(name, Some("test role".to_owned())).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn create_update_and_conflict_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRoleRepository::new(pool);
    let first_name = unique("auditor");
    let second_name = unique("reviewer");

    let first = repository.create_role(role(&first_name)).await;
    let second = repository.create_role(role(&second_name)).await;
    let (Ok(first), Ok(second)) = (first, second) else {
        panic!("role creation should succeed");
    };

    let duplicate = repository.create_role(role(&first_name)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let rename_clash = repository
        .update_role(
            second.id(),
            RoleChanges {
                name: Some(NonEmptyString::new(first_name.clone()).unwrap_or_else(|_| unreachable!())),
                description: None,
            },
        )
        .await;
    assert!(matches!(rename_clash, Err(AppError::Conflict(_))));

    let described = repository
        .update_role(
            first.id(),
            RoleChanges {
                name: None,
                description: Some("updated".to_owned()),
            },
        )
        .await;
    assert!(described.is_ok_and(|role| role.description() == Some("updated")));

    let found = repository.find_role_by_name(&first_name).await;
    assert!(found.is_ok_and(|role| role.is_some_and(|role| role.id() == first.id())));
}

#[tokio::test]
async fn delete_cascades_assignments_and_grant_is_idempotent() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRoleRepository::new(pool);
    let Ok(created) = repository.create_role(role(&unique("member"))).await else {
        panic!("role creation should succeed");
    };
    let actor = ActorId::user(unique("alice")).unwrap_or_else(|_| unreachable!());
    let assignment = Assignment::new(actor.clone(), created.id(), ScopeTarget::System);

    assert!(repository.grant(assignment.clone()).await.is_ok());
    assert!(repository.grant(assignment).await.is_ok());
    let held = repository.assignments_for(&actor).await.unwrap_or_default();
    assert_eq!(held.len(), 1);

    assert!(repository.delete_role(created.id()).await.is_ok());
    let held = repository
        .list_assignments(AssignmentQuery {
            actor: Some(actor),
            ..AssignmentQuery::default()
        })
        .await
        .unwrap_or_default();
    assert!(held.is_empty());
}

#[tokio::test]
async fn lineage_follows_registered_domains() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRoleRepository::new(pool);
    let root = DomainId::new(unique("root")).unwrap_or_else(|_| unreachable!());
    let child = DomainId::new(unique("child")).unwrap_or_else(|_| unreachable!());
    let project = ProjectId::new(unique("project")).unwrap_or_else(|_| unreachable!());

    assert!(repository.register_domain(root.clone(), None).await.is_ok());
    assert!(
        repository
            .register_domain(child.clone(), Some(root.clone()))
            .await
            .is_ok()
    );
    assert!(
        repository
            .register_project(project.clone(), child.clone())
            .await
            .is_ok()
    );

    let project_lineage = repository
        .scope_lineage(&ScopeTarget::Project(project))
        .await
        .unwrap_or_default();
    let domain_lineage = repository
        .scope_lineage(&ScopeTarget::Domain(child.clone()))
        .await
        .unwrap_or_default();
    assert_eq!(project_lineage, vec![child.clone(), root.clone()]);
    assert_eq!(domain_lineage, vec![root]);

    let missing_parent = repository
        .register_domain(
            DomainId::new(unique("orphan")).unwrap_or_else(|_| unreachable!()),
            Some(DomainId::new(unique("ghost")).unwrap_or_else(|_| unreachable!())),
        )
        .await;
    assert!(matches!(missing_parent, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn insert_for_vanished_role_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRoleRepository::new(pool);
    let Ok(mut transaction) = repository.begin().await else {
        panic!("transaction should begin");
    };
    let assignment = Assignment::new(
        ActorId::user(unique("alice")).unwrap_or_else(|_| unreachable!()),
        RoleId::new(),
        ScopeTarget::System,
    );

    let inserted = insert_assignment(&mut transaction, &assignment).await;

    assert!(matches!(inserted, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn assignments_list_users_before_groups_and_system_before_domains() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRoleRepository::new(pool);
    let Ok(created) = repository.create_role(role(&unique("ordered"))).await else {
        panic!("role creation should succeed");
    };
    let domain = DomainId::new(unique("ordering")).unwrap_or_else(|_| unreachable!());
    assert!(repository.register_domain(domain.clone(), None).await.is_ok());

    let user = ActorId::user(unique("zed")).unwrap_or_else(|_| unreachable!());
    let group = ActorId::group(unique("admins")).unwrap_or_else(|_| unreachable!());
    let granted = vec![
        Assignment::new(group, created.id(), ScopeTarget::System),
        Assignment::new(user.clone(), created.id(), ScopeTarget::Domain(domain)),
        Assignment::new(user, created.id(), ScopeTarget::System),
    ];
    for assignment in &granted {
        assert!(repository.grant(assignment.clone()).await.is_ok());
    }

    let listed = repository
        .list_assignments(AssignmentQuery {
            role_id: Some(created.id()),
            ..AssignmentQuery::default()
        })
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|effective| effective.assignment)
        .collect::<Vec<_>>();

    let mut expected = granted;
    expected.sort();
    assert_eq!(listed, expected);
    assert!(matches!(listed[0].scope, ScopeTarget::System));
    assert!(matches!(listed[2].actor, ActorId::Group(_)));
}
