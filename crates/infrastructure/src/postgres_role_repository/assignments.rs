use super::*;

impl PostgresRoleRepository {
    pub(super) async fn grant_impl(&self, assignment: Assignment) -> AppResult<()> {
        let mut transaction = self.begin().await?;

        let role_exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(assignment.role_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?;

        if role_exists == 0 {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                assignment.role_id
            )));
        }

        ensure_scope_registered(&mut transaction, &assignment.scope).await?;

        insert_assignment(&mut transaction, &assignment).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn revoke_impl(&self, assignment: &Assignment) -> AppResult<()> {
        let key = AssignmentKey::from(assignment);
        sqlx::query(
            r#"
            DELETE FROM rbac_role_assignments
            WHERE actor_type = $1
                AND actor_id = $2
                AND role_id = $3
                AND scope_kind = $4
                AND scope_id = $5
            "#,
        )
        .bind(key.actor_type)
        .bind(key.actor_id)
        .bind(key.role_id)
        .bind(key.scope_kind)
        .bind(key.scope_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke role: {error}")))?;

        Ok(())
    }

    pub(super) async fn list_assignments_impl(
        &self,
        query: AssignmentQuery,
    ) -> AppResult<Vec<EffectiveAssignment>> {
        let scope_kind = query.scope.as_ref().map(|scope| scope.kind().as_str());
        let scope_id = query
            .scope
            .as_ref()
            .map(|scope| scope.target_id().unwrap_or_default());

        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                assignments.actor_type,
                assignments.actor_id,
                assignments.role_id,
                roles.name AS role_name,
                assignments.scope_kind,
                assignments.scope_id
            FROM rbac_role_assignments AS assignments
            INNER JOIN rbac_roles AS roles
                ON roles.id = assignments.role_id
            WHERE ($1::TEXT IS NULL OR assignments.actor_type = $1)
                AND ($2::TEXT IS NULL OR assignments.actor_id = $2)
                AND ($3::UUID IS NULL OR assignments.role_id = $3)
                AND ($4::TEXT IS NULL OR assignments.scope_kind = $4)
                AND ($5::TEXT IS NULL OR assignments.scope_id = $5)
            ORDER BY
                CASE assignments.actor_type WHEN 'user' THEN 0 ELSE 1 END,
                assignments.actor_id COLLATE "C",
                assignments.role_id,
                CASE assignments.scope_kind
                    WHEN 'system' THEN 0
                    WHEN 'domain' THEN 1
                    ELSE 2
                END,
                assignments.scope_id COLLATE "C"
            "#,
        )
        .bind(query.actor.as_ref().map(ActorId::type_str))
        .bind(query.actor.as_ref().map(ActorId::id))
        .bind(query.role_id.map(|role_id| role_id.as_uuid()))
        .bind(scope_kind)
        .bind(scope_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role assignments: {error}")))?;

        rows.into_iter().map(EffectiveAssignment::try_from).collect()
    }
}

/// Inserts one assignment row; a role deleted since the existence check is `NotFound`.
pub(super) async fn insert_assignment(
    transaction: &mut Transaction<'_, Postgres>,
    assignment: &Assignment,
) -> AppResult<()> {
    let key = AssignmentKey::from(assignment);
    sqlx::query(
        r#"
        INSERT INTO rbac_role_assignments (actor_type, actor_id, role_id, scope_kind, scope_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (actor_type, actor_id, role_id, scope_kind, scope_id) DO NOTHING
        "#,
    )
    .bind(key.actor_type)
    .bind(key.actor_id)
    .bind(key.role_id)
    .bind(key.scope_kind)
    .bind(key.scope_id)
    .execute(&mut **transaction)
    .await
    .map_err(|error| map_missing_role(error, assignment.role_id))?;

    Ok(())
}

fn map_missing_role(error: sqlx::Error, role_id: RoleId) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!("role '{role_id}' was not found"));
    }

    AppError::Internal(format!("failed to grant role: {error}"))
}

async fn ensure_scope_registered(
    transaction: &mut Transaction<'_, Postgres>,
    scope: &ScopeTarget,
) -> AppResult<()> {
    let (sql, label) = match scope {
        ScopeTarget::System => return Ok(()),
        ScopeTarget::Domain(_) => ("SELECT COUNT(*) FROM scope_domains WHERE id = $1", "domain"),
        ScopeTarget::Project(_) => (
            "SELECT COUNT(*) FROM scope_projects WHERE id = $1",
            "project",
        ),
    };
    let target_id = scope.target_id().unwrap_or_default();

    let registered = sqlx::query_scalar::<_, i64>(sql)
        .bind(target_id)
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve {label}: {error}")))?;

    if registered == 0 {
        return Err(AppError::NotFound(format!(
            "{label} '{target_id}' was not found"
        )));
    }

    Ok(())
}
