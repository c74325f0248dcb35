use super::*;

impl PostgresRoleRepository {
    pub(super) async fn create_role_impl(&self, role: Role) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO rbac_roles (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name().as_str())
        .bind(role.description())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, role.name().as_str(), "create role"))?;

        Role::try_from(row)
    }

    pub(super) async fn find_role_impl(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description
            FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?
        .map(Role::try_from)
        .transpose()
    }

    pub(super) async fn find_role_by_name_impl(&self, name: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description
            FROM rbac_roles
            WHERE name = $1
            "#,
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role by name: {error}")))?
        .map(Role::try_from)
        .transpose()
    }

    pub(super) async fn update_role_impl(
        &self,
        role_id: RoleId,
        changes: RoleChanges,
    ) -> AppResult<Role> {
        let attempted_name = changes
            .name
            .as_ref()
            .map(|name| name.as_str().to_owned())
            .unwrap_or_default();

        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            UPDATE rbac_roles
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(changes.name.as_ref().map(NonEmptyString::as_str))
        .bind(changes.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, attempted_name.as_str(), "update role"))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        Role::try_from(row)
    }

    pub(super) async fn delete_role_impl(&self, role_id: RoleId) -> AppResult<()> {
        // Assignments go with the role through ON DELETE CASCADE.
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }

    pub(super) async fn list_roles_impl(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, description
            FROM rbac_roles
            ORDER BY name COLLATE "C", id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }
}
