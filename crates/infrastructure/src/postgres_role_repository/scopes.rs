use super::*;

impl PostgresRoleRepository {
    pub(super) async fn register_domain_impl(
        &self,
        domain_id: DomainId,
        parent: Option<DomainId>,
    ) -> AppResult<()> {
        if parent.as_ref() == Some(&domain_id) {
            return Err(AppError::Validation(format!(
                "domain '{domain_id}' cannot be its own parent"
            )));
        }

        let mut transaction = self.begin().await?;

        let existing = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT parent_id
            FROM scope_domains
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(domain_id.as_str())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve domain: {error}")))?;

        let requested_parent = parent.as_ref().map(DomainId::as_str);
        if let Some(existing_parent) = existing {
            if existing_parent.as_deref() == requested_parent {
                return Ok(());
            }
            return Err(AppError::Conflict(format!(
                "domain '{domain_id}' is already registered under a different parent"
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO scope_domains (id, parent_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(domain_id.as_str())
        .bind(requested_parent)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_missing_domain(error, requested_parent, "register domain"))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn register_project_impl(
        &self,
        project_id: ProjectId,
        domain_id: DomainId,
    ) -> AppResult<()> {
        let mut transaction = self.begin().await?;

        let existing = sqlx::query_scalar::<_, String>(
            r#"
            SELECT domain_id
            FROM scope_projects
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(project_id.as_str())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve project: {error}")))?;

        if let Some(existing_domain) = existing {
            if existing_domain == domain_id.as_str() {
                return Ok(());
            }
            return Err(AppError::Conflict(format!(
                "project '{project_id}' already belongs to another domain"
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO scope_projects (id, domain_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(project_id.as_str())
        .bind(domain_id.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_missing_domain(error, Some(domain_id.as_str()), "register project")
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn scope_lineage_impl(&self, scope: &ScopeTarget) -> AppResult<Vec<DomainId>> {
        let (start, skip_start) = match scope {
            ScopeTarget::System => return Ok(Vec::new()),
            ScopeTarget::Domain(domain_id) => (domain_id.as_str().to_owned(), true),
            ScopeTarget::Project(project_id) => {
                let owner = sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT domain_id
                    FROM scope_projects
                    WHERE id = $1
                    "#,
                )
                .bind(project_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to resolve project: {error}"))
                })?
                .ok_or_else(|| {
                    AppError::NotFound(format!("project '{project_id}' was not found"))
                })?;
                (owner, false)
            }
        };

        let chain = sqlx::query_scalar::<_, String>(
            r#"
            WITH RECURSIVE lineage (id, parent_id, depth) AS (
                SELECT id, parent_id, 0
                FROM scope_domains
                WHERE id = $1
                UNION ALL
                SELECT domains.id, domains.parent_id, lineage.depth + 1
                FROM scope_domains AS domains
                INNER JOIN lineage
                    ON domains.id = lineage.parent_id
                WHERE lineage.depth < $2
            )
            SELECT id
            FROM lineage
            ORDER BY depth
            "#,
        )
        .bind(start.as_str())
        .bind(MAX_DOMAIN_DEPTH)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve scope lineage: {error}")))?;

        if chain.is_empty() {
            return Err(AppError::NotFound(format!("domain '{start}' was not found")));
        }

        chain
            .into_iter()
            .skip(usize::from(skip_start))
            .map(DomainId::new)
            .collect()
    }
}

fn map_missing_domain(error: sqlx::Error, domain_id: Option<&str>, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!(
            "domain '{}' was not found",
            domain_id.unwrap_or_default()
        ));
    }

    AppError::Internal(format!("failed to {context}: {error}"))
}
