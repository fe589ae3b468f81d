// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageQuery},
    models::rbac::{Permission, Role},
};

pub const ROLE_NAME_TAKEN: &str = "Role already is existed!";
pub const ROLE_SLUG_TAKEN: &str = "Role slug already is existed!";
pub const PERMISSION_SLUG_TAKEN: &str = "Permission already is existed!";

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

fn map_role_unique(e: sqlx::Error) -> AppError {
    let slug_conflict = matches!(
        &e,
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("roles_slug_key")
    );
    AppError::unique_or(e, if slug_conflict { ROLE_SLUG_TAKEN } else { ROLE_NAME_TAKEN })
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CARGOS
    // =========================================================================

    pub async fn find_role<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn find_role_by_slug<'e, E>(&self, executor: E, slug: &str) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE slug = $1")
            .bind(slug)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    /// Outro cargo (id diferente de `exclude_id`) já usa este nome?
    pub async fn role_name_taken(&self, name: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn role_slug_taken(&self, slug: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM roles WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    // 1. Criar o Cargo
    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        description: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, slug, description, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(icon)
        .fetch_one(executor)
        .await
        .map_err(map_role_unique)
    }

    /// Garante a existência de um cargo de sistema (admin, user) sem sobrescrever edições.
    pub async fn upsert_role<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        description: &str,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, slug, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(map_role_unique)?;
        Ok(role)
    }

    pub async fn update_role(
        &self,
        id: Uuid,
        name: &str,
        slug: &str,
        description: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Option<Role>, AppError> {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = $2, slug = $3, description = $4, icon = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(icon)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_role_unique)
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Busca por nome ou id (texto), mais recentes primeiro.
    pub async fn list_roles(&self, query: &PageQuery) -> Result<(Vec<Role>, i64), AppError> {
        let pattern = query.search_pattern();

        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT * FROM roles
            WHERE ($1::text IS NULL OR name ILIKE $1 OR id::text ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern.as_deref())
        .bind(query.page_size())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let row_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM roles WHERE ($1::text IS NULL OR name ILIKE $1 OR id::text ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((roles, row_count))
    }

    // =========================================================================
    //  PERMISSÕES
    // =========================================================================

    pub async fn find_permission(&self, id: Uuid) -> Result<Option<Permission>, AppError> {
        let permission = sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(permission)
    }

    pub async fn permission_slug_taken(&self, slug: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM permissions WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create_permission(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Permission, AppError> {
        sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (name, slug, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, PERMISSION_SLUG_TAKEN))
    }

    pub async fn update_permission(
        &self,
        id: Uuid,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Option<Permission>, AppError> {
        sqlx::query_as::<_, Permission>(
            r#"
            UPDATE permissions
            SET name = $2, slug = $3, description = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, PERMISSION_SLUG_TAKEN))
    }

    pub async fn delete_permission(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_permissions(&self, query: &PageQuery) -> Result<(Vec<Permission>, i64), AppError> {
        let pattern = query.search_pattern();

        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT * FROM permissions
            WHERE ($1::text IS NULL OR name ILIKE $1 OR slug ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern.as_deref())
        .bind(query.page_size())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let row_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM permissions WHERE ($1::text IS NULL OR name ILIKE $1 OR slug ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((permissions, row_count))
    }

    /// Quais destes ids existem de fato na tabela.
    pub async fn existing_permission_ids<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM permissions WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(found)
    }

    // =========================================================================
    //  VÍNCULO CARGO <-> PERMISSÃO
    // =========================================================================

    pub async fn role_permission_ids<'e, E>(&self, executor: E, role_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT permission_id FROM role_permissions WHERE role_id = $1",
        )
        .bind(role_id)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    pub async fn role_permissions<'e, E>(&self, executor: E, role_id: Uuid) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.*
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.slug
            "#,
        )
        .bind(role_id)
        .fetch_all(executor)
        .await?;
        Ok(permissions)
    }

    /// Slugs das permissões de um cargo (montagem da sessão).
    pub async fn role_permission_slugs(&self, role_id: Uuid) -> Result<Vec<String>, AppError> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.slug
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }

    // Remoção em lote
    pub async fn unassign_permissions<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = ANY($2)",
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // Inserção em massa usando UNNEST; ON CONFLICT mantém a operação idempotente
    pub async fn assign_permissions<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
