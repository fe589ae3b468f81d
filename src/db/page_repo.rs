// src/db/page_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::page::Page};

pub const PAGE_URL_TAKEN: &str = "Page url already is existed!";

// Campos graváveis de uma página
pub struct PageFields<'a> {
    pub name: &'a str,
    pub url: &'a str,
    pub icon: Option<&'a str>,
    pub parent_id: Option<Uuid>,
    pub order_index: i32,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct PageRepository {
    pool: PgPool,
}

impl PageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Tabela inteira, plana: a árvore é montada fora do banco.
    pub async fn list_all(&self) -> Result<Vec<Page>, AppError> {
        let pages = sqlx::query_as::<_, Page>(
            "SELECT * FROM pages ORDER BY order_index ASC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(pages)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Page>, AppError> {
        let page = sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(page)
    }

    pub async fn url_taken(&self, url: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pages WHERE url = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(url)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// `page_id` é ancestral de `candidate_parent` (ou o próprio)?
    /// UNION descarta repetidos, então um ciclo já existente não trava a consulta.
    pub async fn is_ancestor_or_self(&self, page_id: Uuid, candidate_parent: Uuid) -> Result<bool, AppError> {
        let found: bool = sqlx::query_scalar(
            r#"
            WITH RECURSIVE chain AS (
                SELECT id, parent_id FROM pages WHERE id = $1
                UNION
                SELECT p.id, p.parent_id FROM pages p JOIN chain c ON p.id = c.parent_id
            )
            SELECT EXISTS (SELECT 1 FROM chain WHERE id = $2)
            "#,
        )
        .bind(candidate_parent)
        .bind(page_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    pub async fn create(&self, fields: PageFields<'_>) -> Result<Page, AppError> {
        sqlx::query_as::<_, Page>(
            r#"
            INSERT INTO pages (name, url, icon, parent_id, order_index, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(fields.name)
        .bind(fields.url)
        .bind(fields.icon)
        .bind(fields.parent_id)
        .bind(fields.order_index)
        .bind(fields.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, PAGE_URL_TAKEN))
    }

    pub async fn update(&self, id: Uuid, fields: PageFields<'_>) -> Result<Option<Page>, AppError> {
        sqlx::query_as::<_, Page>(
            r#"
            UPDATE pages
            SET name = $2, url = $3, icon = $4, parent_id = $5, order_index = $6,
                is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.url)
        .bind(fields.icon)
        .bind(fields.parent_id)
        .bind(fields.order_index)
        .bind(fields.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, PAGE_URL_TAKEN))
    }

    pub async fn toggle_active(&self, id: Uuid) -> Result<Option<Page>, AppError> {
        let page = sqlx::query_as::<_, Page>(
            "UPDATE pages SET is_active = NOT is_active, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(page)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
