// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageQuery},
    models::user::{User, UserWithRole},
};

pub const EMAIL_TAKEN: &str = "Email already is existed!";
pub const USERNAME_TAKEN: &str = "Username already is existed!";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

// Campos de um novo usuário
pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub username: Option<&'a str>,
    pub password_hash: &'a str,
    pub role_id: Option<Uuid>,
    pub email_verified: bool,
}

// A constraint diz qual chave colidiu
fn map_unique(e: sqlx::Error) -> AppError {
    let username_conflict = matches!(
        &e,
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("users_username_key")
    );
    AppError::unique_or(e, if username_conflict { USERNAME_TAKEN } else { EMAIL_TAKEN })
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_with_role(&self, id: Uuid) -> Result<Option<UserWithRole>, AppError> {
        let user = sqlx::query_as::<_, UserWithRole>(
            r#"
            SELECT u.*, r.slug AS role_slug
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Checagem de unicidade: outro usuário (id diferente de `exclude_id`) com este e-mail?
    pub async fn email_taken(&self, email: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn username_taken(&self, username: &str, exclude_id: Option<Uuid>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create_user<'e, E>(&self, executor: E, new_user: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, username, password_hash, role_id, email_verified)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.name)
        .bind(new_user.username)
        .bind(new_user.password_hash)
        .bind(new_user.role_id)
        .bind(new_user.email_verified)
        .fetch_one(executor)
        .await
        .map_err(map_unique)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        email: &str,
        name: &str,
        username: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, name = $3, username = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique)
    }

    pub async fn set_role<'e, E>(&self, executor: E, id: Uuid, role_id: Option<Uuid>) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role_id)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn mark_email_verified(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_ban(
        &self,
        id: Uuid,
        banned: bool,
        reason: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET banned = $2, ban_reason = $3, ban_expires = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(banned)
        .bind(reason)
        .bind(expires)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Listagem paginada com busca por nome ou e-mail.
    pub async fn list(&self, query: &PageQuery) -> Result<(Vec<UserWithRole>, i64), AppError> {
        let pattern = query.search_pattern();

        let users = sqlx::query_as::<_, UserWithRole>(
            r#"
            SELECT u.*, r.slug AS role_slug
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            WHERE ($1::text IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)
            ORDER BY u.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern.as_deref())
        .bind(query.page_size())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let row_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users u WHERE ($1::text IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((users, row_count))
    }
}
