// src/db/session_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{SessionRow, Verification},
};

// Sessões de login e códigos de verificação (OTP)
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_session<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, SessionRow>(
            "INSERT INTO sessions (user_id, expires_at) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(executor)
        .await?;
        Ok(session)
    }

    /// Só devolve sessões ainda válidas.
    pub async fn find_active(&self, id: Uuid) -> Result<Option<SessionRow>, AppError> {
        let session = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn delete_session(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // Usado ao banir ou trocar a senha: derruba todos os logins do usuário
    pub async fn delete_user_sessions(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  VERIFICAÇÕES (OTP)
    // =========================================================================

    /// Um código vivo por identificador: reenviar substitui o anterior.
    pub async fn upsert_verification(
        &self,
        identifier: &str,
        value_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO verifications (identifier, value, attempts, expires_at)
            VALUES ($1, $2, 0, $3)
            ON CONFLICT (identifier)
            DO UPDATE SET value = EXCLUDED.value, attempts = 0, expires_at = EXCLUDED.expires_at, created_at = NOW()
            "#,
        )
        .bind(identifier)
        .bind(value_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_verification(&self, identifier: &str) -> Result<Option<Verification>, AppError> {
        let verification = sqlx::query_as::<_, Verification>(
            "SELECT * FROM verifications WHERE identifier = $1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(verification)
    }

    pub async fn increment_attempts(&self, id: Uuid) -> Result<i32, AppError> {
        let attempts: i32 = sqlx::query_scalar(
            "UPDATE verifications SET attempts = attempts + 1 WHERE id = $1 RETURNING attempts",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(attempts)
    }

    pub async fn delete_verification(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM verifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
