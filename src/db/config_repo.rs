// src/db/config_repo.rs

use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::config::ConfigEntry};

// Armazenamento chave -> valor tipado (jsonb)
#[derive(Clone)]
pub struct ConfigRepository {
    pool: PgPool,
}

impl ConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_entry(&self, key: &str) -> Result<Option<ConfigEntry>, AppError> {
        let entry = sqlx::query_as::<_, ConfigEntry>("SELECT * FROM app_config WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }

    /// Lê e desserializa. Valor com formato inesperado é erro interno.
    pub async fn get<'e, E, T>(&self, executor: E, key: &str) -> Result<Option<T>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: DeserializeOwned,
    {
        let value: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT value FROM app_config WHERE key = $1")
                .bind(key)
                .fetch_optional(executor)
                .await?;

        value
            .map(|v| {
                serde_json::from_value(v)
                    .map_err(|e| AppError::from(anyhow::anyhow!("Config '{}' has an unexpected shape: {}", key, e)))
            })
            .transpose()
    }

    // UPSERT (Insert or Update)
    pub async fn set<'e, E, T>(&self, executor: E, key: &str, value: &T) -> Result<ConfigEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: Serialize,
    {
        let value = serde_json::to_value(value).map_err(anyhow::Error::from)?;

        let entry = sqlx::query_as::<_, ConfigEntry>(
            r#"
            INSERT INTO app_config (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }
}
