// src/config.rs

use chrono::TimeDelta;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration as StdDuration};

use crate::{
    db::{ConfigRepository, PageRepository, RbacRepository, SessionRepository, TaskRepository, UserRepository},
    services::{
        auth::{AuthService, JwtKeys},
        page_service::PageService,
        rbac_service::RbacService,
        setup_service::SetupService,
        task_service::TaskService,
        user_service::UserService,
    },
};

/// Variáveis de ambiente, lidas uma vez na inicialização.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub app_name: String,
    pub bind_addr: String,
    pub session_ttl: TimeDelta,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let session_ttl_days: i64 = match env::var("SESSION_TTL_DAYS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("SESSION_TTL_DAYS must be an integer, got '{}'", raw))?,
            Err(_) => 7,
        };
        let session_ttl = session_ttl_from_days(session_ttl_days)?;

        Ok(Self {
            database_url,
            jwt_secret,
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Admin Dashboard".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            session_ttl,
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }
}

// Entre 1 dia e 10 anos; fora disso TimeDelta estouraria
fn session_ttl_from_days(days: i64) -> anyhow::Result<TimeDelta> {
    if !(1..=3650).contains(&days) {
        anyhow::bail!("SESSION_TTL_DAYS must be between 1 and 3650, got {}", days);
    }
    TimeDelta::try_days(days).ok_or_else(|| anyhow::anyhow!("SESSION_TTL_DAYS is out of range"))
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub page_service: PageService,
    pub task_service: TaskService,
    pub user_service: UserService,
    pub setup_service: SetupService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(StdDuration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Database connection established");

        Ok(Self::from_pool(db_pool, settings))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, settings: &Settings) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let session_repo = SessionRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let page_repo = PageRepository::new(db_pool.clone());
        let task_repo = TaskRepository::new(db_pool.clone());
        let config_repo = ConfigRepository::new(db_pool.clone());

        let keys = JwtKeys::new(settings.jwt_secret.clone(), settings.app_name.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            session_repo.clone(),
            rbac_repo.clone(),
            keys,
            settings.session_ttl,
            db_pool.clone(),
        );
        let rbac_service = RbacService::new(rbac_repo.clone(), db_pool.clone());
        let page_service = PageService::new(page_repo);
        let task_service = TaskService::new(task_repo, user_repo.clone());
        let user_service = UserService::new(
            user_repo.clone(),
            rbac_repo.clone(),
            session_repo,
            db_pool.clone(),
        );
        let setup_service = SetupService::new(user_repo, rbac_repo, config_repo, db_pool.clone());

        Self {
            db_pool,
            auth_service,
            rbac_service,
            page_service,
            task_service,
            user_service,
            setup_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_accepts_sane_values() {
        assert_eq!(session_ttl_from_days(7).unwrap(), TimeDelta::days(7));
    }

    #[test]
    fn session_ttl_rejects_out_of_range_values() {
        assert!(session_ttl_from_days(0).is_err());
        assert!(session_ttl_from_days(-3).is_err());
        assert!(session_ttl_from_days(i64::MAX).is_err());
    }
}
