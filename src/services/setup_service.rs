// src/services/setup_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{user_repo::NewUser, ConfigRepository, RbacRepository, UserRepository},
    models::{
        auth::{ADMIN_ROLE_SLUG, DEFAULT_ROLE_SLUG},
        config::{ConfigEntry, ADMIN_CREATED_KEY},
        user::User,
    },
    services::auth::{hash_password, normalize_email},
};

// Bootstrap único do administrador + acesso ao armazenamento de configuração
#[derive(Clone)]
pub struct SetupService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    config_repo: ConfigRepository,
    pool: PgPool,
}

impl SetupService {
    pub fn new(
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        config_repo: ConfigRepository,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, rbac_repo, config_repo, pool }
    }

    /// Cria (ou promove) o administrador, uma única vez, atomicamente.
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = normalize_email(email);
        let password_hash = hash_password(password).await?;

        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Já foi feito?
        let already: Option<bool> = self.config_repo.get(&mut *tx, ADMIN_CREATED_KEY).await?;
        if already.unwrap_or(false) {
            return Err(AppError::AdminAlreadyCreated);
        }

        // 3. Cargos de sistema
        let admin_role = self
            .rbac_repo
            .upsert_role(&mut *tx, "Admin", ADMIN_ROLE_SLUG, "Full administrative access")
            .await?;
        self.rbac_repo
            .upsert_role(&mut *tx, "User", DEFAULT_ROLE_SLUG, "Default role for new accounts")
            .await?;

        // 4. Usuário admin: promove se o e-mail já existe
        let existing = self.user_repo.find_by_email(&mut *tx, &email).await?;

        let admin = match existing {
            Some(user) => self
                .user_repo
                .set_role(&mut *tx, user.id, Some(admin_role.id))
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".into()))?,
            None => {
                self.user_repo
                    .create_user(
                        &mut *tx,
                        NewUser {
                            email: &email,
                            name: "Admin",
                            username: None,
                            password_hash: &password_hash,
                            role_id: Some(admin_role.id),
                            email_verified: true,
                        },
                    )
                    .await?
            }
        };

        // 5. Marca o bootstrap como concluído
        self.config_repo.set(&mut *tx, ADMIN_CREATED_KEY, &true).await?;

        // 6. Commit
        tx.commit().await?;

        tracing::info!(user_id = %admin.id, "✅ Admin account bootstrapped");
        Ok(admin)
    }

    pub async fn get_config(&self, key: &str) -> Result<ConfigEntry, AppError> {
        self.config_repo
            .get_entry(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Config '{}' not found", key)))
    }

    pub async fn set_config(&self, key: &str, value: &serde_json::Value) -> Result<ConfigEntry, AppError> {
        self.config_repo.set(&self.pool, key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn admin_bootstrap_promotes_existing_user_once(pool: PgPool) {
        let state = crate::test_support::state(pool);
        let existing = state
            .auth_service
            .sign_up("boss@example.com", "password123", "Boss")
            .await
            .unwrap();

        let admin = state.setup_service.create_admin(" Boss@Example.com ", "password456").await.unwrap();
        assert_eq!(admin.id, existing.user.id);

        let session = state.auth_service.get_session(&existing.token).await.unwrap();
        assert!(session.is_admin());

        let again = state.setup_service.create_admin("other@example.com", "password789").await;
        assert!(matches!(again, Err(AppError::AdminAlreadyCreated)));
    }
}
