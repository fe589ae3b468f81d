// src/services/user_service.rs

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{
        user_repo::{NewUser, EMAIL_TAKEN, USERNAME_TAKEN},
        RbacRepository, SessionRepository, UserRepository,
    },
    models::{
        auth::Session,
        user::{BanUserPayload, CreateUserPayload, UpdateUserPayload, User, UserWithRole},
    },
    services::auth::{hash_password, normalize_email},
};

// Operações administrativas sobre usuários
#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    rbac_repo: RbacRepository,
    session_repo: SessionRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(
        repo: UserRepository,
        rbac_repo: RbacRepository,
        session_repo: SessionRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, rbac_repo, session_repo, pool }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserWithRole, AppError> {
        self.repo
            .find_with_role(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn list_users(&self, query: &PageQuery) -> Result<Paginated<UserWithRole>, AppError> {
        let (users, row_count) = self.repo.list(query).await?;
        Ok(Paginated::new(users, row_count, query))
    }

    pub async fn create_user(&self, payload: CreateUserPayload) -> Result<User, AppError> {
        let email = normalize_email(&payload.email);
        let username = payload.username.as_deref().map(str::trim);
        self.ensure_unique(&email, username, None).await?;
        if let Some(role_id) = payload.role_id {
            self.ensure_role_exists(role_id).await?;
        }

        let password_hash = hash_password(&payload.password).await?;
        let user = self
            .repo
            .create_user(
                &self.pool,
                NewUser {
                    email: &email,
                    name: payload.name.trim(),
                    username,
                    password_hash: &password_hash,
                    role_id: payload.role_id,
                    // Criado por um admin: e-mail tido como confiável
                    email_verified: true,
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "User created by admin");
        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, payload: UpdateUserPayload) -> Result<User, AppError> {
        let email = normalize_email(&payload.email);
        let username = payload.username.as_deref().map(str::trim);
        self.ensure_unique(&email, username, Some(id)).await?;

        self.repo
            .update_profile(id, &email, payload.name.trim(), username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn set_role(&self, actor: &Session, id: Uuid, role_id: Option<Uuid>) -> Result<User, AppError> {
        if id == actor.user_id() && actor.user.role_id != role_id {
            return Err(AppError::BadRequest("You cannot change your own role".into()));
        }
        if let Some(role_id) = role_id {
            self.ensure_role_exists(role_id).await?;
        }

        let user = self
            .repo
            .set_role(&self.pool, id, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        tracing::info!(user_id = %id, role_id = ?role_id, "User role changed");
        Ok(user)
    }

    /// Troca de senha derruba as sessões abertas do usuário.
    pub async fn set_password(&self, id: Uuid, new_password: &str) -> Result<User, AppError> {
        let password_hash = hash_password(new_password).await?;
        let user = self
            .repo
            .set_password_hash(id, &password_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let revoked = self.session_repo.delete_user_sessions(id).await?;
        tracing::info!(user_id = %id, revoked, "User password reset by admin");
        Ok(user)
    }

    pub async fn ban_user(&self, actor: &Session, id: Uuid, payload: BanUserPayload) -> Result<User, AppError> {
        if id == actor.user_id() {
            return Err(AppError::BadRequest("You cannot ban yourself".into()));
        }

        let expires = payload
            .expires_in
            .map(|secs| ban_expiry(Utc::now(), secs))
            .transpose()?;
        let user = self
            .repo
            .set_ban(id, true, payload.reason.as_deref(), expires)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        self.session_repo.delete_user_sessions(id).await?;
        tracing::info!(user_id = %id, expires = ?expires, "User banned");
        Ok(user)
    }

    pub async fn unban_user(&self, id: Uuid) -> Result<User, AppError> {
        self.repo
            .set_ban(id, false, None, None)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn ensure_unique(&self, email: &str, username: Option<&str>, exclude_id: Option<Uuid>) -> Result<(), AppError> {
        if self.repo.email_taken(email, exclude_id).await? {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        if let Some(username) = username {
            if self.repo.username_taken(username, exclude_id).await? {
                return Err(AppError::Conflict(USERNAME_TAKEN.into()));
            }
        }
        Ok(())
    }

    async fn ensure_role_exists(&self, role_id: Uuid) -> Result<(), AppError> {
        if self.rbac_repo.find_role(&self.pool, role_id).await?.is_none() {
            return Err(AppError::BadRequest("Role does not exist".into()));
        }
        Ok(())
    }
}

// Fim do banimento; duração fora do alcance de TimeDelta/DateTime vira 400
fn ban_expiry(now: DateTime<Utc>, secs: i64) -> Result<DateTime<Utc>, AppError> {
    TimeDelta::try_seconds(secs)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| AppError::BadRequest("Ban duration is out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn ban_expiry_adds_seconds() {
        let now = Utc::now();
        assert_eq!(ban_expiry(now, 60).unwrap(), now + TimeDelta::seconds(60));
    }

    #[test]
    fn huge_ban_duration_is_rejected_without_panicking() {
        let now = Utc::now();
        assert!(matches!(ban_expiry(now, i64::MAX), Err(AppError::BadRequest(_))));
        assert!(matches!(ban_expiry(now, i64::MAX / 1000), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn ban_payload_caps_duration() {
        let payload: BanUserPayload =
            serde_json::from_str(r#"{"expiresIn": 9223372036854775807}"#).unwrap();
        assert!(payload.validate().is_err());

        let payload: BanUserPayload = serde_json::from_str(r#"{"expiresIn": 3600}"#).unwrap();
        assert!(payload.validate().is_ok());
    }
}
