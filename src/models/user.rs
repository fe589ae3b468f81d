// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub username: Option<String>,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub email_verified: bool,
    pub role_id: Option<Uuid>,

    pub banned: bool,
    pub ban_reason: Option<String>,
    pub ban_expires: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Banimento com prazo vencido não bloqueia mais.
    pub fn is_banned_at(&self, now: DateTime<Utc>) -> bool {
        self.banned && self.ban_expires.is_none_or(|expires| expires > now)
    }
}

// Linha da listagem: usuário + slug do cargo (LEFT JOIN)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRole {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub role_slug: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 3, max = 50, message = "Username must have 3 to 50 characters."))]
    pub username: Option<String>,
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 3, max = 50, message = "Username must have 3 to 50 characters."))]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUserRolePayload {
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetUserPasswordPayload {
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BanUserPayload {
    #[validate(length(max = 500, message = "Reason is too long."))]
    pub reason: Option<String>,
    /// Duração em segundos; ausente = banimento permanente.
    #[validate(range(min = 1, max = 315360000, message = "Ban duration must be between 1 second and 10 years."))]
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(banned: bool, ban_expires: Option<DateTime<Utc>>) -> User {
        User { banned, ban_expires, ..crate::test_support::user() }
    }

    #[test]
    fn ban_respects_expiry() {
        let now = Utc::now();
        assert!(!user(false, None).is_banned_at(now));
        assert!(user(true, None).is_banned_at(now));
        assert!(user(true, Some(now + Duration::hours(1))).is_banned_at(now));
        assert!(!user(true, Some(now - Duration::hours(1))).is_banned_at(now));
    }
}
