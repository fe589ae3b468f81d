// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::User;

pub const ADMIN_ROLE_SLUG: &str = "admin";
pub const DEFAULT_ROLE_SLUG: &str = "user";

// Linha da tabela 'sessions'
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// Linha da tabela 'verifications' (códigos OTP)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Verification {
    pub id: Uuid,
    pub identifier: String,
    pub value: String,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Contexto explícito da requisição autenticada.
/// Montado uma vez pelo middleware e entregue aos handlers pelo extrator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user: User,
    pub role_slug: Option<String>,
    pub permissions: Vec<String>,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.role_slug.as_deref() == Some(ADMIN_ROLE_SLUG)
    }

    /// O cargo admin tem todas as permissões.
    pub fn has_permission(&self, slug: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == slug)
    }
}

// Dados para cadastro
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpPayload {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate)]
pub struct SignInPayload {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpPayload {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpPayload {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must have 6 digits."))]
    pub otp: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // ID do usuário
    pub sid: Uuid,   // ID da sessão (revogável)
    pub iss: String, // Nome da aplicação
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::session;

    #[test]
    fn admin_has_every_permission() {
        let s = session(Some(ADMIN_ROLE_SLUG), &[]);
        assert!(s.has_permission("roles:manage"));
    }

    #[test]
    fn regular_user_needs_assignment() {
        let s = session(Some("editor"), &["pages:manage"]);
        assert!(s.has_permission("pages:manage"));
        assert!(!s.has_permission("users:manage"));
        assert!(!session(None, &[]).has_permission("pages:manage"));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let value = serde_json::to_value(session(None, &[])).unwrap();
        assert!(value["user"].get("passwordHash").is_none());
    }
}
