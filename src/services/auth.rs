// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{user_repo::{NewUser, EMAIL_TAKEN}, RbacRepository, SessionRepository, UserRepository},
    models::{
        auth::{AuthResponse, Claims, Session, DEFAULT_ROLE_SLUG},
        user::User,
    },
};

pub const OTP_TTL_MINUTES: i64 = 5;
pub const MAX_OTP_ATTEMPTS: i32 = 3;

/// Hash bcrypt fora do executor assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Hashing task failed: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let hash_clone = password_hash.to_owned();
    let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &hash_clone))
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))??;
    Ok(is_valid)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn otp_identifier(email: &str) -> String {
    format!("sign-in-otp:{}", email)
}

fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Chaves e emissor do JWT. O token só carrega ids; a sessão no banco é a fonte da verdade.
#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
    issuer: String,
}

impl JwtKeys {
    pub fn new(secret: String, issuer: String) -> Self {
        Self { secret, issuer }
    }

    pub fn encode(&self, user_id: Uuid, session_id: Uuid, expires_at: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id,
            sid: session_id,
            iss: self.issuer.clone(),
            exp: expires_at.timestamp() as usize,
            iat: Utc::now().timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    session_repo: SessionRepository,
    rbac_repo: RbacRepository,
    keys: JwtKeys,
    session_ttl: Duration,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        session_repo: SessionRepository,
        rbac_repo: RbacRepository,
        keys: JwtKeys,
        session_ttl: Duration,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, session_repo, rbac_repo, keys, session_ttl, pool }
    }

    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);
        if self.user_repo.email_taken(&email, None).await? {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }

        // 1. Hashing (fora da transação, não toca no banco)
        let password_hash = hash_password(password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 2. Cargo padrão, se já existir
        let default_role = self.rbac_repo.find_role_by_slug(&mut *tx, DEFAULT_ROLE_SLUG).await?;

        // 3. Cria o usuário
        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    email: &email,
                    name: name.trim(),
                    username: None,
                    password_hash: &password_hash,
                    role_id: default_role.map(|r| r.id),
                    email_verified: false,
                },
            )
            .await?;

        // 4. Abre a sessão na mesma transação
        let token = self.open_session(&mut *tx, &user).await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(user_id = %user.id, "User signed up");
        Ok(AuthResponse { token, user })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&self.pool, &normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        if user.is_banned_at(Utc::now()) {
            return Err(AppError::UserBanned);
        }

        let token = self.open_session(&self.pool, &user).await?;
        tracing::info!(user_id = %user.id, "User signed in with password");
        Ok(AuthResponse { token, user })
    }

    /// E-mail desconhecido também responde sucesso: não revelamos quem tem conta.
    pub async fn send_sign_in_otp(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        let Some(user) = self.user_repo.find_by_email(&self.pool, &email).await? else {
            tracing::debug!("OTP requested for unknown email");
            return Ok(());
        };

        let otp = generate_otp();
        let otp_hash = hash_password(&otp).await?;
        let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

        self.session_repo
            .upsert_verification(&otp_identifier(&email), &otp_hash, expires_at)
            .await?;

        // Sem transporte de e-mail: o código vai para o log
        tracing::info!(user_id = %user.id, %otp, "Sign-in OTP issued");
        Ok(())
    }

    pub async fn verify_sign_in_otp(&self, email: &str, otp: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);
        let verification = self
            .session_repo
            .find_verification(&otp_identifier(&email))
            .await?
            .ok_or(AppError::InvalidOtp)?;

        if verification.expires_at <= Utc::now() {
            self.session_repo.delete_verification(verification.id).await?;
            return Err(AppError::InvalidOtp);
        }
        if verification.attempts >= MAX_OTP_ATTEMPTS {
            self.session_repo.delete_verification(verification.id).await?;
            return Err(AppError::TooManyAttempts);
        }

        if !verify_password(otp, &verification.value).await? {
            let attempts = self.session_repo.increment_attempts(verification.id).await?;
            if attempts >= MAX_OTP_ATTEMPTS {
                self.session_repo.delete_verification(verification.id).await?;
                return Err(AppError::TooManyAttempts);
            }
            return Err(AppError::InvalidOtp);
        }

        // Código usado uma única vez
        self.session_repo.delete_verification(verification.id).await?;

        let user = self
            .user_repo
            .find_by_email(&self.pool, &email)
            .await?
            .ok_or(AppError::InvalidOtp)?;
        if user.is_banned_at(Utc::now()) {
            return Err(AppError::UserBanned);
        }
        if !user.email_verified {
            self.user_repo.mark_email_verified(user.id).await?;
        }

        let token = self.open_session(&self.pool, &user).await?;
        tracing::info!(user_id = %user.id, "User signed in with OTP");
        Ok(AuthResponse { token, user })
    }

    pub async fn sign_out(&self, session: &Session) -> Result<(), AppError> {
        self.session_repo.delete_session(session.session_id).await?;
        tracing::info!(user_id = %session.user_id(), "User signed out");
        Ok(())
    }

    /// Token -> contexto completo da sessão (usuário, cargo, permissões).
    pub async fn get_session(&self, token: &str) -> Result<Session, AppError> {
        let claims = self.keys.decode(token)?;

        let row = self
            .session_repo
            .find_active(claims.sid)
            .await?
            .filter(|row| row.user_id == claims.sub)
            .ok_or(AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(row.user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;
        if user.is_banned_at(Utc::now()) {
            return Err(AppError::UserBanned);
        }

        let (role_slug, permissions) = match user.role_id {
            Some(role_id) => {
                let role = self.rbac_repo.find_role(&self.pool, role_id).await?;
                let permissions = self.rbac_repo.role_permission_slugs(role_id).await?;
                (role.map(|r| r.slug), permissions)
            }
            None => (None, Vec::new()),
        };

        Ok(Session {
            session_id: row.id,
            expires_at: row.expires_at,
            user,
            role_slug,
            permissions,
        })
    }

    async fn open_session<'e, E>(&self, executor: E, user: &User) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let expires_at = Utc::now() + self.session_ttl;
        let session = self.session_repo.create_session(executor, user.id, expires_at).await?;
        self.keys.encode(user.id, session.id, session.expires_at)
    }
}
