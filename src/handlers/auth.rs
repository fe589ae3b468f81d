// src/handlers/auth.rs

use axum::{extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::Json, response::ApiResponse},
    config::AppState,
    middleware::auth::CurrentSession,
    models::auth::{SendOtpPayload, SignInPayload, SignUpPayload, VerifyOtpPayload},
};

// POST /api/auth/sign-up
pub async fn sign_up(
    State(app_state): State<AppState>,
    Json(payload): Json<SignUpPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .sign_up(&payload.email, &payload.password, &payload.name)
        .await?;

    Ok(ApiResponse::created(response))
}

// POST /api/auth/sign-in
pub async fn sign_in(
    State(app_state): State<AppState>,
    Json(payload): Json<SignInPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .sign_in(&payload.email, &payload.password)
        .await?;

    Ok(ApiResponse::ok(response))
}

// POST /api/auth/otp/send
pub async fn send_otp(
    State(app_state): State<AppState>,
    Json(payload): Json<SendOtpPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    app_state.auth_service.send_sign_in_otp(&payload.email).await?;
    Ok(ApiResponse::ok(json!({ "sent": true })))
}

// POST /api/auth/otp/verify
pub async fn verify_otp(
    State(app_state): State<AppState>,
    Json(payload): Json<VerifyOtpPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .verify_sign_in_otp(&payload.email, &payload.otp)
        .await?;

    Ok(ApiResponse::ok(response))
}

// POST /api/auth/sign-out
pub async fn sign_out(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<impl IntoResponse, AppError> {
    app_state.auth_service.sign_out(&session).await?;
    Ok(ApiResponse::ok(json!({ "signedOut": true })))
}

// GET /api/auth/session
pub async fn get_session(CurrentSession(session): CurrentSession) -> impl IntoResponse {
    ApiResponse::ok(session)
}
