// src/handlers/setup.rs

use axum::{extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    common::{error::AppError, extract::{Json, Path}, response::ApiResponse},
    config::AppState,
    middleware::rbac::{PermConfigManage, RequirePermission},
    models::config::{CreateAdminPayload, SetConfigPayload},
};

// POST /api/setup/admin (público, funciona uma única vez)
pub async fn create_admin(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateAdminPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let admin = app_state
        .setup_service
        .create_admin(&payload.email, &payload.password)
        .await?;
    Ok(ApiResponse::created(admin))
}

// GET /api/config/{key}
pub async fn get_config(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermConfigManage>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = app_state.setup_service.get_config(&key).await?;
    Ok(ApiResponse::ok(entry))
}

// PUT /api/config/{key}
pub async fn set_config(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermConfigManage>,
    Path(key): Path<String>,
    Json(payload): Json<SetConfigPayload>,
) -> Result<impl IntoResponse, AppError> {
    let entry = app_state.setup_service.set_config(&key, &payload.value).await?;
    Ok(ApiResponse::ok(entry))
}
