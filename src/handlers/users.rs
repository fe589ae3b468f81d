// src/handlers/users.rs

use axum::{extract::State, response::IntoResponse};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::{Json, Path, Query}, pagination::PageQuery, response::ApiResponse},
    config::AppState,
    middleware::rbac::{PermUsersManage, RequirePermission},
    models::user::{
        BanUserPayload, CreateUserPayload, SetUserPasswordPayload, SetUserRolePayload,
        UpdateUserPayload,
    },
};

// GET /api/users?pageIndex=0&pageSize=10&search=
pub async fn list_users(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermUsersManage>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.user_service.list_users(&query).await?;
    Ok(ApiResponse::ok(page))
}

// GET /api/users/{id}
pub async fn get_user(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state.user_service.get_user(id).await?;
    Ok(ApiResponse::ok(user))
}

// POST /api/users
pub async fn create_user(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermUsersManage>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = app_state.user_service.create_user(payload).await?;
    Ok(ApiResponse::created(user))
}

// PUT /api/users/{id}
pub async fn update_user(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = app_state.user_service.update_user(id, payload).await?;
    Ok(ApiResponse::ok(user))
}

// PUT /api/users/{id}/role
pub async fn set_user_role(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetUserRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state
        .user_service
        .set_role(&guard.session, id, payload.role_id)
        .await?;
    Ok(ApiResponse::ok(user))
}

// PUT /api/users/{id}/password
pub async fn set_user_password(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetUserPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = app_state.user_service.set_password(id, &payload.new_password).await?;
    Ok(ApiResponse::ok(user))
}

// POST /api/users/{id}/ban
pub async fn ban_user(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BanUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = app_state.user_service.ban_user(&guard.session, id, payload).await?;
    Ok(ApiResponse::ok(user))
}

// POST /api/users/{id}/unban
pub async fn unban_user(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state.user_service.unban_user(id).await?;
    Ok(ApiResponse::ok(user))
}
