// src/handlers/rbac.rs

use axum::{extract::State, response::IntoResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::{Json, Path, Query}, pagination::PageQuery, response::ApiResponse},
    config::AppState,
    middleware::{
        auth::CurrentSession,
        rbac::{PermPermissionsManage, PermRolesManage, RequirePermission},
    },
    models::rbac::{PermissionPayload, RolePayload, SetRolePermissionsPayload},
};

// =============================================================================
//  CARGOS
// =============================================================================

// GET /api/roles?pageIndex=0&pageSize=10&search=
pub async fn list_roles(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.rbac_service.list_roles(&query).await?;
    Ok(ApiResponse::ok(page))
}

// GET /api/roles/{id}
pub async fn get_role(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let role = app_state.rbac_service.get_role(id).await?;
    Ok(ApiResponse::ok(role))
}

// POST /api/roles
pub async fn create_role(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRolesManage>,
    Json(payload): Json<RolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let role = app_state.rbac_service.create_role(payload).await?;
    Ok(ApiResponse::created(role))
}

// PUT /api/roles/{id}
pub async fn update_role(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRolesManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let role = app_state.rbac_service.update_role(id, payload).await?;
    Ok(ApiResponse::ok(role))
}

// DELETE /api/roles/{id}
pub async fn delete_role(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRolesManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let id = app_state.rbac_service.delete_role(id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}

// GET /api/roles/{id}/permissions
pub async fn get_role_permissions(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let permissions = app_state.rbac_service.get_role_permissions(id).await?;
    Ok(ApiResponse::ok(permissions))
}

// PUT /api/role-permissions
pub async fn set_role_permissions(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRolesManage>,
    Json(payload): Json<SetRolePermissionsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state
        .rbac_service
        .set_role_permissions(payload.role_id, &payload.permission_ids)
        .await?;
    Ok(ApiResponse::ok(result))
}

// =============================================================================
//  PERMISSÕES
// =============================================================================

// GET /api/permissions
pub async fn list_permissions(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.rbac_service.list_permissions(&query).await?;
    Ok(ApiResponse::ok(page))
}

// GET /api/permissions/{id}
pub async fn get_permission(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let permission = app_state.rbac_service.get_permission(id).await?;
    Ok(ApiResponse::ok(permission))
}

// POST /api/permissions
pub async fn create_permission(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermPermissionsManage>,
    Json(payload): Json<PermissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let permission = app_state.rbac_service.create_permission(payload).await?;
    Ok(ApiResponse::created(permission))
}

// PUT /api/permissions/{id}
pub async fn update_permission(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermPermissionsManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PermissionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let permission = app_state.rbac_service.update_permission(id, payload).await?;
    Ok(ApiResponse::ok(permission))
}

// DELETE /api/permissions/{id}
pub async fn delete_permission(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermPermissionsManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let id = app_state.rbac_service.delete_permission(id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}
