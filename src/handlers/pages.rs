// src/handlers/pages.rs

use axum::{extract::State, response::IntoResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::{Json, Path, Query}, response::ApiResponse},
    config::AppState,
    middleware::{
        auth::CurrentSession,
        rbac::{PermPagesManage, RequirePermission},
    },
    models::page::{HierarchyQuery, PagePayload, ParentOptionsQuery},
};

// GET /api/pages/hierarchy?search=&activeOnly=true
pub async fn get_hierarchy(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Query(query): Query<HierarchyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let forest = app_state
        .page_service
        .get_hierarchy(query.search.as_deref(), query.active_only.unwrap_or(false))
        .await?;
    Ok(ApiResponse::ok(forest))
}

// GET /api/pages/parent-options?excludeId=
pub async fn get_parent_options(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Query(query): Query<ParentOptionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let options = app_state.page_service.get_parent_options(query.exclude_id).await?;
    Ok(ApiResponse::ok(options))
}

// GET /api/pages/{id}
pub async fn get_page(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.page_service.get_page(id).await?;
    Ok(ApiResponse::ok(page))
}

// POST /api/pages
pub async fn create_page(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermPagesManage>,
    Json(payload): Json<PagePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let page = app_state.page_service.create_page(payload).await?;
    Ok(ApiResponse::created(page))
}

// PUT /api/pages/{id}
pub async fn update_page(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermPagesManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PagePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let page = app_state.page_service.update_page(id, payload).await?;
    Ok(ApiResponse::ok(page))
}

// POST /api/pages/{id}/toggle-active
pub async fn toggle_page_active(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermPagesManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.page_service.toggle_active(id).await?;
    Ok(ApiResponse::ok(page))
}

// DELETE /api/pages/{id}
pub async fn delete_page(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermPagesManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let id = app_state.page_service.delete_page(id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}
