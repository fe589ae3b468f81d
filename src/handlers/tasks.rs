// src/handlers/tasks.rs

use axum::{extract::State, response::IntoResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::{Json, Path, Query}, response::ApiResponse},
    config::AppState,
    middleware::{
        auth::CurrentSession,
        rbac::{PermTasksManage, RequirePermission},
    },
    models::task::{TaskListQuery, TaskPayload, TaskPropertyPayload, TaskPropertyQuery},
};

// =============================================================================
//  TAREFAS
// =============================================================================

// GET /api/tasks?pageIndex=0&pageSize=10&search=&status=&priority=
pub async fn list_tasks(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Query(query): Query<TaskListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state
        .task_service
        .list_tasks(&query.page(), query.status.as_deref(), query.priority.as_deref())
        .await?;
    Ok(ApiResponse::ok(page))
}

// GET /api/tasks/{id}
pub async fn get_task(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let task = app_state.task_service.get_task(id).await?;
    Ok(ApiResponse::ok(task))
}

// GET /api/tasks/{id}/subtasks
pub async fn list_subtasks(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tasks = app_state.task_service.list_subtasks(id).await?;
    Ok(ApiResponse::ok(tasks))
}

// POST /api/tasks
pub async fn create_task(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<TaskPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let task = app_state.task_service.create_task(&session, payload).await?;
    Ok(ApiResponse::created(task))
}

// PUT /api/tasks/{id}
pub async fn update_task(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let task = app_state.task_service.update_task(&session, id, payload).await?;
    Ok(ApiResponse::ok(task))
}

// DELETE /api/tasks/{id}
pub async fn delete_task(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let id = app_state.task_service.delete_task(&session, id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}

// =============================================================================
//  PROPRIEDADES
// =============================================================================

// GET /api/task-properties?field=status
pub async fn list_task_properties(
    State(app_state): State<AppState>,
    _session: CurrentSession,
    Query(query): Query<TaskPropertyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let properties = app_state.task_service.list_properties(query.field).await?;
    Ok(ApiResponse::ok(properties))
}

// POST /api/task-properties
pub async fn create_task_property(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermTasksManage>,
    Json(payload): Json<TaskPropertyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let property = app_state.task_service.create_property(payload).await?;
    Ok(ApiResponse::created(property))
}

// DELETE /api/task-properties/{id}
pub async fn delete_task_property(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermTasksManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let id = app_state.task_service.delete_property(id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}
