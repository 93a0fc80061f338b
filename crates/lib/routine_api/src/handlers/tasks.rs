//! Task request handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use routine_core::tasks::{self, NewTask, TaskPatch, TaskRow};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;

/// `?limit=` query parameter for capped list endpoints.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// `GET /api/tasks` — list the authenticated user's tasks.
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<TaskRow>>> {
    let rows = tasks::list_tasks(&state.pool, &user.user_id()?).await?;
    Ok(Json(rows))
}

/// `GET /api/tasks/upcoming?limit=` — tasks due from now on, soonest first.
pub async fn upcoming_tasks_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<TaskRow>>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let rows = tasks::list_upcoming_tasks(&state.pool, &user.user_id()?, limit).await?;
    Ok(Json(rows))
}

/// `POST /api/tasks` — create a task.
pub async fn create_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<NewTask>,
) -> AppResult<(StatusCode, Json<TaskRow>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Task name must not be empty".into()));
    }
    let row = tasks::create_task(&state.pool, &user.user_id()?, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/tasks/{id}` — fetch one task.
pub async fn get_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<TaskRow>> {
    let row = tasks::get_task(&state.pool, &user.user_id()?, &task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    Ok(Json(row))
}

/// `PATCH /api/tasks/{id}` — partially update a task.
pub async fn update_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<TaskPatch>,
) -> AppResult<Json<TaskRow>> {
    let row = tasks::update_task(&state.pool, &user.user_id()?, &task_id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    Ok(Json(row))
}

/// `PATCH /api/tasks/{id}/complete` — record one completed repetition.
pub async fn complete_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<TaskRow>> {
    let row = tasks::complete_task(&state.pool, &user.user_id()?, &task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    Ok(Json(row))
}

/// `DELETE /api/tasks/{id}` — delete a task.
pub async fn delete_task_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let deleted = tasks::delete_task(&state.pool, &user.user_id()?, &task_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Task not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
