//! Goal request handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use routine_core::goals::{self, GoalPatch, GoalRow, NewGoal};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::handlers::tasks::LimitQuery;
use crate::middleware::auth::AuthenticatedUser;

/// `GET /api/goals` — list the authenticated user's goals.
pub async fn list_goals_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<GoalRow>>> {
    let rows = goals::list_goals(&state.pool, &user.user_id()?).await?;
    Ok(Json(rows))
}

/// `GET /api/goals/in-progress?limit=` — in-progress goals, recent first.
pub async fn goals_in_progress_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<GoalRow>>> {
    let limit = query.limit.unwrap_or(5).clamp(1, 100);
    let rows = goals::list_goals_in_progress(&state.pool, &user.user_id()?, limit).await?;
    Ok(Json(rows))
}

/// `POST /api/goals` — create a goal.
pub async fn create_goal_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<NewGoal>,
) -> AppResult<(StatusCode, Json<GoalRow>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Goal name must not be empty".into()));
    }
    let row = goals::create_goal(&state.pool, &user.user_id()?, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/goals/{id}` — fetch one goal.
pub async fn get_goal_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<Json<GoalRow>> {
    let row = goals::get_goal(&state.pool, &user.user_id()?, &goal_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Goal not found".into()))?;
    Ok(Json(row))
}

/// `PATCH /api/goals/{id}` — partially update a goal.
pub async fn update_goal_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(goal_id): Path<Uuid>,
    Json(body): Json<GoalPatch>,
) -> AppResult<Json<GoalRow>> {
    let row = goals::update_goal(&state.pool, &user.user_id()?, &goal_id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Goal not found".into()))?;
    Ok(Json(row))
}

/// `DELETE /api/goals/{id}` — delete a goal.
pub async fn delete_goal_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let deleted = goals::delete_goal(&state.pool, &user.user_id()?, &goal_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Goal not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
