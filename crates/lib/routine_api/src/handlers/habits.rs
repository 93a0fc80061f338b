//! Habit request handlers, including per-day progress.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use routine_core::habits::{
    self, HabitPatch, HabitProgressRow, HabitRow, NewHabit, ProgressStatus,
};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::handlers::tasks::LimitQuery;
use crate::middleware::auth::AuthenticatedUser;

/// Body for recording a day's progress.
#[derive(Debug, Deserialize)]
pub struct ProgressBody {
    pub date: NaiveDate,
    pub status: ProgressStatus,
}

/// `?startDate=&endDate=` range for progress listings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// `GET /api/habits` — list the authenticated user's habits.
pub async fn list_habits_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<HabitRow>>> {
    let rows = habits::list_habits(&state.pool, &user.user_id()?).await?;
    Ok(Json(rows))
}

/// `GET /api/habits/active?limit=` — top habits by streak.
pub async fn active_habits_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<HabitRow>>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let rows = habits::list_active_habits(&state.pool, &user.user_id()?, limit).await?;
    Ok(Json(rows))
}

/// `POST /api/habits` — create a habit.
pub async fn create_habit_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<NewHabit>,
) -> AppResult<(StatusCode, Json<HabitRow>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Habit name must not be empty".into()));
    }
    let row = habits::create_habit(&state.pool, &user.user_id()?, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/habits/{id}` — fetch one habit.
pub async fn get_habit_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<Json<HabitRow>> {
    let row = habits::get_habit(&state.pool, &user.user_id()?, &habit_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Habit not found".into()))?;
    Ok(Json(row))
}

/// `PATCH /api/habits/{id}` — partially update a habit.
pub async fn update_habit_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(habit_id): Path<Uuid>,
    Json(body): Json<HabitPatch>,
) -> AppResult<Json<HabitRow>> {
    let row = habits::update_habit(&state.pool, &user.user_id()?, &habit_id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Habit not found".into()))?;
    Ok(Json(row))
}

/// `DELETE /api/habits/{id}` — delete a habit and its progress.
pub async fn delete_habit_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(habit_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let deleted = habits::delete_habit(&state.pool, &user.user_id()?, &habit_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Habit not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/habits/{id}/progress` — record (or overwrite) a day's outcome.
pub async fn upsert_progress_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(habit_id): Path<Uuid>,
    Json(body): Json<ProgressBody>,
) -> AppResult<Json<HabitProgressRow>> {
    // Ownership check before touching progress rows.
    habits::get_habit(&state.pool, &user.user_id()?, &habit_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Habit not found".into()))?;

    let row = habits::upsert_progress(&state.pool, &habit_id, body.date, body.status).await?;
    Ok(Json(row))
}

/// `GET /api/habits/{id}/progress?startDate=&endDate=` — progress in range.
pub async fn list_progress_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(habit_id): Path<Uuid>,
    Query(range): Query<ProgressRangeQuery>,
) -> AppResult<Json<Vec<HabitProgressRow>>> {
    habits::get_habit(&state.pool, &user.user_id()?, &habit_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Habit not found".into()))?;

    if range.start_date > range.end_date {
        return Err(AppError::Validation(
            "startDate must not be after endDate".into(),
        ));
    }

    let rows =
        habits::list_progress(&state.pool, &habit_id, range.start_date, range.end_date).await?;
    Ok(Json(rows))
}
