//! Habit persistence — habits plus their per-day progress rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::uuid::uuidv7;

/// Outcome recorded for a habit on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    Done,
    Skipped,
    Missed,
}

/// Row returned by habit queries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HabitRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub streak: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row returned by habit progress queries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HabitProgressRow {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub status: ProgressStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a habit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update for a habit. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub streak: Option<i32>,
}

/// List habits for a user, longest streak first.
pub async fn list_habits(pool: &PgPool, user_id: &Uuid) -> Result<Vec<HabitRow>, sqlx::Error> {
    sqlx::query_as::<_, HabitRow>(
        "SELECT id, user_id, name, description, streak, created_at, updated_at \
         FROM habits \
         WHERE user_id = $1 \
         ORDER BY streak DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// List the top `limit` habits by streak.
pub async fn list_active_habits(
    pool: &PgPool,
    user_id: &Uuid,
    limit: i64,
) -> Result<Vec<HabitRow>, sqlx::Error> {
    sqlx::query_as::<_, HabitRow>(
        "SELECT id, user_id, name, description, streak, created_at, updated_at \
         FROM habits \
         WHERE user_id = $1 \
         ORDER BY streak DESC, created_at DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Create a new habit.
pub async fn create_habit(
    pool: &PgPool,
    user_id: &Uuid,
    input: &NewHabit,
) -> Result<HabitRow, sqlx::Error> {
    sqlx::query_as::<_, HabitRow>(
        "INSERT INTO habits (id, user_id, name, description) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, user_id, name, description, streak, created_at, updated_at",
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(&input.name)
    .bind(&input.description)
    .fetch_one(pool)
    .await
}

/// Get a habit by ID (scoped to user).
pub async fn get_habit(
    pool: &PgPool,
    user_id: &Uuid,
    habit_id: &Uuid,
) -> Result<Option<HabitRow>, sqlx::Error> {
    sqlx::query_as::<_, HabitRow>(
        "SELECT id, user_id, name, description, streak, created_at, updated_at \
         FROM habits WHERE id = $1 AND user_id = $2",
    )
    .bind(habit_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Apply a partial update to a habit (scoped to user).
pub async fn update_habit(
    pool: &PgPool,
    user_id: &Uuid,
    habit_id: &Uuid,
    patch: &HabitPatch,
) -> Result<Option<HabitRow>, sqlx::Error> {
    sqlx::query_as::<_, HabitRow>(
        "UPDATE habits SET \
             name = COALESCE($3, name), \
             description = COALESCE($4, description), \
             streak = COALESCE($5, streak), \
             updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING id, user_id, name, description, streak, created_at, updated_at",
    )
    .bind(habit_id)
    .bind(user_id)
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(patch.streak)
    .fetch_optional(pool)
    .await
}

/// Delete a habit (progress rows cascade).
pub async fn delete_habit(
    pool: &PgPool,
    user_id: &Uuid,
    habit_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM habits WHERE id = $1 AND user_id = $2")
        .bind(habit_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Record (or overwrite) progress for a habit on a given day.
///
/// One row per (habit, day); a second submission for the same day
/// replaces the status rather than adding a row.
pub async fn upsert_progress(
    pool: &PgPool,
    habit_id: &Uuid,
    date: NaiveDate,
    status: ProgressStatus,
) -> Result<HabitProgressRow, sqlx::Error> {
    sqlx::query_as::<_, HabitProgressRow>(
        "INSERT INTO habit_progress (id, habit_id, date, status) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (habit_id, date) \
         DO UPDATE SET status = EXCLUDED.status, updated_at = now() \
         RETURNING id, habit_id, date, status, created_at, updated_at",
    )
    .bind(uuidv7())
    .bind(habit_id)
    .bind(date)
    .bind(status)
    .fetch_one(pool)
    .await
}

/// List progress rows for a habit within an inclusive date range.
pub async fn list_progress(
    pool: &PgPool,
    habit_id: &Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<HabitProgressRow>, sqlx::Error> {
    sqlx::query_as::<_, HabitProgressRow>(
        "SELECT id, habit_id, date, status, created_at, updated_at \
         FROM habit_progress \
         WHERE habit_id = $1 AND date BETWEEN $2 AND $3 \
         ORDER BY date DESC",
    )
    .bind(habit_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}
