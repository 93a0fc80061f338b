//! Goal persistence — user-scoped CRUD over the `goals` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::uuid::uuidv7;

/// Goal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

/// Goal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalCategory {
    Personal,
    Financial,
    Health,
    Career,
    Learning,
    Other,
}

/// Row returned by goal queries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GoalRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: GoalCategory,
    pub status: GoalStatus,
    pub target_date: Option<DateTime<Utc>>,
    pub current_value: Option<f64>,
    pub target_value: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a goal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub name: String,
    pub description: Option<String>,
    pub category: GoalCategory,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    pub target_date: Option<DateTime<Utc>>,
    pub current_value: Option<f64>,
    pub target_value: Option<f64>,
}

/// Partial update for a goal. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<GoalCategory>,
    pub status: Option<GoalStatus>,
    pub target_date: Option<DateTime<Utc>>,
    pub current_value: Option<f64>,
    pub target_value: Option<f64>,
}

const GOAL_COLUMNS: &str = "id, user_id, name, description, category, status, target_date, \
     current_value, target_value, created_at, updated_at";

/// List goals for a user, most recently updated first.
pub async fn list_goals(pool: &PgPool, user_id: &Uuid) -> Result<Vec<GoalRow>, sqlx::Error> {
    sqlx::query_as::<_, GoalRow>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals \
         WHERE user_id = $1 \
         ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// List in-progress goals, most recently updated first.
pub async fn list_goals_in_progress(
    pool: &PgPool,
    user_id: &Uuid,
    limit: i64,
) -> Result<Vec<GoalRow>, sqlx::Error> {
    sqlx::query_as::<_, GoalRow>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals \
         WHERE user_id = $1 AND status = 'IN_PROGRESS' \
         ORDER BY updated_at DESC \
         LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Create a new goal.
pub async fn create_goal(
    pool: &PgPool,
    user_id: &Uuid,
    input: &NewGoal,
) -> Result<GoalRow, sqlx::Error> {
    sqlx::query_as::<_, GoalRow>(&format!(
        "INSERT INTO goals (id, user_id, name, description, category, status, target_date, \
                            current_value, target_value) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {GOAL_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(user_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.category)
    .bind(input.status.unwrap_or(GoalStatus::NotStarted))
    .bind(input.target_date)
    .bind(input.current_value)
    .bind(input.target_value)
    .fetch_one(pool)
    .await
}

/// Get a goal by ID (scoped to user).
pub async fn get_goal(
    pool: &PgPool,
    user_id: &Uuid,
    goal_id: &Uuid,
) -> Result<Option<GoalRow>, sqlx::Error> {
    sqlx::query_as::<_, GoalRow>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE id = $1 AND user_id = $2"
    ))
    .bind(goal_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Apply a partial update to a goal (scoped to user).
pub async fn update_goal(
    pool: &PgPool,
    user_id: &Uuid,
    goal_id: &Uuid,
    patch: &GoalPatch,
) -> Result<Option<GoalRow>, sqlx::Error> {
    sqlx::query_as::<_, GoalRow>(&format!(
        "UPDATE goals SET \
             name = COALESCE($3, name), \
             description = COALESCE($4, description), \
             category = COALESCE($5, category), \
             status = COALESCE($6, status), \
             target_date = COALESCE($7, target_date), \
             current_value = COALESCE($8, current_value), \
             target_value = COALESCE($9, target_value), \
             updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {GOAL_COLUMNS}"
    ))
    .bind(goal_id)
    .bind(user_id)
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(patch.category)
    .bind(patch.status)
    .bind(patch.target_date)
    .bind(patch.current_value)
    .bind(patch.target_value)
    .fetch_optional(pool)
    .await
}

/// Delete a goal (scoped to user).
pub async fn delete_goal(
    pool: &PgPool,
    user_id: &Uuid,
    goal_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
        .bind(goal_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
