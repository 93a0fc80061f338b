//! Task persistence — user-scoped CRUD over the `tasks` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::uuid::uuidv7;

/// Eisenhower-style task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    UrgentImportant,
    ImportantNotUrgent,
    UrgentNotImportant,
    NotUrgentNotImportant,
}

/// Task category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    Financial,
    Health,
    Personal,
    Work,
    Learning,
    Home,
    Other,
}

/// Recurrence interval shared by tasks and transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Row returned by task queries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: TaskCategory,
    pub recurrence: Recurrence,
    pub due_date: Option<DateTime<Utc>>,
    pub repetitions_required: i32,
    pub repetitions_completed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: TaskCategory,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    pub due_date: Option<DateTime<Utc>>,
    pub repetitions_required: Option<i32>,
}

/// Partial update for a task. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<TaskCategory>,
    pub recurrence: Option<Recurrence>,
    pub due_date: Option<DateTime<Utc>>,
    pub repetitions_required: Option<i32>,
    pub repetitions_completed: Option<i32>,
}

const TASK_COLUMNS: &str = "id, user_id, name, description, priority, category, recurrence, \
     due_date, repetitions_required, repetitions_completed, created_at, updated_at";

/// List tasks for a user, soonest due date first (undated tasks last).
pub async fn list_tasks(pool: &PgPool, user_id: &Uuid) -> Result<Vec<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks \
         WHERE user_id = $1 \
         ORDER BY due_date ASC NULLS LAST, created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// List tasks due from now on, soonest first.
pub async fn list_upcoming_tasks(
    pool: &PgPool,
    user_id: &Uuid,
    limit: i64,
) -> Result<Vec<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks \
         WHERE user_id = $1 AND due_date >= now() \
         ORDER BY due_date ASC \
         LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Create a new task.
pub async fn create_task(
    pool: &PgPool,
    user_id: &Uuid,
    input: &NewTask,
) -> Result<TaskRow, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "INSERT INTO tasks (id, user_id, name, description, priority, category, recurrence, \
                            due_date, repetitions_required) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(user_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.priority)
    .bind(input.category)
    .bind(input.recurrence.unwrap_or(Recurrence::None))
    .bind(input.due_date)
    .bind(input.repetitions_required.unwrap_or(1))
    .fetch_one(pool)
    .await
}

/// Get a task by ID (scoped to user).
pub async fn get_task(
    pool: &PgPool,
    user_id: &Uuid,
    task_id: &Uuid,
) -> Result<Option<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
    ))
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Apply a partial update to a task (scoped to user).
pub async fn update_task(
    pool: &PgPool,
    user_id: &Uuid,
    task_id: &Uuid,
    patch: &TaskPatch,
) -> Result<Option<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "UPDATE tasks SET \
             name = COALESCE($3, name), \
             description = COALESCE($4, description), \
             priority = COALESCE($5, priority), \
             category = COALESCE($6, category), \
             recurrence = COALESCE($7, recurrence), \
             due_date = COALESCE($8, due_date), \
             repetitions_required = COALESCE($9, repetitions_required), \
             repetitions_completed = COALESCE($10, repetitions_completed), \
             updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(task_id)
    .bind(user_id)
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(patch.priority)
    .bind(patch.category)
    .bind(patch.recurrence)
    .bind(patch.due_date)
    .bind(patch.repetitions_required)
    .bind(patch.repetitions_completed)
    .fetch_optional(pool)
    .await
}

/// Record one completed repetition (clamped at the required count).
pub async fn complete_task(
    pool: &PgPool,
    user_id: &Uuid,
    task_id: &Uuid,
) -> Result<Option<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "UPDATE tasks SET \
             repetitions_completed = LEAST(repetitions_completed + 1, repetitions_required), \
             updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Delete a task (scoped to user).
pub async fn delete_task(
    pool: &PgPool,
    user_id: &Uuid,
    task_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
