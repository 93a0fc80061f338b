//! Transaction persistence — income/expense entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::tasks::Recurrence;
use crate::uuid::uuidv7;

/// Direction of a financial transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

/// Row returned by transaction queries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: Option<String>,
    pub is_recurring: bool,
    pub recurrence_interval: Option<Recurrence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_interval: Option<Recurrence>,
}

/// Partial update for a transaction. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub amount: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_recurring: Option<bool>,
    pub recurrence_interval: Option<Recurrence>,
}

const TX_COLUMNS: &str = "id, user_id, kind, amount, date, description, category, \
     is_recurring, recurrence_interval, created_at, updated_at";

/// List transactions for a user, newest first.
pub async fn list_transactions(
    pool: &PgPool,
    user_id: &Uuid,
) -> Result<Vec<TransactionRow>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TX_COLUMNS} FROM transactions \
         WHERE user_id = $1 \
         ORDER BY date DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Create a new transaction.
pub async fn create_transaction(
    pool: &PgPool,
    user_id: &Uuid,
    input: &NewTransaction,
) -> Result<TransactionRow, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(&format!(
        "INSERT INTO transactions (id, user_id, kind, amount, date, description, category, \
                                   is_recurring, recurrence_interval) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {TX_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(user_id)
    .bind(input.kind)
    .bind(input.amount)
    .bind(input.date)
    .bind(&input.description)
    .bind(&input.category)
    .bind(input.is_recurring)
    .bind(input.recurrence_interval)
    .fetch_one(pool)
    .await
}

/// Get a transaction by ID (scoped to user).
pub async fn get_transaction(
    pool: &PgPool,
    user_id: &Uuid,
    tx_id: &Uuid,
) -> Result<Option<TransactionRow>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TX_COLUMNS} FROM transactions WHERE id = $1 AND user_id = $2"
    ))
    .bind(tx_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Apply a partial update to a transaction (scoped to user).
pub async fn update_transaction(
    pool: &PgPool,
    user_id: &Uuid,
    tx_id: &Uuid,
    patch: &TransactionPatch,
) -> Result<Option<TransactionRow>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(&format!(
        "UPDATE transactions SET \
             kind = COALESCE($3, kind), \
             amount = COALESCE($4, amount), \
             date = COALESCE($5, date), \
             description = COALESCE($6, description), \
             category = COALESCE($7, category), \
             is_recurring = COALESCE($8, is_recurring), \
             recurrence_interval = COALESCE($9, recurrence_interval), \
             updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {TX_COLUMNS}"
    ))
    .bind(tx_id)
    .bind(user_id)
    .bind(patch.kind)
    .bind(patch.amount)
    .bind(patch.date)
    .bind(&patch.description)
    .bind(&patch.category)
    .bind(patch.is_recurring)
    .bind(patch.recurrence_interval)
    .fetch_optional(pool)
    .await
}

/// Delete a transaction (scoped to user).
pub async fn delete_transaction(
    pool: &PgPool,
    user_id: &Uuid,
    tx_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
        .bind(tx_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
