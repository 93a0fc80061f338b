//! Investment persistence — user-scoped CRUD over the `investments` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::uuid::uuidv7;

/// Asset class of an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentType {
    Stock,
    Crypto,
    Fund,
    RealEstate,
    Other,
}

/// Row returned by investment queries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InvestmentType,
    pub quantity: Option<f64>,
    pub purchase_price: Option<f64>,
    pub current_value: f64,
    pub purchase_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an investment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestment {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InvestmentType,
    pub quantity: Option<f64>,
    pub purchase_price: Option<f64>,
    pub current_value: f64,
    pub purchase_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Partial update for an investment. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<InvestmentType>,
    pub quantity: Option<f64>,
    pub purchase_price: Option<f64>,
    pub current_value: Option<f64>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

const INVESTMENT_COLUMNS: &str = "id, user_id, name, kind, quantity, purchase_price, \
     current_value, purchase_date, notes, created_at, updated_at";

/// List investments for a user, most valuable first.
pub async fn list_investments(
    pool: &PgPool,
    user_id: &Uuid,
) -> Result<Vec<InvestmentRow>, sqlx::Error> {
    sqlx::query_as::<_, InvestmentRow>(&format!(
        "SELECT {INVESTMENT_COLUMNS} FROM investments \
         WHERE user_id = $1 \
         ORDER BY current_value DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Create a new investment.
pub async fn create_investment(
    pool: &PgPool,
    user_id: &Uuid,
    input: &NewInvestment,
) -> Result<InvestmentRow, sqlx::Error> {
    sqlx::query_as::<_, InvestmentRow>(&format!(
        "INSERT INTO investments (id, user_id, name, kind, quantity, purchase_price, \
                                  current_value, purchase_date, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {INVESTMENT_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(user_id)
    .bind(&input.name)
    .bind(input.kind)
    .bind(input.quantity)
    .bind(input.purchase_price)
    .bind(input.current_value)
    .bind(input.purchase_date)
    .bind(&input.notes)
    .fetch_one(pool)
    .await
}

/// Get an investment by ID (scoped to user).
pub async fn get_investment(
    pool: &PgPool,
    user_id: &Uuid,
    investment_id: &Uuid,
) -> Result<Option<InvestmentRow>, sqlx::Error> {
    sqlx::query_as::<_, InvestmentRow>(&format!(
        "SELECT {INVESTMENT_COLUMNS} FROM investments WHERE id = $1 AND user_id = $2"
    ))
    .bind(investment_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Apply a partial update to an investment (scoped to user).
pub async fn update_investment(
    pool: &PgPool,
    user_id: &Uuid,
    investment_id: &Uuid,
    patch: &InvestmentPatch,
) -> Result<Option<InvestmentRow>, sqlx::Error> {
    sqlx::query_as::<_, InvestmentRow>(&format!(
        "UPDATE investments SET \
             name = COALESCE($3, name), \
             kind = COALESCE($4, kind), \
             quantity = COALESCE($5, quantity), \
             purchase_price = COALESCE($6, purchase_price), \
             current_value = COALESCE($7, current_value), \
             purchase_date = COALESCE($8, purchase_date), \
             notes = COALESCE($9, notes), \
             updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {INVESTMENT_COLUMNS}"
    ))
    .bind(investment_id)
    .bind(user_id)
    .bind(&patch.name)
    .bind(patch.kind)
    .bind(patch.quantity)
    .bind(patch.purchase_price)
    .bind(patch.current_value)
    .bind(patch.purchase_date)
    .bind(&patch.notes)
    .fetch_optional(pool)
    .await
}

/// Delete an investment (scoped to user).
pub async fn delete_investment(
    pool: &PgPool,
    user_id: &Uuid,
    investment_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM investments WHERE id = $1 AND user_id = $2")
        .bind(investment_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
