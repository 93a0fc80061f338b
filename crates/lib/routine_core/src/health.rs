//! Health measurement persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::uuid::uuidv7;

/// Kind of health measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementType {
    Weight,
    BloodPressure,
    HeartRate,
    SleepHours,
    WaterIntake,
    Other,
}

/// Row returned by measurement queries.
///
/// `value` is free-form text: blood pressure reads "120/80", weight "82.5".
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    pub value: String,
    pub unit: Option<String>,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a measurement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeasurement {
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    pub value: String,
    pub unit: Option<String>,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Partial update for a measurement. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementPatch {
    #[serde(rename = "type")]
    pub kind: Option<MeasurementType>,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

const MEASUREMENT_COLUMNS: &str =
    "id, user_id, kind, value, unit, date, notes, created_at, updated_at";

/// List measurements for a user, newest first.
pub async fn list_measurements(
    pool: &PgPool,
    user_id: &Uuid,
) -> Result<Vec<MeasurementRow>, sqlx::Error> {
    sqlx::query_as::<_, MeasurementRow>(&format!(
        "SELECT {MEASUREMENT_COLUMNS} FROM health_measurements \
         WHERE user_id = $1 \
         ORDER BY date DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Create a new measurement.
pub async fn create_measurement(
    pool: &PgPool,
    user_id: &Uuid,
    input: &NewMeasurement,
) -> Result<MeasurementRow, sqlx::Error> {
    sqlx::query_as::<_, MeasurementRow>(&format!(
        "INSERT INTO health_measurements (id, user_id, kind, value, unit, date, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {MEASUREMENT_COLUMNS}"
    ))
    .bind(uuidv7())
    .bind(user_id)
    .bind(input.kind)
    .bind(&input.value)
    .bind(&input.unit)
    .bind(input.date)
    .bind(&input.notes)
    .fetch_one(pool)
    .await
}

/// Get a measurement by ID (scoped to user).
pub async fn get_measurement(
    pool: &PgPool,
    user_id: &Uuid,
    measurement_id: &Uuid,
) -> Result<Option<MeasurementRow>, sqlx::Error> {
    sqlx::query_as::<_, MeasurementRow>(&format!(
        "SELECT {MEASUREMENT_COLUMNS} FROM health_measurements WHERE id = $1 AND user_id = $2"
    ))
    .bind(measurement_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Apply a partial update to a measurement (scoped to user).
pub async fn update_measurement(
    pool: &PgPool,
    user_id: &Uuid,
    measurement_id: &Uuid,
    patch: &MeasurementPatch,
) -> Result<Option<MeasurementRow>, sqlx::Error> {
    sqlx::query_as::<_, MeasurementRow>(&format!(
        "UPDATE health_measurements SET \
             kind = COALESCE($3, kind), \
             value = COALESCE($4, value), \
             unit = COALESCE($5, unit), \
             date = COALESCE($6, date), \
             notes = COALESCE($7, notes), \
             updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {MEASUREMENT_COLUMNS}"
    ))
    .bind(measurement_id)
    .bind(user_id)
    .bind(patch.kind)
    .bind(&patch.value)
    .bind(&patch.unit)
    .bind(patch.date)
    .bind(&patch.notes)
    .fetch_optional(pool)
    .await
}

/// Delete a measurement (scoped to user).
pub async fn delete_measurement(
    pool: &PgPool,
    user_id: &Uuid,
    measurement_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM health_measurements WHERE id = $1 AND user_id = $2")
        .bind(measurement_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
