//! Health measurement request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use routine_core::health::{self, MeasurementPatch, MeasurementRow, NewMeasurement};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;

/// `GET /api/health/measurements` — list the user's measurements.
pub async fn list_measurements_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<MeasurementRow>>> {
    let rows = health::list_measurements(&state.pool, &user.user_id()?).await?;
    Ok(Json(rows))
}

/// `POST /api/health/measurements` — record a measurement.
pub async fn create_measurement_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<NewMeasurement>,
) -> AppResult<(StatusCode, Json<MeasurementRow>)> {
    if body.value.trim().is_empty() {
        return Err(AppError::Validation(
            "Measurement value must not be empty".into(),
        ));
    }
    let row = health::create_measurement(&state.pool, &user.user_id()?, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/health/measurements/{id}` — fetch one measurement.
pub async fn get_measurement_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(measurement_id): Path<Uuid>,
) -> AppResult<Json<MeasurementRow>> {
    let row = health::get_measurement(&state.pool, &user.user_id()?, &measurement_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Measurement not found".into()))?;
    Ok(Json(row))
}

/// `PATCH /api/health/measurements/{id}` — partially update a measurement.
pub async fn update_measurement_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(measurement_id): Path<Uuid>,
    Json(body): Json<MeasurementPatch>,
) -> AppResult<Json<MeasurementRow>> {
    let row = health::update_measurement(&state.pool, &user.user_id()?, &measurement_id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Measurement not found".into()))?;
    Ok(Json(row))
}

/// `DELETE /api/health/measurements/{id}` — delete a measurement.
pub async fn delete_measurement_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(measurement_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let deleted =
        health::delete_measurement(&state.pool, &user.user_id()?, &measurement_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Measurement not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
