//! Investment request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use routine_core::investments::{self, InvestmentPatch, InvestmentRow, NewInvestment};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;

/// `GET /api/investments` — list the authenticated user's investments.
pub async fn list_investments_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<InvestmentRow>>> {
    let rows = investments::list_investments(&state.pool, &user.user_id()?).await?;
    Ok(Json(rows))
}

/// `POST /api/investments` — create an investment.
pub async fn create_investment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<NewInvestment>,
) -> AppResult<(StatusCode, Json<InvestmentRow>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Investment name must not be empty".into(),
        ));
    }
    if !body.current_value.is_finite() || body.current_value < 0.0 {
        return Err(AppError::Validation(
            "Investment value must not be negative".into(),
        ));
    }
    let row = investments::create_investment(&state.pool, &user.user_id()?, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/investments/{id}` — fetch one investment.
pub async fn get_investment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(investment_id): Path<Uuid>,
) -> AppResult<Json<InvestmentRow>> {
    let row = investments::get_investment(&state.pool, &user.user_id()?, &investment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Investment not found".into()))?;
    Ok(Json(row))
}

/// `PATCH /api/investments/{id}` — partially update an investment.
pub async fn update_investment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(investment_id): Path<Uuid>,
    Json(body): Json<InvestmentPatch>,
) -> AppResult<Json<InvestmentRow>> {
    let row = investments::update_investment(&state.pool, &user.user_id()?, &investment_id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Investment not found".into()))?;
    Ok(Json(row))
}

/// `DELETE /api/investments/{id}` — delete an investment.
pub async fn delete_investment_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(investment_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let deleted =
        investments::delete_investment(&state.pool, &user.user_id()?, &investment_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Investment not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
