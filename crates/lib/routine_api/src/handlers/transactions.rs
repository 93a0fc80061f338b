//! Transaction request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use routine_core::transactions::{self, NewTransaction, TransactionPatch, TransactionRow};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;

/// `GET /api/transactions` — list the authenticated user's transactions.
pub async fn list_transactions_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<TransactionRow>>> {
    let rows = transactions::list_transactions(&state.pool, &user.user_id()?).await?;
    Ok(Json(rows))
}

/// `POST /api/transactions` — create a transaction.
pub async fn create_transaction_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<NewTransaction>,
) -> AppResult<(StatusCode, Json<TransactionRow>)> {
    if body.description.trim().is_empty() {
        return Err(AppError::Validation(
            "Transaction description must not be empty".into(),
        ));
    }
    if !body.amount.is_finite() || body.amount <= 0.0 {
        return Err(AppError::Validation(
            "Transaction amount must be positive".into(),
        ));
    }
    let row = transactions::create_transaction(&state.pool, &user.user_id()?, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/transactions/{id}` — fetch one transaction.
pub async fn get_transaction_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(tx_id): Path<Uuid>,
) -> AppResult<Json<TransactionRow>> {
    let row = transactions::get_transaction(&state.pool, &user.user_id()?, &tx_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;
    Ok(Json(row))
}

/// `PATCH /api/transactions/{id}` — partially update a transaction.
pub async fn update_transaction_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(tx_id): Path<Uuid>,
    Json(body): Json<TransactionPatch>,
) -> AppResult<Json<TransactionRow>> {
    if let Some(amount) = body.amount {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AppError::Validation(
                "Transaction amount must be positive".into(),
            ));
        }
    }
    let row = transactions::update_transaction(&state.pool, &user.user_id()?, &tx_id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;
    Ok(Json(row))
}

/// `DELETE /api/transactions/{id}` — delete a transaction.
pub async fn delete_transaction_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(tx_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let deleted = transactions::delete_transaction(&state.pool, &user.user_id()?, &tx_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Transaction not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
