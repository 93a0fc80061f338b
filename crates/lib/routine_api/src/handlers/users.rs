//! User profile request handlers.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::UpdateProfileRequest;
use crate::services::auth::{self, User};

/// `GET /api/users/me` — the authenticated user's profile.
///
/// Same lookup as `/api/auth/profile`; kept as a separate route for
/// clients that address users rather than the auth session.
pub async fn me_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<User>> {
    let resp = auth::profile(&state.pool, &user.0.sub).await?;
    Ok(Json(resp))
}

/// `PATCH /api/users/me` — update name and/or email.
pub async fn update_me_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let resp = auth::update_profile(
        &state.pool,
        &user.0.sub,
        body.name.as_deref(),
        body.email.as_deref(),
    )
    .await?;
    Ok(Json(resp))
}
