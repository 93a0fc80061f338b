//! # routine_api
//!
//! HTTP API library for Routine.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::Router;
use axum::routing::{get, patch, post, put};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, goals, habits, health, investments, tasks, transactions, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
}

/// Run embedded database migrations.
///
/// Delegates to `routine_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    routine_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
///
/// Register, login, and refresh are the only routes reachable without a
/// bearer token; everything else sits behind the auth middleware.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/profile", get(auth::profile_handler))
        .route(
            "/users/me",
            get(users::me_handler).patch(users::update_me_handler),
        )
        .route(
            "/tasks",
            get(tasks::list_tasks_handler).post(tasks::create_task_handler),
        )
        .route("/tasks/upcoming", get(tasks::upcoming_tasks_handler))
        .route(
            "/tasks/{id}",
            get(tasks::get_task_handler)
                .patch(tasks::update_task_handler)
                .delete(tasks::delete_task_handler),
        )
        .route("/tasks/{id}/complete", patch(tasks::complete_task_handler))
        .route(
            "/habits",
            get(habits::list_habits_handler).post(habits::create_habit_handler),
        )
        .route("/habits/active", get(habits::active_habits_handler))
        .route(
            "/habits/{id}",
            get(habits::get_habit_handler)
                .patch(habits::update_habit_handler)
                .delete(habits::delete_habit_handler),
        )
        .route(
            "/habits/{id}/progress",
            put(habits::upsert_progress_handler).get(habits::list_progress_handler),
        )
        .route(
            "/goals",
            get(goals::list_goals_handler).post(goals::create_goal_handler),
        )
        .route("/goals/in-progress", get(goals::goals_in_progress_handler))
        .route(
            "/goals/{id}",
            get(goals::get_goal_handler)
                .patch(goals::update_goal_handler)
                .delete(goals::delete_goal_handler),
        )
        .route(
            "/transactions",
            get(transactions::list_transactions_handler)
                .post(transactions::create_transaction_handler),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get_transaction_handler)
                .patch(transactions::update_transaction_handler)
                .delete(transactions::delete_transaction_handler),
        )
        .route(
            "/investments",
            get(investments::list_investments_handler)
                .post(investments::create_investment_handler),
        )
        .route(
            "/investments/{id}",
            get(investments::get_investment_handler)
                .patch(investments::update_investment_handler)
                .delete(investments::delete_investment_handler),
        )
        .route(
            "/health/measurements",
            get(health::list_measurements_handler).post(health::create_measurement_handler),
        )
        .route(
            "/health/measurements/{id}",
            get(health::get_measurement_handler)
                .patch(health::update_measurement_handler)
                .delete(health::delete_measurement_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .nest("/api", public.merge(protected))
        .layer(cors)
        .with_state(state)
}
