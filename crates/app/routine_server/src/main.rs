//! Routine API server binary.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "routine_server", about = "Routine API server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/routine"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,routine_api=debug,routine_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    // Configuration is resolved before anything touches the network, so a
    // missing JWT_SECRET aborts startup instead of surfacing per-request.
    let config = routine_api::config::ApiConfig {
        bind_addr: format!("127.0.0.1:{}", args.port),
        pg_connection_url: args.database_url.clone(),
        jwt_secret: routine_api::config::require_jwt_secret()?,
    };

    info!(port = args.port, "starting routine_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    routine_api::migrate(&pool).await?;

    let state = routine_api::AppState {
        pool,
        config: config.clone(),
    };

    let app = routine_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
