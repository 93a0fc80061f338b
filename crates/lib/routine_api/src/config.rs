//! API server configuration.

use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set (no built-in default)")]
    MissingVar(&'static str),
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3001").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable       | Default                                  |
    /// |----------------|------------------------------------------|
    /// | `BIND_ADDR`    | `127.0.0.1:3001`                         |
    /// | `DATABASE_URL` | `postgres://localhost:5432/routine`      |
    /// | `JWT_SECRET`   | REQUIRED — startup fails when unset      |
    ///
    /// The signing secret has no fallback: tokens signed with a guessable
    /// default would be forgeable, so an absent or empty `JWT_SECRET` is a
    /// configuration error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = require_jwt_secret()?;

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3001".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/routine".into()),
            jwt_secret,
        })
    }
}

/// Read `JWT_SECRET` from the environment, failing when absent or empty.
pub fn require_jwt_secret() -> Result<String, ConfigError> {
    std::env::var("JWT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingVar("JWT_SECRET"))
}
