//! Client error types.

use thiserror::Error;

/// Errors surfaced by [`crate::ApiClient`].
///
/// The variants preserve the distinction the session logic depends on:
/// transient transport trouble (`ServerUnavailable`, `ServerError`) never
/// clears the session, while `Unauthorized` and `SessionExpired` are the
/// terminal auth failures that accompany a forced logout.
#[derive(Debug, Error)]
pub enum ClientError {
    /// 4xx response passed through from the API.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// No usable credentials and no refresh token to recover with.
    #[error("Unauthorized")]
    Unauthorized,

    /// The access token expired and the refresh attempt failed.
    #[error("Session expired")]
    SessionExpired,

    /// No response received (connection refused, DNS failure, timeout).
    #[error("Server unavailable")]
    ServerUnavailable,

    /// 5xx response from the API.
    #[error("Server error ({0})")]
    ServerError(u16),

    /// Any other transport-level failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}
