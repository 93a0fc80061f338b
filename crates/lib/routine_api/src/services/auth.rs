//! Authentication service — register/login/refresh flows delegating to
//! `routine_core::auth`.

use chrono::{Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{LogoutResponse, TokenResponse};

// Re-export from routine_core for the middleware and handlers.
pub use routine_core::auth::jwt::{ACCESS_TOKEN_EXPIRY_SECS, verify_access_token};
pub use routine_core::models::auth::{TokenClaims, User};

/// Refresh token lifetime: 30 days.
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Password hashing (delegate to routine_core)
// ---------------------------------------------------------------------------

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> AppResult<String> {
    routine_core::auth::password::hash_password(password).map_err(AppError::from)
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    routine_core::auth::password::verify_password(password, hash).map_err(AppError::from)
}

// ---------------------------------------------------------------------------
// Refresh token generation & hashing
// ---------------------------------------------------------------------------

/// Generate a cryptographically random refresh token (64 alphanumeric chars).
fn generate_refresh_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// SHA-256 hash a refresh token for storage.
fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Normalize an email for storage/lookup: trimmed, lowercased.
///
/// Comparison is case-insensitive while the stored form stays canonical.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> AppResult<()> {
    let at = email.find('@');
    match at {
        Some(i) if i > 0 && i + 1 < email.len() && !email.contains(char::is_whitespace) => Ok(()),
        _ => Err(AppError::Validation("Invalid email address".into())),
    }
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Build a `TokenResponse` from user data plus a fresh token pair.
fn build_token_response(user: User, access_token: String, refresh_token: String) -> TokenResponse {
    TokenResponse {
        access_token,
        refresh_token,
        expires_in: ACCESS_TOKEN_EXPIRY_SECS,
        token_type: "Bearer".to_string(),
        user,
    }
}

/// Issue a new token pair for a user and persist the refresh token hash.
async fn issue_tokens(
    pool: &PgPool,
    user: User,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let access_token =
        routine_core::auth::jwt::generate_access_token(&user.id, &user.email, jwt_secret)?;
    let refresh_token = generate_refresh_token();
    let token_hash = hash_refresh_token(&refresh_token);

    let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS);
    routine_core::auth::queries::store_refresh_token(pool, &token_hash, &user.id, expires_at)
        .await?;

    Ok(build_token_response(user, access_token, refresh_token))
}

// ---------------------------------------------------------------------------
// Public auth operations
// ---------------------------------------------------------------------------

/// Register a new user account. Returns the public user record — no token,
/// no password hash.
pub async fn register(
    pool: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> AppResult<User> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name must not be empty".into()));
    }
    validate_email(email)?;
    validate_password(password)?;

    let email = normalize_email(email);
    if routine_core::auth::queries::email_exists(pool, &email).await? {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let pw_hash = hash_password(password)?;
    let user_id =
        routine_core::auth::queries::create_user(pool, &email, name.trim(), &pw_hash).await?;

    info!(user_id = %user_id, "user registered");

    Ok(User {
        id: user_id,
        email,
        name: name.trim().to_string(),
    })
}

/// Authenticate with email + password.
pub async fn login(
    pool: &PgPool,
    email: &str,
    password: &str,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let email = normalize_email(email);
    let row = routine_core::auth::queries::find_user_by_email(pool, &email).await?;

    // Same generic error for unknown email and wrong password — the
    // response must not reveal whether the account exists.
    let (user_id, name, pw_hash) = match row {
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
        Some(r) => r,
    };

    if !verify_password(password, &pw_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user_id, "user logged in");

    issue_tokens(
        pool,
        User {
            id: user_id,
            email,
            name,
        },
        jwt_secret,
    )
    .await
}

/// Refresh an access token using a refresh token (single-use rotation).
///
/// The presented token is revoked before the new pair is issued, so a
/// replayed token is rejected exactly like an invalid one.
pub async fn refresh(
    pool: &PgPool,
    refresh_token: &str,
    jwt_secret: &[u8],
) -> AppResult<TokenResponse> {
    let token_hash = hash_refresh_token(refresh_token);

    let row =
        routine_core::auth::queries::find_valid_refresh_token(pool, &token_hash).await?;

    let (token_id, user_id) = match row {
        None => return Err(AppError::Unauthorized("Invalid refresh token".into())),
        Some(r) => r,
    };

    routine_core::auth::queries::revoke_refresh_token(pool, &token_id).await?;

    let user = routine_core::auth::queries::get_user_by_id(pool, &user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

    issue_tokens(pool, user, jwt_secret).await
}

/// Logout — revoke a specific refresh token server-side.
pub async fn logout(pool: &PgPool, refresh_token: Option<&str>) -> AppResult<LogoutResponse> {
    if let Some(token) = refresh_token {
        let token_hash = hash_refresh_token(token);
        routine_core::auth::queries::revoke_refresh_token_by_hash(pool, &token_hash).await?;
    }
    Ok(LogoutResponse { success: true })
}

/// Fetch the authenticated user's profile.
///
/// The guard validates tokens statelessly, so a user deleted after token
/// issue still reaches this point — the lookup is what surfaces 404.
pub async fn profile(pool: &PgPool, user_id: &str) -> AppResult<User> {
    routine_core::auth::queries::get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Update the authenticated user's profile fields.
pub async fn update_profile(
    pool: &PgPool,
    user_id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> AppResult<User> {
    let email = match email {
        Some(e) => {
            validate_email(e)?;
            let normalized = normalize_email(e);
            let current = profile(pool, user_id).await?;
            if normalized != current.email
                && routine_core::auth::queries::email_exists(pool, &normalized).await?
            {
                return Err(AppError::Conflict("Email already registered".into()));
            }
            Some(normalized)
        }
        None => None,
    };

    routine_core::auth::queries::update_user(pool, user_id, name, email.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
