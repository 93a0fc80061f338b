//! Auth-related database queries.

use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::User;
use crate::uuid::uuidv7;

/// Fetch a user by email, returning (id, name, password_hash).
///
/// Emails are stored lowercased; callers normalize before lookup.
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(String, String, String)>, AuthError> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        "SELECT id::text, name, password_hash FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Create a new user, returning the user ID.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<String, AuthError> {
    let user_id = sqlx::query_scalar::<_, String>(
        "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING id::text",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(user_id)
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AuthError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Fetch user email and name by user ID.
pub async fn get_user_by_id(pool: &PgPool, user_id: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, (String, String)>(
        "SELECT email, name FROM users WHERE id = $1::uuid",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(email, name)| User {
        id: user_id.to_string(),
        email,
        name,
    }))
}

/// Update a user's profile fields. `None` leaves the column unchanged.
pub async fn update_user(
    pool: &PgPool,
    user_id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, (String, String)>(
        "UPDATE users \
         SET name = COALESCE($2, name), \
             email = COALESCE($3, email), \
             updated_at = now() \
         WHERE id = $1::uuid \
         RETURNING email, name",
    )
    .bind(user_id)
    .bind(name)
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(email, name)| User {
        id: user_id.to_string(),
        email,
        name,
    }))
}

/// Delete a user record. Administrative/test-only path; cascades to all
/// owned rows including refresh tokens.
pub async fn delete_user(pool: &PgPool, user_id: &str) -> Result<bool, AuthError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1::uuid")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Store a refresh token hash.
pub async fn store_refresh_token(
    pool: &PgPool,
    token_hash: &str,
    user_id: &str,
    expires_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO refresh_tokens (id, token_hash, user_id, expires_at) VALUES ($1, $2, $3::uuid, $4)",
    )
    .bind(uuidv7())
    .bind(token_hash)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Find a valid, non-revoked, non-expired refresh token. Returns (token_id, user_id).
pub async fn find_valid_refresh_token(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<(String, String)>, AuthError> {
    let row = sqlx::query_as::<_, (String, String)>(
        "SELECT rt.id::text, rt.user_id::text \
         FROM refresh_tokens rt \
         WHERE rt.token_hash = $1 \
           AND rt.revoked_at IS NULL \
           AND rt.expires_at > now()",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Revoke a refresh token by ID.
pub async fn revoke_refresh_token(pool: &PgPool, token_id: &str) -> Result<(), AuthError> {
    sqlx::query("UPDATE refresh_tokens SET revoked_at = now() WHERE id = $1::uuid")
        .bind(token_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Revoke a refresh token by hash.
pub async fn revoke_refresh_token_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = now() \
         WHERE token_hash = $1 AND revoked_at IS NULL",
    )
    .bind(token_hash)
    .execute(pool)
    .await?;
    Ok(())
}
