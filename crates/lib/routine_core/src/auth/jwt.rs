//! JWT access token generation and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::AuthError;
use crate::models::auth::TokenClaims;

/// Access token lifetime: 24 hours.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 24 * 60 * 60;

/// Generate a signed JWT access token (HS256, 24 h expiry).
pub fn generate_access_token(
    user_id: &str,
    email: &str,
    secret: &[u8],
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: (now + Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify a JWT access token, returning the claims on success.
///
/// Returns `None` on any failure: bad signature, malformed token,
/// or expired `exp` claim. Callers must not distinguish the cases.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Option<TokenClaims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<TokenClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"unit-test-secret";

    #[test]
    fn generate_then_verify_roundtrip() {
        let token = generate_access_token("user-123", "a@b.com", SECRET).unwrap();
        let claims = verify_access_token(&token, SECRET).expect("token should verify");
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "a@b.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token("user-123", "a@b.com", SECRET).unwrap();
        assert!(verify_access_token(&token, b"other-secret").is_none());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = generate_access_token("user-123", "a@b.com", SECRET).unwrap();
        // Flip a character in the payload segment.
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let mut payload: Vec<u8> = parts[1].clone().into_bytes();
        payload[0] = if payload[0] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload).unwrap();
        let tampered = parts.join(".");
        assert!(verify_access_token(&tampered, SECRET).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Encode claims that expired well past the default validation leeway.
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: "user-123".into(),
            email: "a@b.com".into(),
            exp: now - 600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(verify_access_token(&token, SECRET).is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify_access_token("not-a-jwt", SECRET).is_none());
    }
}
