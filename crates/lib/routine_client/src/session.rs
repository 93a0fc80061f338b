//! Pure session state machine.
//!
//! `apply` is a plain state transition — given the current state and an
//! event, produce the next state. No network, no disk, so the transition
//! logic is unit-testable without mocking HTTP. The store layer owns
//! persistence; the client layer owns side effects.

use serde::{Deserialize, Serialize};

/// The authenticated user as the API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Client-side view of the session.
///
/// Invariant: `is_authenticated` is true iff both `user` and `token` are
/// present. `apply` recomputes it on every transition rather than trusting
/// any stored flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Events that drive session transitions.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A login/register/session-check round trip started.
    LoadingStarted,
    /// Login succeeded with a fresh token pair.
    LoginSucceeded { user: AuthUser, token: String },
    /// Registration succeeded (no token is issued on register).
    Registered,
    /// A refresh produced a new access token; the user is unchanged.
    TokenRefreshed { token: String },
    /// A profile fetch confirmed (or updated) the current user.
    ProfileLoaded { user: AuthUser },
    /// An auth operation failed; keep the session, surface the message.
    AuthFailed { message: String },
    /// Set or clear the inline error without touching anything else.
    ErrorSet { message: Option<String> },
    /// The single forced-logout transition: everything goes.
    LoggedOut,
}

impl SessionState {
    /// Rebuild a state from persisted fields, re-deriving the invariant.
    pub fn from_parts(user: Option<AuthUser>, token: Option<String>) -> Self {
        let is_authenticated = user.is_some() && token.is_some();
        Self {
            user,
            token,
            is_authenticated,
            is_loading: false,
            error: None,
        }
    }
}

/// Apply one event to the session, producing the next state.
pub fn apply(state: &SessionState, event: SessionEvent) -> SessionState {
    let mut next = state.clone();
    match event {
        SessionEvent::LoadingStarted => {
            next.is_loading = true;
            next.error = None;
        }
        SessionEvent::LoginSucceeded { user, token } => {
            next.user = Some(user);
            next.token = Some(token);
            next.is_loading = false;
            next.error = None;
        }
        SessionEvent::Registered => {
            next.is_loading = false;
            next.error = None;
        }
        SessionEvent::TokenRefreshed { token } => {
            next.token = Some(token);
        }
        SessionEvent::ProfileLoaded { user } => {
            next.user = Some(user);
            next.is_loading = false;
        }
        SessionEvent::AuthFailed { message } => {
            next.is_loading = false;
            next.error = Some(message);
        }
        SessionEvent::ErrorSet { message } => {
            next.error = message;
        }
        SessionEvent::LoggedOut => {
            next = SessionState::default();
        }
    }
    next.is_authenticated = next.user.is_some() && next.token.is_some();
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthUser {
        AuthUser {
            id: "u1".into(),
            email: "a@b.com".into(),
            name: "A".into(),
        }
    }

    #[test]
    fn login_authenticates() {
        let s = apply(
            &SessionState::default(),
            SessionEvent::LoginSucceeded {
                user: user(),
                token: "tok".into(),
            },
        );
        assert!(s.is_authenticated);
        assert_eq!(s.token.as_deref(), Some("tok"));
        assert!(!s.is_loading);
        assert!(s.error.is_none());
    }

    #[test]
    fn token_alone_is_not_authenticated() {
        // A refresh landing without a known user must not flip the flag.
        let s = apply(
            &SessionState::default(),
            SessionEvent::TokenRefreshed { token: "tok".into() },
        );
        assert!(s.token.is_some());
        assert!(s.user.is_none());
        assert!(!s.is_authenticated);
    }

    #[test]
    fn refresh_keeps_user_and_swaps_token() {
        let logged_in = apply(
            &SessionState::default(),
            SessionEvent::LoginSucceeded {
                user: user(),
                token: "old".into(),
            },
        );
        let s = apply(&logged_in, SessionEvent::TokenRefreshed { token: "new".into() });
        assert!(s.is_authenticated);
        assert_eq!(s.token.as_deref(), Some("new"));
        assert_eq!(s.user, logged_in.user);
    }

    #[test]
    fn logout_clears_everything() {
        let logged_in = apply(
            &SessionState::default(),
            SessionEvent::LoginSucceeded {
                user: user(),
                token: "tok".into(),
            },
        );
        let s = apply(&logged_in, SessionEvent::LoggedOut);
        assert_eq!(s, SessionState::default());
        // Idempotent: a second logout is a no-op.
        assert_eq!(apply(&s, SessionEvent::LoggedOut), s);
    }

    #[test]
    fn auth_failure_keeps_session_and_sets_error() {
        let logged_in = apply(
            &SessionState::default(),
            SessionEvent::LoginSucceeded {
                user: user(),
                token: "tok".into(),
            },
        );
        let s = apply(
            &logged_in,
            SessionEvent::AuthFailed {
                message: "Invalid credentials".into(),
            },
        );
        assert!(s.is_authenticated);
        assert_eq!(s.error.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn invariant_holds_from_persisted_parts() {
        assert!(SessionState::from_parts(Some(user()), Some("tok".into())).is_authenticated);
        assert!(!SessionState::from_parts(Some(user()), None).is_authenticated);
        assert!(!SessionState::from_parts(None, Some("tok".into())).is_authenticated);
    }
}
