//! Durable session store.
//!
//! Two files under the app data directory, kept separate so clearing or
//! rotating one never requires re-parsing the other:
//! - `session.json` — the serialized session (user, token, authenticated flag),
//! - `refresh-token` — the raw refresh token string.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::session::{self, AuthUser, SessionEvent, SessionState};

/// File holding the serialized session blob.
const SESSION_FILE: &str = "session.json";

/// File holding the raw refresh token.
const REFRESH_TOKEN_FILE: &str = "refresh-token";

/// The subset of session state that survives restarts.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    user: Option<AuthUser>,
    token: Option<String>,
    is_authenticated: bool,
}

/// Durable holder of the current session plus the separately-stored
/// refresh token.
///
/// The `generation` counter increments every time the store is cleared.
/// In-flight work snapshots the generation before an await point and
/// re-checks it before writing back, so a refresh that completes after a
/// logout cannot resurrect the session.
pub struct SessionStore {
    dir: PathBuf,
    state: SessionState,
    refresh_token: Option<String>,
    generation: u64,
}

impl SessionStore {
    /// Open a store rooted at `dir`, hydrating any persisted session.
    ///
    /// Unreadable or corrupt files are treated as an absent session, not
    /// an error — the user just has to log in again.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let state = match fs::read_to_string(dir.join(SESSION_FILE)) {
            Ok(raw) => match serde_json::from_str::<PersistedSession>(&raw) {
                Ok(persisted) => SessionState::from_parts(persisted.user, persisted.token),
                Err(e) => {
                    warn!("discarding unreadable session file: {e}");
                    SessionState::default()
                }
            },
            Err(_) => SessionState::default(),
        };
        let refresh_token = fs::read_to_string(dir.join(REFRESH_TOKEN_FILE))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            dir,
            state,
            refresh_token,
            generation: 0,
        }
    }

    /// Open a store in the platform data directory (`$APP_DATA/routine/`).
    pub fn open_default() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("routine");
        Self::open(dir)
    }

    /// Directory the store persists into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The stored refresh token, if any.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Clear-generation counter; bumped by [`SessionStore::clear`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply a session event and persist the result.
    pub fn apply(&mut self, event: SessionEvent) {
        if matches!(event, SessionEvent::LoggedOut) {
            self.clear();
            return;
        }
        self.state = session::apply(&self.state, event);
        self.save_session();
    }

    /// Store or remove the refresh token.
    pub fn set_refresh_token(&mut self, token: Option<String>) {
        self.refresh_token = token;
        let path = self.dir.join(REFRESH_TOKEN_FILE);
        let result = match &self.refresh_token {
            Some(token) => self.ensure_dir().and_then(|_| fs::write(&path, token)),
            None => match fs::remove_file(&path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        };
        if let Err(e) = result {
            warn!("failed to persist refresh token: {e}");
        }
    }

    /// Wipe everything: in-memory state, both durable files, and bump the
    /// generation so in-flight writers know to stand down.
    ///
    /// Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.state = SessionState::default();
        self.refresh_token = None;
        self.generation += 1;
        for file in [SESSION_FILE, REFRESH_TOKEN_FILE] {
            if let Err(e) = fs::remove_file(self.dir.join(file)) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("failed to remove {file}: {e}");
                }
            }
        }
    }

    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    fn save_session(&self) {
        let persisted = PersistedSession {
            user: self.state.user.clone(),
            token: self.state.token.clone(),
            is_authenticated: self.state.is_authenticated,
        };
        let result = self.ensure_dir().and_then(|_| {
            let raw = serde_json::to_string(&persisted)?;
            fs::write(self.dir.join(SESSION_FILE), raw)
        });
        if let Err(e) = result {
            warn!("failed to persist session: {e}");
        }
    }
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
    fn session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = SessionStore::open(dir.path());
        store.apply(SessionEvent::LoginSucceeded {
            user: user(),
            token: "tok".into(),
        });
        store.set_refresh_token(Some("refresh-1".into()));

        let reopened = SessionStore::open(dir.path());
        assert!(reopened.state().is_authenticated);
        assert_eq!(reopened.state().token.as_deref(), Some("tok"));
        assert_eq!(reopened.refresh_token(), Some("refresh-1"));
    }

    #[test]
    fn clear_removes_both_files_and_bumps_generation() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = SessionStore::open(dir.path());
        store.apply(SessionEvent::LoginSucceeded {
            user: user(),
            token: "tok".into(),
        });
        store.set_refresh_token(Some("refresh-1".into()));
        let generation = store.generation();

        store.clear();
        assert_eq!(store.generation(), generation + 1);
        assert!(!dir.path().join(SESSION_FILE).exists());
        assert!(!dir.path().join(REFRESH_TOKEN_FILE).exists());

        // Clearing twice is fine.
        store.clear();

        let reopened = SessionStore::open(dir.path());
        assert!(!reopened.state().is_authenticated);
        assert!(reopened.refresh_token().is_none());
    }

    #[test]
    fn corrupt_session_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SESSION_FILE), "not json at all").unwrap();

        let store = SessionStore::open(dir.path());
        assert!(!store.state().is_authenticated);
        assert!(store.state().user.is_none());
    }

    #[test]
    fn persisted_flag_is_rederived_not_trusted() {
        let dir = tempfile::tempdir().unwrap();
        // Token missing but flag claims authenticated: the invariant wins.
        fs::write(
            dir.path().join(SESSION_FILE),
            r#"{"user":{"id":"u1","email":"a@b.com","name":"A"},"token":null,"isAuthenticated":true}"#,
        )
        .unwrap();

        let store = SessionStore::open(dir.path());
        assert!(!store.state().is_authenticated);
    }
}
