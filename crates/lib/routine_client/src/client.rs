//! HTTP client for the Routine API.
//!
//! Every request reads the access token out of the session store at
//! dispatch time — there is no process-wide default header to mutate.
//! A 401/403 on a non-auth endpoint triggers at most one transparent
//! refresh-and-retry; unrecoverable auth failures funnel through the
//! single forced-logout path.

use std::sync::{Arc, Mutex};

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::session::{AuthUser, SessionEvent, SessionState};
use crate::store::SessionStore;

/// Why the session was cleared. Carried on the logout broadcast so the UI
/// can phrase the redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The access token expired and the refresh attempt failed.
    SessionExpired,
    /// No credentials and no refresh token to recover with.
    Unauthorized,
    /// The backend was unreachable while nothing was authenticated.
    ServerUnreachable,
    /// The user asked to log out.
    UserInitiated,
}

/// Token pair as the API returns it from login and refresh.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: AuthUser,
}

/// Error body shape shared by all API error responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for the Routine API with transparent token refresh.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<Mutex<SessionStore>>,
    /// Single-flight gate: concurrent 401s coalesce into one refresh call.
    refresh_gate: tokio::sync::Mutex<()>,
    logout_tx: broadcast::Sender<LogoutReason>,
}

impl ApiClient {
    /// Create a client against `base_url`, taking ownership of the store.
    pub fn new(base_url: impl Into<String>, store: SessionStore) -> Self {
        let (logout_tx, _) = broadcast::channel(16);
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store: Arc::new(Mutex::new(store)),
            refresh_gate: tokio::sync::Mutex::new(()),
            logout_tx,
        }
    }

    /// Handle to the underlying session store.
    pub fn session_store(&self) -> Arc<Mutex<SessionStore>> {
        Arc::clone(&self.store)
    }

    /// Snapshot of the current session state.
    pub fn session(&self) -> SessionState {
        self.store.lock().unwrap().state().clone()
    }

    /// Subscribe to forced-logout notifications. The event is the redirect
    /// signal: on receipt the UI should navigate to the login screen.
    pub fn subscribe_logout(&self) -> broadcast::Receiver<LogoutReason> {
        self.logout_tx.subscribe()
    }

    /// Set or clear the inline error message.
    pub fn set_error(&self, message: Option<String>) {
        self.store
            .lock()
            .unwrap()
            .apply(SessionEvent::ErrorSet { message });
    }

    // -----------------------------------------------------------------
    // Session actions
    // -----------------------------------------------------------------

    /// `POST /api/auth/login` — authenticate and persist the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, ClientError> {
        self.store
            .lock()
            .unwrap()
            .apply(SessionEvent::LoadingStarted);

        let body = serde_json::json!({ "email": email, "password": password });
        match self.execute(Method::POST, "/api/auth/login", Some(&body)).await {
            Ok(resp) => {
                let tokens: TokenResponse = resp
                    .json()
                    .await
                    .map_err(|e| ClientError::Decode(e.to_string()))?;
                let mut store = self.store.lock().unwrap();
                store.apply(SessionEvent::LoginSucceeded {
                    user: tokens.user.clone(),
                    token: tokens.access_token,
                });
                store.set_refresh_token(Some(tokens.refresh_token));
                Ok(tokens.user)
            }
            Err(e) => {
                self.store.lock().unwrap().apply(SessionEvent::AuthFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// `POST /api/auth/register` — create an account. No token is issued;
    /// callers follow up with [`ApiClient::login`].
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, ClientError> {
        self.store
            .lock()
            .unwrap()
            .apply(SessionEvent::LoadingStarted);

        let body = serde_json::json!({ "name": name, "email": email, "password": password });
        match self
            .execute(Method::POST, "/api/auth/register", Some(&body))
            .await
        {
            Ok(resp) => {
                let user: AuthUser = resp
                    .json()
                    .await
                    .map_err(|e| ClientError::Decode(e.to_string()))?;
                self.store.lock().unwrap().apply(SessionEvent::Registered);
                Ok(user)
            }
            Err(e) => {
                self.store.lock().unwrap().apply(SessionEvent::AuthFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Log out: clear local state synchronously, then make a best-effort
    /// attempt to revoke the refresh token server-side.
    ///
    /// Idempotent — a second call finds nothing to clear and does nothing.
    pub async fn logout(&self) {
        let (access, refresh) = {
            let store = self.store.lock().unwrap();
            (
                store.state().token.clone(),
                store.refresh_token().map(str::to_string),
            )
        };

        self.force_logout(LogoutReason::UserInitiated);

        if let (Some(access), Some(refresh)) = (access, refresh) {
            let body = serde_json::json!({ "refreshToken": refresh });
            if let Err(e) = self
                .dispatch(Method::POST, "/api/auth/logout", Some(&body), Some(&access))
                .await
            {
                debug!("server-side token revocation failed: {e}");
            }
        }
    }

    /// Validate a persisted session at startup.
    ///
    /// Calls the profile endpoint; on an auth failure, tries one refresh
    /// and re-fetches. Only when that also fails is the user logged out.
    /// A transient transport failure decides nothing.
    pub async fn check_session(&self) -> Result<bool, ClientError> {
        let has_token = { self.store.lock().unwrap().state().token.is_some() };
        if !has_token {
            return Ok(false);
        }

        self.store
            .lock()
            .unwrap()
            .apply(SessionEvent::LoadingStarted);

        match self.fetch_profile().await {
            Ok(user) => {
                self.store
                    .lock()
                    .unwrap()
                    .apply(SessionEvent::ProfileLoaded { user });
                Ok(true)
            }
            Err(ClientError::ServerUnavailable) => {
                self.store.lock().unwrap().apply(SessionEvent::AuthFailed {
                    message: ClientError::ServerUnavailable.to_string(),
                });
                Err(ClientError::ServerUnavailable)
            }
            Err(_) => {
                // The interceptor skips refresh for auth-prefixed paths, so
                // retry by hand: one refresh, one more profile fetch.
                match self.refresh_session().await {
                    Ok(()) => match self.fetch_profile().await {
                        Ok(user) => {
                            self.store
                                .lock()
                                .unwrap()
                                .apply(SessionEvent::ProfileLoaded { user });
                            Ok(true)
                        }
                        Err(ClientError::ServerUnavailable) => Err(ClientError::ServerUnavailable),
                        Err(_) => {
                            self.force_logout(LogoutReason::SessionExpired);
                            Ok(false)
                        }
                    },
                    Err(ClientError::ServerUnavailable) => {
                        self.store.lock().unwrap().apply(SessionEvent::AuthFailed {
                            message: ClientError::ServerUnavailable.to_string(),
                        });
                        Err(ClientError::ServerUnavailable)
                    }
                    Err(_) => {
                        self.force_logout(LogoutReason::SessionExpired);
                        Ok(false)
                    }
                }
            }
        }
    }

    /// Manually exchange the stored refresh token for a new access token.
    pub async fn refresh_session(&self) -> Result<(), ClientError> {
        let stale = { self.store.lock().unwrap().state().token.clone() };
        self.refresh_access_token(stale.as_deref()).await.map(|_| ())
    }

    // -----------------------------------------------------------------
    // Typed request helpers
    // -----------------------------------------------------------------

    /// `GET path`, decoding the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.execute(Method::GET, path, None).await?;
        resp.json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `POST path` with a JSON body, decoding the JSON response.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let resp = self.execute(Method::POST, path, Some(&body)).await?;
        resp.json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `PATCH path` with a JSON body, decoding the JSON response.
    pub async fn patch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let resp = self.execute(Method::PATCH, path, Some(&body)).await?;
        resp.json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `DELETE path`, discarding the response body.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.execute(Method::DELETE, path, None).await.map(|_| ())
    }

    // -----------------------------------------------------------------
    // Request pipeline
    // -----------------------------------------------------------------

    /// Run one request through the full pipeline: attach the current
    /// token, dispatch, and on 401/403 (non-auth endpoints only) refresh
    /// once and retry once with the new token.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let token = { self.store.lock().unwrap().state().token.clone() };

        let resp = match self
            .dispatch(method.clone(), path, body, token.as_deref())
            .await
        {
            Ok(resp) => resp,
            Err(e) => return Err(self.on_transport_failure(e)),
        };

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let is_auth_endpoint = path.starts_with("/api/auth/");
        if (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN)
            && !is_auth_endpoint
        {
            let new_token = match self.refresh_access_token(token.as_deref()).await {
                Ok(token) => token,
                Err(ClientError::Unauthorized) => {
                    self.force_logout(LogoutReason::Unauthorized);
                    return Err(ClientError::Unauthorized);
                }
                Err(ClientError::SessionExpired) => {
                    self.force_logout(LogoutReason::SessionExpired);
                    return Err(ClientError::SessionExpired);
                }
                // Transient trouble reaching the refresh endpoint is not
                // evidence of an invalid session.
                Err(e) => return Err(e),
            };

            // Exactly one retry, and it carries the NEW token.
            let retried = match self.dispatch(method, path, body, Some(&new_token)).await {
                Ok(resp) => resp,
                Err(e) => return Err(self.on_transport_failure(e)),
            };
            if retried.status().is_success() {
                return Ok(retried);
            }
            return Err(Self::error_from_response(retried).await);
        }

        Err(Self::error_from_response(resp).await)
    }

    /// Send one HTTP request, injecting the bearer token if given.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send().await
    }

    /// Exchange the refresh token for a new access token, single-flight.
    ///
    /// `stale_token` is the access token the caller dispatched with; if a
    /// concurrent refresh already replaced it, the fresh token is returned
    /// without spending another refresh token.
    async fn refresh_access_token(&self, stale_token: Option<&str>) -> Result<String, ClientError> {
        let _gate = self.refresh_gate.lock().await;

        let (refresh_token, generation) = {
            let store = self.store.lock().unwrap();
            if let Some(current) = store.state().token.as_deref() {
                if Some(current) != stale_token {
                    return Ok(current.to_string());
                }
            }
            (
                store.refresh_token().map(str::to_string),
                store.generation(),
            )
        };

        let Some(refresh_token) = refresh_token else {
            return Err(ClientError::Unauthorized);
        };

        debug!("access token rejected, attempting refresh");
        let resp = self
            .http
            .post(format!("{}/api/auth/refresh", self.base_url))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|_| ClientError::ServerUnavailable)?;

        if !resp.status().is_success() {
            return Err(ClientError::SessionExpired);
        }

        let tokens: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        let mut store = self.store.lock().unwrap();
        if store.generation() != generation {
            // Logged out while the refresh was in flight; do not
            // resurrect the session with the late result.
            return Err(ClientError::Unauthorized);
        }
        store.apply(SessionEvent::TokenRefreshed {
            token: tokens.access_token.clone(),
        });
        store.set_refresh_token(Some(tokens.refresh_token));
        Ok(tokens.access_token)
    }

    /// Handle a request that never produced a response.
    fn on_transport_failure(&self, e: reqwest::Error) -> ClientError {
        debug!("transport failure: {e}");
        let authenticated = { self.store.lock().unwrap().state().is_authenticated };
        if !authenticated {
            // Nothing to validate the session against and nothing
            // authenticated to protect: send the user to login.
            self.force_logout(LogoutReason::ServerUnreachable);
        }
        ClientError::ServerUnavailable
    }

    /// The single forced-logout path: clear state, clear durable storage,
    /// broadcast the redirect signal. No-op when nothing is stored.
    fn force_logout(&self, reason: LogoutReason) {
        let had_session = {
            let mut store = self.store.lock().unwrap();
            let state = store.state();
            let had = state.user.is_some()
                || state.token.is_some()
                || store.refresh_token().is_some();
            if had {
                store.clear();
            }
            had
        };
        if had_session {
            warn!(?reason, "session cleared, forcing logout");
            let _ = self.logout_tx.send(reason);
        }
    }

    async fn fetch_profile(&self) -> Result<AuthUser, ClientError> {
        let resp = self.execute(Method::GET, "/api/auth/profile", None).await?;
        resp.json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Map a non-2xx response to a `ClientError`.
    async fn error_from_response(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        if status.is_server_error() {
            return ClientError::ServerError(status.as_u16());
        }
        let message = resp
            .json::<ApiErrorBody>()
            .await
            .map(|b| b.message)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}
