//! # routine_client
//!
//! Typed HTTP client for the Routine API.
//!
//! Three layers, separated so each is testable on its own:
//! - [`session`] — the pure session state machine (no I/O),
//! - [`store`] — the durable on-disk session store,
//! - [`client`] — the HTTP client that injects the bearer token per
//!   request and transparently refreshes it once on 401.

pub mod client;
pub mod error;
pub mod session;
pub mod store;

pub use client::{ApiClient, LogoutReason};
pub use error::ClientError;
pub use session::{AuthUser, SessionEvent, SessionState};
pub use store::SessionStore;
