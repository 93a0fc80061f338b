//! Request handlers.

pub mod auth;
pub mod goals;
pub mod habits;
pub mod health;
pub mod investments;
pub mod tasks;
pub mod transactions;
pub mod users;
