//! # routine_core
//!
//! Core domain logic for Routine.

pub mod auth;
pub mod db;
pub mod goals;
pub mod habits;
pub mod health;
pub mod investments;
pub mod migrate;
pub mod models;
pub mod tasks;
pub mod transactions;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
