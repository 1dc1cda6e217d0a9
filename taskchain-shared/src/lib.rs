//! # TaskChain Shared Library
//!
//! This crate contains the domain types, persistence and workflow rules used
//! by the TaskChain API server and its maintenance binaries.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pooling and migrations
//! - `auth`: Password hashing, JWTs and one-time tokens
//! - `store`: Transactional entity store (PostgreSQL and in-memory)
//! - `workflow`: Task release engine, sequencing policy and workflow service

pub mod auth;
pub mod db;
pub mod models;
pub mod store;
pub mod workflow;

/// Current version of the TaskChain shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
