//! # TeamBoard Shared Library
//!
//! Models, authentication primitives, and the Kanban core used by the
//! TeamBoard API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `auth`: Password hashing, JWTs, and team authorization checks
//! - `db`: Connection pool and migrations
//! - `kanban`: Ordering engine, move/history recorder, metrics, provisioning

pub mod auth;
pub mod db;
pub mod kanban;
pub mod models;

/// Current version of the TeamBoard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
