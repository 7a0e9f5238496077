//! Integration tests for the roadmapper backend.
//!
//! - **api_tests**: end-to-end requests through the full router
//! - **db_tests**: schema and constraint behaviour
//! - **config_tests**: configuration loading and validation
//! - **error_tests**: error conversion and response envelopes
//!
//! Run a single module with `cargo test api_tests`.

pub mod config_tests;
pub mod db_tests;
pub mod error_tests;

use sqlx::sqlite::SqlitePoolOptions;

/// A fresh in-memory database with the schema applied.
///
/// A single connection that never expires, otherwise the in-memory database
/// would vanish with it.
pub(crate) async fn memory_pool() -> sqlx::SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crate::db::init_db(&pool).await.unwrap();
    pool
}
