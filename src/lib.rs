//! # Roadmapper Backend Library
//!
//! Core library for roadmapper, a community site where learners publish
//! step-by-step roadmaps for a topic, vote on them and discuss them in
//! threaded comments.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server and routing
//! - **SQLx**: asynchronous SQLite access
//! - **Tokio**: async runtime
//! - **Serde**: JSON (de)serialization
//!
//! ## Core Components
//!
//! - [`ranking`]: Bayesian scoring and ordering of voted items
//! - [`thread`]: assembly of flat comments into reply trees
//! - [`auth`]: password hashing and bearer sessions
//! - [`config`]: layered configuration
//! - [`db`]: schema initialization
//! - [`error`]: error type and JSON error responses
//! - [`metrics`]: request counters
//! - [`middleware`]: rate limiting, body limits, extractors
//! - [`routes`]: HTTP handlers and the router
//! - [`state`]: shared application state
//! - [`types`]: request and response types

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod ranking;
pub mod routes;
pub mod state;
pub mod thread;
pub mod types;

#[cfg(test)]
mod tests;
