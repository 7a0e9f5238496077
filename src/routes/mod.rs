//! HTTP route handlers for the roadmapper API.
//!
//! - `health`: liveness, readiness, metrics and build information
//! - `users`: registration, login and sessions
//! - `catalog`: categories and topics
//! - `roadmaps`: roadmaps, steps and roadmap votes
//! - `comments`: threaded topic discussions
//! - `rank`: stateless Bayesian ranking
//! - `votes`: vote storage shared by roadmaps and comments

pub mod catalog;
pub mod comments;
pub mod health;
pub mod rank;
pub mod roadmaps;
pub mod users;
pub mod votes;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{rate_limit::rate_limit_middleware, validation::validate_request_middleware};
use crate::state::AppState;

/// Assembles the full API with its middleware stack.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.limits.max_body_bytes;

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/version", get(health::version))
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/me", get(users::me))
        .route("/categories", get(catalog::list_categories).post(catalog::create_category))
        .route("/categories/{id}/topics", get(catalog::list_category_topics))
        .route("/topics", get(catalog::list_topics).post(catalog::create_topic))
        .route("/topics/{id}", get(catalog::get_topic))
        .route("/topics/{id}/comments", get(comments::topic_comments))
        .route("/roadmaps", get(roadmaps::list_roadmaps).post(roadmaps::create_roadmap))
        .route("/roadmaps/{id}", get(roadmaps::get_roadmap).delete(roadmaps::delete_roadmap))
        .route("/roadmaps/{id}/steps", get(roadmaps::list_steps).post(roadmaps::create_step))
        .route("/roadmaps/{id}/vote", put(roadmaps::vote_roadmap))
        .route("/rank", post(rank::rank_items))
        .route("/comments", post(comments::create_comment))
        .route("/comments/{id}", patch(comments::update_comment).delete(comments::delete_comment))
        .route("/comments/{id}/vote", put(comments::vote_comment))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn_with_state(state.clone(), validate_request_middleware))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
