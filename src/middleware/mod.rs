//! Middleware and request extractors.
//!
//! Cross-cutting request handling layered onto the router: body-size checks,
//! per-IP rate limiting, client IP detection and bearer-token authentication.

pub mod auth;
pub mod ip;
pub mod rate_limit;
pub mod validation;

pub use rate_limit::{EndpointRateLimiter, RateLimiter};
