use std::sync::Arc;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::middleware::{EndpointRateLimiter, RateLimiter};
use crate::ranking::BayesianParams;

/// The shared application state.
///
/// Cheap to clone; handed to every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: sqlx::SqlitePool,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Server-wide ranking constants, validated at startup.
    pub ranking: BayesianParams,
    pub metrics: Metrics,
    /// Per-IP limiter applied to every request.
    pub global_limiter: RateLimiter,
    /// Stricter limits for credential endpoints.
    pub rate_limiter: EndpointRateLimiter,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// Fails if the ranking section of `config` is not a valid parameter set.
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let ranking = config.ranking.params()?;
        let rl = &config.rate_limit;
        let global_limiter = RateLimiter::new(rl.global_max_requests, rl.window_seconds);
        let rate_limiter = EndpointRateLimiter::new().with_limits(vec![
            ("/login", rl.login_per_minute, 60),
            ("/register", rl.register_per_minute, 60),
        ]);

        Ok(Self {
            db,
            config: Arc::new(config),
            ranking,
            metrics: Metrics::new(),
            global_limiter,
            rate_limiter,
        })
    }
}
