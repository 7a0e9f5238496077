use std::path::Path;

use serde::Deserialize;

use crate::ranking::BayesianParams;

const DEFAULTS: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    pub prior_weight: f64,
    pub prior_strength: f64,
}

impl RankingConfig {
    pub fn params(&self) -> anyhow::Result<BayesianParams> {
        Ok(BayesianParams::new(self.prior_weight, self.prior_strength)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub max_body_bytes: usize,
    pub max_comment_chars: usize,
    pub max_title_chars: usize,
    pub max_name_chars: usize,
    /// Deepest allowed reply level, top-level comments are level 1.
    pub max_reply_depth: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub global_max_requests: usize,
    pub window_seconds: u64,
    pub login_per_minute: usize,
    pub register_per_minute: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub ranking: RankingConfig,
    pub limits: LimitsConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        match ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
        {
            Ok(app_cfg) => app_cfg,
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

/// Loads the configuration: embedded defaults -> roadmapper.toml -> $ROADMAPPER_CONFIG -> env.
pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();
    load_with(std::env::var("ROADMAPPER_CONFIG").ok().as_deref())
}

/// Same as [`load`] with an explicit extra config file instead of `$ROADMAPPER_CONFIG`.
pub fn load_with(custom_path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        // Optional local file: roadmapper.toml (in CWD)
        .add_source(::config::File::with_name("roadmapper").required(false));

    if let Some(path) = custom_path {
        builder = builder.add_source(::config::File::with_name(path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("ROADMAPPER").separator("__"));

    let app_cfg: AppConfig = builder.build()?.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    if cfg.database.max_connections == 0 {
        return Err(anyhow::anyhow!("database.max_connections must be > 0"));
    }

    // Auth
    if cfg.auth.token_ttl_minutes <= 0 {
        return Err(anyhow::anyhow!("auth.token_ttl_minutes must be > 0"));
    }
    if !(4..=31).contains(&cfg.auth.bcrypt_cost) {
        return Err(anyhow::anyhow!("auth.bcrypt_cost must be in 4..=31"));
    }

    // Ranking: the server-wide default must never divide by zero
    cfg.ranking.params().map_err(|e| anyhow::anyhow!("ranking: {}", e))?;
    if cfg.ranking.prior_strength <= 0.0 {
        return Err(anyhow::anyhow!("ranking.prior_strength must be > 0"));
    }

    // Limits
    let l = &cfg.limits;
    if l.max_body_bytes == 0
        || l.max_comment_chars == 0
        || l.max_title_chars == 0
        || l.max_name_chars == 0
        || l.max_reply_depth == 0
    {
        return Err(anyhow::anyhow!("limits.* must all be > 0"));
    }

    let r = &cfg.rate_limit;
    if r.global_max_requests == 0 || r.window_seconds == 0 {
        return Err(anyhow::anyhow!("rate_limit.global_max_requests and rate_limit.window_seconds must be > 0"));
    }
    if r.login_per_minute == 0 || r.register_per_minute == 0 {
        return Err(anyhow::anyhow!("rate_limit.login_per_minute and rate_limit.register_per_minute must be > 0"));
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        if path.is_empty() || path.starts_with(":memory:") {
            return Ok(());
        }
        let path = path.split('?').next().unwrap_or(path);
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
