#[cfg(test)]
mod tests {
    use crate::config::{self, AppConfig};
    use std::fs;
    use tempfile::NamedTempFile;

    fn write_temp_config(content: &str) -> NamedTempFile {
        let temp_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        fs::write(temp_file.path(), content).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "sqlite://data/roadmapper.db");
        assert_eq!(config.database.max_connections, 16);
        assert_eq!(config.auth.token_ttl_minutes, 30);
        assert_eq!(config.ranking.prior_weight, 0.5);
        assert_eq!(config.ranking.prior_strength, 50.0);
        assert_eq!(config.limits.max_comment_chars, 10_000);
        assert_eq!(config.limits.max_reply_depth, 100);
        assert!(config::validate(&config).is_ok());
    }

    #[test]
    fn test_custom_file_overrides_defaults() {
        let file = write_temp_config(
            r#"
[server]
port = 3000

[ranking]
prior_weight = 0.7
prior_strength = 10.0
"#,
        );

        let config = config::load_with(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "127.0.0.1");
        let params = config.ranking.params().unwrap();
        assert_eq!(params.prior_weight(), 0.7);
        assert_eq!(params.prior_strength(), 10.0);
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let file = write_temp_config("[server]\nport = 0\n");
        let err = config::load_with(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("invalid server.port"));
    }

    #[test]
    fn test_missing_custom_file_is_ignored() {
        let config = config::load_with(Some("/nonexistent/roadmapper-custom")).unwrap();
        assert_eq!(config.server.port, AppConfig::default().server.port);
    }

    #[test]
    fn test_validate_rejections() {
        let cases: [(&str, fn(&mut AppConfig)); 11] = [
            ("port", |c| c.server.port = 0),
            ("max_connections", |c| c.database.max_connections = 0),
            ("ttl", |c| c.auth.token_ttl_minutes = 0),
            ("bcrypt", |c| c.auth.bcrypt_cost = 3),
            ("prior weight", |c| c.ranking.prior_weight = 1.2),
            ("prior strength", |c| c.ranking.prior_strength = 0.0),
            ("negative prior strength", |c| c.ranking.prior_strength = -3.0),
            ("body", |c| c.limits.max_body_bytes = 0),
            ("reply depth", |c| c.limits.max_reply_depth = 0),
            ("rate window", |c| c.rate_limit.window_seconds = 0),
            ("login limit", |c| c.rate_limit.login_per_minute = 0),
        ];

        for (name, mutate) in cases {
            let mut config = AppConfig::default();
            mutate(&mut config);
            assert!(config::validate(&config).is_err(), "{} should be rejected", name);
        }
    }

    #[test]
    fn test_ensure_sqlite_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("app.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());

        config::ensure_sqlite_parent_dir(&url).unwrap();
        assert!(dir.path().join("nested").is_dir());

        assert!(config::ensure_sqlite_parent_dir("sqlite::memory:").is_ok());
        assert!(config::ensure_sqlite_parent_dir("sqlite://:memory:").is_ok());
    }
}
