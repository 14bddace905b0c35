//! Configuration management for the store.

use std::{env, path::PathBuf, time::Duration};

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Pool size
    pub max_connections: u32,
    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
    /// Root directory that cover buckets live under
    pub cover_dir: PathBuf,
    /// Public base URL that serves `cover_dir`
    pub cover_public_url: String,
    /// Bucket (subdirectory) for cover images
    pub cover_bucket: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        let timeout_secs = parse_or(&lookup, "DATABASE_TIMEOUT_SECS", 10)?;

        let cover_dir = lookup("COVER_DIR").unwrap_or_else(|| "./covers".to_string());
        let cover_public_url = lookup("COVER_PUBLIC_URL")
            .unwrap_or_else(|| "http://localhost:8080/storage".to_string())
            .trim_end_matches('/')
            .to_string();
        let cover_bucket = lookup("COVER_BUCKET")
            .unwrap_or_else(|| shelf_engine::DEFAULT_COVER_BUCKET.to_string());
        if cover_bucket.is_empty() || cover_bucket.contains(['/', '\\']) || cover_bucket == ".." {
            return Err(ConfigError::Invalid {
                key: "COVER_BUCKET",
                value: cover_bucket,
            });
        }

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(timeout_secs),
            cover_dir: PathBuf::from(cover_dir),
            cover_public_url,
            cover_bucket,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("Invalid {key} value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/shelf")])).unwrap();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.acquire_timeout, Duration::from_secs(10));
        assert_eq!(config.cover_dir, PathBuf::from("./covers"));
        assert_eq!(config.cover_public_url, "http://localhost:8080/storage");
        assert_eq!(config.cover_bucket, "book");
    }

    #[test]
    fn database_url_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabaseUrl));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/shelf"),
            ("DATABASE_MAX_CONNECTIONS", " 12 "),
            ("DATABASE_TIMEOUT_SECS", "3"),
            ("COVER_DIR", "/srv/covers"),
            ("COVER_PUBLIC_URL", "https://cdn.example/storage/"),
            ("COVER_BUCKET", "covers"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.cover_public_url, "https://cdn.example/storage");
        assert_eq!(config.cover_bucket, "covers");
    }

    #[test]
    fn bad_numbers_are_errors() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/shelf"),
            ("DATABASE_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid DATABASE_TIMEOUT_SECS value: \"soon\"");

        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/shelf"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DATABASE_MAX_CONNECTIONS", .. }));
    }

    #[test]
    fn bucket_must_be_a_single_segment() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/shelf"),
            ("COVER_BUCKET", "a/b"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "COVER_BUCKET", .. }));
    }
}
