use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_BACKUP_DIR: &str = "/workspace/projects/backups";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HTTP_MAX_RETRIES: u32 = 0;
const DEFAULT_TRADES_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JOURNAL_API_URL {value:?}: {source}")]
    InvalidApiUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid {key} value {value:?} (expected a non-negative integer)")]
    InvalidNumber { key: &'static str, value: String },
    #[error("TRADES_PAGE_SIZE must be greater than zero")]
    ZeroPageSize,
    #[error("missing DATABASE_URL")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub backup_dir: PathBuf,
    pub database_url: Option<String>,
    pub http_timeout: Duration,
    pub http_max_retries: u32,
    pub trades_page_size: usize,
}

impl Config {
    /// Loads `.env` (if present) and reads configuration from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("JOURNAL_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_base_url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidApiUrl {
            value: raw_url.clone(),
            source,
        })?;

        let backup_dir = lookup("BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR));

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let http_timeout_secs = parse_or("HTTP_TIMEOUT_SECS", &lookup, DEFAULT_HTTP_TIMEOUT_SECS)?;
        let http_max_retries = parse_or("HTTP_MAX_RETRIES", &lookup, DEFAULT_HTTP_MAX_RETRIES)?;
        let trades_page_size = parse_or("TRADES_PAGE_SIZE", &lookup, DEFAULT_TRADES_PAGE_SIZE)?;
        if trades_page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }

        Ok(Config {
            api_base_url,
            backup_dir,
            database_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
            http_max_retries,
            trades_page_size,
        })
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or(ConfigError::MissingDatabaseUrl)
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.api_base_url.as_str(), "http://localhost:5000/");
        assert_eq!(cfg.backup_dir, PathBuf::from("/workspace/projects/backups"));
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert_eq!(cfg.http_max_retries, 0);
        assert_eq!(cfg.trades_page_size, 100);
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config_from(&[
            ("JOURNAL_API_URL", "http://journal.internal:8080"),
            ("BACKUP_DIR", "/tmp/backups"),
            ("DATABASE_URL", "postgres://localhost/journal"),
            ("HTTP_TIMEOUT_SECS", "3"),
            ("HTTP_MAX_RETRIES", "2"),
            ("TRADES_PAGE_SIZE", "25"),
        ])
        .unwrap();
        assert_eq!(cfg.api_base_url.host_str(), Some("journal.internal"));
        assert_eq!(cfg.backup_dir, PathBuf::from("/tmp/backups"));
        assert_eq!(cfg.require_database_url().unwrap(), "postgres://localhost/journal");
        assert_eq!(cfg.http_timeout, Duration::from_secs(3));
        assert_eq!(cfg.http_max_retries, 2);
        assert_eq!(cfg.trades_page_size, 25);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            config_from(&[("JOURNAL_API_URL", "not a url")]),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            config_from(&[("HTTP_TIMEOUT_SECS", "ten")]),
            Err(ConfigError::InvalidNumber { key: "HTTP_TIMEOUT_SECS", .. })
        ));
        assert!(matches!(
            config_from(&[("TRADES_PAGE_SIZE", "0")]),
            Err(ConfigError::ZeroPageSize)
        ));
    }

    #[test]
    fn blank_database_url_counts_as_missing() {
        let cfg = config_from(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(matches!(cfg.require_database_url(), Err(ConfigError::MissingDatabaseUrl)));
    }
}
