//! API Configuration Module
//!
//! Configuration is loaded from environment variables with sensible
//! defaults for development; only the ledger URL is required. The
//! ledger URL and notification credentials are consumed here but
//! owned by the deployment.

use std::time::Duration;

use crate::error::{ApiError, ApiResult};

/// Optional downstream notification endpoint + credentials.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// Override point for tests; the real API otherwise.
    pub api_base: String,
}

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the remote ledger service.
    pub ledger_url: String,

    /// Age beyond which a cached snapshot is served as STALE.
    pub cache_ttl: Duration,

    /// Bound on any single ledger fetch.
    pub fetch_timeout: Duration,

    /// Allowed CORS origins (comma-separated in the env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Telegram notification credentials; notifications are skipped
    /// entirely when unset.
    pub telegram: Option<TelegramConfig>,
}

impl AppConfig {
    /// Create AppConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VOUCHERD_LEDGER_URL`: Remote ledger base URL (required)
    /// - `VOUCHERD_CACHE_TTL_SECS`: Snapshot staleness bound (default: 120)
    /// - `VOUCHERD_FETCH_TIMEOUT_SECS`: Per-fetch bound (default: 15)
    /// - `VOUCHERD_CORS_ORIGINS`: Comma-separated origins (empty = allow all)
    /// - `VOUCHERD_TELEGRAM_BOT_TOKEN` / `VOUCHERD_TELEGRAM_CHAT_ID`:
    ///   notification credentials; both must be set to enable alerts
    pub fn from_env() -> ApiResult<Self> {
        let ledger_url = std::env::var("VOUCHERD_LEDGER_URL").map_err(|_| {
            ApiError::invalid_input("VOUCHERD_LEDGER_URL is not set; cannot reach the ledger")
        })?;

        let cache_ttl = Duration::from_secs(env_secs("VOUCHERD_CACHE_TTL_SECS", 120));
        let fetch_timeout = Duration::from_secs(env_secs("VOUCHERD_FETCH_TIMEOUT_SECS", 15));

        let cors_origins = std::env::var("VOUCHERD_CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        let telegram = match (
            std::env::var("VOUCHERD_TELEGRAM_BOT_TOKEN"),
            std::env::var("VOUCHERD_TELEGRAM_CHAT_ID"),
        ) {
            (Ok(bot_token), Ok(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                Some(TelegramConfig {
                    bot_token,
                    chat_id,
                    api_base: std::env::var("VOUCHERD_TELEGRAM_API_BASE")
                        .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
                })
            }
            _ => None,
        };

        Ok(Self {
            ledger_url,
            cache_ttl,
            fetch_timeout,
            cors_origins,
            telegram,
        })
    }

    /// A config pointing at the given ledger with all defaults.
    pub fn for_ledger(ledger_url: impl Into<String>) -> Self {
        Self {
            ledger_url: ledger_url.into(),
            cache_ttl: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(15),
            cors_origins: Vec::new(),
            telegram: None,
        }
    }
}

fn env_secs(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_values() {
        let config = AppConfig::for_ledger("https://ledger.example/exec");
        assert_eq!(config.cache_ttl, Duration::from_secs(120));
        assert_eq!(config.fetch_timeout, Duration::from_secs(15));
        assert!(config.cors_origins.is_empty());
        assert!(config.telegram.is_none());
    }

    #[test]
    fn test_parse_origins_trims_and_drops_empties() {
        let origins = parse_origins(" https://a.example , ,https://b.example,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);

        assert!(parse_origins("").is_empty());
    }
}
