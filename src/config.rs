//! Runtime configuration
//!
//! Read once from the environment (after `dotenvy` has loaded `.env`).
//! Invalid values are logged and replaced by their defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::scrapers::ScraperConfig;

const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_BIND_ADDR: &str = "BIND_ADDR";
const ENV_CORS_ORIGINS: &str = "CORS_ORIGINS";
const ENV_REFRESH_ENABLED: &str = "PROPERTY_REFRESH_ENABLED";
const ENV_REFRESH_INTERVAL: &str = "PROPERTY_REFRESH_INTERVAL_SECS";
const ENV_REFRESH_DELAY: &str = "PROPERTY_REFRESH_DELAY_MS";
const ENV_SCRAPER_TIMEOUT: &str = "SCRAPER_TIMEOUT_SECS";
const ENV_SCRAPER_RETRY_MAX: &str = "SCRAPER_RETRY_MAX";
const ENV_SCRAPER_RETRY_DELAY: &str = "SCRAPER_RETRY_DELAY_MS";
const ENV_SCRAPER_REQUEST_DELAY: &str = "SCRAPER_REQUEST_DELAY_MS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
/// Once a day
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 86_400;
const DEFAULT_REFRESH_DELAY_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshConfig {
    pub enabled: bool,
    pub interval: Duration,
    /// Pause between two properties within one pass
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// None selects the in-memory store
    pub database_url: Option<String>,
    pub bind_addr: String,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
    pub refresh: RefreshConfig,
    pub scraper: ScraperConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &str, default: u64| parse_or_default(key, text(key), default);

        let scraper_defaults = ScraperConfig::default();

        let cors_origins = text(ENV_CORS_ORIGINS)
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty() && origin != "*")
                    .collect()
            })
            .unwrap_or_default();

        let enabled = match text(ENV_REFRESH_ENABLED) {
            None => true,
            Some(raw) => match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    warn!("Invalid {}='{}', using default true", ENV_REFRESH_ENABLED, raw);
                    true
                }
            },
        };

        Self {
            database_url: text(ENV_DATABASE_URL),
            bind_addr: text(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            cors_origins,
            refresh: RefreshConfig {
                enabled,
                interval: Duration::from_secs(
                    number(ENV_REFRESH_INTERVAL, DEFAULT_REFRESH_INTERVAL_SECS).max(1),
                ),
                delay: Duration::from_millis(number(ENV_REFRESH_DELAY, DEFAULT_REFRESH_DELAY_MS)),
            },
            scraper: ScraperConfig {
                timeout_secs: number(ENV_SCRAPER_TIMEOUT, scraper_defaults.timeout_secs).max(1),
                retry_max: number(ENV_SCRAPER_RETRY_MAX, scraper_defaults.retry_max as u64)
                    .clamp(1, u32::MAX as u64) as u32,
                retry_delay_ms: number(ENV_SCRAPER_RETRY_DELAY, scraper_defaults.retry_delay_ms),
                request_delay_ms: number(
                    ENV_SCRAPER_REQUEST_DELAY,
                    scraper_defaults.request_delay_ms,
                ),
            },
        }
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid {}='{}', using default {}", key, raw, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.database_url, None);
        assert_eq!(config.bind_addr, "0.0.0.0:8001");
        assert!(config.cors_origins.is_empty());
        assert_eq!(
            config.refresh,
            RefreshConfig {
                enabled: true,
                interval: Duration::from_secs(86_400),
                delay: Duration::from_millis(2_000),
            }
        );
        assert_eq!(config.scraper.timeout_secs, 30);
        assert_eq!(config.scraper.retry_max, 3);
        assert_eq!(config.scraper.retry_delay_ms, 1000);
        assert_eq!(config.scraper.request_delay_ms, 1000);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://tracker@localhost/tracker"),
            ("CORS_ORIGINS", "http://localhost:3000, https://app.example.com"),
            ("PROPERTY_REFRESH_ENABLED", "false"),
            ("PROPERTY_REFRESH_INTERVAL_SECS", "3600"),
            ("SCRAPER_RETRY_MAX", "5"),
        ]);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://tracker@localhost/tracker")
        );
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
        assert!(!config.refresh.enabled);
        assert_eq!(config.refresh.interval, Duration::from_secs(3600));
        assert_eq!(config.scraper.retry_max, 5);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config(&[
            ("DATABASE_URL", "   "),
            ("PROPERTY_REFRESH_DELAY_MS", "soon"),
            ("SCRAPER_TIMEOUT_SECS", "-4"),
            ("PROPERTY_REFRESH_ENABLED", "maybe"),
            ("CORS_ORIGINS", "*"),
        ]);
        assert_eq!(config.database_url, None);
        assert_eq!(config.refresh.delay, Duration::from_millis(2_000));
        assert_eq!(config.scraper.timeout_secs, 30);
        assert!(config.refresh.enabled);
        assert!(config.cors_origins.is_empty());
    }
}
