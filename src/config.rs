//! Runtime configuration for the market table

use crate::constants::{COINGECKO_API_URL, EVENT_CHANNEL_CAPACITY, REFRESH_INTERVAL_SECS, USER_AGENT};
use crate::store::JsonFileStorage;
use std::path::PathBuf;
use std::time::Duration;

/// Overrides the upstream API base URL
pub const API_URL_ENV: &str = "MARKET_TABLE_API_URL";
/// Overrides the refresh interval, in seconds
pub const REFRESH_SECS_ENV: &str = "MARKET_TABLE_REFRESH_SECS";
/// Sets an explicit request timeout, in seconds
pub const TIMEOUT_SECS_ENV: &str = "MARKET_TABLE_TIMEOUT_SECS";
/// Overrides where the view state is persisted
pub const STATE_PATH_ENV: &str = "MARKET_TABLE_STATE_PATH";

#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    /// Base URL of the CoinGecko-compatible API
    pub api_base_url: String,
    /// Interval of the recurring refresh
    pub refresh_interval: Duration,
    /// Request timeout; `None` keeps the transport default
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
    /// File holding the persisted view state
    pub state_path: PathBuf,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            api_base_url: COINGECKO_API_URL.to_string(),
            refresh_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            request_timeout: None,
            user_agent: USER_AGENT.to_string(),
            state_path: JsonFileStorage::default_path(),
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl TableConfig {
    /// Defaults with overrides from the `MARKET_TABLE_*` environment variables
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(secs) = parse_secs(&lookup, REFRESH_SECS_ENV) {
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_secs(&lookup, TIMEOUT_SECS_ENV) {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(path) = lookup(STATE_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            config.state_path = PathBuf::from(path);
        }

        config
    }
}

/// Positive whole seconds from `key`
fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(secs),
        _ => {
            tracing::warn!(key, value = %raw, "Ignoring invalid configuration override");
            None
        }
    }
}
