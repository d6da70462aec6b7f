//! Console configuration.
//!
//! All settings have defaults matching the stock AlphaBase server; each can
//! be overridden through a builder method or an `ALPHABASE_*` environment
//! variable.

use std::time::Duration;

use crate::error::{ConsoleError, ConsoleResult};

/// Default backend root for REST and WebSocket endpoints.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Collection names probed on every discovery pass, whether or not the
/// server reports them.
pub const DEFAULT_SEED_COLLECTIONS: &[&str] = &[
    "sensors",
    "devices",
    "my_collection",
    "presses",
    "todos",
    "users",
    "products",
    "orders",
    "customers",
    "inventory",
    "tasks",
    "notes",
    "messages",
    "notifications",
    "settings",
    "logs",
    "events",
    "analytics",
    "files",
    "uploads",
    "esp32",
    "esp32_sensors",
    "esp32_data",
    "esp32_logs",
    "iot_devices",
    "iot_sensors",
    "microcontroller",
    "arduino",
    "sensor_data",
    "device_data",
    "telemetry",
    "iot_telemetry",
];

/// Reconnection policy for the real-time channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeConfig {
    /// Automatic reconnect attempts before giving up (default: 5)
    pub max_reconnect_attempts: u32,
    /// Flat delay before every reconnect attempt (default: 3s)
    pub reconnect_delay: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(3000),
        }
    }
}

impl RealtimeConfig {
    /// Set the reconnect budget.
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Set the delay between reconnect attempts.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Collection discovery settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// Names probed in addition to the server-reported list
    pub seed_collections: Vec<String>,
    /// Maximum probes in flight at once (default: 8)
    pub concurrency: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            seed_collections: DEFAULT_SEED_COLLECTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            concurrency: 8,
        }
    }
}

impl DiscoveryConfig {
    /// Replace the seed vocabulary.
    pub fn with_seed_collections<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed_collections = seeds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the probe concurrency. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Top-level configuration.
///
/// # Example
///
/// ```ignore
/// use alphabase_console::config::ConsoleConfig;
///
/// let config = ConsoleConfig::default()
///     .with_base_url("https://alphabase.example.com")
///     .with_request_timeout(Duration::from_secs(10));
/// assert_eq!(config.ws_url(), "wss://alphabase.example.com/ws");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Root for all REST and WebSocket endpoints
    pub base_url: String,
    /// Real-time channel settings
    pub realtime: RealtimeConfig,
    /// Discovery settings
    pub discovery: DiscoveryConfig,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            realtime: RealtimeConfig::default(),
            discovery: DiscoveryConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ConsoleConfig {
    /// Create a new ConsoleConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL. A trailing slash is dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the real-time settings.
    pub fn with_realtime(mut self, realtime: RealtimeConfig) -> Self {
        self.realtime = realtime;
        self
    }

    /// Set the discovery settings.
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// WebSocket endpoint derived from the base URL.
    ///
    /// `http` becomes `ws` and `https` becomes `wss`.
    pub fn ws_url(&self) -> String {
        let base_url = self.base_url.trim_end_matches('/');
        let base = if let Some(rest) = base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base_url.to_string()
        };
        format!("{}/ws", base)
    }

    /// Build a config from `ALPHABASE_*` environment variables.
    ///
    /// - `ALPHABASE_URL`
    /// - `ALPHABASE_MAX_RECONNECT_ATTEMPTS`
    /// - `ALPHABASE_RECONNECT_DELAY_MS`
    /// - `ALPHABASE_DISCOVERY_CONCURRENCY`
    /// - `ALPHABASE_SEED_COLLECTIONS` (comma separated, replaces the defaults)
    /// - `ALPHABASE_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> ConsoleResult<Self> {
        let mut config = Self::default();

        if let Some(url) = env_value("ALPHABASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(attempts) = env_number::<u32>("ALPHABASE_MAX_RECONNECT_ATTEMPTS")? {
            config.realtime.max_reconnect_attempts = attempts;
        }
        if let Some(ms) = env_number::<u64>("ALPHABASE_RECONNECT_DELAY_MS")? {
            config.realtime.reconnect_delay = Duration::from_millis(ms);
        }
        if let Some(concurrency) = env_number::<usize>("ALPHABASE_DISCOVERY_CONCURRENCY")? {
            config.discovery = config.discovery.with_concurrency(concurrency);
        }
        if let Some(seeds) = env_value("ALPHABASE_SEED_COLLECTIONS") {
            config.discovery = config.discovery.with_seed_collections(
                seeds
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty()),
            );
        }
        if let Some(secs) = env_number::<u64>("ALPHABASE_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_number<T>(key: &str) -> ConsoleResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_value(key) {
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| ConsoleError::Config {
            key: key.to_string(),
            message: format!("'{}': {}", raw, e),
        }),
        None => Ok(None),
    }
}
