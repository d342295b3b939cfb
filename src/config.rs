use std::env;
use std::time::Duration;

use anyhow::{ensure, Context, Result};

use crate::feed::DEFAULT_FEED_CAPACITY;

/// How long mutation signals are coalesced before one durable write.
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;

/// Interval of the best-effort keepalive ping sent to the host.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 20;

/// Interval between rescan broadcasts when auto-refresh is enabled.
pub const DEFAULT_AUTO_REFRESH_SECS: u64 = 60;

/// Central configuration loaded from environment variables.
///
/// Everything has a default — the engine runs with no .env at all.
/// The .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    pub db_path: String,
    /// Maximum number of posts retained in the feed.
    pub feed_capacity: usize,
    /// Debounce window for coalescing durable writes.
    pub debounce: Duration,
    /// Period of the no-op keepalive ping. Best-effort suspension
    /// mitigation only; correctness never depends on it firing.
    pub keepalive_interval: Duration,
    /// Period of the automatic rescan broadcast (gated by the
    /// auto_refresh setting at runtime).
    pub auto_refresh_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let feed_capacity = match env::var("TRIBUTARY_FEED_CAPACITY") {
            Ok(raw) => parse_capacity(&raw)?,
            Err(_) => DEFAULT_FEED_CAPACITY,
        };

        let debounce_ms = match env::var("TRIBUTARY_DEBOUNCE_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("TRIBUTARY_DEBOUNCE_MS must be an integer (milliseconds)")?,
            Err(_) => DEFAULT_DEBOUNCE_MS,
        };

        Ok(Self {
            db_path: env::var("TRIBUTARY_DB_PATH").unwrap_or_else(|_| "./tributary.db".to_string()),
            feed_capacity,
            debounce: Duration::from_millis(debounce_ms),
            keepalive_interval: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
            auto_refresh_interval: Duration::from_secs(DEFAULT_AUTO_REFRESH_SECS),
        })
    }
}

/// Parse the feed capacity override. A capacity of 0 would make every
/// upsert immediately evict its own post (while still announcing it),
/// so it is rejected rather than accepted as a degenerate no-op feed.
fn parse_capacity(raw: &str) -> Result<usize> {
    let capacity: usize = raw
        .parse()
        .context("TRIBUTARY_FEED_CAPACITY must be a positive integer")?;
    ensure!(capacity > 0, "TRIBUTARY_FEED_CAPACITY must be at least 1");
    Ok(capacity)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./tributary.db".to_string(),
            feed_capacity: DEFAULT_FEED_CAPACITY,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            keepalive_interval: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
            auto_refresh_interval: Duration::from_secs(DEFAULT_AUTO_REFRESH_SECS),
        }
    }
}
