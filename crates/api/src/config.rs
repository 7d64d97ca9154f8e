//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use domain::{PricingTable, Result as PricingResult};
use saga::CollectOptions;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `text` or `json` (default: `text`)
/// - `REPLY_IDLE_TIMEOUT_MS` — gap allowed between replies (default: `1000`)
/// - `REPLY_DEADLINE_MS` — bound on total reply collection (default: `5000`)
/// - `PRICING_TABLE_PATH` — JSON pricing table (default: built-in rates)
/// - `DATABASE_URL` — PostgreSQL quote store (default: in-memory)
/// - `STAFF_POOL_SIZE` — cleaners on the in-memory roster (default: `5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub reply_idle_timeout: Duration,
    pub reply_deadline: Duration,
    pub pricing_table_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub staff_pool_size: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            reply_idle_timeout: millis("REPLY_IDLE_TIMEOUT_MS", defaults.reply_idle_timeout),
            reply_deadline: millis("REPLY_DEADLINE_MS", defaults.reply_deadline),
            pricing_table_path: lookup("PRICING_TABLE_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            database_url: lookup("DATABASE_URL").filter(|u| !u.is_empty()),
            staff_pool_size: lookup("STAFF_POOL_SIZE")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.staff_pool_size),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the reply collection bounds for the booking coordinator.
    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            idle_timeout: self.reply_idle_timeout,
            deadline: self.reply_deadline,
        }
    }

    /// Loads the configured pricing table, or the built-in one.
    pub fn pricing_table(&self) -> PricingResult<PricingTable> {
        match &self.pricing_table_path {
            Some(path) => PricingTable::from_path(path),
            None => Ok(PricingTable::default()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            reply_idle_timeout: Duration::from_millis(1000),
            reply_deadline: Duration::from_millis(5000),
            pricing_table_path: None,
            database_url: None,
            staff_pool_size: 5,
        }
    }
}
