//! Configuration for the watchdog
//!
//! Configuration is read from an optional YAML file and then overridden
//! per-field by environment variables:
//!
//! | Field | Env var | Default |
//! |---|---|---|
//! | `image_url` | `IMAGE_URL` | required |
//! | `check_interval` | `CHECK_INTERVAL` | `5m` |
//! | `storage_path` | `STORAGE_PATH` | `./data` |
//! | `telegram_bot_token` | `TELEGRAM_BOT_TOKEN` | required |
//! | `telegram_chat_id` | `TELEGRAM_CHAT_ID` | required, nonzero |
//! | `log_level` | `LOG_LEVEL` | `info` |
//!
//! Intervals accept `"30s"`, `"5m"`, `"2h"` or bare seconds (`"300"`).
//! Override values that fail to parse are ignored in favor of the previous
//! value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Immutable watchdog configuration
///
/// Owned by the [`Watchdog`](crate::Watchdog) for its entire run; never
/// mutated after load.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// URL of the image to monitor
    #[serde(default)]
    pub image_url: String,

    /// Interval between poll cycles
    #[serde(
        default = "default_check_interval",
        deserialize_with = "deserialize_interval"
    )]
    pub check_interval: Duration,

    /// Directory holding the persisted snapshot
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Telegram bot token used for notifications
    #[serde(default)]
    pub telegram_bot_token: String,

    /// Telegram chat the notifications go to
    #[serde(default)]
    pub telegram_chat_id: i64,

    /// Log level for the tracing subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            check_interval: default_check_interval(),
            storage_path: default_storage_path(),
            telegram_bot_token: String::new(),
            telegram_chat_id: 0,
            log_level: default_log_level(),
        }
    }
}

impl WatchConfig {
    /// Load configuration from an optional YAML file plus env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Apply environment-variable overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("IMAGE_URL")
            && !url.is_empty()
        {
            self.image_url = url;
        }
        if let Ok(interval) = std::env::var("CHECK_INTERVAL")
            && !interval.is_empty()
        {
            match parse_interval(&interval) {
                Ok(d) => self.check_interval = d,
                Err(e) => tracing::warn!("ignoring CHECK_INTERVAL override: {}", e),
            }
        }
        if let Ok(path) = std::env::var("STORAGE_PATH")
            && !path.is_empty()
        {
            self.storage_path = PathBuf::from(path);
        }
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN")
            && !token.is_empty()
        {
            self.telegram_bot_token = token;
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID")
            && !chat_id.is_empty()
        {
            match chat_id.parse::<i64>() {
                Ok(id) => self.telegram_chat_id = id,
                Err(e) => tracing::warn!("ignoring TELEGRAM_CHAT_ID override: {}", e),
            }
        }
        if let Ok(level) = std::env::var("LOG_LEVEL")
            && !level.is_empty()
        {
            self.log_level = level;
        }
    }

    /// Validate the configuration
    ///
    /// Fatal before the loop starts: the daemon exits non-zero on any of
    /// these rather than monitoring with a broken setup.
    pub fn validate(&self) -> Result<()> {
        if self.image_url.is_empty() {
            return Err(Error::config("image_url is required"));
        }
        if self.check_interval.is_zero() {
            return Err(Error::config("check_interval must be positive"));
        }
        if self.telegram_bot_token.is_empty() {
            return Err(Error::config("telegram_bot_token is required"));
        }
        if self.telegram_chat_id == 0 {
            return Err(Error::config("telegram_chat_id is required"));
        }
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(Error::config(format!(
                    "log_level '{}' is not valid (trace, debug, info, warn, error)",
                    other
                )));
            }
        }
        Ok(())
    }
}

/// Parse an interval like `"30s"`, `"5m"`, `"2h"` or bare seconds (`"300"`)
pub fn parse_interval(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::config("interval cannot be empty"));
    }

    let (value, multiplier) = match input.as_bytes()[input.len() - 1] {
        b's' => (&input[..input.len() - 1], 1),
        b'm' => (&input[..input.len() - 1], 60),
        b'h' => (&input[..input.len() - 1], 3600),
        _ => (input, 1),
    };

    let value: u64 = value
        .parse()
        .map_err(|_| Error::config(format!("invalid interval '{}'", input)))?;

    Ok(Duration::from_secs(value * multiplier))
}

fn deserialize_interval<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_interval(&raw).map_err(serde::de::Error::custom)
}

fn default_check_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}
