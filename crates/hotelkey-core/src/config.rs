//! Environment-sourced configuration.
//!
//! Every setting has a default except the cloud credentials. Values are read
//! from `HOTELKEY_*` environment variables, parsed, and validated as a whole:
//! [`EncoderConfig::validate`] reports every problem it finds, not just the
//! first one.
//!
//! # Example
//!
//! ```
//! use hotelkey_core::EncoderConfig;
//! use std::collections::HashMap;
//!
//! let env = HashMap::from([
//!     ("HOTELKEY_CLOUD_CLIENT_ID", "client"),
//!     ("HOTELKEY_CLOUD_CLIENT_SECRET", "secret"),
//!     ("HOTELKEY_ENCODER_PORT", "COM7"),
//! ]);
//!
//! let config = EncoderConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
//! assert_eq!(config.encoder.default_port, "COM7");
//! assert_eq!(config.encoder.retry_attempts, 3);
//! ```

use crate::{
    BeepPattern, Result,
    constants::*,
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const ENV_CLOUD_BASE_URL: &str = "HOTELKEY_CLOUD_BASE_URL";
pub const ENV_CLOUD_CLIENT_ID: &str = "HOTELKEY_CLOUD_CLIENT_ID";
pub const ENV_CLOUD_CLIENT_SECRET: &str = "HOTELKEY_CLOUD_CLIENT_SECRET";
pub const ENV_CLOUD_TIMEOUT_MS: &str = "HOTELKEY_CLOUD_TIMEOUT_MS";
pub const ENV_BRIDGE_PATH: &str = "HOTELKEY_BRIDGE_PATH";
pub const ENV_ENCODER_PORT: &str = "HOTELKEY_ENCODER_PORT";
pub const ENV_CONNECTION_TIMEOUT_MS: &str = "HOTELKEY_ENCODER_CONNECTION_TIMEOUT_MS";
pub const ENV_COMMAND_TIMEOUT_MS: &str = "HOTELKEY_ENCODER_COMMAND_TIMEOUT_MS";
pub const ENV_RETRY_ATTEMPTS: &str = "HOTELKEY_ENCODER_RETRY_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "HOTELKEY_ENCODER_RETRY_DELAY_MS";
pub const ENV_CARD_DEFAULT_EXPIRY_HOURS: &str = "HOTELKEY_CARD_DEFAULT_EXPIRY_HOURS";
pub const ENV_CARD_MAX_EXPIRY_DAYS: &str = "HOTELKEY_CARD_MAX_EXPIRY_DAYS";
pub const ENV_BEEP_DURATION_MS: &str = "HOTELKEY_BEEP_DURATION_MS";
pub const ENV_BEEP_INTERVAL_MS: &str = "HOTELKEY_BEEP_INTERVAL_MS";
pub const ENV_BEEP_COUNT: &str = "HOTELKEY_BEEP_COUNT";
pub const ENV_AUTO_DISCONNECT_ON_ERROR: &str = "HOTELKEY_AUTO_DISCONNECT_ON_ERROR";
pub const ENV_LOG_ERRORS: &str = "HOTELKEY_LOG_ERRORS";
pub const ENV_RETRY_ON_CONNECTION_ERROR: &str = "HOTELKEY_RETRY_ON_CONNECTION_ERROR";

/// Complete encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub cloud: CloudConfig,
    pub encoder: EncoderSettings,
    pub card: CardConfig,
    pub error_handling: ErrorHandlingConfig,
}

/// Cloud hotel-management API settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_ms: i64,
}

impl CloudConfig {
    /// Create cloud settings with the default base URL and timeout.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_CLOUD_BASE_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout_ms: DEFAULT_CLOUD_TIMEOUT_MS,
        }
    }

    pub fn timeout(&self) -> Duration {
        millis(self.timeout_ms)
    }
}

// The secret never reaches logs through `{:?}`.
impl std::fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Encoder hardware and bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Bridge executable.
    pub bridge_path: PathBuf,

    /// Port used when a command does not name one.
    pub default_port: String,

    /// Timeout for the `connect` invocation.
    pub connection_timeout_ms: i64,

    /// Timeout for every other bridge invocation.
    pub command_timeout_ms: i64,

    /// Connect retries after the first attempt.
    pub retry_attempts: i64,

    /// Delay between connect attempts.
    pub retry_delay_ms: i64,
}

impl EncoderSettings {
    pub fn connection_timeout(&self) -> Duration {
        millis(self.connection_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        millis(self.command_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        millis(self.retry_delay_ms)
    }

    /// Retry count as an unsigned value; negative counts are rejected by
    /// validation and read as zero here.
    pub fn retries(&self) -> u32 {
        u32::try_from(self.retry_attempts).unwrap_or(0)
    }
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            bridge_path: PathBuf::from(DEFAULT_BRIDGE_PATH),
            default_port: DEFAULT_ENCODER_PORT.to_string(),
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// Card validity bounds and buzzer defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardConfig {
    pub default_expiry_hours: i64,
    pub max_expiry_days: i64,
    pub beep: BeepPattern,
}

impl CardConfig {
    /// Compute the card timestamp for a card valid `hours` from `now`.
    ///
    /// # Errors
    /// Returns `Error::InvalidExpiry` if `hours` is not positive, exceeds
    /// `max_expiry_days`, or the result does not fit the encoder's 32-bit
    /// timestamp.
    ///
    /// # Examples
    ///
    /// ```
    /// use hotelkey_core::CardConfig;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let card = CardConfig::default();
    /// let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    /// assert_eq!(card.expiry_timestamp(now, 24).unwrap(), 1_700_086_400);
    /// assert!(card.expiry_timestamp(now, 24 * 31).is_err());
    /// ```
    pub fn expiry_timestamp(&self, now: DateTime<Utc>, hours: i64) -> Result<u32> {
        if hours <= 0 {
            return Err(Error::InvalidExpiry(format!(
                "expiry must be at least one hour, got {hours}"
            )));
        }
        let max_hours = self.max_expiry_days.saturating_mul(24);
        if hours > max_hours {
            return Err(Error::InvalidExpiry(format!(
                "expiry of {hours}h exceeds the maximum of {} days",
                self.max_expiry_days
            )));
        }

        let expires = now.timestamp().saturating_add(hours.saturating_mul(3600));
        u32::try_from(expires).map_err(|_| {
            Error::InvalidExpiry(format!("timestamp {expires} does not fit in 32 bits"))
        })
    }

    /// Card timestamp for the default validity.
    ///
    /// # Errors
    /// See [`CardConfig::expiry_timestamp`].
    pub fn default_expiry_timestamp(&self, now: DateTime<Utc>) -> Result<u32> {
        self.expiry_timestamp(now, self.default_expiry_hours)
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            default_expiry_hours: DEFAULT_CARD_EXPIRY_HOURS,
            max_expiry_days: DEFAULT_MAX_EXPIRY_DAYS,
            beep: BeepPattern::default(),
        }
    }
}

/// Failure-handling toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    /// Release the device after a failed single command.
    pub auto_disconnect_on_error: bool,

    /// Log workflow failures at `error` level instead of `debug`.
    pub log_errors: bool,

    /// Retry `connect` on transport failures.
    pub retry_on_connection_error: bool,
}

impl Default for ErrorHandlingConfig {
    fn default() -> Self {
        Self {
            auto_disconnect_on_error: true,
            log_errors: true,
            retry_on_connection_error: true,
        }
    }
}

impl EncoderConfig {
    /// Defaults with the given cloud credentials.
    pub fn new(cloud: CloudConfig) -> Self {
        Self {
            cloud,
            encoder: EncoderSettings::default(),
            card: CardConfig::default(),
            error_handling: ErrorHandlingConfig::default(),
        }
    }

    /// Load and validate configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Error::Config` for unparseable values and
    /// `Error::InvalidConfig` listing every validation failure.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load and validate configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// See [`EncoderConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let cloud = CloudConfig {
            base_url: text(ENV_CLOUD_BASE_URL, DEFAULT_CLOUD_BASE_URL),
            client_id: text(ENV_CLOUD_CLIENT_ID, ""),
            client_secret: text(ENV_CLOUD_CLIENT_SECRET, ""),
            timeout_ms: parse_or(&lookup, ENV_CLOUD_TIMEOUT_MS, DEFAULT_CLOUD_TIMEOUT_MS)?,
        };

        let encoder = EncoderSettings {
            bridge_path: PathBuf::from(text(ENV_BRIDGE_PATH, DEFAULT_BRIDGE_PATH)),
            default_port: text(ENV_ENCODER_PORT, DEFAULT_ENCODER_PORT),
            connection_timeout_ms: parse_or(
                &lookup,
                ENV_CONNECTION_TIMEOUT_MS,
                DEFAULT_CONNECTION_TIMEOUT_MS,
            )?,
            command_timeout_ms: parse_or(&lookup, ENV_COMMAND_TIMEOUT_MS, DEFAULT_COMMAND_TIMEOUT_MS)?,
            retry_attempts: parse_or(&lookup, ENV_RETRY_ATTEMPTS, DEFAULT_RETRY_ATTEMPTS)?,
            retry_delay_ms: parse_or(&lookup, ENV_RETRY_DELAY_MS, DEFAULT_RETRY_DELAY_MS)?,
        };

        let card = CardConfig {
            default_expiry_hours: parse_or(
                &lookup,
                ENV_CARD_DEFAULT_EXPIRY_HOURS,
                DEFAULT_CARD_EXPIRY_HOURS,
            )?,
            max_expiry_days: parse_or(&lookup, ENV_CARD_MAX_EXPIRY_DAYS, DEFAULT_MAX_EXPIRY_DAYS)?,
            beep: BeepPattern {
                duration_ms: parse_or(&lookup, ENV_BEEP_DURATION_MS, DEFAULT_BEEP_DURATION_MS)?,
                interval_ms: parse_or(&lookup, ENV_BEEP_INTERVAL_MS, DEFAULT_BEEP_INTERVAL_MS)?,
                count: parse_or(&lookup, ENV_BEEP_COUNT, DEFAULT_BEEP_COUNT)?,
            },
        };

        let defaults = ErrorHandlingConfig::default();
        let error_handling = ErrorHandlingConfig {
            auto_disconnect_on_error: parse_flag(
                &lookup,
                ENV_AUTO_DISCONNECT_ON_ERROR,
                defaults.auto_disconnect_on_error,
            )?,
            log_errors: parse_flag(&lookup, ENV_LOG_ERRORS, defaults.log_errors)?,
            retry_on_connection_error: parse_flag(
                &lookup,
                ENV_RETRY_ON_CONNECTION_ERROR,
                defaults.retry_on_connection_error,
            )?,
        };

        let config = Self {
            cloud,
            encoder,
            card,
            error_handling,
        };
        config.validate()?;

        debug!(
            base_url = %config.cloud.base_url,
            port = %config.encoder.default_port,
            bridge = %config.encoder.bridge_path.display(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Check every constraint and report all violations together.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` with one message per violation.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.cloud.client_id.trim().is_empty() {
            problems.push("cloud client id is required".to_string());
        }
        if self.cloud.client_secret.trim().is_empty() {
            problems.push("cloud client secret is required".to_string());
        }
        if self.cloud.base_url.trim().is_empty() {
            problems.push("cloud base URL is required".to_string());
        }
        if self.cloud.timeout_ms <= 0 {
            problems.push("cloud timeout must be greater than 0".to_string());
        }

        if self.encoder.default_port.trim().is_empty() {
            problems.push("default encoder port is required".to_string());
        }
        if self.encoder.connection_timeout_ms <= 0 {
            problems.push("connection timeout must be greater than 0".to_string());
        }
        if self.encoder.command_timeout_ms <= 0 {
            problems.push("command timeout must be greater than 0".to_string());
        }
        if self.encoder.retry_attempts < 0 {
            problems.push("retry attempts must be non-negative".to_string());
        }
        if self.encoder.retry_delay_ms < 0 {
            problems.push("retry delay must be non-negative".to_string());
        }

        if self.card.default_expiry_hours <= 0 {
            problems.push("default expiry hours must be greater than 0".to_string());
        }
        if self.card.max_expiry_days <= 0 {
            problems.push("max expiry days must be greater than 0".to_string());
        }
        if self.card.default_expiry_hours > 0
            && self.card.max_expiry_days > 0
            && self.card.default_expiry_hours > self.card.max_expiry_days.saturating_mul(24)
        {
            problems.push("default expiry exceeds the maximum expiry".to_string());
        }
        let beep = self.card.beep;
        if let Err(e) = BeepPattern::new(beep.duration_ms, beep.interval_ms, beep.count) {
            problems.push(e.to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(problems))
        }
    }
}

fn millis(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key}: invalid number '{raw}'"))),
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{key}: invalid boolean '{raw}'"))),
    }
}
