//! Connect retry policy.
//!
//! Only transport-classified failures ([`SessionError::is_transport`]) are
//! retried, with a fixed delay between attempts. Device codes, malformed
//! output and spawn failures end the operation at once.

use crate::{Result, SessionError};
use hotelkey_core::{EncoderSettings, ErrorHandlingConfig};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// How many times, and how far apart, a failed connect is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,

    /// Pause before each retry.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A single attempt, never repeated.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Policy from encoder settings; disabled when the error-handling
    /// config turns connection retries off.
    pub fn from_config(encoder: &EncoderSettings, handling: &ErrorHandlingConfig) -> Self {
        if handling.retry_on_connection_error {
            Self::new(encoder.retries(), encoder.retry_delay())
        } else {
            Self::disabled()
        }
    }

    /// Whether a failure after `retries` retries should be tried again.
    pub fn should_retry(&self, retries: u32, error: &SessionError) -> bool {
        retries < self.max_retries && error.is_transport()
    }

    /// Run `op` until it succeeds or the policy gives up.
    ///
    /// # Errors
    /// Returns the last error produced by `op`.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;
        loop {
            match op().await {
                Ok(value) => {
                    if retries > 0 {
                        info!(operation, retries, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if self.should_retry(retries, &e) => {
                    retries += 1;
                    warn!(
                        operation,
                        attempt = retries,
                        max_retries = self.max_retries,
                        delay_ms = self.delay.as_millis(),
                        error = %e,
                        "Retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&EncoderSettings::default(), &ErrorHandlingConfig::default())
    }
}
