//! Transport trait for bridge invocations.
//!
//! Uses native `async fn` in traits (Rust 1.90 + Edition 2024), so the trait
//! is not object-safe; see [`crate::AnyBridge`] for dispatch.

#![allow(async_fn_in_trait)]

use crate::Result;
use hotelkey_protocol::Invocation;
use std::time::Duration;

/// Output captured from one successful bridge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
}

impl RawOutput {
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Runs one bridge invocation.
///
/// # Example
///
/// ```no_run
/// use hotelkey_bridge::{BridgeTransport, Result};
/// use hotelkey_protocol::{BridgeCommand, CommandKind, decode_value};
/// use std::time::Duration;
///
/// async fn card_number<T: BridgeTransport>(bridge: &T) -> Result<Option<String>> {
///     let output = bridge
///         .invoke(&BridgeCommand::GetCardNo.encode(), Duration::from_secs(30))
///         .await?;
///     Ok(decode_value(CommandKind::GetCardNo, &output.stdout).ok())
/// }
/// ```
pub trait BridgeTransport: Send + Sync {
    /// Run `invocation` as a single bridge process.
    ///
    /// Exactly one process is started per call. Stdout and stderr are
    /// captured independently.
    ///
    /// # Errors
    ///
    /// - `SpawnFailure` if the process cannot be started
    /// - `TransportFailure` on a nonzero exit or signal termination
    /// - `Timeout` if the process runs longer than `timeout`; the process is
    ///   killed and reaped before this returns
    async fn invoke(&self, invocation: &Invocation, timeout: Duration) -> Result<RawOutput>;
}
