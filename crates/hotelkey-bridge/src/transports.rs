//! Enum wrapper for bridge transport dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn BridgeTransport>`
//! is not available. [`AnyBridge`] gives callers that choose the transport at
//! runtime (the CLI's `--simulate` flag) a single concrete type.
//!
//! # Examples
//!
//! ```
//! use hotelkey_bridge::{AnyBridge, MockBridge, ProcessBridge};
//!
//! let simulate = true;
//! let bridge = if simulate {
//!     AnyBridge::Mock(MockBridge::simulated_encoder())
//! } else {
//!     AnyBridge::Process(ProcessBridge::new("CardEncoderBridge.exe"))
//! };
//! assert!(bridge.is_simulated());
//! ```

use crate::{BridgeTransport, MockBridge, ProcessBridge, RawOutput, Result};
use hotelkey_protocol::Invocation;
use std::time::Duration;

/// Runtime-selected bridge transport.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyBridge {
    /// The real bridge executable.
    Process(ProcessBridge),

    /// Scripted replies, no hardware.
    Mock(MockBridge),
}

impl AnyBridge {
    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Mock(_))
    }
}

impl BridgeTransport for AnyBridge {
    async fn invoke(&self, invocation: &Invocation, timeout: Duration) -> Result<RawOutput> {
        match self {
            Self::Process(bridge) => bridge.invoke(invocation, timeout).await,
            Self::Mock(bridge) => bridge.invoke(invocation, timeout).await,
        }
    }
}

impl From<ProcessBridge> for AnyBridge {
    fn from(bridge: ProcessBridge) -> Self {
        Self::Process(bridge)
    }
}

impl From<MockBridge> for AnyBridge {
    fn from(bridge: MockBridge) -> Self {
        Self::Mock(bridge)
    }
}
