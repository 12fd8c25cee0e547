//! Bridge transport for the card encoder.
//!
//! The encoder is driven through an external bridge executable that takes one
//! command per process and prints its answer on stdout. This crate runs that
//! executable and hands back the captured output; it does not interpret it
//! (see `hotelkey-protocol` for decoding).
//!
//! # Transports
//!
//! - [`ProcessBridge`] spawns the real executable through `tokio::process`.
//! - [`MockBridge`] answers from a script and records every invocation. It
//!   backs the test suites and the CLI's simulation mode.
//! - [`AnyBridge`] dispatches to either, since native `async fn` in traits is
//!   not object-safe.
//!
//! # Example
//!
//! ```
//! use hotelkey_bridge::{BridgeTransport, MockBridge};
//! use hotelkey_protocol::BridgeCommand;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> hotelkey_bridge::Result<()> {
//!     let bridge = MockBridge::new();
//!     let invocation = BridgeCommand::Connect { port: "COM3".into() }.encode();
//!
//!     let output = bridge.invoke(&invocation, Duration::from_secs(1)).await?;
//!     assert_eq!(output.stdout, "Connect result: 0\n");
//!     Ok(())
//! }
//! ```
//!
//! # Failure Classification
//!
//! Exit status 0 is success regardless of what was printed; a bridge that
//! reports a device error still exits 0 and the decoder catches it. A nonzero
//! exit or a signal is a [`BridgeError::TransportFailure`], a process that
//! cannot be started is a [`BridgeError::SpawnFailure`], and a process that
//! outlives its timeout is killed and reported as [`BridgeError::Timeout`].
//! Nothing is retried here.

pub mod error;
pub mod mock;
pub mod process;
pub mod traits;
pub mod transports;

pub use error::{BridgeError, Result};
pub use mock::{MockBridge, MockReply};
pub use process::ProcessBridge;
pub use traits::{BridgeTransport, RawOutput};
pub use transports::AnyBridge;
