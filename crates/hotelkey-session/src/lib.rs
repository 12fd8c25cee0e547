//! Encoder control session for the hotel card encoder.
//!
//! This crate ties the lower layers together:
//!
//! ```text
//!            ┌──────────────────────┐
//!            │  workflows           │  encode / read, always released
//!            └──────────┬───────────┘
//!            ┌──────────▼───────────┐
//!            │  EncoderSession      │  state, FIFO command lock, retries
//!            └───┬──────────────┬───┘
//!  ┌─────────────▼───┐      ┌───▼──────────────────┐
//!  │ CredentialCache │      │ codec + BridgeTransport │
//!  │  → CloudClient  │      │  → bridge subprocess    │
//!  └─────────────────┘      └─────────────────────────┘
//! ```
//!
//! Sessions are constructed explicitly and shared by reference (or `Arc`);
//! there is no process-wide instance.

pub mod error;
pub mod retry;
pub mod session;
pub mod state;
pub mod workflow;

pub use error::{Result, SessionError};
pub use retry::RetryPolicy;
pub use session::{EncoderSession, SessionOptions};
pub use state::ConnectionState;
