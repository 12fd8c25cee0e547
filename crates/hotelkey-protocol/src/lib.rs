//! Command codec for the card encoder bridge.
//!
//! Encoding turns a typed [`BridgeCommand`] into the positional argument list
//! the bridge executable expects. Decoding turns the bridge's captured stdout
//! back into a typed reply or a [`ProtocolError`].

pub mod commands;
pub mod decode;
pub mod error;
pub mod payload;
pub mod response;

pub use commands::{BridgeCommand, CommandKind, Invocation, ResponseShape};
pub use decode::{decode, decode_block, decode_flag, decode_status, decode_value};
pub use error::{ProtocolError, Result};
pub use payload::{CancellationRecord, EncoderVersion, Parsed};
pub use response::{BLOCK_DATA_LABEL, Reply, ResponseLine, render_status};
