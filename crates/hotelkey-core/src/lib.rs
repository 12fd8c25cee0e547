//! Core domain types for the hotel card encoder.
//!
//! This crate holds everything the other `hotelkey` crates agree on: the card
//! records passed to and read from the encoder, the device error code space,
//! protocol-level constants and the environment-sourced configuration.

pub mod config;
pub mod constants;
pub mod device_code;
pub mod error;
pub mod types;

pub use config::{
    CardConfig, CloudConfig, EncoderConfig, EncoderSettings, ErrorHandlingConfig,
};
pub use device_code::DeviceErrorCode;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
