use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Card data validation errors
    #[error("Invalid MAC address: {0}")]
    InvalidMacAddress(String),

    #[error("Invalid hex in {field}: {message}")]
    InvalidHex { field: &'static str, message: String },

    #[error("Invalid sector address: {0}")]
    InvalidSector(String),

    #[error("Invalid card data: {0}")]
    InvalidCardData(String),

    #[error("Invalid card expiry: {0}")]
    InvalidExpiry(String),

    #[error("Invalid beep pattern: {0}")]
    InvalidBeepPattern(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {}", .0.join(", "))]
    InvalidConfig(Vec<String>),
}

impl Error {
    /// Create a new invalid hex error.
    pub fn invalid_hex(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidHex {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
