use hotelkey_bridge::BridgeError;
use hotelkey_cloud::CloudError;
use hotelkey_core::DeviceErrorCode;
use hotelkey_protocol::{CommandKind, ProtocolError};
use thiserror::Error;

/// Errors returned by [`EncoderSession`](crate::EncoderSession) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Hotel credentials could not be resolved; nothing was sent to the
    /// encoder.
    #[error("Hotel credentials unavailable: {0}")]
    CredentialUnavailable(#[source] CloudError),

    /// The bridge process could not be run to completion.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The bridge ran but its output was not a valid answer.
    #[error("Invalid response to {command}: {source}")]
    Protocol {
        command: CommandKind,
        #[source]
        source: ProtocolError,
    },

    /// The encoder reported a nonzero result code.
    #[error("{command} failed: device code {code}")]
    Device {
        command: CommandKind,
        code: DeviceErrorCode,
    },

    #[error("Encoder is not connected")]
    NotConnected,

    #[error("Encoder is already connected on {port}")]
    AlreadyConnected { port: String },

    /// Card data failed validation.
    #[error(transparent)]
    Validation(#[from] hotelkey_core::Error),
}

impl SessionError {
    /// Attribute a decoding failure to `command`, lifting device codes.
    pub fn protocol(command: CommandKind, error: ProtocolError) -> Self {
        match error.device_code() {
            Some(code) => Self::Device { command, code },
            None => Self::Protocol {
                command,
                source: error,
            },
        }
    }

    /// The device result code, if the encoder reported one.
    pub fn device_code(&self) -> Option<DeviceErrorCode> {
        match self {
            Self::Device { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` for failures that a connect retry may resolve.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Bridge(e) if e.is_transport())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
