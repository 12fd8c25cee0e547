use hotelkey_core::DeviceErrorCode;
use thiserror::Error;

/// Failures while decoding bridge output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The output does not follow the `label: payload` grammar.
    #[error("Malformed bridge response {line:?}: {reason}")]
    MalformedResponse { line: String, reason: String },

    /// A well-formed line carried a label other than the command's.
    #[error("Expected '{expected}' response, got '{found}'")]
    UnexpectedLabel {
        expected: &'static str,
        found: String,
    },

    /// The bridge printed an `Error:` or `Exception:` line.
    #[error("Bridge reported: {message}")]
    BridgeReported { message: String },

    /// The status line carried a nonzero device code.
    #[error("Device returned {0}")]
    Device(DeviceErrorCode),
}

impl ProtocolError {
    pub fn malformed(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            line: line.into(),
            reason: reason.into(),
        }
    }

    pub fn unexpected_label(expected: &'static str, found: impl Into<String>) -> Self {
        Self::UnexpectedLabel {
            expected,
            found: found.into(),
        }
    }

    /// Device code carried by the error, if any.
    pub fn device_code(&self) -> Option<DeviceErrorCode> {
        match self {
            Self::Device(code) => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
