use thiserror::Error;

/// Errors returned by the cloud hotel-management API client.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The API answered with a nonzero `errcode`.
    #[error("Cloud API error {code}: {message}")]
    Api { code: i64, message: String },

    /// The request failed at the HTTP level.
    #[error("Cloud transport error{}: {message}", format_status(.status))]
    Transport { status: Option<u16>, message: String },

    /// The request exceeded the configured timeout.
    #[error("Cloud request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The response body did not have the expected shape.
    #[error("Failed to decode cloud response: {0}")]
    Decode(String),

    /// The client could not be built from its configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CloudError {
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Classify a reqwest failure.
    pub(crate) fn from_reqwest(error: reqwest::Error, duration_ms: u64) -> Self {
        if error.is_timeout() {
            Self::Timeout { duration_ms }
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::transport(error.status().map(|s| s.as_u16()), error.to_string())
        }
    }
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CloudError>;
