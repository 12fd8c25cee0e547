//! Encoder connection state.
//!
//! ```text
//! Disconnected --connect(port)--> Connected { port }
//! Connected { port } --disconnect()--> Disconnected
//! ```
//!
//! The state only changes on the reported outcome of a bridge `connect` or
//! `disconnect`; it never changes speculatively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the session holds the encoder, and on which port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,

    Connected {
        port: String,
    },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// The bound port, if connected.
    pub fn port(&self) -> Option<&str> {
        match self {
            Self::Connected { port } => Some(port),
            Self::Disconnected => None,
        }
    }

    /// Returns `true` if connected to exactly `port`.
    pub fn is_bound_to(&self, port: &str) -> bool {
        self.port() == Some(port)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("Disconnected"),
            Self::Connected { port } => write!(f, "Connected({port})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        let state = ConnectionState::default();
        assert!(!state.is_connected());
        assert_eq!(state.port(), None);
        assert_eq!(state.to_string(), "Disconnected");
    }

    #[test]
    fn test_connected_port() {
        let state = ConnectionState::Connected {
            port: "COM3".into(),
        };
        assert!(state.is_connected());
        assert!(state.is_bound_to("COM3"));
        assert!(!state.is_bound_to("COM4"));
        assert_eq!(state.to_string(), "Connected(COM3)");
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_string(&ConnectionState::Connected {
            port: "COM3".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"state":"connected","port":"COM3"}"#);
    }
}
