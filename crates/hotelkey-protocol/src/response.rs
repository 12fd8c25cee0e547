//! Bridge response line grammar.
//!
//! Every line the bridge prints has the shape:
//!
//! ```text
//! <label>: <payload>
//! ```
//!
//! The label is everything before the first `": "` and must not be empty.
//! The payload is the rest of the line and may be empty; the bridge prints
//! `Card No: ` with a trailing space when the value is blank, so a line that
//! ends in `:` once trailing whitespace is gone is read as an empty payload.
//!
//! # Examples
//!
//! ```
//! use hotelkey_protocol::ResponseLine;
//!
//! let line = ResponseLine::parse("Card ID (JSON): {\"id\":1}").unwrap();
//! assert_eq!(line.label, "Card ID (JSON)");
//! assert_eq!(line.payload, "{\"id\":1}");
//!
//! assert!(ResponseLine::parse("no separator here").is_err());
//! assert!(ResponseLine::parse(": 0").is_err());
//! ```

use crate::{
    commands::{CommandKind, ResponseShape},
    error::{ProtocolError, Result},
};
use hotelkey_core::{DeviceErrorCode, constants::RESPONSE_SEPARATOR};
use std::fmt;

/// Label of the second line printed by `readsectorrawdata`.
pub const BLOCK_DATA_LABEL: &str = "Block Data";

/// One parsed `label: payload` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine {
    pub label: String,
    pub payload: String,
}

impl ResponseLine {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }

    /// Parse a single output line.
    ///
    /// # Errors
    /// Returns `ProtocolError::MalformedResponse` if the separator is missing
    /// or the label is empty.
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim_end();

        let (label, payload) = match trimmed.split_once(RESPONSE_SEPARATOR) {
            Some((label, payload)) => (label, payload),
            None => match trimmed.strip_suffix(':') {
                Some(label) => (label, ""),
                None => {
                    return Err(ProtocolError::malformed(line, "missing ': ' separator"));
                }
            },
        };

        if label.trim().is_empty() {
            return Err(ProtocolError::malformed(line, "empty label"));
        }

        Ok(Self::new(label, payload))
    }

    /// `Error` and `Exception` lines report bridge-side failures.
    pub fn is_bridge_error(&self) -> bool {
        matches!(self.label.as_str(), "Error" | "Exception")
    }
}

impl fmt::Display for ResponseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.label, RESPONSE_SEPARATOR, self.payload)
    }
}

/// Successful, decoded outcome of one bridge command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status command returned 0.
    Ack,

    /// Value command payload, verbatim.
    Value(String),

    /// `configserver` outcome.
    Flag(bool),

    /// Raw block contents as contiguous uppercase hex.
    Block(String),
}

impl Reply {
    /// Render the stdout the bridge prints for this reply.
    ///
    /// Used by the mock bridge and by tests.
    ///
    /// # Examples
    ///
    /// ```
    /// use hotelkey_protocol::{CommandKind, Reply};
    ///
    /// assert_eq!(Reply::Ack.render(CommandKind::Connect), "Connect result: 0\n");
    /// assert_eq!(
    ///     Reply::Value("12345".into()).render(CommandKind::GetCardNo),
    ///     "Card No: 12345\n"
    /// );
    /// ```
    pub fn render(&self, kind: CommandKind) -> String {
        match (self, kind.shape()) {
            (Reply::Block(hex), ResponseShape::StatusWithBlock) => format!(
                "{}\n{}\n",
                ResponseLine::new(kind.label(), "0"),
                ResponseLine::new(BLOCK_DATA_LABEL, dashed_hex(hex))
            ),
            (Reply::Value(value), _) => format!("{}\n", ResponseLine::new(kind.label(), value)),
            (Reply::Flag(flag), _) => format!(
                "{}\n",
                ResponseLine::new(kind.label(), if *flag { "True" } else { "False" })
            ),
            _ => render_status(kind, DeviceErrorCode::Success),
        }
    }
}

/// Render a status line carrying `code`.
pub fn render_status(kind: CommandKind, code: DeviceErrorCode) -> String {
    format!("{}\n", ResponseLine::new(kind.label(), code.code().to_string()))
}

// The bridge formats block bytes as `AB-CD-...`.
fn dashed_hex(hex: &str) -> String {
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Connect result: 0", "Connect result", "0")]
    #[case("Card No: ", "Card No", "")]
    #[case("Card No:", "Card No", "")]
    #[case("Version: {\"a\": \"b\"}", "Version", "{\"a\": \"b\"}")]
    #[case("Card ID (JSON): abc\r", "Card ID (JSON)", "abc")]
    #[case("Exception: Unable to load DLL: x", "Exception", "Unable to load DLL: x")]
    fn test_parse_line(#[case] input: &str, #[case] label: &str, #[case] payload: &str) {
        let line = ResponseLine::parse(input).unwrap();
        assert_eq!(line.label, label);
        assert_eq!(line.payload, payload);
    }

    #[rstest]
    #[case("")]
    #[case("Connect result 0")]
    #[case(": 0")]
    #[case("   : 0")]
    #[case("Unknown command 'frobnicate'")]
    fn test_parse_line_rejects(#[case] input: &str) {
        assert!(matches!(
            ResponseLine::parse(input),
            Err(ProtocolError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_bridge_error_labels() {
        assert!(ResponseLine::new("Error", "Port required").is_bridge_error());
        assert!(ResponseLine::new("Exception", "boom").is_bridge_error());
        assert!(!ResponseLine::new("Connect result", "0").is_bridge_error());
    }

    #[test]
    fn test_render_block_reply() {
        let out = Reply::Block("00112233445566778899AABBCCDDEEFF".into())
            .render(CommandKind::ReadSectorRawData);
        assert_eq!(
            out,
            "Read sector raw data result: 0\nBlock Data: 00-11-22-33-44-55-66-77-88-99-AA-BB-CC-DD-EE-FF\n"
        );
    }

    #[test]
    fn test_render_status_with_code() {
        assert_eq!(
            render_status(CommandKind::WriteCard, DeviceErrorCode::KeyMismatch),
            "Write card result: 106\n"
        );
    }
}
