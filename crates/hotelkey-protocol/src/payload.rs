//! Opportunistic JSON payloads.
//!
//! Some value commands print JSON when the device firmware supports it and
//! plain text otherwise. Parsing never fails: text that is not the expected
//! JSON is kept as [`Parsed::Opaque`].
//!
//! ```
//! use hotelkey_protocol::{EncoderVersion, Parsed, CancellationRecord};
//!
//! let version = EncoderVersion::parse("V2.3.1");
//! assert_eq!(version, Parsed::Opaque("V2.3.1".into()));
//!
//! let cancellations = CancellationRecord::parse_list("not json").structured_or_default();
//! assert!(cancellations.is_empty());
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A payload that was either parsed into `T` or kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parsed<T> {
    Structured(T),
    Opaque(String),
}

impl<T: DeserializeOwned> Parsed<T> {
    /// Try to parse `text` as JSON into `T`.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str(text.trim()) {
            Ok(value) => Parsed::Structured(value),
            Err(_) => Parsed::Opaque(text.to_string()),
        }
    }
}

impl<T> Parsed<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, Parsed::Structured(_))
    }

    pub fn structured(&self) -> Option<&T> {
        match self {
            Parsed::Structured(value) => Some(value),
            Parsed::Opaque(_) => None,
        }
    }

    /// The structured value, or `T::default()` for opaque text.
    pub fn structured_or_default(self) -> T
    where
        T: Default,
    {
        match self {
            Parsed::Structured(value) => value,
            Parsed::Opaque(_) => T::default(),
        }
    }
}

/// Encoder firmware and hardware versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderVersion {
    pub firmware: String,
    pub hardware: String,
    pub protocol: String,
}

impl EncoderVersion {
    pub fn parse(text: &str) -> Parsed<Self> {
        Parsed::parse(text)
    }
}

/// One entry of the encoder's cancellation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRecord {
    pub card_number: String,
    pub timestamp: i64,
    pub reason: String,
}

impl CancellationRecord {
    /// Parse the `Cancellation Info` payload. An empty payload is an empty
    /// list.
    pub fn parse_list(text: &str) -> Parsed<Vec<Self>> {
        if text.trim().is_empty() {
            return Parsed::Structured(Vec::new());
        }
        Parsed::parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_json() {
        let parsed =
            EncoderVersion::parse(r#"{"firmware":"1.2","hardware":"B","protocol":"3"}"#);
        assert_eq!(
            parsed.structured(),
            Some(&EncoderVersion {
                firmware: "1.2".into(),
                hardware: "B".into(),
                protocol: "3".into(),
            })
        );
    }

    #[test]
    fn test_version_missing_field_stays_opaque() {
        let text = r#"{"firmware":"1.2"}"#;
        assert_eq!(EncoderVersion::parse(text), Parsed::Opaque(text.into()));
    }

    #[test]
    fn test_cancellation_list() {
        let parsed = CancellationRecord::parse_list(
            r#"[{"cardNumber":"889","timestamp":1700000000,"reason":"lost"}]"#,
        );
        assert!(parsed.is_structured());
        let records = parsed.structured_or_default();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].card_number, "889");
        assert_eq!(records[0].reason, "lost");
    }

    #[test]
    fn test_cancellation_empty_and_garbage() {
        assert_eq!(CancellationRecord::parse_list("  "), Parsed::Structured(vec![]));
        assert_eq!(
            CancellationRecord::parse_list("(null)"),
            Parsed::Opaque("(null)".into())
        );
    }

    #[test]
    fn test_untagged_serialization() {
        let opaque: Parsed<EncoderVersion> = Parsed::Opaque("V1".into());
        assert_eq!(serde_json::to_string(&opaque).unwrap(), "\"V1\"");
    }
}
