//! Device result codes reported by the encoder firmware.
//!
//! The encoder answers every state-changing command with a numeric result.
//! Zero means success; the remaining values form a small, fixed error space
//! that is terminal for the command that produced it and never worth a retry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result code reported by the encoder.
///
/// Unknown codes are preserved in [`DeviceErrorCode::Unknown`] so the raw
/// value is always recoverable through [`DeviceErrorCode::code`].
///
/// # Examples
///
/// ```
/// use hotelkey_core::DeviceErrorCode;
///
/// assert_eq!(DeviceErrorCode::from_code(106), DeviceErrorCode::KeyMismatch);
/// assert_eq!(DeviceErrorCode::from_code(4), DeviceErrorCode::CommError(4));
/// assert_eq!(DeviceErrorCode::from_code(77).code(), 77);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", from = "i32")]
pub enum DeviceErrorCode {
    /// Command completed (0).
    Success,

    /// Generic failure (1).
    Fail,

    /// Invalid parameter (2).
    BadParam,

    /// Communication error with the encoder (3, 4 or 5).
    CommError(i32),

    /// Hotel credential payload rejected (13).
    BadHotelInfo,

    /// No card, or card not seated on the encoder (101).
    CardMisplaced,

    /// Card key does not match the hotel (106).
    KeyMismatch,

    /// Code outside the documented space.
    Unknown(i32),
}

impl DeviceErrorCode {
    /// Map a raw result code onto the enumeration.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Fail,
            2 => Self::BadParam,
            3..=5 => Self::CommError(code),
            13 => Self::BadHotelInfo,
            101 => Self::CardMisplaced,
            106 => Self::KeyMismatch,
            other => Self::Unknown(other),
        }
    }

    /// Raw numeric code.
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Fail => 1,
            Self::BadParam => 2,
            Self::CommError(code) | Self::Unknown(code) => code,
            Self::BadHotelInfo => 13,
            Self::CardMisplaced => 101,
            Self::KeyMismatch => 106,
        }
    }

    /// Returns `true` for [`DeviceErrorCode::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Symbolic name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Fail => "FAIL",
            Self::BadParam => "BAD_PARAM",
            Self::CommError(_) => "COMM_ERROR",
            Self::BadHotelInfo => "BAD_HOTEL_INFO",
            Self::CardMisplaced => "CARD_MISPLACED",
            Self::KeyMismatch => "KEY_MISMATCH",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for DeviceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

impl From<i32> for DeviceErrorCode {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<DeviceErrorCode> for i32 {
    fn from(code: DeviceErrorCode) -> Self {
        code.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, DeviceErrorCode::Success)]
    #[case(1, DeviceErrorCode::Fail)]
    #[case(2, DeviceErrorCode::BadParam)]
    #[case(3, DeviceErrorCode::CommError(3))]
    #[case(5, DeviceErrorCode::CommError(5))]
    #[case(13, DeviceErrorCode::BadHotelInfo)]
    #[case(101, DeviceErrorCode::CardMisplaced)]
    #[case(106, DeviceErrorCode::KeyMismatch)]
    #[case(-7, DeviceErrorCode::Unknown(-7))]
    fn test_from_code(#[case] raw: i32, #[case] expected: DeviceErrorCode) {
        let code = DeviceErrorCode::from_code(raw);
        assert_eq!(code, expected);
        assert_eq!(code.code(), raw);
    }

    #[test]
    fn test_display_includes_name_and_code() {
        assert_eq!(DeviceErrorCode::KeyMismatch.to_string(), "KEY_MISMATCH(106)");
        assert_eq!(DeviceErrorCode::CommError(4).to_string(), "COMM_ERROR(4)");
    }

    #[test]
    fn test_serializes_as_raw_code() {
        let json = serde_json::to_string(&DeviceErrorCode::CardMisplaced).unwrap();
        assert_eq!(json, "101");
        let back: DeviceErrorCode = serde_json::from_str("13").unwrap();
        assert_eq!(back, DeviceErrorCode::BadHotelInfo);
    }

    #[test]
    fn test_only_zero_is_success() {
        assert!(DeviceErrorCode::Success.is_success());
        assert!(!DeviceErrorCode::Fail.is_success());
        assert!(!DeviceErrorCode::Unknown(99).is_success());
    }
}
