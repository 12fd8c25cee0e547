//! Core constants for the hotel card encoder.
//!
//! This module centralizes the fixed values shared by the codec, the session
//! and the configuration layer: card field widths, the credential validity
//! window and the defaults used when an environment variable is absent.
//!
//! # Bridge Response Shape
//!
//! Every line the hardware bridge prints follows the same grammar:
//!
//! ```text
//! <label>: <payload>
//!        ^^
//!        RESPONSE_SEPARATOR
//! ```
//!
//! # Usage
//!
//! ```
//! use hotelkey_core::constants::*;
//!
//! assert_eq!(MAC_ADDRESS_HEX_LEN, 12);
//! assert_eq!(CREDENTIAL_VALIDITY_SECS, 600);
//! ```

// ============================================================================
// Bridge Protocol
// ============================================================================

/// Separator between a response label and its payload.
///
/// # Examples
///
/// ```
/// use hotelkey_core::constants::RESPONSE_SEPARATOR;
///
/// let line = "Connect result: 0";
/// let (label, payload) = line.split_once(RESPONSE_SEPARATOR).unwrap();
/// assert_eq!(label, "Connect result");
/// assert_eq!(payload, "0");
/// ```
pub const RESPONSE_SEPARATOR: &str = ": ";

/// Device result code reported on success.
pub const RESULT_SUCCESS: i32 = 0;

// ============================================================================
// Card Field Widths
// ============================================================================

/// Lock MAC identifier length in hex digits (6 bytes).
pub const MAC_ADDRESS_HEX_LEN: usize = 12;

/// Sector key length in hex digits (6-byte Mifare key).
pub const SECTOR_KEY_HEX_LEN: usize = 12;

/// Block data length in hex digits (16-byte block).
pub const BLOCK_DATA_HEX_LEN: usize = 32;

/// Highest addressable sector (Mifare Classic 4K has 40 sectors).
pub const MAX_SECTOR: u8 = 39;

/// Highest addressable block within a sector (large 4K sectors hold 16 blocks).
pub const MAX_BLOCK: u8 = 15;

// ============================================================================
// Credentials
// ============================================================================

/// How long fetched hotel credential material stays valid (10 minutes).
pub const CREDENTIAL_VALIDITY_SECS: u64 = 10 * 60;

/// Success sentinel in the cloud response envelope's `errcode` field.
pub const CLOUD_SUCCESS_CODE: i64 = 0;

// ============================================================================
// Configuration Defaults
// ============================================================================

/// Default cloud API base URL.
pub const DEFAULT_CLOUD_BASE_URL: &str = "https://euapi.ttlock.com/v3";

/// Default cloud HTTP timeout in milliseconds.
pub const DEFAULT_CLOUD_TIMEOUT_MS: i64 = 30_000;

/// Default bridge executable, resolved through `PATH` when relative.
pub const DEFAULT_BRIDGE_PATH: &str = "CardEncoderBridge.exe";

/// Default encoder port.
pub const DEFAULT_ENCODER_PORT: &str = "COM3";

/// Default timeout for the `connect` invocation in milliseconds.
pub const DEFAULT_CONNECTION_TIMEOUT_MS: i64 = 10_000;

/// Default timeout for every other bridge invocation in milliseconds.
pub const DEFAULT_COMMAND_TIMEOUT_MS: i64 = 30_000;

/// Default number of connect retries after the first attempt.
pub const DEFAULT_RETRY_ATTEMPTS: i64 = 3;

/// Default delay between connect attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: i64 = 1_000;

/// Default card validity in hours.
pub const DEFAULT_CARD_EXPIRY_HOURS: i64 = 24;

/// Longest card validity accepted, in days.
pub const DEFAULT_MAX_EXPIRY_DAYS: i64 = 30;

/// Default beep length in milliseconds.
pub const DEFAULT_BEEP_DURATION_MS: u32 = 100;

/// Default pause between beeps in milliseconds.
pub const DEFAULT_BEEP_INTERVAL_MS: u32 = 50;

/// Default number of beeps.
pub const DEFAULT_BEEP_COUNT: u32 = 3;
