//! Decoding of captured bridge stdout.
//!
//! The bridge may print diagnostics before its answer, so decoding looks at
//! the last non-empty line (the last two for `readsectorrawdata`). A line is
//! checked in this order:
//!
//! 1. it must follow the `label: payload` grammar ([`ResponseLine::parse`]);
//! 2. an `Error` or `Exception` label becomes [`ProtocolError::BridgeReported`];
//! 3. the label must be the command's own label;
//! 4. the payload is interpreted according to the command's [`ResponseShape`].
//!
//! # Examples
//!
//! ```
//! use hotelkey_core::DeviceErrorCode;
//! use hotelkey_protocol::{CommandKind, ProtocolError, decode_status, decode_value};
//!
//! assert!(decode_status(CommandKind::Connect, "Connect result: 0\n").is_ok());
//!
//! let err = decode_status(CommandKind::WriteCard, "Write card result: 106\n").unwrap_err();
//! assert_eq!(err, ProtocolError::Device(DeviceErrorCode::KeyMismatch));
//!
//! let card_no = decode_value(CommandKind::GetCardNo, "Card No: 0012345\n").unwrap();
//! assert_eq!(card_no, "0012345");
//! ```

use crate::{
    commands::{CommandKind, ResponseShape},
    error::{ProtocolError, Result},
    response::{BLOCK_DATA_LABEL, Reply, ResponseLine},
};
use hotelkey_core::{DeviceErrorCode, constants::BLOCK_DATA_HEX_LEN, types::normalize_hex};

/// Decode the output of `kind` according to its response shape.
///
/// # Errors
/// Returns a [`ProtocolError`] describing why the output is not a success.
pub fn decode(kind: CommandKind, stdout: &str) -> Result<Reply> {
    match kind.shape() {
        ResponseShape::Status => decode_status(kind, stdout).map(|()| Reply::Ack),
        ResponseShape::Value => decode_value(kind, stdout).map(Reply::Value),
        ResponseShape::Flag => decode_flag(kind, stdout).map(Reply::Flag),
        ResponseShape::StatusWithBlock => decode_block(kind, stdout).map(Reply::Block),
    }
}

/// Decode a `<label>: <code>` status line.
///
/// # Errors
/// `ProtocolError::Device` for a nonzero code, `MalformedResponse` for a
/// non-integer payload, plus the label errors described in the module docs.
pub fn decode_status(kind: CommandKind, stdout: &str) -> Result<()> {
    let line = expect_label(kind.label(), last_line(stdout)?)?;
    check_status(&line)
}

/// Decode a value line and return its payload verbatim.
///
/// # Errors
/// See the module docs.
pub fn decode_value(kind: CommandKind, stdout: &str) -> Result<String> {
    let line = expect_label(kind.label(), last_line(stdout)?)?;
    Ok(line.payload)
}

/// Decode a `True`/`False` line (case-insensitive).
///
/// # Errors
/// `MalformedResponse` if the payload is not a boolean.
pub fn decode_flag(kind: CommandKind, stdout: &str) -> Result<bool> {
    let line = expect_label(kind.label(), last_line(stdout)?)?;
    match line.payload.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ProtocolError::malformed(
            line.to_string(),
            "payload is not a boolean",
        )),
    }
}

/// Decode a status line followed by a `Block Data` line.
///
/// The status is checked first; the block data is returned as contiguous
/// uppercase hex.
///
/// # Errors
/// See [`decode_status`]; additionally `MalformedResponse` if the block line
/// is missing or is not 16 bytes of hex.
pub fn decode_block(kind: CommandKind, stdout: &str) -> Result<String> {
    let mut lines = non_empty_lines(stdout).rev();
    let last = ResponseLine::parse(
        lines
            .next()
            .ok_or_else(|| ProtocolError::malformed(stdout, "no output"))?,
    )?;

    if last.label != BLOCK_DATA_LABEL {
        // Only a status line: report its failure if it has one.
        let status = expect_label(kind.label(), last)?;
        check_status(&status)?;
        return Err(ProtocolError::malformed(
            status.to_string(),
            "missing block data line",
        ));
    }

    let status_line = lines
        .next()
        .ok_or_else(|| ProtocolError::malformed(last.to_string(), "missing status line"))?;
    let status = expect_label(kind.label(), ResponseLine::parse(status_line)?)?;
    check_status(&status)?;

    normalize_hex("block data", &last.payload, BLOCK_DATA_HEX_LEN)
        .map_err(|e| ProtocolError::malformed(last.to_string(), e.to_string()))
}

fn non_empty_lines(stdout: &str) -> impl DoubleEndedIterator<Item = &str> {
    stdout.lines().filter(|line| !line.trim().is_empty())
}

fn last_line(stdout: &str) -> Result<ResponseLine> {
    let line = non_empty_lines(stdout)
        .next_back()
        .ok_or_else(|| ProtocolError::malformed(stdout, "no output"))?;
    ResponseLine::parse(line)
}

fn expect_label(expected: &'static str, line: ResponseLine) -> Result<ResponseLine> {
    if line.label == expected {
        Ok(line)
    } else if line.is_bridge_error() {
        Err(ProtocolError::BridgeReported {
            message: line.payload,
        })
    } else {
        Err(ProtocolError::unexpected_label(expected, line.label))
    }
}

fn check_status(line: &ResponseLine) -> Result<()> {
    let code: i32 = line
        .payload
        .trim()
        .parse()
        .map_err(|_| ProtocolError::malformed(line.to_string(), "status is not an integer"))?;

    match DeviceErrorCode::from_code(code) {
        DeviceErrorCode::Success => Ok(()),
        failure => Err(ProtocolError::Device(failure)),
    }
}
