use crate::{
    Result,
    constants::{
        BLOCK_DATA_HEX_LEN, DEFAULT_BEEP_COUNT, DEFAULT_BEEP_DURATION_MS, DEFAULT_BEEP_INTERVAL_MS,
        MAC_ADDRESS_HEX_LEN, MAX_BLOCK, MAX_SECTOR, SECTOR_KEY_HEX_LEN,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strip the separators humans and the bridge put into hex strings
/// (`AB-CD`, `AB:CD`, `AB CD`) and uppercase the rest.
///
/// # Errors
/// Returns `Error::InvalidHex` if a non-hex character remains or the length
/// differs from `expected_len`.
pub fn normalize_hex(field: &'static str, input: &str, expected_len: usize) -> Result<String> {
    let hex: String = input
        .chars()
        .filter(|c| !matches!(c, '-' | ':' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(Error::invalid_hex(field, format!("unexpected character '{bad}'")));
    }

    if hex.len() != expected_len {
        return Err(Error::invalid_hex(
            field,
            format!("expected {expected_len} hex digits, got {}", hex.len()),
        ));
    }

    Ok(hex)
}

/// Lock MAC identifier (12 hex digits, stored uppercase without separators).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a MAC address with validation.
    ///
    /// Colons, dashes and spaces are accepted as separators and removed.
    ///
    /// # Errors
    /// Returns `Error::InvalidMacAddress` if the input is not 12 hex digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use hotelkey_core::MacAddress;
    ///
    /// let mac = MacAddress::new("ab:cd:ef:12:34:56").unwrap();
    /// assert_eq!(mac.as_str(), "ABCDEF123456");
    ///
    /// assert!(MacAddress::new("ABCDEF").is_err());
    /// ```
    pub fn new(input: &str) -> Result<Self> {
        normalize_hex("mac", input.trim(), MAC_ADDRESS_HEX_LEN)
            .map(MacAddress)
            .map_err(|e| Error::InvalidMacAddress(format!("{input}: {e}")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MacAddress::new(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        MacAddress::new(&value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

/// Access rights written onto a guest card.
///
/// Constructed by the caller, handed to the encoder's write command and not
/// retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAccessRecord {
    /// Building number the card opens.
    pub building_number: u16,

    /// Floor number the card opens.
    pub floor_number: u16,

    /// MAC identifier of the lock the card opens.
    pub mac: MacAddress,

    /// Card validity end, in Unix epoch seconds.
    pub timestamp: u32,

    /// Whether the card may open a lock that is in lock-out mode.
    pub allow_lock_out: bool,
}

impl CardAccessRecord {
    /// Create an access record.
    #[must_use]
    pub fn new(
        building_number: u16,
        floor_number: u16,
        mac: MacAddress,
        timestamp: u32,
        allow_lock_out: bool,
    ) -> Self {
        Self {
            building_number,
            floor_number,
            mac,
            timestamp,
            allow_lock_out,
        }
    }
}

/// Card contents returned by a successful read sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDataRecord {
    pub card_number: String,
    pub card_id: String,
    pub hotel_array: String,
}

impl CardDataRecord {
    /// Assemble a record from the three read results.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardData` if any field is blank. A record is
    /// either complete or not produced at all.
    pub fn new(card_number: String, card_id: String, hotel_array: String) -> Result<Self> {
        for (name, value) in [
            ("card number", &card_number),
            ("card id", &card_id),
            ("hotel array", &hotel_array),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidCardData(format!("{name} is empty")));
            }
        }

        Ok(Self {
            card_number,
            card_id,
            hotel_array,
        })
    }
}

/// Address, key and payload for a raw sector read or write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSectorDescriptor")]
pub struct SectorDescriptor {
    sector: u8,
    block: u8,
    encrypted: bool,
    key: String,
    data: String,
}

impl SectorDescriptor {
    /// Create a descriptor for a raw sector operation.
    ///
    /// # Errors
    /// Returns an error if the sector or block is out of range, the key is
    /// not 12 hex digits, or the block data is not 32 hex digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use hotelkey_core::SectorDescriptor;
    ///
    /// let sector = SectorDescriptor::new(1, 2, true, "FFFFFFFFFFFF", &"00".repeat(16)).unwrap();
    /// assert_eq!(sector.key(), "FFFFFFFFFFFF");
    ///
    /// assert!(SectorDescriptor::new(1, 2, true, "FFFF", &"00".repeat(16)).is_err());
    /// ```
    pub fn new(sector: u8, block: u8, encrypted: bool, key: &str, data: &str) -> Result<Self> {
        if sector > MAX_SECTOR {
            return Err(Error::InvalidSector(format!(
                "sector must be 0-{MAX_SECTOR}, got {sector}"
            )));
        }
        if block > MAX_BLOCK {
            return Err(Error::InvalidSector(format!(
                "block must be 0-{MAX_BLOCK}, got {block}"
            )));
        }

        Ok(Self {
            sector,
            block,
            encrypted,
            key: normalize_hex("key", key, SECTOR_KEY_HEX_LEN)?,
            data: normalize_hex("block data", data, BLOCK_DATA_HEX_LEN)?,
        })
    }

    /// Descriptor for a read; the block data argument is a zero placeholder.
    ///
    /// # Errors
    /// Same as [`SectorDescriptor::new`], minus the data check.
    pub fn for_read(sector: u8, block: u8, encrypted: bool, key: &str) -> Result<Self> {
        Self::new(sector, block, encrypted, key, &"0".repeat(BLOCK_DATA_HEX_LEN))
    }

    pub fn sector(&self) -> u8 {
        self.sector
    }

    pub fn block(&self) -> u8 {
        self.block
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn data(&self) -> &str {
        &self.data
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSectorDescriptor {
    sector: u8,
    block: u8,
    encrypted: bool,
    key: String,
    data: String,
}

impl TryFrom<RawSectorDescriptor> for SectorDescriptor {
    type Error = Error;

    fn try_from(raw: RawSectorDescriptor) -> Result<Self> {
        Self::new(raw.sector, raw.block, raw.encrypted, &raw.key, &raw.data)
    }
}

/// Buzzer pattern for the encoder's beep command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawBeepPattern")]
pub struct BeepPattern {
    pub duration_ms: u32,
    pub interval_ms: u32,
    pub count: u32,
}

impl BeepPattern {
    /// Create a beep pattern.
    ///
    /// # Errors
    /// Returns `Error::InvalidBeepPattern` if any value is zero.
    pub fn new(duration_ms: u32, interval_ms: u32, count: u32) -> Result<Self> {
        if duration_ms == 0 || interval_ms == 0 || count == 0 {
            return Err(Error::InvalidBeepPattern(format!(
                "duration, interval and count must be positive, got {duration_ms}/{interval_ms}/{count}"
            )));
        }
        Ok(Self {
            duration_ms,
            interval_ms,
            count,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBeepPattern {
    duration_ms: u32,
    interval_ms: u32,
    count: u32,
}

impl TryFrom<RawBeepPattern> for BeepPattern {
    type Error = Error;

    fn try_from(raw: RawBeepPattern) -> Result<Self> {
        Self::new(raw.duration_ms, raw.interval_ms, raw.count)
    }
}

impl Default for BeepPattern {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_BEEP_DURATION_MS,
            interval_ms: DEFAULT_BEEP_INTERVAL_MS,
            count: DEFAULT_BEEP_COUNT,
        }
    }
}
