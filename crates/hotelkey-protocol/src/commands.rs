//! Bridge command definitions and argument encoding.
//!
//! The bridge executable takes one command per process:
//!
//! ```text
//! CardEncoderBridge.exe <command> [arg1] [arg2] ...
//!                       ^^^^^^^^^
//!                       CommandKind::name()
//! ```
//!
//! # Command Categories
//!
//! ## Connection
//! - `connect` (port), `disconnect`
//!
//! ## Credential-bound card operations
//!
//! These take the hotel credential payload as their first argument:
//! - `initcardencoder`, `initcard`, `writecard`, `readcard`, `clearcard`,
//!   `cancelcard`, `readcancellationinfo`, `deinitcard`
//!
//! ## Device queries and maintenance
//! - `getcardno`, `getcardid`, `getversion`, `getsectors`, `getcpucardsupport`
//! - `stopinitcard`, `beep`, `setsectors`, `initconstructioncard`
//! - `readsectorrawdata`, `writesectorrawdata`
//! - `configserver` (no device session required)
//!
//! # Examples
//!
//! ```
//! use hotelkey_protocol::{BridgeCommand, CommandKind};
//!
//! let invocation = BridgeCommand::Connect { port: "COM3".into() }.encode();
//! assert_eq!(invocation.kind(), CommandKind::Connect);
//! assert_eq!(invocation.args(), ["connect", "COM3"]);
//! ```
//!
//! Booleans are rendered the way the bridge's parser accepts them:
//!
//! ```
//! use hotelkey_core::{CardAccessRecord, MacAddress};
//! use hotelkey_protocol::BridgeCommand;
//!
//! let access = CardAccessRecord::new(1, 2, MacAddress::new("AABBCCDDEEFF").unwrap(), 1_700_000_000, true);
//! let invocation = BridgeCommand::WriteCard { credential: "payload".into(), access }.encode();
//! assert_eq!(
//!     invocation.args(),
//!     ["writecard", "payload", "1", "2", "AABBCCDDEEFF", "1700000000", "True"]
//! );
//! ```

use hotelkey_core::{BeepPattern, CardAccessRecord, SectorDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every operation the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Connect,
    Disconnect,
    InitCardEncoder,
    InitCard,
    StopInitCard,
    WriteCard,
    ReadCard,
    GetCardNo,
    GetCardId,
    ClearCard,
    Beep,
    GetVersion,
    CancelCard,
    ReadCancellationInfo,
    ConfigServer,
    SetSectors,
    GetSectors,
    ReadSectorRawData,
    WriteSectorRawData,
    DeinitCard,
    InitConstructionCard,
    GetCpuCardSupport,
}

/// How the bridge reports the outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `<label>: <integer device code>`
    Status,

    /// `<label>: <free text>`
    Value,

    /// `<label>: True|False`
    Flag,

    /// Status line followed by `Block Data: XX-XX-...`
    StatusWithBlock,
}

impl CommandKind {
    pub const ALL: [CommandKind; 22] = [
        CommandKind::Connect,
        CommandKind::Disconnect,
        CommandKind::InitCardEncoder,
        CommandKind::InitCard,
        CommandKind::StopInitCard,
        CommandKind::WriteCard,
        CommandKind::ReadCard,
        CommandKind::GetCardNo,
        CommandKind::GetCardId,
        CommandKind::ClearCard,
        CommandKind::Beep,
        CommandKind::GetVersion,
        CommandKind::CancelCard,
        CommandKind::ReadCancellationInfo,
        CommandKind::ConfigServer,
        CommandKind::SetSectors,
        CommandKind::GetSectors,
        CommandKind::ReadSectorRawData,
        CommandKind::WriteSectorRawData,
        CommandKind::DeinitCard,
        CommandKind::InitConstructionCard,
        CommandKind::GetCpuCardSupport,
    ];

    /// Command name passed as the bridge's first argument.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Connect => "connect",
            CommandKind::Disconnect => "disconnect",
            CommandKind::InitCardEncoder => "initcardencoder",
            CommandKind::InitCard => "initcard",
            CommandKind::StopInitCard => "stopinitcard",
            CommandKind::WriteCard => "writecard",
            CommandKind::ReadCard => "readcard",
            CommandKind::GetCardNo => "getcardno",
            CommandKind::GetCardId => "getcardid",
            CommandKind::ClearCard => "clearcard",
            CommandKind::Beep => "beep",
            CommandKind::GetVersion => "getversion",
            CommandKind::CancelCard => "cancelcard",
            CommandKind::ReadCancellationInfo => "readcancellationinfo",
            CommandKind::ConfigServer => "configserver",
            CommandKind::SetSectors => "setsectors",
            CommandKind::GetSectors => "getsectors",
            CommandKind::ReadSectorRawData => "readsectorrawdata",
            CommandKind::WriteSectorRawData => "writesectorrawdata",
            CommandKind::DeinitCard => "deinitcard",
            CommandKind::InitConstructionCard => "initconstructioncard",
            CommandKind::GetCpuCardSupport => "getcpucardsupport",
        }
    }

    /// Look a command up by its bridge name.
    ///
    /// # Examples
    /// ```
    /// use hotelkey_protocol::CommandKind;
    ///
    /// assert_eq!(CommandKind::from_name("getcardno"), Some(CommandKind::GetCardNo));
    /// assert_eq!(CommandKind::from_name("reboot"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Label of the line the bridge prints for this command.
    ///
    /// For [`ResponseShape::StatusWithBlock`] this is the status line's label;
    /// the block line always uses [`crate::BLOCK_DATA_LABEL`].
    pub fn label(&self) -> &'static str {
        match self {
            CommandKind::Connect => "Connect result",
            CommandKind::Disconnect => "Disconnect result",
            CommandKind::InitCardEncoder => "Init card encoder result",
            CommandKind::InitCard => "Init card result",
            CommandKind::StopInitCard => "Stop init card result",
            CommandKind::WriteCard => "Write card result",
            CommandKind::ReadCard => "Hotel Array",
            CommandKind::GetCardNo => "Card No",
            CommandKind::GetCardId => "Card ID (JSON)",
            CommandKind::ClearCard => "Clear card result",
            CommandKind::Beep => "Beep result",
            CommandKind::GetVersion => "Version",
            CommandKind::CancelCard => "Cancel card result",
            CommandKind::ReadCancellationInfo => "Cancellation Info",
            CommandKind::ConfigServer => "Config server result",
            CommandKind::SetSectors => "Set sectors result",
            CommandKind::GetSectors => "Sectors",
            CommandKind::ReadSectorRawData => "Read sector raw data result",
            CommandKind::WriteSectorRawData => "Write sector raw data result",
            CommandKind::DeinitCard => "De-init card result",
            CommandKind::InitConstructionCard => "Init construction card result",
            CommandKind::GetCpuCardSupport => "CPU Card Support",
        }
    }

    pub fn shape(&self) -> ResponseShape {
        match self {
            CommandKind::ReadCard
            | CommandKind::GetCardNo
            | CommandKind::GetCardId
            | CommandKind::GetVersion
            | CommandKind::ReadCancellationInfo
            | CommandKind::GetSectors
            | CommandKind::GetCpuCardSupport => ResponseShape::Value,
            CommandKind::ConfigServer => ResponseShape::Flag,
            CommandKind::ReadSectorRawData => ResponseShape::StatusWithBlock,
            _ => ResponseShape::Status,
        }
    }

    /// Returns `true` if the command carries the hotel credential payload.
    #[inline]
    pub fn requires_credentials(&self) -> bool {
        matches!(
            self,
            CommandKind::InitCardEncoder
                | CommandKind::InitCard
                | CommandKind::WriteCard
                | CommandKind::ReadCard
                | CommandKind::ClearCard
                | CommandKind::CancelCard
                | CommandKind::ReadCancellationInfo
                | CommandKind::DeinitCard
        )
    }

    /// Returns `true` if the command needs an open device session.
    #[inline]
    pub fn requires_connection(&self) -> bool {
        !matches!(
            self,
            CommandKind::Connect | CommandKind::Disconnect | CommandKind::ConfigServer
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bridge command with its typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    Connect {
        port: String,
    },
    Disconnect,
    InitCardEncoder {
        credential: String,
    },
    InitCard {
        credential: String,
    },
    StopInitCard,
    WriteCard {
        credential: String,
        access: CardAccessRecord,
    },
    ReadCard {
        credential: String,
    },
    GetCardNo,
    GetCardId,
    ClearCard {
        credential: String,
    },
    Beep(BeepPattern),
    GetVersion,
    CancelCard {
        credential: String,
        card_number: String,
        timestamp: u32,
    },
    ReadCancellationInfo {
        credential: String,
    },
    ConfigServer {
        url: String,
    },
    SetSectors {
        sectors: String,
    },
    GetSectors,
    ReadSectorRawData(SectorDescriptor),
    WriteSectorRawData(SectorDescriptor),
    DeinitCard {
        credential: String,
    },
    InitConstructionCard,
    GetCpuCardSupport,
}

impl BridgeCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            BridgeCommand::Connect { .. } => CommandKind::Connect,
            BridgeCommand::Disconnect => CommandKind::Disconnect,
            BridgeCommand::InitCardEncoder { .. } => CommandKind::InitCardEncoder,
            BridgeCommand::InitCard { .. } => CommandKind::InitCard,
            BridgeCommand::StopInitCard => CommandKind::StopInitCard,
            BridgeCommand::WriteCard { .. } => CommandKind::WriteCard,
            BridgeCommand::ReadCard { .. } => CommandKind::ReadCard,
            BridgeCommand::GetCardNo => CommandKind::GetCardNo,
            BridgeCommand::GetCardId => CommandKind::GetCardId,
            BridgeCommand::ClearCard { .. } => CommandKind::ClearCard,
            BridgeCommand::Beep(_) => CommandKind::Beep,
            BridgeCommand::GetVersion => CommandKind::GetVersion,
            BridgeCommand::CancelCard { .. } => CommandKind::CancelCard,
            BridgeCommand::ReadCancellationInfo { .. } => CommandKind::ReadCancellationInfo,
            BridgeCommand::ConfigServer { .. } => CommandKind::ConfigServer,
            BridgeCommand::SetSectors { .. } => CommandKind::SetSectors,
            BridgeCommand::GetSectors => CommandKind::GetSectors,
            BridgeCommand::ReadSectorRawData(_) => CommandKind::ReadSectorRawData,
            BridgeCommand::WriteSectorRawData(_) => CommandKind::WriteSectorRawData,
            BridgeCommand::DeinitCard { .. } => CommandKind::DeinitCard,
            BridgeCommand::InitConstructionCard => CommandKind::InitConstructionCard,
            BridgeCommand::GetCpuCardSupport => CommandKind::GetCpuCardSupport,
        }
    }

    /// Build the positional argument list for this command.
    pub fn encode(&self) -> Invocation {
        let kind = self.kind();
        let mut args = vec![kind.name().to_string()];

        match self {
            BridgeCommand::Connect { port } => args.push(port.clone()),
            BridgeCommand::InitCardEncoder { credential }
            | BridgeCommand::InitCard { credential }
            | BridgeCommand::ReadCard { credential }
            | BridgeCommand::ClearCard { credential }
            | BridgeCommand::ReadCancellationInfo { credential }
            | BridgeCommand::DeinitCard { credential } => args.push(credential.clone()),
            BridgeCommand::WriteCard { credential, access } => args.extend([
                credential.clone(),
                access.building_number.to_string(),
                access.floor_number.to_string(),
                access.mac.to_string(),
                access.timestamp.to_string(),
                render_bool(access.allow_lock_out).to_string(),
            ]),
            BridgeCommand::Beep(pattern) => args.extend([
                pattern.duration_ms.to_string(),
                pattern.interval_ms.to_string(),
                pattern.count.to_string(),
            ]),
            BridgeCommand::CancelCard {
                credential,
                card_number,
                timestamp,
            } => args.extend([credential.clone(), card_number.clone(), timestamp.to_string()]),
            BridgeCommand::ConfigServer { url } => args.push(url.clone()),
            BridgeCommand::SetSectors { sectors } => args.push(sectors.clone()),
            BridgeCommand::ReadSectorRawData(sector) | BridgeCommand::WriteSectorRawData(sector) => {
                args.extend([
                    sector.sector().to_string(),
                    sector.block().to_string(),
                    render_bool(sector.is_encrypted()).to_string(),
                    sector.key().to_string(),
                    sector.data().to_string(),
                ])
            }
            BridgeCommand::Disconnect
            | BridgeCommand::StopInitCard
            | BridgeCommand::GetCardNo
            | BridgeCommand::GetCardId
            | BridgeCommand::GetVersion
            | BridgeCommand::GetSectors
            | BridgeCommand::InitConstructionCard
            | BridgeCommand::GetCpuCardSupport => {}
        }

        Invocation { kind, args }
    }
}

/// Positional arguments for one bridge process.
///
/// `args()[0]` is always the command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    kind: CommandKind,
    args: Vec<String>,
}

impl Invocation {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments after the command name.
    pub fn params(&self) -> &[String] {
        &self.args[1..]
    }
}

fn render_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
