//! Shared fixtures for codec integration tests.

#![allow(dead_code)]

use hotelkey_core::{BeepPattern, CardAccessRecord, MacAddress, SectorDescriptor};
use hotelkey_protocol::{BridgeCommand, CommandKind, Reply, ResponseShape};

pub const CREDENTIAL: &str = "HOTEL-INFO-PAYLOAD";
pub const BLOCK_HEX: &str = "00112233445566778899AABBCCDDEEFF";

pub fn access_record() -> CardAccessRecord {
    CardAccessRecord::new(
        1,
        5,
        MacAddress::new("AABBCCDDEEFF").unwrap(),
        1_700_086_400,
        false,
    )
}

pub fn sector() -> SectorDescriptor {
    SectorDescriptor::new(2, 1, true, "FFFFFFFFFFFF", BLOCK_HEX).unwrap()
}

/// A representative command for every kind.
pub fn sample_command(kind: CommandKind) -> BridgeCommand {
    let credential = CREDENTIAL.to_string();
    match kind {
        CommandKind::Connect => BridgeCommand::Connect { port: "COM3".into() },
        CommandKind::Disconnect => BridgeCommand::Disconnect,
        CommandKind::InitCardEncoder => BridgeCommand::InitCardEncoder { credential },
        CommandKind::InitCard => BridgeCommand::InitCard { credential },
        CommandKind::StopInitCard => BridgeCommand::StopInitCard,
        CommandKind::WriteCard => BridgeCommand::WriteCard {
            credential,
            access: access_record(),
        },
        CommandKind::ReadCard => BridgeCommand::ReadCard { credential },
        CommandKind::GetCardNo => BridgeCommand::GetCardNo,
        CommandKind::GetCardId => BridgeCommand::GetCardId,
        CommandKind::ClearCard => BridgeCommand::ClearCard { credential },
        CommandKind::Beep => BridgeCommand::Beep(BeepPattern::default()),
        CommandKind::GetVersion => BridgeCommand::GetVersion,
        CommandKind::CancelCard => BridgeCommand::CancelCard {
            credential,
            card_number: "889".into(),
            timestamp: 1_700_000_000,
        },
        CommandKind::ReadCancellationInfo => BridgeCommand::ReadCancellationInfo { credential },
        CommandKind::ConfigServer => BridgeCommand::ConfigServer {
            url: "https://example.test/api".into(),
        },
        CommandKind::SetSectors => BridgeCommand::SetSectors { sectors: "1,2,3".into() },
        CommandKind::GetSectors => BridgeCommand::GetSectors,
        CommandKind::ReadSectorRawData => BridgeCommand::ReadSectorRawData(sector()),
        CommandKind::WriteSectorRawData => BridgeCommand::WriteSectorRawData(sector()),
        CommandKind::DeinitCard => BridgeCommand::DeinitCard { credential },
        CommandKind::InitConstructionCard => BridgeCommand::InitConstructionCard,
        CommandKind::GetCpuCardSupport => BridgeCommand::GetCpuCardSupport,
    }
}

/// Positional parameters each command must carry, in order.
pub fn expected_params(kind: CommandKind) -> Vec<String> {
    match kind {
        CommandKind::Connect => strings(&["COM3"]),
        CommandKind::InitCardEncoder
        | CommandKind::InitCard
        | CommandKind::ReadCard
        | CommandKind::ClearCard
        | CommandKind::ReadCancellationInfo
        | CommandKind::DeinitCard => strings(&[CREDENTIAL]),
        CommandKind::WriteCard => strings(&[
            CREDENTIAL,
            "1",
            "5",
            "AABBCCDDEEFF",
            "1700086400",
            "False",
        ]),
        CommandKind::Beep => strings(&["100", "50", "3"]),
        CommandKind::CancelCard => strings(&[CREDENTIAL, "889", "1700000000"]),
        CommandKind::ConfigServer => strings(&["https://example.test/api"]),
        CommandKind::SetSectors => strings(&["1,2,3"]),
        CommandKind::ReadSectorRawData | CommandKind::WriteSectorRawData => {
            strings(&["2", "1", "True", "FFFFFFFFFFFF", BLOCK_HEX])
        }
        _ => Vec::new(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The reply a healthy encoder gives for `kind`.
pub fn success_reply(kind: CommandKind) -> Reply {
    match kind.shape() {
        ResponseShape::Status => Reply::Ack,
        ResponseShape::Value => Reply::Value(format!("{}-value", kind.name())),
        ResponseShape::Flag => Reply::Flag(true),
        ResponseShape::StatusWithBlock => Reply::Block(BLOCK_HEX.into()),
    }
}
