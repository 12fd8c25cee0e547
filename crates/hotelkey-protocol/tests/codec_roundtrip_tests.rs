//! Encode and decode every bridge command against the bridge's output format.

mod common;

use hotelkey_core::DeviceErrorCode;
use hotelkey_protocol::{
    CancellationRecord, CommandKind, EncoderVersion, Parsed, ProtocolError, Reply, ResponseShape,
    decode, render_status,
};
use rstest::rstest;

#[test]
fn test_every_command_encodes_in_bridge_order() {
    for kind in CommandKind::ALL {
        let invocation = common::sample_command(kind).encode();
        assert_eq!(invocation.kind(), kind);
        assert_eq!(invocation.args()[0], kind.name(), "command name for {kind}");
        assert_eq!(invocation.params(), common::expected_params(kind), "params for {kind}");
    }
}

#[test]
fn test_every_command_decodes_its_success_output() {
    for kind in CommandKind::ALL {
        let reply = common::success_reply(kind);
        let stdout = reply.render(kind);
        assert_eq!(decode(kind, &stdout), Ok(reply), "round trip for {kind}");
    }
}

#[test]
fn test_every_status_command_surfaces_device_codes() {
    let status_kinds = CommandKind::ALL
        .into_iter()
        .filter(|k| matches!(k.shape(), ResponseShape::Status | ResponseShape::StatusWithBlock));

    for kind in status_kinds {
        let stdout = render_status(kind, DeviceErrorCode::CardMisplaced);
        assert_eq!(
            decode(kind, &stdout),
            Err(ProtocolError::Device(DeviceErrorCode::CardMisplaced)),
            "device code for {kind}"
        );
    }
}

#[test]
fn test_write_card_key_mismatch() {
    assert_eq!(
        decode(CommandKind::WriteCard, "Write card result: 106\r\n"),
        Err(ProtocolError::Device(DeviceErrorCode::KeyMismatch))
    );
}

#[rstest]
#[case(CommandKind::Connect, "Error: Port required\n")]
#[case(CommandKind::WriteCard, "Exception: Input string was not in a correct format.\n")]
#[case(CommandKind::GetCardNo, "Exception: Unable to load DLL\n")]
fn test_bridge_reported_errors(#[case] kind: CommandKind, #[case] stdout: &str) {
    assert!(matches!(
        decode(kind, stdout),
        Err(ProtocolError::BridgeReported { .. })
    ));
}

#[test]
fn test_missing_separator_is_malformed() {
    for kind in CommandKind::ALL {
        assert!(
            matches!(
                decode(kind, "garbage without separator\n"),
                Err(ProtocolError::MalformedResponse { .. })
            ),
            "malformed for {kind}"
        );
    }
}

#[test]
fn test_json_payloads_from_bridge_output() {
    let stdout = "Version: {\"firmware\":\"4.1\",\"hardware\":\"E2\",\"protocol\":\"2\"}\n";
    let Reply::Value(text) = decode(CommandKind::GetVersion, stdout).unwrap() else {
        panic!("expected value reply");
    };
    assert_eq!(EncoderVersion::parse(&text).structured().unwrap().firmware, "4.1");

    let Reply::Value(text) =
        decode(CommandKind::ReadCancellationInfo, "Cancellation Info: \n").unwrap()
    else {
        panic!("expected value reply");
    };
    assert_eq!(CancellationRecord::parse_list(&text), Parsed::Structured(vec![]));
}
