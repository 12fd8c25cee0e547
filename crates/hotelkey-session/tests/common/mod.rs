//! Shared fixtures for session and workflow tests.

#![allow(dead_code)]

use chrono::Utc;
use hotelkey_bridge::{MockBridge, MockReply};
use hotelkey_cloud::{CloudError, CredentialCache, CredentialInfo, CredentialSource};
use hotelkey_core::{BeepPattern, CardAccessRecord, DeviceErrorCode, MacAddress};
use hotelkey_protocol::{CommandKind, ResponseShape};
use hotelkey_session::{EncoderSession, RetryPolicy, SessionOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const PORT: &str = "COM3";
pub const PAYLOAD: &str = "HOTEL-CREDENTIAL-PAYLOAD";

/// Always hands out the same credential payload.
#[derive(Debug, Default)]
pub struct StaticSource {
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialSource for StaticSource {
    async fn fetch_credential_info(&self) -> hotelkey_cloud::Result<CredentialInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CredentialInfo::new(
            "1001",
            "Test Hotel",
            PAYLOAD,
            Utc::now(),
            Duration::from_secs(600),
        ))
    }
}

/// Cloud that rejects the client.
#[derive(Debug, Default)]
pub struct FailingSource {
    calls: AtomicUsize,
}

impl FailingSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialSource for FailingSource {
    async fn fetch_credential_info(&self) -> hotelkey_cloud::Result<CredentialInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CloudError::api(10003, "invalid client"))
    }
}

pub fn options() -> SessionOptions {
    SessionOptions {
        connection_timeout: Duration::from_secs(1),
        command_timeout: Duration::from_secs(2),
        retry: RetryPolicy::new(2, Duration::from_millis(100)),
        beep: BeepPattern::default(),
        log_errors: true,
    }
}

pub fn session(bridge: &MockBridge) -> EncoderSession<MockBridge, StaticSource> {
    session_with(bridge, options())
}

pub fn session_with(
    bridge: &MockBridge,
    options: SessionOptions,
) -> EncoderSession<MockBridge, StaticSource> {
    EncoderSession::with_options(
        bridge.clone(),
        CredentialCache::new(StaticSource::default()),
        options,
    )
}

pub fn failing_session(bridge: &MockBridge) -> EncoderSession<MockBridge, FailingSource> {
    EncoderSession::with_options(
        bridge.clone(),
        CredentialCache::new(FailingSource::default()),
        options(),
    )
}

pub fn access() -> CardAccessRecord {
    CardAccessRecord::new(
        1,
        2,
        MacAddress::new("A1:B2:C3:D4:E5:F6").unwrap(),
        1_700_086_400,
        false,
    )
}

/// A reply that makes `kind` fail without being retried: a device code for
/// status commands, a nonzero exit for the rest.
pub fn failure_for(kind: CommandKind) -> MockReply {
    match kind.shape() {
        ResponseShape::Status => MockReply::device_code(kind, DeviceErrorCode::Fail),
        _ => MockReply::exit(1, "reader error"),
    }
}
