//! Encoder control session.
//!
//! An [`EncoderSession`] owns one bridge transport and one credential cache
//! and is the only way commands reach the encoder. It keeps the connection
//! state and enforces three rules before anything is spawned:
//!
//! - commands that need the device fail with [`SessionError::NotConnected`]
//!   while disconnected;
//! - commands that carry the hotel credential resolve it first and fail with
//!   [`SessionError::CredentialUnavailable`] if that fails;
//! - commands run one at a time, in arrival order.
//!
//! # Serialization
//!
//! Every command holds the session's command lock (a fair
//! [`tokio::sync::Mutex`]) for all of its bridge invocations, so callers
//! that arrive while a command is running queue behind it. `read_card_data`
//! keeps the lock across its three invocations.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use hotelkey_bridge::MockBridge;
//! use hotelkey_cloud::{CredentialCache, CredentialInfo, CredentialSource};
//! use hotelkey_session::EncoderSession;
//! use std::time::Duration;
//!
//! struct Fixed;
//!
//! impl CredentialSource for Fixed {
//!     async fn fetch_credential_info(&self) -> hotelkey_cloud::Result<CredentialInfo> {
//!         Ok(CredentialInfo::new("1", "Demo", "payload", Utc::now(), Duration::from_secs(600)))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> hotelkey_session::Result<()> {
//!     let session = EncoderSession::new(MockBridge::new(), CredentialCache::new(Fixed));
//!
//!     session.connect("COM3").await?;
//!     session.init_card_encoder().await?;
//!     let card = session.read_card_data().await?;
//!     session.disconnect().await?;
//!
//!     assert!(!card.card_number.is_empty());
//!     Ok(())
//! }
//! ```

use crate::{ConnectionState, Result, RetryPolicy, SessionError};
use hotelkey_bridge::BridgeTransport;
use hotelkey_cloud::{CredentialCache, CredentialInfo, CredentialSource};
use hotelkey_core::{
    BeepPattern, CardAccessRecord, CardDataRecord, EncoderConfig, EncoderSettings,
    SectorDescriptor,
};
use hotelkey_protocol::{
    BridgeCommand, CancellationRecord, CommandKind, EncoderVersion, Parsed, ProtocolError,
    decode_block, decode_flag, decode_status, decode_value,
};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

/// Tunables for an [`EncoderSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Timeout for the bridge `connect` invocation.
    pub connection_timeout: Duration,

    /// Timeout for every other bridge invocation.
    pub command_timeout: Duration,

    /// Connect retry policy.
    pub retry: RetryPolicy,

    /// Pattern used by [`EncoderSession::beep_default`].
    pub beep: BeepPattern,

    /// Log workflow failures at `error` level instead of `debug`.
    pub log_errors: bool,
}

impl SessionOptions {
    pub fn from_config(config: &EncoderConfig) -> Self {
        Self {
            connection_timeout: config.encoder.connection_timeout(),
            command_timeout: config.encoder.command_timeout(),
            retry: RetryPolicy::from_config(&config.encoder, &config.error_handling),
            beep: config.card.beep,
            log_errors: config.error_handling.log_errors,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        let encoder = EncoderSettings::default();
        Self {
            connection_timeout: encoder.connection_timeout(),
            command_timeout: encoder.command_timeout(),
            retry: RetryPolicy::default(),
            beep: BeepPattern::default(),
            log_errors: true,
        }
    }
}

/// Stateful, serialized access to one encoder.
#[derive(Debug)]
pub struct EncoderSession<T, S> {
    transport: T,
    credentials: CredentialCache<S>,
    options: SessionOptions,
    state: Mutex<ConnectionState>,
    commands: AsyncMutex<()>,
    lease: AsyncMutex<()>,
}

impl<T: BridgeTransport, S: CredentialSource> EncoderSession<T, S> {
    /// Session with default timeouts and retry policy.
    pub fn new(transport: T, credentials: CredentialCache<S>) -> Self {
        Self::with_options(transport, credentials, SessionOptions::default())
    }

    pub fn with_options(transport: T, credentials: CredentialCache<S>, options: SessionOptions) -> Self {
        Self {
            transport,
            credentials,
            options,
            state: Mutex::new(ConnectionState::Disconnected),
            commands: AsyncMutex::new(()),
            lease: AsyncMutex::new(()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn credentials(&self) -> &CredentialCache<S> {
        &self.credentials
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Snapshot of the connection state.
    pub fn state(&self) -> ConnectionState {
        self.lock_state().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.lock_state().is_connected()
    }

    // ---- connection ----

    /// Open the encoder on `port`.
    ///
    /// Connecting to the port already bound is a no-op. Transport failures
    /// are retried according to the session's [`RetryPolicy`].
    ///
    /// # Errors
    /// `AlreadyConnected` if bound to a different port (state unchanged),
    /// otherwise the failure of the last connect attempt.
    pub async fn connect(&self, port: &str) -> Result<()> {
        self.open(port).await.map(drop)
    }

    /// Connect and report whether this call opened the connection. `false`
    /// means the session was already bound to `port`.
    async fn open(&self, port: &str) -> Result<bool> {
        let _turn = self.commands.lock().await;

        match self.state() {
            ConnectionState::Connected { port: bound } if bound == port => {
                debug!(port, "Encoder already connected");
                return Ok(false);
            }
            ConnectionState::Connected { port: bound } => {
                return Err(SessionError::AlreadyConnected { port: bound });
            }
            ConnectionState::Disconnected => {}
        }

        self.options
            .retry
            .run("connect", || {
                let command = BridgeCommand::Connect {
                    port: port.to_string(),
                };
                async move { self.status(command).await }
            })
            .await?;

        self.set_state(ConnectionState::Connected {
            port: port.to_string(),
        });
        info!(port, "Encoder connected");
        Ok(true)
    }

    /// Close the encoder. A no-op while disconnected.
    ///
    /// # Errors
    /// The bridge's failure; the session stays connected in that case.
    pub async fn disconnect(&self) -> Result<()> {
        let _turn = self.commands.lock().await;

        if !self.is_connected() {
            debug!("Encoder already disconnected");
            return Ok(());
        }

        self.status(BridgeCommand::Disconnect).await?;
        self.set_state(ConnectionState::Disconnected);
        info!("Encoder disconnected");
        Ok(())
    }

    /// Run `work` with the encoder connected on `port`, releasing it on
    /// every exit path.
    ///
    /// The scope owns the connection unless the session is already bound to
    /// `port`, in which case `work` runs without connecting or releasing.
    /// Release issues exactly one bridge `disconnect`, also after a failed
    /// connect, and leaves the session disconnected whatever the bridge
    /// answers. Scopes on one session run one at a time and must not be
    /// nested.
    ///
    /// # Errors
    /// The first failure of connect or `work`; a release failure after such
    /// an error is only logged. If everything else succeeded, a release
    /// failure is returned.
    pub async fn with_connection<'a, R, F, Fut>(&'a self, port: &str, work: F) -> Result<R>
    where
        F: FnOnce(&'a Self) -> Fut,
        Fut: Future<Output = Result<R>> + 'a,
    {
        let _lease = self.lease.lock().await;

        let outcome = match self.open(port).await {
            Ok(true) => work(self).await,
            Ok(false) => {
                debug!(port, "Reusing open encoder connection");
                return work(self).await;
            }
            Err(e @ SessionError::AlreadyConnected { .. }) => return Err(e),
            Err(e) => Err(e),
        };
        let released = self.release().await;

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release)) => {
                warn!(error = %release, "Failed to release encoder after error");
                Err(e)
            }
        }
    }

    /// Unconditional disconnect used by [`EncoderSession::with_connection`].
    async fn release(&self) -> Result<()> {
        let _turn = self.commands.lock().await;
        let result = self.status(BridgeCommand::Disconnect).await;
        self.set_state(ConnectionState::Disconnected);
        if result.is_ok() {
            info!("Encoder released");
        }
        result
    }

    // ---- credential-bound commands ----

    /// Prime the encoder with the hotel credential.
    pub async fn init_card_encoder(&self) -> Result<()> {
        let _turn = self.begin(CommandKind::InitCardEncoder).await?;
        let credential = self.credential().await?;
        self.status(BridgeCommand::InitCardEncoder {
            credential: credential.payload.clone(),
        })
        .await
    }

    /// Prepare the card on the encoder for writing.
    pub async fn init_card(&self) -> Result<()> {
        let _turn = self.begin(CommandKind::InitCard).await?;
        let credential = self.credential().await?;
        self.status(BridgeCommand::InitCard {
            credential: credential.payload.clone(),
        })
        .await
    }

    /// Write access rights onto the card.
    pub async fn write_card_access(&self, access: &CardAccessRecord) -> Result<()> {
        let _turn = self.begin(CommandKind::WriteCard).await?;
        let credential = self.credential().await?;
        debug!(
            building = access.building_number,
            floor = access.floor_number,
            mac = %access.mac,
            timestamp = access.timestamp,
            "Writing card access"
        );
        self.status(BridgeCommand::WriteCard {
            credential: credential.payload.clone(),
            access: access.clone(),
        })
        .await
    }

    /// Read the card: hotel array, then card number, then card id.
    ///
    /// # Errors
    /// The first failing read; partial results are discarded.
    pub async fn read_card_data(&self) -> Result<CardDataRecord> {
        let _turn = self.begin(CommandKind::ReadCard).await?;
        let credential = self.credential().await?;

        let hotel_array = self
            .value(BridgeCommand::ReadCard {
                credential: credential.payload.clone(),
            })
            .await?;
        let card_number = self.value(BridgeCommand::GetCardNo).await?;
        let card_id = self.value(BridgeCommand::GetCardId).await?;

        let record = CardDataRecord::new(card_number, card_id, hotel_array)?;
        debug!(card_number = %record.card_number, "Card read");
        Ok(record)
    }

    pub async fn clear_card(&self) -> Result<()> {
        let _turn = self.begin(CommandKind::ClearCard).await?;
        let credential = self.credential().await?;
        self.status(BridgeCommand::ClearCard {
            credential: credential.payload.clone(),
        })
        .await
    }

    /// Revoke a card number as of `timestamp` (epoch seconds).
    pub async fn cancel_card(&self, card_number: &str, timestamp: u32) -> Result<()> {
        let _turn = self.begin(CommandKind::CancelCard).await?;
        let credential = self.credential().await?;
        self.status(BridgeCommand::CancelCard {
            credential: credential.payload.clone(),
            card_number: card_number.to_string(),
            timestamp,
        })
        .await
    }

    /// Cancellation list stored on the encoder. Output that is not a JSON
    /// list reads as empty.
    pub async fn read_cancellation_info(&self) -> Result<Vec<CancellationRecord>> {
        let _turn = self.begin(CommandKind::ReadCancellationInfo).await?;
        let credential = self.credential().await?;
        let text = self
            .value(BridgeCommand::ReadCancellationInfo {
                credential: credential.payload.clone(),
            })
            .await?;

        let parsed = CancellationRecord::parse_list(&text);
        if !parsed.is_structured() {
            debug!(payload = %text, "Cancellation info is not a JSON list");
        }
        Ok(parsed.structured_or_default())
    }

    pub async fn deinit_card(&self) -> Result<()> {
        let _turn = self.begin(CommandKind::DeinitCard).await?;
        let credential = self.credential().await?;
        self.status(BridgeCommand::DeinitCard {
            credential: credential.payload.clone(),
        })
        .await
    }

    // ---- device commands ----

    pub async fn stop_init_card(&self) -> Result<()> {
        let _turn = self.begin(CommandKind::StopInitCard).await?;
        self.status(BridgeCommand::StopInitCard).await
    }

    pub async fn card_number(&self) -> Result<String> {
        let _turn = self.begin(CommandKind::GetCardNo).await?;
        self.value(BridgeCommand::GetCardNo).await
    }

    pub async fn card_id(&self) -> Result<String> {
        let _turn = self.begin(CommandKind::GetCardId).await?;
        self.value(BridgeCommand::GetCardId).await
    }

    pub async fn beep(&self, pattern: BeepPattern) -> Result<()> {
        let _turn = self.begin(CommandKind::Beep).await?;
        self.status(BridgeCommand::Beep(pattern)).await
    }

    /// Beep with the configured pattern.
    pub async fn beep_default(&self) -> Result<()> {
        self.beep(self.options.beep).await
    }

    /// Firmware version; plain-text answers stay opaque.
    pub async fn version(&self) -> Result<Parsed<EncoderVersion>> {
        let _turn = self.begin(CommandKind::GetVersion).await?;
        let text = self.value(BridgeCommand::GetVersion).await?;
        Ok(EncoderVersion::parse(&text))
    }

    /// Point the bridge at a lock server. Works while disconnected.
    pub async fn config_server(&self, url: &str) -> Result<bool> {
        let _turn = self.begin(CommandKind::ConfigServer).await?;
        let command = BridgeCommand::ConfigServer {
            url: url.to_string(),
        };
        let stdout = self.invoke(&command).await?;
        decode_flag(CommandKind::ConfigServer, &stdout)
            .map_err(|e| SessionError::protocol(CommandKind::ConfigServer, e))
    }

    pub async fn set_sectors(&self, sectors: &str) -> Result<()> {
        let _turn = self.begin(CommandKind::SetSectors).await?;
        self.status(BridgeCommand::SetSectors {
            sectors: sectors.to_string(),
        })
        .await
    }

    pub async fn sectors(&self) -> Result<String> {
        let _turn = self.begin(CommandKind::GetSectors).await?;
        self.value(BridgeCommand::GetSectors).await
    }

    /// Read one block; returns 32 uppercase hex digits.
    pub async fn read_sector_raw_data(&self, sector: &SectorDescriptor) -> Result<String> {
        let _turn = self.begin(CommandKind::ReadSectorRawData).await?;
        let command = BridgeCommand::ReadSectorRawData(sector.clone());
        let stdout = self.invoke(&command).await?;
        decode_block(CommandKind::ReadSectorRawData, &stdout)
            .map_err(|e| SessionError::protocol(CommandKind::ReadSectorRawData, e))
    }

    pub async fn write_sector_raw_data(&self, sector: &SectorDescriptor) -> Result<()> {
        let _turn = self.begin(CommandKind::WriteSectorRawData).await?;
        self.status(BridgeCommand::WriteSectorRawData(sector.clone()))
            .await
    }

    pub async fn init_construction_card(&self) -> Result<()> {
        let _turn = self.begin(CommandKind::InitConstructionCard).await?;
        self.status(BridgeCommand::InitConstructionCard).await
    }

    /// Whether the encoder can write CPU cards.
    pub async fn cpu_card_support(&self) -> Result<bool> {
        let _turn = self.begin(CommandKind::GetCpuCardSupport).await?;
        let text = self.value(BridgeCommand::GetCpuCardSupport).await?;
        text.trim().parse::<i32>().map(|flag| flag != 0).map_err(|_| {
            SessionError::protocol(
                CommandKind::GetCpuCardSupport,
                ProtocolError::malformed(text.clone(), "payload is not an integer"),
            )
        })
    }

    // ---- plumbing ----

    /// Wait for this command's turn and check the connection precondition.
    async fn begin(&self, kind: CommandKind) -> Result<tokio::sync::MutexGuard<'_, ()>> {
        let turn = self.commands.lock().await;
        if kind.requires_connection() && !self.is_connected() {
            debug!(command = kind.name(), "Rejected: encoder not connected");
            return Err(SessionError::NotConnected);
        }
        Ok(turn)
    }

    pub(crate) async fn credential(&self) -> Result<Arc<CredentialInfo>> {
        self.credentials
            .get()
            .await
            .map_err(SessionError::CredentialUnavailable)
    }

    async fn invoke(&self, command: &BridgeCommand) -> Result<String> {
        let invocation = command.encode();
        let kind = invocation.kind();
        let timeout = match kind {
            CommandKind::Connect => self.options.connection_timeout,
            _ => self.options.command_timeout,
        };

        debug!(command = kind.name(), timeout_ms = timeout.as_millis(), "Invoking bridge");
        let output = self.transport.invoke(&invocation, timeout).await?;
        if !output.stderr.trim().is_empty() {
            debug!(command = kind.name(), stderr = %output.stderr.trim(), "Bridge diagnostics");
        }
        Ok(output.stdout)
    }

    async fn status(&self, command: BridgeCommand) -> Result<()> {
        let kind = command.kind();
        let stdout = self.invoke(&command).await?;
        decode_status(kind, &stdout).map_err(|e| SessionError::protocol(kind, e))
    }

    async fn value(&self, command: BridgeCommand) -> Result<String> {
        let kind = command.kind();
        let stdout = self.invoke(&command).await?;
        decode_value(kind, &stdout).map_err(|e| SessionError::protocol(kind, e))
    }

    fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: ConnectionState) {
        *self.lock_state() = state;
    }
}
