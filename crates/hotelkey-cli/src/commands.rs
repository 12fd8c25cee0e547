//! Subcommands and their execution.

use anyhow::{Context, Result};
use chrono::Utc;
use hotelkey_bridge::AnyBridge;
use hotelkey_cloud::CloudClient;
use hotelkey_core::{CardAccessRecord, EncoderConfig, MacAddress, SectorDescriptor};
use hotelkey_session::EncoderSession;
use serde_json::{Value, json};
use std::future::Future;
use tracing::warn;

type Session = EncoderSession<AnyBridge, CloudClient>;

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Encode a guest card and read it back.
    Encode {
        /// Building number the card opens.
        #[arg(long, default_value = "1")]
        building: u16,
        /// Floor number the card opens.
        #[arg(long, default_value = "1")]
        floor: u16,
        /// MAC of the lock the card opens (12 hex digits).
        #[arg(long)]
        mac: String,
        /// Validity in hours (defaults to HOTELKEY_CARD_DEFAULT_EXPIRY_HOURS).
        #[arg(long)]
        hours: Option<i64>,
        /// Allow opening locks in lock-out mode.
        #[arg(long)]
        allow_lock_out: bool,
    },
    /// Read the card on the encoder.
    Read,
    /// Show the hotel the cloud credentials belong to.
    HotelInfo,
    /// Show the cloud server clock.
    ServerTime,
    /// Show the encoder firmware version.
    Version,
    /// Sound the encoder buzzer with the configured pattern.
    Beep,
    /// Erase the card on the encoder.
    Clear,
    /// Revoke a card number.
    Cancel {
        /// Card number to revoke.
        card_number: String,
        /// Revocation time in epoch seconds (defaults to now).
        #[arg(long)]
        timestamp: Option<u32>,
    },
    /// List cancellations stored on the encoder.
    Cancellations,
    /// Point the bridge at a lock server.
    ConfigServer {
        /// Server URL.
        url: String,
    },
    /// Read one raw block from the card.
    ReadSector {
        /// Sector number.
        sector: u8,
        /// Block number within the sector.
        block: u8,
        /// Sector key (12 hex digits).
        #[arg(long, default_value = "FFFFFFFFFFFF")]
        key: String,
        /// Authenticate with the key.
        #[arg(long)]
        encrypted: bool,
    },
}

/// Execute `command` and return its JSON result.
pub async fn run(
    session: &Session,
    config: &EncoderConfig,
    port: &str,
    command: Command,
) -> Result<Value> {
    let auto_disconnect = config.error_handling.auto_disconnect_on_error;

    match command {
        Command::Encode {
            building,
            floor,
            mac,
            hours,
            allow_lock_out,
        } => {
            let now = Utc::now();
            let timestamp = match hours {
                Some(hours) => config.card.expiry_timestamp(now, hours)?,
                None => config.card.default_expiry_timestamp(now)?,
            };
            let access = CardAccessRecord::new(
                building,
                floor,
                MacAddress::new(&mac)?,
                timestamp,
                allow_lock_out,
            );
            let card = session
                .perform_complete_card_encoding(port, &access)
                .await
                .context("Card encoding failed")?;
            Ok(json!({ "card": card, "expiresAt": timestamp }))
        }
        Command::Read => {
            let card = session
                .perform_card_reading(port)
                .await
                .context("Card reading failed")?;
            Ok(json!({ "card": card }))
        }
        Command::HotelInfo => {
            let info = session
                .credentials()
                .get()
                .await
                .context("Failed to fetch hotel credentials")?;
            Ok(serde_json::to_value(info.as_ref())?)
        }
        Command::ServerTime => {
            let seconds = session.credentials().source().fetch_server_time().await?;
            Ok(json!({ "serverTime": seconds }))
        }
        Command::Version => {
            let version =
                single(session, port, auto_disconnect, |s| async move { s.version().await })
                    .await?;
            Ok(json!({ "version": version }))
        }
        Command::Beep => {
            single(session, port, auto_disconnect, |s| async move { s.beep_default().await })
                .await?;
            Ok(json!({ "beeped": true }))
        }
        Command::Clear => {
            single(session, port, auto_disconnect, |s| async move { s.clear_card().await })
                .await?;
            Ok(json!({ "cleared": true }))
        }
        Command::Cancel {
            card_number,
            timestamp,
        } => {
            let timestamp = match timestamp {
                Some(timestamp) => timestamp,
                None => u32::try_from(Utc::now().timestamp())
                    .context("Current time does not fit a card timestamp")?,
            };
            let number = card_number.as_str();
            single(session, port, auto_disconnect, |s| async move {
                s.cancel_card(number, timestamp).await
            })
            .await?;
            Ok(json!({ "cancelled": card_number, "timestamp": timestamp }))
        }
        Command::Cancellations => {
            let records = single(session, port, auto_disconnect, |s| async move {
                s.read_cancellation_info().await
            })
            .await?;
            Ok(json!({ "cancellations": records }))
        }
        Command::ConfigServer { url } => {
            let accepted = session.config_server(&url).await?;
            Ok(json!({ "url": url, "accepted": accepted }))
        }
        Command::ReadSector {
            sector,
            block,
            key,
            encrypted,
        } => {
            let descriptor = SectorDescriptor::for_read(sector, block, encrypted, &key)?;
            let descriptor = &descriptor;
            let data = single(session, port, auto_disconnect, |s| async move {
                s.read_sector_raw_data(descriptor).await
            })
            .await?;
            Ok(json!({ "sector": sector, "block": block, "data": data }))
        }
    }
}

/// Connect, run one command, and disconnect.
///
/// After a failed command the encoder is only released when
/// `auto_disconnect` is set.
async fn single<'a, R, F, Fut>(
    session: &'a Session,
    port: &str,
    auto_disconnect: bool,
    op: F,
) -> Result<R>
where
    F: FnOnce(&'a Session) -> Fut,
    Fut: Future<Output = hotelkey_session::Result<R>>,
{
    session.connect(port).await?;

    match op(session).await {
        Ok(value) => {
            session.disconnect().await?;
            Ok(value)
        }
        Err(e) => {
            if auto_disconnect {
                if let Err(release) = session.disconnect().await {
                    warn!(error = %release, "Failed to disconnect after error");
                }
            } else {
                warn!(port, "Leaving encoder connected after failed command");
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotelkey_bridge::{MockBridge, MockReply};
    use hotelkey_cloud::CredentialCache;
    use hotelkey_core::CloudConfig;
    use hotelkey_protocol::CommandKind;
    use hotelkey_session::SessionOptions;
    use rstest::rstest;

    const PORT: &str = "COM7";

    fn setup(auto_disconnect: bool) -> (MockBridge, Session, EncoderConfig) {
        let mut config = EncoderConfig::new(CloudConfig::new("client-id", "client-secret"));
        config.error_handling.auto_disconnect_on_error = auto_disconnect;

        let bridge = MockBridge::new();
        let cloud = CloudClient::new(&config.cloud).unwrap();
        let session = EncoderSession::with_options(
            AnyBridge::Mock(bridge.clone()),
            CredentialCache::new(cloud),
            SessionOptions::from_config(&config),
        );
        (bridge, session, config)
    }

    #[rstest]
    #[case(true, 1)]
    #[case(false, 0)]
    #[tokio::test]
    async fn test_failed_command_honours_auto_disconnect(
        #[case] auto_disconnect: bool,
        #[case] disconnects: usize,
    ) {
        let (bridge, session, config) = setup(auto_disconnect);
        bridge.push_reply(CommandKind::GetVersion, MockReply::exit(1, "reader error"));

        let result = run(&session, &config, PORT, Command::Version).await;

        assert!(result.is_err());
        assert_eq!(bridge.count(CommandKind::Disconnect), disconnects);
        assert_eq!(session.is_connected(), !auto_disconnect);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    #[tokio::test]
    async fn test_successful_command_always_disconnects(#[case] auto_disconnect: bool) {
        let (bridge, session, config) = setup(auto_disconnect);

        let output = run(&session, &config, PORT, Command::Beep).await.unwrap();

        assert_eq!(output, json!({ "beeped": true }));
        assert_eq!(
            bridge.commands(),
            [CommandKind::Connect, CommandKind::Beep, CommandKind::Disconnect]
        );
        assert!(!session.is_connected());
    }
}
