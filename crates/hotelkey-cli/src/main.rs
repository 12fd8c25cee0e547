//! hotelkey CLI
//!
//! Drives the hotel card encoder from the command line. Configuration comes
//! from `HOTELKEY_*` environment variables; results are printed to stdout as
//! JSON and logs go to stderr.

mod commands;

use anyhow::Context;
use clap::Parser;
use hotelkey_bridge::{AnyBridge, MockBridge, ProcessBridge};
use hotelkey_cloud::{CloudClient, CredentialCache};
use hotelkey_core::EncoderConfig;
use hotelkey_session::{EncoderSession, SessionOptions};
use std::io;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "hotelkey")]
#[command(version, about = "Hotel card encoder control", long_about = None)]
struct Cli {
    /// Encoder port (defaults to HOTELKEY_ENCODER_PORT)
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Answer from a simulated encoder instead of running the bridge
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "hotelkey=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = EncoderConfig::from_env().context("Failed to load configuration")?;
    let port = cli
        .port
        .unwrap_or_else(|| config.encoder.default_port.clone());

    let bridge = if cli.simulate {
        AnyBridge::Mock(MockBridge::simulated_encoder())
    } else {
        AnyBridge::Process(ProcessBridge::new(&config.encoder.bridge_path))
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        simulated = bridge.is_simulated(),
        port = %port,
        "Starting hotelkey"
    );

    let cloud = CloudClient::new(&config.cloud).context("Failed to create cloud client")?;
    let session = EncoderSession::with_options(
        bridge,
        CredentialCache::new(cloud),
        SessionOptions::from_config(&config),
    );

    let output = commands::run(&session, &config, &port, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hotelkey",
            "encode",
            "--mac",
            "A1B2C3D4E5F6",
            "--hours",
            "48",
            "--simulate",
            "--port",
            "COM9",
        ])
        .unwrap();

        assert!(cli.simulate);
        assert_eq!(cli.port.as_deref(), Some("COM9"));
        assert!(matches!(
            cli.command,
            Command::Encode {
                hours: Some(48),
                building: 1,
                allow_lock_out: false,
                ..
            }
        ));
    }

    #[test]
    fn test_read_sector_defaults() {
        let cli = Cli::try_parse_from(["hotelkey", "read-sector", "4", "1"]).unwrap();
        match cli.command {
            Command::ReadSector {
                sector,
                block,
                key,
                encrypted,
            } => {
                assert_eq!((sector, block), (4, 1));
                assert_eq!(key, "FFFFFFFFFFFF");
                assert!(!encrypted);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
