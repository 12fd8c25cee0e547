//! Multi-step card workflows.
//!
//! Each workflow resolves the hotel credentials, then runs its steps inside
//! [`EncoderSession::with_connection`], so the encoder is released on every
//! exit path:
//!
//! ```text
//! encode: credentials → connect → init_card_encoder → init_card
//!         → write_card_access → read_card_data → disconnect
//! read:   credentials → connect → init_card_encoder → read_card_data
//!         → disconnect
//! ```
//!
//! The first failing step aborts the rest and its error is returned. A
//! credential failure happens before anything is spawned.

use crate::{EncoderSession, Result, SessionError};
use hotelkey_bridge::BridgeTransport;
use hotelkey_cloud::CredentialSource;
use hotelkey_core::{CardAccessRecord, CardDataRecord};
use tracing::{debug, error, info};

impl<T: BridgeTransport, S: CredentialSource> EncoderSession<T, S> {
    /// Encode a guest card on `port` and read it back.
    ///
    /// # Errors
    /// The first failing step; see the module docs.
    pub async fn perform_complete_card_encoding(
        &self,
        port: &str,
        access: &CardAccessRecord,
    ) -> Result<CardDataRecord> {
        let outcome = self.encode_card(port, access).await;
        self.report("card encoding", port, &outcome);
        outcome
    }

    /// Read the card currently on the encoder at `port`.
    ///
    /// # Errors
    /// The first failing step; see the module docs.
    pub async fn perform_card_reading(&self, port: &str) -> Result<CardDataRecord> {
        let outcome = self.read_card(port).await;
        self.report("card reading", port, &outcome);
        outcome
    }

    async fn encode_card(&self, port: &str, access: &CardAccessRecord) -> Result<CardDataRecord> {
        self.credential().await?;
        self.with_connection(port, |session| async move {
            session.init_card_encoder().await?;
            session.init_card().await?;
            session.write_card_access(access).await?;
            session.read_card_data().await
        })
        .await
    }

    async fn read_card(&self, port: &str) -> Result<CardDataRecord> {
        self.credential().await?;
        self.with_connection(port, |session| async move {
            session.init_card_encoder().await?;
            session.read_card_data().await
        })
        .await
    }

    fn report(&self, workflow: &'static str, port: &str, outcome: &Result<CardDataRecord>) {
        match outcome {
            Ok(card) => info!(workflow, port, card_number = %card.card_number, "Workflow completed"),
            Err(e) if self.options().log_errors => log_failure(workflow, port, e),
            Err(e) => debug!(workflow, port, error = %e, "Workflow failed"),
        }
    }
}

fn log_failure(workflow: &'static str, port: &str, e: &SessionError) {
    match e.device_code() {
        Some(code) => error!(workflow, port, code = code.code(), error = %e, "Workflow failed"),
        None => error!(workflow, port, error = %e, "Workflow failed"),
    }
}
