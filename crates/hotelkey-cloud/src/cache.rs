//! In-memory credential cache.
//!
//! The cache holds at most one [`CredentialInfo`]. A [`CredentialCache::get`]
//! inside the validity window returns the cached value; outside it, the
//! caller fetches a replacement while holding the cache lock, so concurrent
//! callers wait for that fetch and then observe its value instead of issuing
//! their own.
//!
//! A failed fetch leaves the cache untouched. Callers waiting behind a failed
//! fetch run their own attempt in turn.
//!
//! Expiry is tracked with [`tokio::time::Instant`], which lets tests drive it
//! with a paused clock.
//!
//! # Example
//!
//! ```
//! use hotelkey_cloud::{CredentialCache, CredentialInfo, CredentialSource, Result};
//! use chrono::Utc;
//! use std::time::Duration;
//!
//! struct Fixed;
//!
//! impl CredentialSource for Fixed {
//!     async fn fetch_credential_info(&self) -> Result<CredentialInfo> {
//!         Ok(CredentialInfo::new("1", "Demo", "payload", Utc::now(), Duration::from_secs(600)))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let cache = CredentialCache::new(Fixed);
//!     let first = cache.get().await?;
//!     let second = cache.get().await?;
//!     assert!(std::sync::Arc::ptr_eq(&first, &second));
//!     Ok(())
//! }
//! ```

#![allow(async_fn_in_trait)]

use crate::{CredentialInfo, Result};
use hotelkey_core::constants::CREDENTIAL_VALIDITY_SECS;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Anything that can produce fresh credential material.
pub trait CredentialSource: Send + Sync {
    /// Fetch credential info. No caching, no retry.
    async fn fetch_credential_info(&self) -> Result<CredentialInfo>;
}

#[derive(Debug)]
struct Entry {
    info: Arc<CredentialInfo>,
    expires_at: Instant,
}

impl Entry {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Single-slot, time-bounded credential cache.
#[derive(Debug)]
pub struct CredentialCache<S> {
    source: S,
    validity: Duration,
    slot: Mutex<Option<Entry>>,
}

impl<S: CredentialSource> CredentialCache<S> {
    /// Cache with the default 10 minute validity window.
    pub fn new(source: S) -> Self {
        Self::with_validity(source, Duration::from_secs(CREDENTIAL_VALIDITY_SECS))
    }

    pub fn with_validity(source: S, validity: Duration) -> Self {
        Self {
            source,
            validity,
            slot: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Return valid credentials, fetching them if needed.
    ///
    /// # Errors
    /// Propagates the source's error; the cache is not updated.
    pub async fn get(&self) -> Result<Arc<CredentialInfo>> {
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref()
            && entry.is_fresh()
        {
            return Ok(Arc::clone(&entry.info));
        }

        debug!(expired = slot.is_some(), "Refreshing hotel credentials");
        let mut info = self
            .source
            .fetch_credential_info()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to fetch hotel credentials"))?;
        info.set_validity(self.validity);

        let info = Arc::new(info);
        *slot = Some(Entry {
            info: Arc::clone(&info),
            expires_at: Instant::now() + self.validity,
        });

        info!(
            hotel_id = %info.hotel_id,
            valid_until = %info.valid_until,
            "Hotel credentials cached"
        );
        Ok(info)
    }

    /// Cached credentials if still valid; never fetches.
    pub async fn cached(&self) -> Option<Arc<CredentialInfo>> {
        self.slot
            .lock()
            .await
            .as_ref()
            .filter(|entry| entry.is_fresh())
            .map(|entry| Arc::clone(&entry.info))
    }

    /// Drop the cached credentials so the next `get` fetches.
    pub async fn invalidate(&self) {
        if self.slot.lock().await.take().is_some() {
            debug!("Hotel credentials invalidated");
        }
    }
}
