//! Concurrency tests for the credential cache.

use chrono::Utc;
use hotelkey_cloud::{CloudError, CredentialCache, CredentialInfo, CredentialSource, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Source that takes a while per fetch and counts calls.
struct SlowSource {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl SlowSource {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }
}

impl CredentialSource for SlowSource {
    async fn fetch_credential_info(&self) -> Result<CredentialInfo> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(100)).await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(CloudError::transport(Some(500), "Internal Server Error"));
        }
        Ok(CredentialInfo::new(
            "1",
            "Hotel",
            format!("payload-{n}"),
            Utc::now(),
            Duration::from_secs(600),
        ))
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_gets_coalesce_into_one_fetch() {
    let cache = Arc::new(CredentialCache::new(SlowSource::new()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get().await.map(|info| info.payload.clone()) })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "payload-1");
    }
    assert_eq!(cache.source().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_refreshes_once_under_contention() {
    let cache = Arc::new(CredentialCache::new(SlowSource::new()));
    cache.get().await.unwrap();

    tokio::time::advance(Duration::from_secs(601)).await;

    let (a, b) = tokio::join!(cache.get(), cache.get());
    assert_eq!(a.unwrap().payload, "payload-2");
    assert_eq!(b.unwrap().payload, "payload-2");
    assert_eq!(cache.source().calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_keeps_cache_empty() {
    let source = SlowSource::new();
    source.fail.store(true, Ordering::SeqCst);
    let cache = CredentialCache::new(source);

    assert!(cache.get().await.is_err());
    assert!(cache.cached().await.is_none());

    cache.source().fail.store(false, Ordering::SeqCst);
    assert_eq!(cache.get().await.unwrap().payload, "payload-2");
}
