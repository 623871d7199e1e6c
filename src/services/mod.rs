//! Widget services
//!
//! One service per widget, each a thin orchestration layer: freshness check,
//! guarded fetch, persistence, and fallback to the last known-good reading.

mod crypto_service;
mod currency_service;
mod spotify_service;

pub use crypto_service::{CryptoReading, CryptoService};
pub use currency_service::{CurrencyReading, CurrencyService};
pub use spotify_service::SpotifyService;

use crate::cache::{is_stale, CachedReading, ReadingStore};
use crate::error::Result;
use crate::providers::Provider;
use serde_json::Value;
use tracing::{debug, warn};

/// A reading plus where it came from
#[derive(Debug)]
pub(crate) struct ReadingOutcome {
    pub reading: CachedReading<Value>,
    pub from_cache: bool,
}

/// Shared cache-driven refresh path.
///
/// A fresh cached reading is served as-is unless `force` is set. When the
/// fetch fails and a cached reading exists, that reading is served instead;
/// the error only propagates with an empty cache.
pub(crate) async fn fetch_or_cached(
    store: &dyn ReadingStore,
    provider: &dyn Provider,
    force: bool,
) -> Result<ReadingOutcome> {
    let cached = store.load(provider.id())?;

    if !force && !is_stale(cached.as_ref().map(|c| c.fetched_at), provider.ttl_ms()) {
        if let Some(reading) = cached {
            debug!("Serving fresh cached reading for '{}'", provider.id());
            return Ok(ReadingOutcome {
                reading,
                from_cache: true,
            });
        }
    }

    match provider.fetch().await {
        Ok(payload) => {
            let reading = CachedReading::new(payload);
            store.save(provider.id(), &reading)?;
            Ok(ReadingOutcome {
                reading,
                from_cache: false,
            })
        }
        Err(e) => match cached {
            Some(reading) => {
                warn!(
                    "Refresh for '{}' failed, serving last known good: {}",
                    provider.id(),
                    e
                );
                Ok(ReadingOutcome {
                    reading,
                    from_cache: true,
                })
            }
            None => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, CRYPTO_TTL_MS};
    use crate::error::AppError;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeProvider {
        calls: AtomicU32,
        fail: bool,
    }

    impl FakeProvider {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn id(&self) -> &'static str {
            "fake"
        }

        fn name(&self) -> &'static str {
            "Fake"
        }

        fn ttl_ms(&self) -> i64 {
            CRYPTO_TTL_MS
        }

        async fn fetch(&self) -> Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                Err(AppError::Network("fake outage".to_string()))
            } else {
                Ok(serde_json::json!({"call": call}))
            }
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let store = MemoryStore::new();
        let provider = FakeProvider::new(false);

        let first = fetch_or_cached(&store, &provider, false).await.unwrap();
        assert!(!first.from_cache);

        let second = fetch_or_cached(&store, &provider, false).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.reading.payload, first.reading.payload);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_bypasses_fresh_cache() {
        let store = MemoryStore::new();
        let provider = FakeProvider::new(false);

        fetch_or_cached(&store, &provider, false).await.unwrap();
        let forced = fetch_or_cached(&store, &provider, true).await.unwrap();

        assert!(!forced.from_cache);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_cache_triggers_fetch() {
        let store = MemoryStore::new();
        let provider = FakeProvider::new(false);

        let stale = CachedReading {
            payload: serde_json::json!({"old": true}),
            fetched_at: Utc::now() - Duration::milliseconds(CRYPTO_TTL_MS + 1),
        };
        store.save("fake", &stale).unwrap();

        let outcome = fetch_or_cached(&store, &provider, false).await.unwrap();
        assert!(!outcome.from_cache);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_to_cache() {
        let store = MemoryStore::new();
        let provider = FakeProvider::new(true);

        let stale = CachedReading {
            payload: serde_json::json!({"old": true}),
            fetched_at: Utc::now() - Duration::milliseconds(CRYPTO_TTL_MS + 1),
        };
        store.save("fake", &stale).unwrap();

        let outcome = fetch_or_cached(&store, &provider, false).await.unwrap();
        assert!(outcome.from_cache);
        assert_eq!(outcome.reading.payload, serde_json::json!({"old": true}));
    }

    #[tokio::test]
    async fn test_failed_fetch_with_empty_cache_propagates() {
        let store = MemoryStore::new();
        let provider = FakeProvider::new(true);

        let err = fetch_or_cached(&store, &provider, false).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }
}
