//! Freshness policy and cached readings
//!
//! Each widget keeps at most one [`CachedReading`] in the host's store.
//! Whether that reading is still usable is decided by the pure [`is_stale`]
//! check against a per-source TTL; the periodic pollers are the authoritative
//! re-fetch trigger, the TTL check only the mount-time decision.

mod store;

pub use store::{MemoryStore, ReadingStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Crypto prices: 5 minutes
pub const CRYPTO_TTL_MS: i64 = 5 * 60 * 1000;

/// Currency rates: 60 minutes
pub const CURRENCY_TTL_MS: i64 = 60 * 60 * 1000;

/// Spotify playback poll period (poll-driven, not cache-driven)
pub const SPOTIFY_POLL_MS: i64 = 5 * 1000;

/// One widget's cached payload plus the moment it was fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedReading<T> {
    pub payload: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CachedReading<T> {
    /// Wrap a freshly fetched payload, stamped with the current time
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            fetched_at: Utc::now(),
        }
    }
}

/// Is a reading fetched at `last_fetched_at` stale at `now`?
///
/// Absent readings are always stale. Pure; no I/O.
pub fn is_stale_at(last_fetched_at: Option<DateTime<Utc>>, ttl_ms: i64, now: DateTime<Utc>) -> bool {
    match last_fetched_at {
        None => true,
        Some(last) => now.signed_duration_since(last).num_milliseconds() > ttl_ms,
    }
}

/// [`is_stale_at`] evaluated at the current wall clock
pub fn is_stale(last_fetched_at: Option<DateTime<Utc>>, ttl_ms: i64) -> bool {
    is_stale_at(last_fetched_at, ttl_ms, Utc::now())
}
