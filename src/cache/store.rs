//! Reading store boundary
//!
//! The core never touches the host's storage directly: it reads the prior
//! cached state through this trait and hands new readings back through it.

use crate::cache::CachedReading;
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Persistence boundary for widget readings.
///
/// Implementations must keep `fetched_at` monotonically non-decreasing per
/// widget: a save carrying an older timestamp than the stored row is dropped,
/// not an error. Late results from a stopped poller are therefore harmless.
pub trait ReadingStore: Send + Sync {
    fn load(&self, widget_id: &str) -> Result<Option<CachedReading<serde_json::Value>>>;

    fn save(&self, widget_id: &str, reading: &CachedReading<serde_json::Value>) -> Result<()>;
}

/// In-memory store for tests and ephemeral hosts
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, CachedReading<serde_json::Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadingStore for MemoryStore {
    fn load(&self, widget_id: &str) -> Result<Option<CachedReading<serde_json::Value>>> {
        Ok(self.rows.read().get(widget_id).cloned())
    }

    fn save(&self, widget_id: &str, reading: &CachedReading<serde_json::Value>) -> Result<()> {
        let mut rows = self.rows.write();

        if let Some(existing) = rows.get(widget_id) {
            if existing.fetched_at > reading.fetched_at {
                debug!("Discarding out-of-date reading for widget '{}'", widget_id);
                return Ok(());
            }
        }

        rows.insert(widget_id.to_string(), reading.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_load_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.load("crypto").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let store = MemoryStore::new();
        let reading = CachedReading::new(serde_json::json!({"thb": 35.2}));

        store.save("currency", &reading).unwrap();

        let loaded = store.load("currency").unwrap().unwrap();
        assert_eq!(loaded.payload, reading.payload);
        assert_eq!(loaded.fetched_at, reading.fetched_at);
    }

    #[test]
    fn test_older_save_is_discarded() {
        let store = MemoryStore::new();
        let newer = CachedReading::new(serde_json::json!(2));
        let older = CachedReading {
            payload: serde_json::json!(1),
            fetched_at: newer.fetched_at - Duration::seconds(10),
        };

        store.save("crypto", &newer).unwrap();
        store.save("crypto", &older).unwrap();

        let loaded = store.load("crypto").unwrap().unwrap();
        assert_eq!(loaded.payload, serde_json::json!(2));
    }

    #[test]
    fn test_equal_timestamp_overwrites() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = CachedReading {
            payload: serde_json::json!("a"),
            fetched_at: now,
        };
        let second = CachedReading {
            payload: serde_json::json!("b"),
            fetched_at: now,
        };

        store.save("w", &first).unwrap();
        store.save("w", &second).unwrap();

        assert_eq!(store.load("w").unwrap().unwrap().payload, serde_json::json!("b"));
    }
}
