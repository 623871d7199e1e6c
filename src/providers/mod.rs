//! Remote data adapters
//!
//! Each adapter maps one third-party API's response shape into a normalized
//! reading type. Transport and parsing are kept separate: the `parse_*`
//! functions are pure and carry the adapter contracts.

pub mod types;
mod coingecko;
mod exchangerate;
mod spotify;

pub use coingecko::CoinGeckoProvider;
pub use exchangerate::ExchangeRateProvider;
pub use spotify::SpotifyProvider;

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;

/// Widget ids double as provider ids
pub const WIDGET_CRYPTO: &str = "crypto";
pub const WIDGET_CURRENCY: &str = "currency";
pub const WIDGET_SPOTIFY: &str = "spotify";

/// A cache-driven remote data source
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider id (e.g. "crypto", "currency")
    fn id(&self) -> &'static str;

    /// Display name
    fn name(&self) -> &'static str;

    /// How long a cached reading from this source stays fresh
    fn ttl_ms(&self) -> i64;

    /// Fetch and normalize, returned as JSON for the generic cache path
    async fn fetch(&self) -> Result<serde_json::Value>;
}

/// Registry of cache-driven providers, keyed by id
///
/// Spotify is poll-driven and needs a live access token per request, so it
/// lives outside this registry.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create a registry with all cache-driven providers
    pub fn new(client: &Client) -> Self {
        let mut providers: HashMap<String, Arc<dyn Provider>> = HashMap::new();

        providers.insert(
            WIDGET_CRYPTO.to_string(),
            Arc::new(CoinGeckoProvider::new(client.clone())),
        );
        providers.insert(
            WIDGET_CURRENCY.to_string(),
            Arc::new(ExchangeRateProvider::new(client.clone())),
        );

        Self { providers }
    }

    /// Get provider by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(id).cloned()
    }

    /// List all registered providers
    pub fn list(&self) -> Vec<Arc<dyn Provider>> {
        self.providers.values().cloned().collect()
    }
}
