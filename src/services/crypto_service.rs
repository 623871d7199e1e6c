//! Crypto price widget service

use crate::cache::ReadingStore;
use crate::error::{AppError, Result};
use crate::providers::types::CryptoPrice;
use crate::providers::WIDGET_CRYPTO;
use crate::services::fetch_or_cached;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Crypto widget payload handed to the renderer
#[derive(Debug, Clone, Serialize)]
pub struct CryptoReading {
    pub prices: Vec<CryptoPrice>,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
}

/// Crypto price widget operations
pub struct CryptoService;

impl CryptoService {
    /// Refresh the crypto widget.
    ///
    /// With `force` unset, a reading fresher than the crypto TTL is served
    /// from cache without a network round trip. A refresh already in flight
    /// serves the cached reading instead of racing a second fetch.
    pub async fn refresh(state: &AppState, force: bool) -> Result<CryptoReading> {
        info!("Refreshing crypto widget (force: {})", force);

        let provider = state
            .providers
            .get(WIDGET_CRYPTO)
            .ok_or_else(|| AppError::Internal("crypto provider not registered".to_string()))?;

        let _guard = match state.try_begin_refresh(WIDGET_CRYPTO) {
            Some(guard) => guard,
            None => {
                let cached = state.db.load(WIDGET_CRYPTO)?.ok_or_else(|| {
                    AppError::Internal("crypto refresh already in flight".to_string())
                })?;
                return Ok(CryptoReading {
                    prices: serde_json::from_value(cached.payload)?,
                    fetched_at: cached.fetched_at,
                    from_cache: true,
                });
            }
        };

        let outcome = fetch_or_cached(state.db.as_ref(), provider.as_ref(), force).await?;

        Ok(CryptoReading {
            prices: serde_json::from_value(outcome.reading.payload)?,
            fetched_at: outcome.reading.fetched_at,
            from_cache: outcome.from_cache,
        })
    }
}
