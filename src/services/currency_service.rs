//! Currency rate widget service

use crate::cache::ReadingStore;
use crate::error::{AppError, Result};
use crate::providers::types::ExchangeRateSet;
use crate::providers::WIDGET_CURRENCY;
use crate::services::fetch_or_cached;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Currency widget payload handed to the renderer
#[derive(Debug, Clone, Serialize)]
pub struct CurrencyReading {
    pub rates: ExchangeRateSet,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
}

/// Currency rate widget operations
pub struct CurrencyService;

impl CurrencyService {
    /// Refresh the currency widget.
    ///
    /// The hourly poller passes `force` so the wall-clock interval stays
    /// authoritative; mount-time calls leave it unset and lean on the TTL.
    pub async fn refresh(state: &AppState, force: bool) -> Result<CurrencyReading> {
        info!("Refreshing currency widget (force: {})", force);

        let provider = state
            .providers
            .get(WIDGET_CURRENCY)
            .ok_or_else(|| AppError::Internal("currency provider not registered".to_string()))?;

        let _guard = match state.try_begin_refresh(WIDGET_CURRENCY) {
            Some(guard) => guard,
            None => {
                let cached = state.db.load(WIDGET_CURRENCY)?.ok_or_else(|| {
                    AppError::Internal("currency refresh already in flight".to_string())
                })?;
                return Ok(CurrencyReading {
                    rates: serde_json::from_value(cached.payload)?,
                    fetched_at: cached.fetched_at,
                    from_cache: true,
                });
            }
        };

        let outcome = fetch_or_cached(state.db.as_ref(), provider.as_ref(), force).await?;

        Ok(CurrencyReading {
            rates: serde_json::from_value(outcome.reading.payload)?,
            fetched_at: outcome.reading.fetched_at,
            from_cache: outcome.from_cache,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedReading;

    #[tokio::test]
    async fn test_fresh_cache_serves_rate_triple() {
        let state = AppState::new_for_testing().unwrap();

        let reading = CachedReading::new(serde_json::json!({
            "usd": 1.0, "thb": 35.2, "lak": 20100.0
        }));
        state.db.save("currency", &reading).unwrap();

        let result = CurrencyService::refresh(&state, false).await.unwrap();

        assert!(result.from_cache);
        assert_eq!(result.rates.usd, 1.0);
        assert_eq!(result.rates.thb, 35.2);
        assert_eq!(result.rates.lak, 20100.0);
    }

    #[tokio::test]
    async fn test_in_flight_refresh_serves_cache() {
        let state = AppState::new_for_testing().unwrap();

        let reading = CachedReading::new(serde_json::json!({
            "usd": 1.0, "thb": 36.0, "lak": 21000.0
        }));
        state.db.save("currency", &reading).unwrap();

        let _guard = state.try_begin_refresh("currency").unwrap();

        let result = CurrencyService::refresh(&state, true).await.unwrap();
        assert!(result.from_cache);
        assert_eq!(result.rates.thb, 36.0);
    }
}
