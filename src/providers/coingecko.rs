//! CoinGecko crypto price adapter

use crate::cache::CRYPTO_TTL_MS;
use crate::error::{AppError, Result};
use crate::http::{fetch_with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::providers::types::CryptoPrice;
use crate::providers::Provider;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Tracked assets in display order: (CoinGecko id, ticker, display name)
const ASSETS: [(&str, &str, &str); 3] = [
    ("bitcoin", "BTC", "Bitcoin"),
    ("ethereum", "ETH", "Ethereum"),
    ("gold", "GOLD", "Gold"),
];

/// CoinGecko simple-price adapter
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Fetch the tracked asset prices
    pub async fn fetch_prices(&self) -> Result<Vec<CryptoPrice>> {
        let ids: Vec<&str> = ASSETS.iter().map(|(id, _, _)| *id).collect();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true",
            self.base_url,
            ids.join(",")
        );

        let response = fetch_with_retry(&self.client, &url, DEFAULT_MAX_ATTEMPTS).await?;
        let body: Value = response.json().await?;

        parse_simple_price(&body)
    }
}

/// Parse a CoinGecko `/simple/price` response.
///
/// Assets missing from the response are silently omitted, so the output may
/// hold 0-3 entries. A present asset with a missing or non-numeric field is
/// a format error.
pub fn parse_simple_price(body: &Value) -> Result<Vec<CryptoPrice>> {
    let mut prices = Vec::new();

    for (id, symbol, name) in ASSETS {
        let Some(entry) = body.get(id) else {
            continue;
        };

        let price = entry
            .get("usd")
            .and_then(Value::as_f64)
            .ok_or_else(|| AppError::DataFormat(format!("{} missing numeric 'usd'", id)))?;

        let change_24h = entry
            .get("usd_24h_change")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                AppError::DataFormat(format!("{} missing numeric 'usd_24h_change'", id))
            })?;

        prices.push(CryptoPrice {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change_24h,
        });
    }

    Ok(prices)
}

#[async_trait]
impl Provider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        "crypto"
    }

    fn name(&self) -> &'static str {
        "Crypto Prices"
    }

    fn ttl_ms(&self) -> i64 {
        CRYPTO_TTL_MS
    }

    async fn fetch(&self) -> Result<serde_json::Value> {
        let prices = self.fetch_prices().await?;
        Ok(serde_json::to_value(prices)?)
    }
}
