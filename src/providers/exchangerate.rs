//! exchangerate-api currency rate adapter

use crate::cache::CURRENCY_TTL_MS;
use crate::error::{AppError, Result};
use crate::http::{fetch_with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::providers::types::ExchangeRateSet;
use crate::providers::Provider;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const BASE_URL: &str = "https://api.exchangerate-api.com/v4";

/// USD-based rate table adapter
pub struct ExchangeRateProvider {
    client: Client,
    base_url: String,
}

impl ExchangeRateProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Fetch the USD/THB/LAK rate triple
    pub async fn fetch_rates(&self) -> Result<ExchangeRateSet> {
        let url = format!("{}/latest/USD", self.base_url);

        let response = fetch_with_retry(&self.client, &url, DEFAULT_MAX_ATTEMPTS).await?;
        let body: Value = response.json().await?;

        parse_rates(&body)
    }
}

/// Parse an exchangerate-api `/latest/USD` response.
///
/// The currency widget's contract requires all three currencies; a missing
/// code is a hard format error, unlike the crypto adapter's omit-on-absence.
pub fn parse_rates(body: &Value) -> Result<ExchangeRateSet> {
    let rates = body
        .get("rates")
        .ok_or_else(|| AppError::DataFormat("response missing 'rates' table".to_string()))?;

    let rate = |code: &str| -> Result<f64> {
        rates
            .get(code)
            .and_then(Value::as_f64)
            .ok_or_else(|| AppError::DataFormat(format!("rates missing numeric '{}'", code)))
    };

    Ok(ExchangeRateSet {
        usd: 1.0,
        thb: rate("THB")?,
        lak: rate("LAK")?,
    })
}

#[async_trait]
impl Provider for ExchangeRateProvider {
    fn id(&self) -> &'static str {
        "currency"
    }

    fn name(&self) -> &'static str {
        "Currency Rates"
    }

    fn ttl_ms(&self) -> i64 {
        CURRENCY_TTL_MS
    }

    async fn fetch(&self) -> Result<serde_json::Value> {
        let rates = self.fetch_rates().await?;
        Ok(serde_json::to_value(rates)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_rate_table() {
        let body = serde_json::json!({
            "base": "USD",
            "rates": {"THB": 35.2, "LAK": 20100.0, "EUR": 0.92}
        });

        let rates = parse_rates(&body).unwrap();
        assert_eq!(rates.usd, 1.0);
        assert_eq!(rates.thb, 35.2);
        assert_eq!(rates.lak, 20100.0);
    }

    #[test]
    fn test_missing_lak_is_format_error() {
        let body = serde_json::json!({
            "rates": {"THB": 35.2}
        });

        let err = parse_rates(&body).unwrap_err();
        match err {
            AppError::DataFormat(msg) => assert!(msg.contains("LAK")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_rates_table_is_format_error() {
        let err = parse_rates(&serde_json::json!({"base": "USD"})).unwrap_err();
        assert!(matches!(err, AppError::DataFormat(_)));
    }
}
