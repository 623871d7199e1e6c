//! Bounded exponential-backoff retry for remote API fetches
//!
//! The third-party APIs this dashboard talks to carry no SLA; a short retry
//! ladder smooths over transient blips. Any failure counts the same: a
//! transport fault and a non-2xx status both consume one attempt.

use crate::error::{AppError, Result};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of consecutive attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry an async operation with exponential backoff.
///
/// Attempt `i` (0-indexed) sleeps `2^i` seconds after failing; the first
/// attempt runs immediately. The last error is returned once `max_attempts`
/// consecutive attempts have failed. No jitter.
pub async fn retry_with_backoff<T, E, F, Fut>(
    max_attempts: u32,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(err);
                }

                let wait = Duration::from_secs(1u64 << (attempt - 1));
                warn!(
                    "Attempt {}/{} failed ({}), retrying in {}s",
                    attempt,
                    max_attempts,
                    err,
                    wait.as_secs()
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}

/// GET a URL, retrying on any failure, and accept the first 2xx response.
///
/// Fails with [`AppError::Network`] only after `max_attempts` consecutive
/// failures.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    max_attempts: u32,
) -> Result<reqwest::Response> {
    let result = retry_with_backoff(max_attempts, |attempt| {
        let client = client.clone();
        let url = url.to_string();
        async move {
            debug!("GET {} (attempt {})", url, attempt + 1);

            let response = client.get(&url).send().await.map_err(|e| e.to_string())?;
            let status = response.status();
            if status.is_success() {
                Ok(response)
            } else {
                Err(format!("unexpected status {}", status))
            }
        }
    })
    .await;

    result.map_err(|e| {
        AppError::Network(format!(
            "{} failed after {} attempts: {}",
            url, max_attempts, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_fail_twice_then_succeed() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = tokio::time::Instant::now();

        let result = retry_with_backoff(3, |_| {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("boom".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: std::result::Result<(), String> = retry_with_backoff(3, |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("always down".to_string())
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "always down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_first_success_is_immediate() {
        let result: std::result::Result<u32, String> =
            retry_with_backoff(3, |attempt| async move { Ok(attempt) }).await;
        assert_eq!(result.unwrap(), 0);
    }

    async fn spawn_server(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_attempts_as_network_error() {
        use axum::extract::State;
        use axum::routing::get;

        async fn unavailable(State(hits): State<Arc<AtomicU32>>) -> axum::http::StatusCode {
            hits.fetch_add(1, Ordering::SeqCst);
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        }

        let hits = Arc::new(AtomicU32::new(0));
        let app = axum::Router::new()
            .route("/rates", get(unavailable))
            .with_state(hits.clone());
        let base = spawn_server(app).await;

        let err = fetch_with_retry(&Client::new(), &format!("{}/rates", base), 3)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_first_2xx_is_accepted() {
        use axum::extract::State;
        use axum::routing::get;

        async fn ok(State(hits): State<Arc<AtomicU32>>) -> &'static str {
            hits.fetch_add(1, Ordering::SeqCst);
            "{}"
        }

        let hits = Arc::new(AtomicU32::new(0));
        let app = axum::Router::new()
            .route("/rates", get(ok))
            .with_state(hits.clone());
        let base = spawn_server(app).await;

        let response = fetch_with_retry(&Client::new(), &format!("{}/rates", base), 3)
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
