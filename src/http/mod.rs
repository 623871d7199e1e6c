//! HTTP client utilities

mod retry;

pub use retry::{fetch_with_retry, retry_with_backoff, DEFAULT_MAX_ATTEMPTS};
