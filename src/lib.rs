//! ApexGrid - widget dashboard data core
//!
//! Headless data layer for a customizable widget dashboard: crypto prices,
//! currency rates, Spotify now-playing with OAuth token lifecycle, a
//! stale-aware fetch/cache policy per widget, and a time-of-day phase engine
//! for theming. Rendering and the host shell live elsewhere; host
//! capabilities (persistence, OAuth redirect capture) are injected at trait
//! seams.

pub mod auth;
pub mod cache;
pub mod db;
pub mod error;
pub mod http;
pub mod providers;
pub mod scheduler;
pub mod security;
pub mod services;
pub mod state;
pub mod theme;

pub use error::{AppError, Result};
pub use state::AppState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for a host process
///
/// Honors `RUST_LOG` when set; defaults to debug output for this crate.
/// Call once at host startup.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apexgrid=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
