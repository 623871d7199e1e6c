//! Periodic refresh scheduling
//!
//! Mount-time refreshes run through the services directly; these helpers
//! start the long-lived pollers that keep mounted widgets current (currency
//! hourly, Spotify every few seconds). The crypto widget re-fetches only on
//! mount through its TTL check and has no poller. Each poller registers on
//! [`AppState`] so unmounting can stop it.

mod poller;

pub use poller::{PollerHandle, WidgetPoller};

use crate::cache::{CURRENCY_TTL_MS, SPOTIFY_POLL_MS};
use crate::providers::types::PlaybackState;
use crate::providers::{WIDGET_CURRENCY, WIDGET_SPOTIFY};
use crate::services::{CurrencyService, SpotifyService};
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

const CURRENCY_PERIOD: Duration = Duration::from_millis(CURRENCY_TTL_MS as u64);
const SPOTIFY_PERIOD: Duration = Duration::from_millis(SPOTIFY_POLL_MS as u64);

/// Start the hourly currency poller and register it on the state.
///
/// Ticks force the fetch; the wall-clock interval, not the cache TTL, is
/// what keeps the displayed rates current.
pub fn start_currency_poller(state: Arc<AppState>) {
    let task_state = state.clone();
    let handle = WidgetPoller::spawn(WIDGET_CURRENCY, CURRENCY_PERIOD, move || {
        let state = task_state.clone();
        async move { CurrencyService::refresh(&state, true).await.map(|_| ()) }
    });
    state.register_poller(WIDGET_CURRENCY, handle);
}

/// Start the now-playing poller; each snapshot goes to `on_playback`.
///
/// A tick that lands while the previous poll is still in flight is skipped.
pub fn start_spotify_poller<F>(state: Arc<AppState>, on_playback: F)
where
    F: Fn(PlaybackState) + Send + Sync + 'static,
{
    let task_state = state.clone();
    let on_playback = Arc::new(on_playback);

    let handle = WidgetPoller::spawn(WIDGET_SPOTIFY, SPOTIFY_PERIOD, move || {
        let state = task_state.clone();
        let on_playback = on_playback.clone();
        async move {
            if let Some(playback) = SpotifyService::poll(&state).await? {
                on_playback(playback);
            }
            Ok(())
        }
    });
    state.register_poller(WIDGET_SPOTIFY, handle);
}
