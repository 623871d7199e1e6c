//! Spotify now-playing widget service
//!
//! Poll-driven: the poller asks every few seconds and pushes whatever comes
//! back. Tokens are refreshed transparently before each call through the
//! auth manager.

use crate::auth::{AuthFlowLauncher, AuthState};
use crate::error::Result;
use crate::providers::types::PlaybackState;
use crate::providers::WIDGET_SPOTIFY;
use crate::security::{ClientCredentials, CredentialStore};
use crate::state::AppState;
use tracing::{debug, info};

/// Spotify widget operations
pub struct SpotifyService;

impl SpotifyService {
    /// Store client credentials and hand them to the auth manager
    pub fn configure(state: &AppState, client_id: String, client_secret: String) -> Result<()> {
        info!("Storing Spotify client credentials");

        let credentials = ClientCredentials {
            client_id,
            client_secret,
        };
        CredentialStore::store(&credentials)?;
        state.spotify_auth.set_credentials(credentials);

        Ok(())
    }

    /// Whether credentials are available for a connect attempt
    pub fn is_configured(state: &AppState) -> bool {
        state.spotify_auth.has_credentials()
    }

    /// Run the authorization flow through the injected launcher
    pub async fn connect(state: &AppState, launcher: &dyn AuthFlowLauncher) -> Result<()> {
        state.spotify_auth.connect(launcher).await
    }

    /// Drop the session; also stops the now-playing poller if one is running
    pub fn disconnect(state: &AppState) -> Result<()> {
        state.stop_widget(WIDGET_SPOTIFY);
        state.spotify_auth.disconnect()
    }

    /// Current token lifecycle state
    pub fn auth_state(state: &AppState) -> AuthState {
        state.spotify_auth.auth_state()
    }

    /// One poll tick: ensure a live token, then fetch the playback snapshot.
    ///
    /// Returns `Ok(None)` when a previous poll is still in flight; the tick
    /// is skipped rather than raced.
    pub async fn poll(state: &AppState) -> Result<Option<PlaybackState>> {
        let _guard = match state.try_begin_refresh(WIDGET_SPOTIFY) {
            Some(guard) => guard,
            None => {
                debug!("Skipping Spotify poll tick; previous poll still in flight");
                return Ok(None);
            }
        };

        let access_token = state.spotify_auth.ensure_fresh_token().await?;
        let playback = state.spotify.currently_playing(&access_token).await?;

        Ok(Some(playback))
    }

    /// Resume playback
    pub async fn play(state: &AppState) -> Result<()> {
        let access_token = state.spotify_auth.ensure_fresh_token().await?;
        state.spotify.play(&access_token).await
    }

    /// Pause playback
    pub async fn pause(state: &AppState) -> Result<()> {
        let access_token = state.spotify_auth.ensure_fresh_token().await?;
        state.spotify.pause(&access_token).await
    }

    /// Skip to the next track
    pub async fn next(state: &AppState) -> Result<()> {
        let access_token = state.spotify_auth.ensure_fresh_token().await?;
        state.spotify.next(&access_token).await
    }

    /// Skip to the previous track
    pub async fn previous(state: &AppState) -> Result<()> {
        let access_token = state.spotify_auth.ensure_fresh_token().await?;
        state.spotify.previous(&access_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_poll_without_session_is_auth_error() {
        let state = AppState::new_for_testing().unwrap();

        let err = SpotifyService::poll(&state).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_overlapping_poll_tick_is_skipped() {
        let state = AppState::new_for_testing().unwrap();
        let _guard = state.try_begin_refresh("spotify").unwrap();

        let result = SpotifyService::poll(&state).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_unconfigured_state_reports_unauthenticated() {
        let state = AppState::new_for_testing().unwrap();
        assert!(!SpotifyService::is_configured(&state));
        assert_eq!(SpotifyService::auth_state(&state).label(), "unauthenticated");
    }
}
