//! Spotify OAuth token lifecycle manager
//!
//! State machine: `Unauthenticated -> Authenticating -> Authenticated`, with
//! `Authenticated -> Authenticated` on refresh and `Authenticated -> Expired`
//! when no refresh token remains. `Expired` is terminal until the user
//! reconnects. At most one refresh is in flight at a time; an overlapping
//! poll waits behind the refresh lock instead of racing a second refresh.

use crate::auth::launcher::AuthFlowLauncher;
use crate::auth::token::{AuthState, OAuthTokenSet};
use crate::db::sqlite::SqliteDb;
use crate::error::{AppError, Result};
use crate::security::{ClientCredentials, SecurityManager};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

const PROVIDER: &str = "spotify";
const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SCOPES: &str = "user-read-playback-state user-modify-playback-state \
                      user-read-currently-playing user-read-recently-played \
                      playlist-read-private";

/// Treat tokens as expired slightly early so a poll never races the real
/// expiry mid-request.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

/// Build a token set from a provider response, carrying the previous refresh
/// token forward when the provider omits a new one.
fn token_set_from_response(
    response: TokenResponse,
    previous_refresh: Option<String>,
    now: DateTime<Utc>,
) -> OAuthTokenSet {
    OAuthTokenSet {
        access_token: response.access_token,
        refresh_token: response.refresh_token.or(previous_refresh),
        expires_at: now + Duration::seconds(response.expires_in - EXPIRY_MARGIN_SECS),
    }
}

/// Spotify OAuth manager owning the token lifecycle for one dashboard
pub struct SpotifyAuthManager {
    client: Client,
    db: Arc<SqliteDb>,
    security: Arc<SecurityManager>,
    credentials: RwLock<Option<ClientCredentials>>,
    state: RwLock<AuthState>,
    /// Serializes refreshes; overlapping poll ticks wait here
    refresh_lock: tokio::sync::Mutex<()>,
    token_url: String,
}

impl SpotifyAuthManager {
    pub fn new(client: Client, db: Arc<SqliteDb>, security: Arc<SecurityManager>) -> Self {
        Self {
            client,
            db,
            security,
            credentials: RwLock::new(None),
            state: RwLock::new(AuthState::Unauthenticated),
            refresh_lock: tokio::sync::Mutex::new(()),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Override the token endpoint (tests, proxies)
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Set the client credentials used for Basic auth at the token endpoint
    pub fn set_credentials(&self, credentials: ClientCredentials) {
        *self.credentials.write() = Some(credentials);
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.read().is_some()
    }

    /// Current lifecycle state (snapshot)
    pub fn auth_state(&self) -> AuthState {
        self.state.read().clone()
    }

    /// Restore a persisted session, if one exists
    ///
    /// An expired persisted token set still loads as `Authenticated`; the
    /// next poll refreshes or expires it.
    pub fn load_persisted(&self) -> Result<()> {
        if let Some(tokens) = self.db.get_token_set(PROVIDER, &self.security)? {
            info!("Restored persisted Spotify session");
            *self.state.write() = AuthState::Authenticated(tokens);
        }
        Ok(())
    }

    fn build_authorize_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        state_nonce: &str,
    ) -> Result<String> {
        let mut url = Url::parse(AUTHORIZE_URL)
            .map_err(|e| AppError::Internal(format!("Invalid authorize URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", state_nonce)
            .append_pair("scope", SCOPES);

        Ok(url.to_string())
    }

    /// Run the full authorization-code flow through the injected launcher
    pub async fn connect(&self, launcher: &dyn AuthFlowLauncher) -> Result<()> {
        let credentials = self.credentials.read().clone().ok_or_else(|| {
            AppError::Config("Spotify client credentials are not configured".to_string())
        })?;

        *self.state.write() = AuthState::Authenticating;

        let nonce = uuid::Uuid::new_v4().to_string();
        let redirect_uri = launcher.redirect_uri();
        let authorize_url =
            self.build_authorize_url(&credentials.client_id, &redirect_uri, &nonce)?;

        match self
            .run_code_flow(&credentials, launcher, &authorize_url, &nonce, &redirect_uri)
            .await
        {
            Ok(tokens) => {
                self.db.store_token_set(PROVIDER, &tokens, &self.security)?;
                *self.state.write() = AuthState::Authenticated(tokens);
                info!("Spotify connected");
                Ok(())
            }
            Err(e) => {
                *self.state.write() = AuthState::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn run_code_flow(
        &self,
        credentials: &ClientCredentials,
        launcher: &dyn AuthFlowLauncher,
        authorize_url: &str,
        nonce: &str,
        redirect_uri: &str,
    ) -> Result<OAuthTokenSet> {
        let redirect = launcher.launch(authorize_url).await?;

        if redirect.state != nonce {
            return Err(AppError::Auth(
                "Authorization state parameter mismatch".to_string(),
            ));
        }

        self.exchange_code(credentials, &redirect.code, redirect_uri)
            .await
    }

    async fn exchange_code(
        &self,
        credentials: &ClientCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OAuthTokenSet> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Code exchange failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_set_from_response(token_response, None, Utc::now()))
    }

    /// Get a live access token, refreshing transparently when expired.
    ///
    /// Called before every poll operation.
    pub async fn ensure_fresh_token(&self) -> Result<String> {
        match self.auth_state() {
            AuthState::Unauthenticated | AuthState::Authenticating => {
                Err(AppError::Auth("Spotify is not connected".to_string()))
            }
            AuthState::Expired => Err(AppError::Auth(
                "Spotify session expired; reconnect required".to_string(),
            )),
            AuthState::Authenticated(tokens) if !tokens.is_expired() => Ok(tokens.access_token),
            AuthState::Authenticated(_) => self.refresh_current().await,
        }
    }

    async fn refresh_current(&self) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        // A poll that waited here may find the token already refreshed
        let tokens = match self.auth_state() {
            AuthState::Authenticated(tokens) => tokens,
            _ => return Err(AppError::Auth("Spotify is not connected".to_string())),
        };
        if !tokens.is_expired() {
            return Ok(tokens.access_token);
        }

        let Some(refresh_token) = tokens.refresh_token.clone() else {
            *self.state.write() = AuthState::Expired;
            return Err(AppError::Auth(
                "Access token expired and no refresh token is available".to_string(),
            ));
        };

        let credentials = self.credentials.read().clone().ok_or_else(|| {
            AppError::Config("Spotify client credentials are not configured".to_string())
        })?;

        match self
            .refresh(&credentials, &refresh_token, tokens.refresh_token)
            .await
        {
            Ok(new_tokens) => {
                // In-memory state first: a rotated refresh token must never
                // be lost to a failed disk write.
                let access_token = new_tokens.access_token.clone();
                *self.state.write() = AuthState::Authenticated(new_tokens.clone());

                if let Err(e) = self.db.store_token_set(PROVIDER, &new_tokens, &self.security) {
                    warn!("Failed to persist refreshed Spotify tokens: {}", e);
                }

                info!("Spotify access token refreshed");
                Ok(access_token)
            }
            Err(e @ AppError::Auth(_)) => {
                // Refresh token rejected by the provider; session is over
                warn!("Spotify refresh rejected: {}", e);
                *self.state.write() = AuthState::Expired;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn refresh(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
        previous_refresh: Option<String>,
    ) -> Result<OAuthTokenSet> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
        {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Token refresh rejected ({}): {}",
                status, body
            )));
        }
        if !status.is_success() {
            return Err(AppError::Api(format!(
                "Token endpoint returned {}",
                status
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_set_from_response(
            token_response,
            previous_refresh,
            Utc::now(),
        ))
    }

    /// Drop the session and stored tokens
    pub fn disconnect(&self) -> Result<()> {
        self.db.delete_token_set(PROVIDER)?;
        *self.state.write() = AuthState::Unauthenticated;
        info!("Spotify disconnected");
        Ok(())
    }
}
