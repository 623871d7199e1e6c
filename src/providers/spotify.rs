//! Spotify playback adapter
//!
//! Poll-driven rather than cache-driven: the now-playing widget asks every
//! few seconds and renders whatever comes back. A 204 or 404 from the
//! playback endpoint is the valid "nothing playing" state, not a failure.

use crate::error::{AppError, Result};
use crate::providers::types::{NowPlaying, PlaybackState, Track};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

const BASE_URL: &str = "https://api.spotify.com";

/// Spotify Web API playback adapter
pub struct SpotifyProvider {
    client: Client,
    base_url: String,
}

impl SpotifyProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Fetch the current playback snapshot
    pub async fn currently_playing(&self, access_token: &str) -> Result<PlaybackState> {
        let url = format!("{}/v1/me/player/currently-playing", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            return Ok(PlaybackState::NoTrack);
        }
        if !status.is_success() {
            return Err(AppError::Api(format!(
                "Playback endpoint returned {}",
                status
            )));
        }

        let body: Value = response.json().await?;
        parse_playback(&body)
    }

    /// Resume playback on the active device
    pub async fn play(&self, access_token: &str) -> Result<()> {
        self.control(access_token, Method::PUT, "play").await
    }

    /// Pause playback
    pub async fn pause(&self, access_token: &str) -> Result<()> {
        self.control(access_token, Method::PUT, "pause").await
    }

    /// Skip to the next track
    pub async fn next(&self, access_token: &str) -> Result<()> {
        self.control(access_token, Method::POST, "next").await
    }

    /// Skip to the previous track
    pub async fn previous(&self, access_token: &str) -> Result<()> {
        self.control(access_token, Method::POST, "previous").await
    }

    async fn control(&self, access_token: &str, method: Method, action: &str) -> Result<()> {
        let url = format!("{}/v1/me/player/{}", self.base_url, action);

        let response = self
            .client
            .request(method, &url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Api(format!(
                "Playback control '{}' returned {}",
                action, status
            )));
        }

        Ok(())
    }
}

/// Parse a 2xx currently-playing body.
///
/// A body without a playable `item` (ads, private sessions, podcasts hidden
/// by scope) is `NoTrack`; a present item with malformed fields is a format
/// error.
pub fn parse_playback(body: &Value) -> Result<PlaybackState> {
    let Some(item) = body.get("item").filter(|item| !item.is_null()) else {
        return Ok(PlaybackState::NoTrack);
    };

    let title = item
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::DataFormat("item missing 'name'".to_string()))?
        .to_string();

    let artists = item
        .get("artists")
        .and_then(Value::as_array)
        .map(|artists| {
            artists
                .iter()
                .filter_map(|a| a.get("name").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    let album = item
        .get("album")
        .and_then(|album| album.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let art_url = item
        .get("album")
        .and_then(|album| album.get("images"))
        .and_then(Value::as_array)
        .and_then(|images| images.first())
        .and_then(|image| image.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let duration_ms = item
        .get("duration_ms")
        .and_then(Value::as_u64)
        .ok_or_else(|| AppError::DataFormat("item missing 'duration_ms'".to_string()))?;

    let progress_ms = body
        .get("progress_ms")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let is_playing = body
        .get("is_playing")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(PlaybackState::Active(NowPlaying {
        track: Track {
            title,
            artists,
            album,
            art_url,
            duration_ms,
        },
        progress_ms,
        is_playing,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_body() -> Value {
        serde_json::json!({
            "is_playing": true,
            "progress_ms": 12345,
            "item": {
                "name": "Song One",
                "duration_ms": 200000,
                "artists": [{"name": "Artist A"}, {"name": "Artist B"}],
                "album": {
                    "name": "Album X",
                    "images": [{"url": "https://img.example/cover.jpg"}]
                }
            }
        })
    }

    #[test]
    fn test_parse_active_playback() {
        let state = parse_playback(&playing_body()).unwrap();

        let PlaybackState::Active(now_playing) = state else {
            panic!("expected active playback");
        };
        assert_eq!(now_playing.track.title, "Song One");
        assert_eq!(now_playing.track.artists, "Artist A, Artist B");
        assert_eq!(now_playing.track.album, "Album X");
        assert_eq!(
            now_playing.track.art_url.as_deref(),
            Some("https://img.example/cover.jpg")
        );
        assert_eq!(now_playing.progress_ms, 12345);
        assert!(now_playing.is_playing);
    }

    #[test]
    fn test_missing_item_is_no_track() {
        let state = parse_playback(&serde_json::json!({"is_playing": false})).unwrap();
        assert_eq!(state, PlaybackState::NoTrack);
    }

    #[test]
    fn test_null_item_is_no_track() {
        let state = parse_playback(&serde_json::json!({"item": null})).unwrap();
        assert_eq!(state, PlaybackState::NoTrack);
    }

    #[test]
    fn test_item_without_name_is_format_error() {
        let body = serde_json::json!({
            "item": {"duration_ms": 1000}
        });
        assert!(matches!(
            parse_playback(&body).unwrap_err(),
            AppError::DataFormat(_)
        ));
    }

    #[tokio::test]
    async fn test_204_maps_to_no_track() {
        use axum::routing::get;
        use axum::Router;

        async fn no_content() -> axum::http::StatusCode {
            axum::http::StatusCode::NO_CONTENT
        }

        let app = Router::new().route("/v1/me/player/currently-playing", get(no_content));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let provider = SpotifyProvider {
            client: Client::new(),
            base_url: format!("http://{}", addr),
        };

        let state = provider.currently_playing("token").await.unwrap();
        assert_eq!(state, PlaybackState::NoTrack);
    }
}
