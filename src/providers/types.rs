//! Normalized reading types shared by the provider adapters

use serde::{Deserialize, Serialize};

/// One crypto asset's price snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoPrice {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_24h: f64,
}

/// Fixed USD/THB/LAK rate triple (USD is 1.0 by construction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateSet {
    pub usd: f64,
    pub thb: f64,
    pub lak: f64,
}

/// Track metadata for the now-playing widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artists: String,
    pub album: String,
    pub art_url: Option<String>,
    pub duration_ms: u64,
}

/// Current playback snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub track: Track,
    pub progress_ms: u64,
    pub is_playing: bool,
}

/// Playback state: either something is loaded on a device, or nothing is.
///
/// `NoTrack` is a valid non-error state (nothing playing, no device, or a
/// 204/404 from the playback endpoint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlaybackState {
    NoTrack,
    Active(NowPlaying),
}
