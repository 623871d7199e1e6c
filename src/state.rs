//! Application state management

use crate::auth::SpotifyAuthManager;
use crate::db::sqlite::SqliteDb;
use crate::error::Result;
use crate::providers::{ProviderRegistry, SpotifyProvider};
use crate::scheduler::PollerHandle;
use crate::security::{CredentialStore, SecurityManager};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across the host shell
pub struct AppState {
    /// SQLite database (widget cache, tokens, settings)
    pub db: Arc<SqliteDb>,

    /// Security manager for token encryption
    pub security: Arc<SecurityManager>,

    /// Shared HTTP client
    pub http: reqwest::Client,

    /// Cache-driven provider registry
    pub providers: Arc<ProviderRegistry>,

    /// Spotify playback adapter
    pub spotify: Arc<SpotifyProvider>,

    /// Spotify token lifecycle manager
    pub spotify_auth: Arc<SpotifyAuthManager>,

    /// Running widget pollers (widget id -> handle)
    pub pollers: DashMap<String, PollerHandle>,

    /// Per-widget in-flight refresh flags
    in_flight: DashMap<String, Arc<AtomicBool>>,

    /// Application data directory
    pub data_dir: PathBuf,
}

impl AppState {
    /// Create new application state rooted at a data directory
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        info!("Data directory: {:?}", data_dir);

        let db = Arc::new(SqliteDb::new(&data_dir.join("apexgrid.db"))?);
        let security = Arc::new(SecurityManager::new(data_dir.clone())?);

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let providers = Arc::new(ProviderRegistry::new(&http));
        let spotify = Arc::new(SpotifyProvider::new(http.clone()));
        let spotify_auth = Arc::new(SpotifyAuthManager::new(
            http.clone(),
            db.clone(),
            security.clone(),
        ));

        // Client credentials live in the OS keychain; an unlocked keychain
        // is not guaranteed, so failure here only delays Spotify setup.
        match CredentialStore::get() {
            Ok(Some(credentials)) => spotify_auth.set_credentials(credentials),
            Ok(None) => {}
            Err(e) => warn!("Could not read Spotify credentials from keychain: {}", e),
        }

        spotify_auth.load_persisted()?;

        Ok(Self {
            db,
            security,
            http,
            providers,
            spotify,
            spotify_auth,
            pollers: DashMap::new(),
            in_flight: DashMap::new(),
            data_dir,
        })
    }

    /// State over an in-memory database, for tests
    #[cfg(test)]
    pub fn new_for_testing() -> Result<Self> {
        let db = Arc::new(SqliteDb::in_memory()?);
        let security = Arc::new(SecurityManager::new_for_testing()?);
        let http = reqwest::Client::new();
        let providers = Arc::new(ProviderRegistry::new(&http));
        let spotify = Arc::new(SpotifyProvider::new(http.clone()));
        let spotify_auth = Arc::new(SpotifyAuthManager::new(
            http.clone(),
            db.clone(),
            security.clone(),
        ));

        Ok(Self {
            db,
            security,
            http,
            providers,
            spotify,
            spotify_auth,
            pollers: DashMap::new(),
            in_flight: DashMap::new(),
            data_dir: std::env::temp_dir(),
        })
    }

    /// Try to mark a widget's refresh as in flight.
    ///
    /// Returns `None` when a refresh for this widget is already outstanding;
    /// the caller should fall back to cached data or skip the tick rather
    /// than race a second fetch. The flag clears when the guard drops.
    pub fn try_begin_refresh(&self, widget_id: &str) -> Option<RefreshGuard> {
        let flag = self
            .in_flight
            .entry(widget_id.to_string())
            .or_default()
            .clone();

        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(RefreshGuard { flag })
        }
    }

    /// Register a poller for a widget, stopping any previous one
    pub fn register_poller(&self, widget_id: &str, handle: PollerHandle) {
        if let Some(previous) = self.pollers.insert(widget_id.to_string(), handle) {
            previous.stop();
        }
    }

    /// Stop a widget's poller on unmount; returns whether one was running
    pub fn stop_widget(&self, widget_id: &str) -> bool {
        match self.pollers.remove(widget_id) {
            Some((_, handle)) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    /// Stop every running poller (host shutdown)
    pub fn stop_all_widgets(&self) {
        self.pollers.retain(|_, handle| {
            handle.stop();
            false
        });
    }
}

/// Clears the widget's in-flight flag on drop
pub struct RefreshGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
