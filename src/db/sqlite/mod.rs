//! SQLite database module

pub mod models;
mod cache;
mod migrations;
mod settings;
mod tokens;

use crate::auth::OAuthTokenSet;
use crate::cache::{CachedReading, ReadingStore};
use crate::error::Result;
use crate::security::SecurityManager;
pub use models::Settings;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database wrapper
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Create new SQLite database connection
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// In-memory database for tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    /// Run arbitrary SQL against the live connection, for fault-injection
    /// in tests
    #[cfg(test)]
    pub fn execute_batch_for_testing(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(sql)?;
        Ok(())
    }

    // ========== OAuth Token Methods ==========

    /// Store an encrypted token set for a provider
    pub fn store_token_set(
        &self,
        provider: &str,
        tokens: &OAuthTokenSet,
        security: &SecurityManager,
    ) -> Result<()> {
        let conn = self.conn.lock();
        tokens::store_token_set(&conn, provider, tokens, security)
    }

    /// Get a decrypted token set for a provider
    pub fn get_token_set(
        &self,
        provider: &str,
        security: &SecurityManager,
    ) -> Result<Option<OAuthTokenSet>> {
        let conn = self.conn.lock();
        tokens::get_token_set(&conn, provider, security)
    }

    /// Delete a provider's token set
    pub fn delete_token_set(&self, provider: &str) -> Result<()> {
        let conn = self.conn.lock();
        tokens::delete_token_set(&conn, provider)
    }

    // ========== Settings Methods ==========

    /// Get settings
    pub fn get_settings(&self) -> Result<Settings> {
        let conn = self.conn.lock();
        settings::get_settings(&conn)
    }

    /// Update settings
    pub fn update_settings(
        &self,
        timezone: Option<String>,
        redirect_port: Option<u16>,
    ) -> Result<Settings> {
        let conn = self.conn.lock();
        settings::update_settings(&conn, timezone, redirect_port)
    }
}

impl ReadingStore for SqliteDb {
    fn load(&self, widget_id: &str) -> Result<Option<CachedReading<serde_json::Value>>> {
        let conn = self.conn.lock();
        cache::load_reading(&conn, widget_id)
    }

    fn save(&self, widget_id: &str, reading: &CachedReading<serde_json::Value>) -> Result<()> {
        let conn = self.conn.lock();
        cache::save_reading(&conn, widget_id, reading)
    }
}
