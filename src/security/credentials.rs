//! OS keychain storage for Spotify client credentials

use crate::error::Result;
use keyring::Entry;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "apexgrid";
const ACCOUNT: &str = "spotify-client";

/// Spotify application client id/secret pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Keychain-backed credential store
pub struct CredentialStore;

impl CredentialStore {
    /// Store the Spotify client credentials
    pub fn store(credentials: &ClientCredentials) -> Result<()> {
        let entry = Entry::new(SERVICE, ACCOUNT)?;
        let json = serde_json::to_string(credentials)?;
        entry.set_password(&json)?;
        Ok(())
    }

    /// Get the Spotify client credentials, if configured
    pub fn get() -> Result<Option<ClientCredentials>> {
        let entry = Entry::new(SERVICE, ACCOUNT)?;

        match entry.get_password() {
            Ok(json) => {
                let credentials: ClientCredentials = serde_json::from_str(&json)?;
                Ok(Some(credentials))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the stored credentials
    pub fn delete() -> Result<()> {
        let entry = Entry::new(SERVICE, ACCOUNT)?;

        match entry.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
            Err(e) => Err(e.into()),
        }
    }
}
