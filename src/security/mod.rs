//! Secret sealing and credential storage
//!
//! OAuth tokens are sealed with AES-256-GCM under an app master key before
//! they touch disk. The master key lives in a local file (no keychain prompt
//! on every launch); the Spotify client credentials live in the OS keychain.

mod credentials;
mod file_storage;

use crate::error::{AppError, Result};
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use rand::RngCore;
use std::path::PathBuf;

pub use credentials::{ClientCredentials, CredentialStore};

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// Seals secrets for storage under the app master key.
///
/// A sealed value is one opaque string: the random per-value nonce prepended
/// to the AES-256-GCM ciphertext, base64 over the whole frame.
pub struct SecurityManager {
    cipher: Aes256Gcm,
}

impl SecurityManager {
    /// Create a security manager rooted at the app config directory,
    /// generating the master key on first run
    pub fn new(config_dir: PathBuf) -> Result<Self> {
        let storage = file_storage::FileStorage::new(config_dir);
        let master_key = storage.get_or_create_master_key()?;
        Self::from_key(&master_key)
    }

    /// Security manager with an ephemeral key, for tests
    #[cfg(test)]
    pub fn new_for_testing() -> Result<Self> {
        let mut key = vec![0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self::from_key(&key)
    }

    fn from_key(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_SIZE {
            return Err(AppError::Encryption(format!(
                "Master key must be {} bytes, got {}",
                KEY_SIZE,
                key.len()
            )));
        }

        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|e| AppError::Encryption(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Seal a secret into a single storable string
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| AppError::Encryption(e.to_string()))?;

        let mut frame = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(frame))
    }

    /// Open a sealed value back into the secret
    pub fn open(&self, sealed: &str) -> Result<String> {
        let frame = base64::engine::general_purpose::STANDARD
            .decode(sealed)
            .map_err(|e| AppError::Encryption(format!("Invalid sealed value: {}", e)))?;

        if frame.len() <= NONCE_SIZE {
            return Err(AppError::Encryption(
                "Sealed value too short to hold a nonce".to_string(),
            ));
        }

        let (nonce, ciphertext) = frame.split_at(NONCE_SIZE);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| AppError::Encryption(format!("Unsealing failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::Encryption(format!("Sealed value is not UTF-8: {}", e)))
    }
}
