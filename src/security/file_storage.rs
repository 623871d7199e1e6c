//! File-based master-key storage
//!
//! Stores the token-encryption master key in a local file with basic
//! obfuscation. This avoids OS keychain password prompts on every launch;
//! the keychain is reserved for the Spotify client credentials.

use crate::error::{AppError, Result};
use base64::Engine;
use std::fs;
use std::path::PathBuf;

const SECRETS_FILE: &str = "secrets.dat";

/// File-based storage for the app master key
pub struct FileStorage {
    config_dir: PathBuf,
}

impl FileStorage {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get or create the master key, generating it on first run
    pub fn get_or_create_master_key(&self) -> Result<Vec<u8>> {
        let secrets_path = self.config_dir.join(SECRETS_FILE);

        if secrets_path.exists() {
            let data = fs::read(&secrets_path)
                .map_err(|e| AppError::Config(format!("Failed to read secrets: {}", e)))?;

            self.decode_key(&data)
        } else {
            use rand::RngCore;

            let mut master_key = vec![0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut master_key);

            let data = self.encode_key(&master_key);

            if let Some(parent) = secrets_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| AppError::Config(format!("Failed to create config dir: {}", e)))?;
            }

            fs::write(&secrets_path, &data)
                .map_err(|e| AppError::Config(format!("Failed to write secrets: {}", e)))?;

            Ok(master_key)
        }
    }

    fn encode_key(&self, master_key: &[u8]) -> Vec<u8> {
        let obfuscation_key = Self::obfuscation_key();

        let obfuscated: Vec<u8> = master_key
            .iter()
            .zip(obfuscation_key.iter().cycle())
            .map(|(a, b)| a ^ b)
            .collect();

        base64::engine::general_purpose::STANDARD
            .encode(&obfuscated)
            .into_bytes()
    }

    fn decode_key(&self, data: &[u8]) -> Result<Vec<u8>> {
        let data_str = String::from_utf8(data.to_vec())
            .map_err(|e| AppError::Config(format!("Invalid secrets format: {}", e)))?;

        let obfuscation_key = Self::obfuscation_key();

        let obfuscated = base64::engine::general_purpose::STANDARD
            .decode(data_str.trim())
            .map_err(|e| AppError::Config(format!("Failed to decode master key: {}", e)))?;

        Ok(obfuscated
            .iter()
            .zip(obfuscation_key.iter().cycle())
            .map(|(a, b)| a ^ b)
            .collect())
    }

    fn obfuscation_key() -> Vec<u8> {
        // Derived from the app identifier; raises the bar against casual
        // inspection only, the real protection is AES-GCM on the tokens.
        b"apexgrid-dashboard-core".to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());

        let first = storage.get_or_create_master_key().unwrap();
        let second = storage.get_or_create_master_key().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn test_distinct_dirs_get_distinct_keys() {
        let dir1 = tempfile::tempdir().unwrap();
        let dir2 = tempfile::tempdir().unwrap();

        let key1 = FileStorage::new(dir1.path().to_path_buf())
            .get_or_create_master_key()
            .unwrap();
        let key2 = FileStorage::new(dir2.path().to_path_buf())
            .get_or_create_master_key()
            .unwrap();

        assert_ne!(key1, key2);
    }
}
