//! Per-deployment data-key management.
//!
//! The data key never sits on disk in plaintext: it lives in
//! [`KEY_FILE`] inside the data directory, obfuscated with a master key via
//! the alphabet cipher.  The master key comes from the
//! `SEASTORE_MASTER_KEY` environment variable and falls back to a fixed
//! default — a known weak spot, kept deliberately (changing it would orphan
//! existing key files; see DESIGN.md).
//!
//! The master key and every generated data key must draw only from the
//! cipher alphabet; anything else fails with `UnsupportedCharacter` before
//! touching disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::cipher::{self, CipherError};

/// File inside the data directory holding the encrypted data key.
pub const KEY_FILE: &str = ".encryption_key";

/// Length of a freshly generated data key.
pub const KEY_LEN: usize = 16;

/// Fallback master key when `SEASTORE_MASTER_KEY` is unset.
/// Weak by design — ships with every deployment.
pub const DEFAULT_MASTER_KEY: &str = "SEA_SECRET_MASTER";

/// Character pool for generated data keys.  Strictly a subset of the cipher
/// alphabet, so a generated key always encrypts cleanly.
const KEY_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("cipher error while handling the key file: {0}")]
    Cipher(#[from] CipherError),
    #[error("key file I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Resolve the master key from the environment, falling back to the
/// built-in default.
pub fn master_key_from_env() -> String {
    std::env::var("SEASTORE_MASTER_KEY").unwrap_or_else(|_| DEFAULT_MASTER_KEY.to_string())
}

/// Owns the key-file path and the master key used to obfuscate it.
#[derive(Debug, Clone)]
pub struct KeyStore {
    data_dir: PathBuf,
    master_key: String,
}

impl KeyStore {
    pub fn new(data_dir: impl Into<PathBuf>, master_key: impl Into<String>) -> Self {
        Self { data_dir: data_dir.into(), master_key: master_key.into() }
    }

    pub fn key_path(&self) -> PathBuf {
        self.data_dir.join(KEY_FILE)
    }

    /// Create the data directory if it is missing.  Idempotent.
    pub fn ensure_data_dir(&self) -> Result<(), KeyStoreError> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Return the deployment's data key, generating and persisting one on
    /// first use.
    ///
    /// A missing key file is the only recoverable condition; every other
    /// I/O failure propagates.
    pub fn get_or_create(&self) -> Result<String, KeyStoreError> {
        self.ensure_data_dir()?;

        match fs::read_to_string(self.key_path()) {
            Ok(encrypted) => Ok(cipher::decrypt(&encrypted, &self.master_key)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let key = generate_key(KEY_LEN);
                self.save(&key)?;
                debug!(path = %self.key_path().display(), "generated new data key");
                Ok(key)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist `key`, encrypted with the master key.
    pub fn save(&self, key: &str) -> Result<(), KeyStoreError> {
        self.ensure_data_dir()?;
        let encrypted = cipher::encrypt(key, &self.master_key)?;
        fs::write(self.key_path(), encrypted)?;
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Random key of `len` characters drawn from [`KEY_CHARSET`].
pub fn generate_key(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| KEY_CHARSET[rng.gen_range(0..KEY_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generates_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let ks = KeyStore::new(dir.path(), "MASTERKEY");

        let key = ks.get_or_create().unwrap();
        assert_eq!(key.len(), KEY_LEN);
        assert!(ks.key_path().exists());

        // Second call must read the same key back, not regenerate.
        assert_eq!(ks.get_or_create().unwrap(), key);
    }

    #[test]
    fn key_file_is_not_plaintext() {
        let dir = TempDir::new().unwrap();
        let ks = KeyStore::new(dir.path(), "MASTERKEY");
        let key = ks.get_or_create().unwrap();

        let on_disk = std::fs::read_to_string(ks.key_path()).unwrap();
        assert_ne!(on_disk, key);
        assert_eq!(cipher::decrypt(&on_disk, "MASTERKEY").unwrap(), key);
    }

    #[test]
    fn wrong_master_key_yields_garbage_not_panic() {
        let dir = TempDir::new().unwrap();
        let key = KeyStore::new(dir.path(), "MASTERKEY").get_or_create().unwrap();

        let other = KeyStore::new(dir.path(), "OTHERKEY").get_or_create().unwrap();
        assert_ne!(other, key);
    }

    #[test]
    fn generated_keys_stay_inside_the_alphabet() {
        for _ in 0..50 {
            let key = generate_key(KEY_LEN);
            assert!(key.chars().all(|c| crate::cipher::ALPHABET.contains(c)));
        }
    }

    #[test]
    fn creates_missing_data_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        let ks = KeyStore::new(&nested, "MASTERKEY");
        ks.get_or_create().unwrap();
        assert!(nested.join(KEY_FILE).exists());
    }
}
