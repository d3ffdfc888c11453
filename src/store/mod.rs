//! The load/save pipeline — the only entry points the rest of an
//! application needs.
//!
//! # File layout
//! One file per collection (`<name>.sea`) plus the key file, all inside one
//! data directory created on demand.  A collection file's plaintext payload
//! is
//!
//! ```text
//! <entropy-coded-bitstring>::<serialized-code-table>
//! ```
//!
//! and the whole payload is encrypted with the alphabet cipher under the
//! deployment's data key.  The `::` separator is reserved: bits are binary
//! digits and table characters are percent-encoded, so it can never occur
//! inside either half.
//!
//! # Durability & concurrency
//! The unit of durability is the whole collection file; every save is a
//! full-file overwrite.  Each public operation takes a per-collection mutex
//! for its whole load-or-save sequence, so two threads on one `Store`
//! cannot interleave on the same file.  A read-modify-write cycle spanning
//! two calls still races (last write wins) — callers needing more must hold
//! their own scope.
//!
//! An absent collection file is an empty collection; it is created empty on
//! first access so later saves never have to distinguish first-write.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::debug;

use crate::cipher::{self, CipherError};
use crate::codec::{self, CodeTable, CodecError};
use crate::keystore::{self, KeyStore, KeyStoreError};
use crate::link::LinkError;
use crate::record::{self, Record};

/// Reserved separator between the bitstring and the code table.
pub const PAYLOAD_SEPARATOR: &str = "::";

/// Collection file extension.
pub const COLLECTION_EXT: &str = "sea";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Key(#[from] KeyStoreError),
    #[error(transparent)]
    Link(#[from] LinkError),
    /// Decrypted payload has no `::` separator — wrong key or corrupt file.
    #[error("malformed payload in collection {collection:?}: missing separator")]
    MissingSeparator { collection: String },
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
}

// ── Config ───────────────────────────────────────────────────────────────────

/// Explicit storage configuration — no process-wide globals, so tests can
/// point a `Store` at a throwaway directory.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub master_key: String,
}

impl StoreConfig {
    /// Config rooted at `data_dir`, master key from `SEASTORE_MASTER_KEY`
    /// or the built-in default.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            master_key: keystore::master_key_from_env(),
        }
    }

    pub fn with_master_key(mut self, master_key: impl Into<String>) -> Self {
        self.master_key = master_key.into();
        self
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

pub struct Store {
    data_dir: PathBuf,
    keystore: KeyStore,
    key_lock: Mutex<()>,
    collection_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Store {
    /// Open a store rooted at the configured data directory, creating the
    /// directory if needed.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let keystore = KeyStore::new(&config.data_dir, config.master_key);
        keystore.ensure_data_dir()?;
        Ok(Self {
            data_dir: config.data_dir,
            keystore,
            key_lock: Mutex::new(()),
            collection_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.{COLLECTION_EXT}"))
    }

    fn lock_for(&self, collection: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .collection_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// The key file is shared by every collection; serialize access to it.
    fn data_key(&self) -> Result<String, StoreError> {
        let _guard = self.key_lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.keystore.get_or_create()?)
    }

    // ── Load / save ──────────────────────────────────────────────────────────

    /// Load every record of `collection`.
    ///
    /// An absent file is created empty and reads as an empty collection;
    /// any other I/O failure propagates.
    pub fn load(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let path = self.collection_path(collection);
        let encrypted = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::write(&path, "")?;
                debug!(collection, "collection file created empty on first read");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if encrypted.trim().is_empty() {
            return Ok(Vec::new());
        }

        let key = self.data_key()?;
        let payload = cipher::decrypt(&encrypted, &key)?;
        let (bits, table_wire) = payload.split_once(PAYLOAD_SEPARATOR).ok_or_else(|| {
            StoreError::MissingSeparator { collection: collection.to_string() }
        })?;
        let table = CodeTable::from_wire(table_wire)?;
        let text = codec::decode(bits, &table)?;
        Ok(record::deserialize_records(&text))
    }

    /// Replace the whole `collection` file with `records`.
    pub fn save(&self, collection: &str, records: &[Record]) -> Result<(), StoreError> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let text = record::serialize_records(records);
        let encoded = codec::encode(&text)?;
        let payload = format!("{}{PAYLOAD_SEPARATOR}{}", encoded.bits, encoded.table.to_wire());
        let key = self.data_key()?;
        let encrypted = cipher::encrypt(&payload, &key)?;
        fs::write(self.collection_path(collection), encrypted)?;
        debug!(collection, records = records.len(), "collection saved");
        Ok(())
    }

    /// Names of every collection file in the data directory, sorted.
    pub fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(COLLECTION_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
