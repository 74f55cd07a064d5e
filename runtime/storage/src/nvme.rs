use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::{StorageKey, StorageValue};

/// NVMe / SSD-backed key-value store — the "warm" tier.
///
/// Each key is SHA-256 hashed and hex-encoded to produce a safe filename.
/// Values are stored as raw bytes on disk.
pub struct WarmStore {
    base_dir: PathBuf,
}

impl WarmStore {
    /// Open (or create) a warm store at the given directory.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let base_dir = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Retrieve a value by key from disk.
    pub fn get(&self, key: &StorageKey) -> io::Result<Option<StorageValue>> {
        let path = self.key_path(key);
        match fs::read(&path) {
            Ok(data) => Ok(Some(StorageValue(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write a key-value pair to disk.
    pub fn put(&self, key: &StorageKey, value: &StorageValue) -> io::Result<()> {
        let path = self.key_path(key);
        fs::write(&path, &value.0)
    }

    /// Remove a key from disk, returning the old value if it existed.
    pub fn remove(&self, key: &StorageKey) -> io::Result<Option<StorageValue>> {
        let path = self.key_path(key);
        match fs::read(&path) {
            Ok(data) => {
                fs::remove_file(&path)?;
                Ok(Some(StorageValue(data)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if a key exists on disk without reading the value.
    pub fn contains(&self, key: &StorageKey) -> bool {
        self.key_path(key).exists()
    }

    /// Compute the filesystem path for a given key.
    fn key_path(&self, key: &StorageKey) -> PathBuf {
        let hash = Self::hash_key(key);
        // Use first 2 hex chars as subdirectory for sharding.
        let (shard, rest) = hash.split_at(2);
        let shard_dir = self.base_dir.join(shard);
        // Lazily create the shard directory — ignore errors (checked on put).
        let _ = fs::create_dir_all(&shard_dir);
        shard_dir.join(rest)
    }

    /// SHA-256 hash a key and return its hex encoding.
    fn hash_key(key: &StorageKey) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }
}
