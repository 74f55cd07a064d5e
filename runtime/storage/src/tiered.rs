use parking_lot::RwLock;
use std::sync::Arc;

use crate::archive::ColdArchive;
use crate::lru_cache::HotCache;
use crate::nvme::WarmStore;
use crate::types::*;

/// Tiered storage — orchestrates Hot (LRU), Warm (NVMe), and Cold (archive) tiers.
///
/// Read path: hot -> warm -> cold, with promotion back to hot on access.
/// Write path: writes to hot immediately; evicted hot entries flush to warm.
pub struct TieredStorage {
    hot: Arc<HotCache>,
    warm: Arc<WarmStore>,
    cold: Arc<ColdArchive>,
    stats: Arc<RwLock<StorageStats>>,
}

impl TieredStorage {
    /// Create a new tiered storage system from the given config.
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        let hot = Arc::new(HotCache::new(config.lru_capacity));
        let warm = Arc::new(WarmStore::new(&config.nvme_path)?);
        let cold = Arc::new(ColdArchive::new(&config.archive_path)?);
        let stats = Arc::new(RwLock::new(StorageStats::default()));

        // Wire up the eviction callback: when the hot cache evicts an entry,
        // flush it to the warm tier.
        let warm_for_cb = warm.clone();
        let stats_for_cb = stats.clone();
        hot.set_eviction_callback(move |key, value| {
            tracing::debug!(%key, "evicting from hot -> warm");
            if let Err(e) = warm_for_cb.put(&key, &value) {
                tracing::error!(%key, error = %e, "failed to flush evicted entry to warm store");
            }
            stats_for_cb.write().evictions += 1;
        });

        Ok(Self {
            hot,
            warm,
            cold,
            stats,
        })
    }

    /// Get a value, checking hot -> warm -> cold. Promotes to hot on access.
    pub fn get(&self, key: &StorageKey) -> StorageResult<Option<StorageValue>> {
        // 1) Hot tier.
        if let Some(val) = self.hot.get(key) {
            self.stats.write().hot_hits += 1;
            return Ok(Some(val));
        }
        self.stats.write().hot_misses += 1;

        // 2) Warm tier.
        match self.warm.get(key)? {
            Some(val) => {
                self.stats.write().warm_hits += 1;
                // Promote to hot.
                self.hot.put(key.clone(), val.clone());
                self.stats.write().promotions += 1;
                return Ok(Some(val));
            }
            None => {
                self.stats.write().warm_misses += 1;
            }
        }

        // 3) Cold tier.
        match self.cold.retrieve(key)? {
            Some(val) => {
                self.stats.write().cold_hits += 1;
                // Promote to hot.
                self.hot.put(key.clone(), val.clone());
                self.stats.write().promotions += 1;
                Ok(Some(val))
            }
            None => {
                self.stats.write().cold_misses += 1;
                Ok(None)
            }
        }
    }

    /// Put a value. Writes directly to the hot cache.
    /// Also writes to the warm tier for durability.
    pub fn put(&self, key: StorageKey, value: StorageValue) -> StorageResult<()> {
        // Write to warm tier for durability.
        self.warm.put(&key, &value)?;
        // Place in hot cache (may evict LRU -> warm via callback).
        self.hot.put(key, value);
        Ok(())
    }

    /// Remove a value from all tiers.
    pub fn remove(&self, key: &StorageKey) -> StorageResult<Option<StorageValue>> {
        let hot_val = self.hot.remove(key);
        let warm_val = self.warm.remove(key)?;
        let cold_val = self.cold.remove(key)?;
        // Return the first non-None value found.
        Ok(hot_val.or(warm_val).or(cold_val))
    }

    /// Move a key-value pair from warm storage into cold archive.
    /// This is used for data below a certain block height that is
    /// considered historical and no longer needs fast access.
    pub fn archive_key(&self, key: &StorageKey) -> StorageResult<bool> {
        if let Some(val) = self.warm.remove(key)? {
            self.cold.archive(key, &val)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Move all keys matching a prefix from warm to cold storage.
    /// In a real implementation, this would scan by block height;
    /// for now, callers pass specific keys to archive.
    pub fn archive_keys(&self, keys: &[StorageKey]) -> StorageResult<u64> {
        let mut count = 0u64;
        for key in keys {
            // Also evict from hot if present.
            self.hot.remove(key);
            if self.archive_key(key)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Locate which tier a key resides in (if any).
    pub fn locate(&self, key: &StorageKey) -> Option<StorageTier> {
        if self.hot.contains(key) {
            return Some(StorageTier::Hot);
        }
        if self.warm.contains(key) {
            return Some(StorageTier::Warm);
        }
        if self.cold.contains(key) {
            return Some(StorageTier::Cold);
        }
        None
    }

    /// Return a snapshot of runtime statistics.
    pub fn stats(&self) -> StorageStats {
        let mut s = self.stats.read().clone();
        s.hot_entries = self.hot.len();
        s
    }

    /// Access to the underlying hot cache (for advanced use).
    pub fn hot_cache(&self) -> &HotCache {
        &self.hot
    }
}
