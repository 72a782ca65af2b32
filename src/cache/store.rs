//! Cache Store Module
//!
//! Backend-independent cache engine. Owns one [`StorageBackend`] behind a
//! per-instance mutex and implements the contract once: open-or-recreate,
//! lazy expiration on read, upsert with the repair ladder, sweeping.
//!
//! Engine calls are synchronous, so every operation takes the lock and then
//! runs on the blocking pool; async callers only await.
//!
//! An optional [`MemoryTier`] sits in front of the backend. Reads fill it,
//! writes go through it, and remove, sweep, close and recreation invalidate it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::memory::MemoryTier;
use crate::cache::repair::{self, RepairOutcome};
use crate::cache::{BackendKind, CacheEntry, CacheStats, StorageBackend};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Store Options ==
/// Behaviour switches fixed when a store is opened.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Sweep once right after opening
    pub sweep_on_open: bool,
    /// Entries kept in the memory tier; 0 disables it
    pub memory_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sweep_on_open: true,
            memory_capacity: 0,
        }
    }
}

// == Store Core ==
/// Contract logic over one backend. Only ever touched with the lock held.
struct StoreCore {
    backend: Box<dyn StorageBackend>,
    memory: MemoryTier,
    stats: CacheStats,
    sweep_on_open: bool,
}

impl StoreCore {
    fn open(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.backend.is_open() {
            return Ok(());
        }

        let kind = self.backend.kind();
        let location = self.backend.location().display().to_string();

        match self.backend.open() {
            Ok(()) => info!("Opened {} cache {}", kind, location),
            Err(e) => {
                warn!("Could not open {} cache {}: {}", kind, location, e);

                if let Err(e) = self.backend.recreate() {
                    error!("Failed to create {} cache {}: {}", kind, location, e);
                    self.backend.close();
                    return Err(CacheError::OpenFailure(format!("{}: {}", location, e)));
                }

                self.memory.clear();
                self.stats.record_recreation();
                info!("Created {} cache {}", kind, location);
            }
        }

        if self.sweep_on_open {
            self.sweep(now);
        }

        Ok(())
    }

    fn close(&mut self) {
        self.memory.clear();

        if self.backend.is_open() {
            self.backend.close();
            info!(
                "Closed {} cache {}",
                self.backend.kind(),
                self.backend.location().display()
            );
        }
    }

    /// Reads `key` from the backend, wrapping engine errors.
    fn lookup(&self, key: &str) -> Result<Option<CacheEntry>> {
        self.backend
            .get(key)
            .map_err(|e| CacheError::QueryFailure(format!("{}: {}", key, e)))
    }

    fn get(&mut self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        if self.backend.is_open() && !key.is_empty() {
            if let Some(entry) = self.memory.get(key, now) {
                self.stats.record_memory_hit();
                return Some(entry);
            }
        }

        let found = if !self.backend.is_open() || key.is_empty() {
            None
        } else {
            match self.lookup(key) {
                Ok(entry) => entry.filter(|entry| !entry.is_expired_at(now)),
                Err(e) => {
                    warn!("Get failed: {}", e);
                    None
                }
            }
        };

        if let Some(entry) = &found {
            self.memory.insert(entry);
        }

        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }

        found
    }

    fn set(&mut self, entry: CacheEntry) -> Result<()> {
        if !self.backend.is_open() {
            debug!("Cache closed, not storing '{}'", entry.key);
            return Ok(());
        }

        if entry.key.is_empty() {
            return Err(CacheError::InvalidKey("key must not be empty".to_string()));
        }

        let error = match self.backend.upsert(&entry) {
            Ok(()) => {
                self.memory.insert(&entry);
                self.stats.record_write();
                return Ok(());
            }
            Err(e) => e,
        };

        warn!("Set({}) failed: {}", entry.key, error);
        self.memory.remove(&entry.key);

        if matches!(error, CacheError::InvalidKey(_)) {
            self.stats.record_dropped_write();
            return Err(error);
        }

        if !self.backend.supports_repair() {
            self.stats.record_dropped_write();
            return Err(CacheError::WriteFailure(format!("{}: {}", entry.key, error)));
        }

        match repair::run(self.backend.as_mut()) {
            Ok(outcome) => {
                match outcome {
                    RepairOutcome::Reindexed => self.stats.record_reindex(),
                    RepairOutcome::Recreated => {
                        self.memory.clear();
                        self.stats.record_recreation();
                    }
                }

                match self.backend.upsert(&entry) {
                    Ok(()) => {
                        self.memory.insert(&entry);
                        self.stats.record_write();
                        Ok(())
                    }
                    Err(e) => {
                        warn!("Set({}) failed again after repair: {}", entry.key, e);
                        self.stats.record_dropped_write();
                        Err(CacheError::WriteFailure(format!("{}: {}", entry.key, e)))
                    }
                }
            }
            Err(e) => {
                // The ladder closed the backend
                self.memory.clear();
                self.stats.record_dropped_write();
                Err(CacheError::WriteFailure(format!("{}: {}", entry.key, e)))
            }
        }
    }

    fn remove(&mut self, key: &str) {
        self.memory.remove(key);

        if !self.backend.is_open() || key.is_empty() {
            return;
        }

        match self.backend.remove(key) {
            Ok(true) => debug!("Removed '{}'", key),
            Ok(false) => {}
            Err(e) => warn!("Remove({}) failed: {}", key, e),
        }
    }

    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        self.memory.remove_expired(now);

        if !self.backend.is_open() {
            return 0;
        }

        let deleted = match self.backend.delete_expired(now) {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!("Sweeping expired items failed: {}", e);
                return 0;
            }
        };

        if deleted > 0 {
            info!("Deleted {} expired items", deleted);
            self.stats.record_swept(deleted);

            if let Err(e) = self.backend.compact() {
                warn!("Compacting after sweep failed: {}", e);
            }
        }

        deleted
    }

    fn len(&self) -> usize {
        if !self.backend.is_open() {
            return 0;
        }

        self.backend.len().unwrap_or_else(|e| {
            warn!("Counting entries failed: {}", e);
            0
        })
    }
}

// == Cache Store ==
/// Shared handle to a persistent tile cache.
///
/// Cloning is cheap; all clones use the same backend and lock.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<Mutex<StoreCore>>,
    clock: Arc<dyn Clock>,
    kind: BackendKind,
    location: PathBuf,
}

impl CacheStore {
    // == Constructors ==
    /// Opens `backend` with the system clock, sweeping once after opening.
    pub async fn open(backend: Box<dyn StorageBackend>) -> Result<Self> {
        Self::open_with(backend, Arc::new(SystemClock), true).await
    }

    /// Opens `backend` without a memory tier.
    pub async fn open_with(
        backend: Box<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        sweep_on_open: bool,
    ) -> Result<Self> {
        let options = StoreOptions {
            sweep_on_open,
            ..StoreOptions::default()
        };
        Self::open_with_options(backend, clock, options).await
    }

    /// Opens `backend`, creating a fresh store if the existing one is absent
    /// or unreadable.
    ///
    /// Fails only when not even a fresh store can be created.
    pub async fn open_with_options(
        backend: Box<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        options: StoreOptions,
    ) -> Result<Self> {
        let store = Self {
            kind: backend.kind(),
            location: backend.location().to_path_buf(),
            inner: Arc::new(Mutex::new(StoreCore {
                backend,
                memory: MemoryTier::new(options.memory_capacity),
                stats: CacheStats::new(),
                sweep_on_open: options.sweep_on_open,
            })),
            clock,
        };

        store.reopen().await?;
        Ok(store)
    }

    /// Opens the backend described by the configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let backend = config.backend.create(&config.cache_path);
        let options = StoreOptions {
            sweep_on_open: config.sweep_on_open,
            memory_capacity: config.memory_capacity,
        };
        Self::open_with_options(backend, Arc::new(SystemClock), options).await
    }

    /// Runs `f` against the core on the blocking pool, with the lock held.
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreCore) -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut core = self.inner.clone().lock_owned().await;

        tokio::task::spawn_blocking(move || f(&mut core))
            .await
            .map_err(|e| CacheError::Internal(format!("cache task failed: {}", e)))
    }

    // == Lifecycle ==
    /// Opens the store if it is closed. Idempotent.
    pub async fn reopen(&self) -> Result<()> {
        let now = self.now();
        self.run(move |core| core.open(now)).await?
    }

    /// Releases the file handle or connection. Idempotent.
    pub async fn close(&self) {
        if let Err(e) = self.run(|core| core.close()).await {
            warn!("Closing cache failed: {}", e);
        }
    }

    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.backend.is_open()
    }

    // == Get ==
    /// Returns the entry for `key` if present and not yet expired.
    ///
    /// Failures are logged and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let key = key.to_string();
        let now = self.now();

        self.run(move |core| core.get(&key, now))
            .await
            .unwrap_or_else(|e| {
                warn!("{}", e);
                None
            })
    }

    // == Set ==
    /// Inserts or overwrites the entry for `key`.
    ///
    /// A closed store accepts and discards the write.
    pub async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        expiration: DateTime<Utc>,
    ) -> Result<()> {
        let entry = CacheEntry::new(key, value, expiration);
        self.run(move |core| core.set(entry)).await?
    }

    // == Remove ==
    /// Deletes the entry for `key`, if any.
    pub async fn remove(&self, key: &str) {
        let key = key.to_string();

        if let Err(e) = self.run(move |core| core.remove(&key)).await {
            warn!("{}", e);
        }
    }

    // == Sweep ==
    /// Deletes every entry that has expired by the clock's current time.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(self.now()).await
    }

    /// Deletes every entry with `expiration <= now` and returns the count.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        self.run(move |core| core.sweep(now)).await.unwrap_or_else(|e| {
            warn!("{}", e);
            0
        })
    }

    // == Introspection ==
    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.run(|core| core.len()).await.unwrap_or(0)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats.clone()
    }

    /// Entries currently held in the memory tier.
    pub async fn memory_len(&self) -> usize {
        self.inner.lock().await.memory.len()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn location(&self) -> &Path {
        &self.location
    }
}
