//! In-memory backend with scripted failures, for exercising the store's
//! recovery paths without corrupting real files.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::{BackendKind, CacheEntry, StorageBackend};
use crate::error::{CacheError, Result};

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    pub records: HashMap<String, CacheEntry>,
    pub open: bool,
    /// Number of upcoming upserts that fail
    pub failing_upserts: usize,
    pub fail_open: bool,
    pub fail_get: bool,
    pub fail_reindex: bool,
    pub fail_recreate: bool,
    pub reindex_calls: usize,
    pub recreate_calls: usize,
    /// Shared so it can be read after the backend is boxed
    pub compactions: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    pub fn opened() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    pub fn seed(&mut self, key: &str) {
        self.records.insert(
            key.to_string(),
            CacheEntry::new(key, b"seed".to_vec(), DateTime::<Utc>::MAX_UTC),
        );
    }

    fn injected(what: &str) -> CacheError {
        CacheError::Internal(format!("injected {} failure", what))
    }
}

impl StorageBackend for ScriptedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
    }

    fn location(&self) -> &Path {
        Path::new("memory")
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(Self::injected("open"));
        }
        self.open = true;
        Ok(())
    }

    fn recreate(&mut self) -> Result<()> {
        self.recreate_calls += 1;
        self.open = false;
        if self.fail_recreate {
            return Err(Self::injected("recreate"));
        }
        self.records.clear();
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        if self.fail_get {
            return Err(Self::injected("get"));
        }
        Ok(self.records.get(key).cloned())
    }

    fn upsert(&mut self, entry: &CacheEntry) -> Result<()> {
        if self.failing_upserts > 0 {
            self.failing_upserts -= 1;
            return Err(Self::injected("upsert"));
        }
        self.records.insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        Ok(self.records.remove(key).is_some())
    }

    fn delete_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let before = self.records.len();
        self.records.retain(|_, entry| !entry.is_expired_at(now));
        Ok(before - self.records.len())
    }

    fn compact(&mut self) -> Result<()> {
        self.compactions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn supports_repair(&self) -> bool {
        true
    }

    fn reindex(&mut self) -> Result<()> {
        self.reindex_calls += 1;
        if self.fail_reindex {
            return Err(Self::injected("reindex"));
        }
        Ok(())
    }
}
