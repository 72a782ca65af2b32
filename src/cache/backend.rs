//! Storage Backend Module
//!
//! The narrow adapter every storage engine implements. Upsert semantics,
//! lazy expiration, sweeping and the repair ladder live once in
//! [`CacheStore`](super::CacheStore); a backend only knows how to talk to
//! its engine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, EmbeddedStore, FilesystemStore, RelationalStore};
use crate::error::{CacheError, Result};

/// File stem used when a bare directory is given as the cache location.
pub const DEFAULT_FILE_STEM: &str = "TileCache";

// == Storage Backend Trait ==
/// Synchronous access to one storage engine.
///
/// Implementations own their file handle or connection exclusively. All
/// methods are called with the store's lock held and from a blocking thread.
pub trait StorageBackend: Send + 'static {
    fn kind(&self) -> BackendKind;

    /// Where the backend keeps its data.
    fn location(&self) -> &Path;

    fn is_open(&self) -> bool;

    /// Opens an existing store. Fails if it is absent or unreadable.
    fn open(&mut self) -> Result<()>;

    /// Destroys whatever is at the location and creates a fresh, empty store,
    /// creating parent directories as needed. The old handle is closed first.
    fn recreate(&mut self) -> Result<()>;

    /// Releases the handle. Idempotent.
    fn close(&mut self);

    /// Raw lookup; returns expired records too.
    fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Inserts the entry or overwrites the existing one with the same key.
    fn upsert(&mut self, entry: &CacheEntry) -> Result<()>;

    /// Returns whether a record was removed.
    fn remove(&mut self, key: &str) -> Result<bool>;

    /// Deletes every record with `expiration <= now`, returning the count.
    fn delete_expired(&mut self, now: DateTime<Utc>) -> Result<usize>;

    /// Reclaims space after deletions.
    fn compact(&mut self) -> Result<()> {
        Ok(())
    }

    /// Number of stored records, expired or not.
    fn len(&self) -> Result<usize>;

    /// Whether [`reindex`](Self::reindex) is meaningful for this engine.
    fn supports_repair(&self) -> bool {
        false
    }

    /// Lightweight in-place structural repair.
    fn reindex(&mut self) -> Result<()> {
        Err(CacheError::RepairFailure(format!(
            "{} backend has no in-place repair",
            self.kind()
        )))
    }
}

// == Backend Kind ==
/// The available storage engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Single-file record store (redb)
    Embedded,
    /// SQLite table
    Relational,
    /// One file per key under a root directory
    Filesystem,
}

impl BackendKind {
    /// File extension of the default cache file, if the backend uses one.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            BackendKind::Embedded => Some("redb"),
            BackendKind::Relational => Some("sqlite"),
            BackendKind::Filesystem => None,
        }
    }

    /// Appends `TileCache.<ext>` to a location that has no extension.
    pub fn resolve_location(self, location: &Path) -> PathBuf {
        match self.extension() {
            Some(ext) if location.extension().is_none() => {
                location.join(format!("{}.{}", DEFAULT_FILE_STEM, ext))
            }
            _ => location.to_path_buf(),
        }
    }

    /// Builds an unopened backend of this kind for `location`.
    pub fn create(self, location: impl AsRef<Path>) -> Box<dyn StorageBackend> {
        let path = self.resolve_location(location.as_ref());

        match self {
            BackendKind::Embedded => Box::new(EmbeddedStore::new(path)),
            BackendKind::Relational => Box::new(RelationalStore::new(path)),
            BackendKind::Filesystem => Box::new(FilesystemStore::new(path)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Embedded => "embedded",
            BackendKind::Relational => "relational",
            BackendKind::Filesystem => "filesystem",
        };
        f.write_str(name)
    }
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embedded" | "redb" => Ok(BackendKind::Embedded),
            "relational" | "sqlite" => Ok(BackendKind::Relational),
            "filesystem" | "files" => Ok(BackendKind::Filesystem),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown cache backend '{}'",
                other
            ))),
        }
    }
}
