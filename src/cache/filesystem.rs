//! Filesystem Store
//!
//! One file per key under a root directory. Key segments separated by `/` or
//! `\` become nested directories; the last segment is the leaf file holding
//! the raw blob. The expiration is kept out-of-band in the extended attribute
//! `user.tile_cache.expires` (ticks, little-endian), so the body is exactly
//! the tile bytes.
//!
//! The attribute also marks ownership. Files without it were not written by
//! the cache: they are never served, counted, swept, overwritten or wiped, and
//! only directories emptied by a sweep are pruned.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use crate::cache::entry::{self, CacheEntry};
use crate::cache::{BackendKind, StorageBackend};
use crate::error::{CacheError, Result};

/// Extended attribute carrying a cache file's expiration ticks.
pub const EXPIRES_ATTR: &str = "user.tile_cache.expires";

// == Filesystem Store ==
/// Directory-tree store.
#[derive(Debug)]
pub struct FilesystemStore {
    root: PathBuf,
    open: bool,
    /// Directories that lost a file since the last compaction
    emptied: BTreeSet<PathBuf>,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open: false,
            emptied: BTreeSet::new(),
        }
    }

    /// Maps a key onto a path below the root.
    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();

        for segment in key.split(&['/', '\\'][..]) {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\0') {
                return Err(CacheError::InvalidKey(key.to_string()));
            }
            path.push(segment);
        }

        Ok(path)
    }

    /// Cache-owned files below the root, with their expirations.
    fn cache_files(&self) -> impl Iterator<Item = (PathBuf, DateTime<Utc>)> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable cache path: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let expiration = read_expiration(entry.path())?;
                Some((entry.into_path(), expiration))
            })
    }

    /// Deletes one cache file and remembers its directory for pruning.
    fn delete_file(&mut self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                if let Some(parent) = path.parent() {
                    self.emptied.insert(parent.to_path_buf());
                }
                true
            }
            Err(e) => {
                debug!("Failed to delete cache file {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Removes emptied directories and their empty ancestors, stopping at
    /// the root.
    fn prune(&mut self) {
        // Deepest first, so children go before their parents
        let mut directories: Vec<PathBuf> = std::mem::take(&mut self.emptied).into_iter().collect();
        directories.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));

        for directory in directories {
            let mut current = directory.as_path();

            while current != self.root.as_path() && current.starts_with(&self.root) {
                // Fails harmlessly on non-empty directories
                if fs::remove_dir(current).is_err() {
                    break;
                }
                match current.parent() {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }
    }
}

// == Expiration Attribute ==
/// Reads the expiration of a cache-owned file; `None` for any other file.
fn read_expiration(path: &Path) -> Option<DateTime<Utc>> {
    let raw = xattr::get(path, EXPIRES_ATTR).ok().flatten()?;
    let ticks: [u8; 8] = raw.as_slice().try_into().ok()?;
    Some(entry::from_ticks(i64::from_le_bytes(ticks)))
}

fn write_expiration(path: &Path, entry: &CacheEntry) -> Result<()> {
    xattr::set(path, EXPIRES_ATTR, &entry.expiration_ticks().to_le_bytes())?;
    Ok(())
}

impl StorageBackend for FilesystemStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Filesystem
    }

    fn location(&self) -> &Path {
        &self.root
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        if !fs::metadata(&self.root)?.is_dir() {
            return Err(CacheError::OpenFailure(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        self.open = true;
        Ok(())
    }

    /// Deletes every cache-owned file. Other files and a root that is not a
    /// directory are left alone.
    fn recreate(&mut self) -> Result<()> {
        self.close();

        match fs::symlink_metadata(&self.root) {
            Ok(metadata) if metadata.is_dir() => {
                let owned: Vec<PathBuf> = self.cache_files().map(|(path, _)| path).collect();
                for path in owned {
                    self.delete_file(&path);
                }
                self.prune();
            }
            Ok(_) => {
                return Err(CacheError::OpenFailure(format!(
                    "{} is not a directory",
                    self.root.display()
                )))
            }
            Err(_) => fs::create_dir_all(&self.root)?,
        }

        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key)?;

        // A non-directory segment or a non-file leaf is just a miss
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => {}
            _ => return Ok(None),
        }

        let Some(expiration) = read_expiration(&path) else {
            return Ok(None);
        };
        let value = fs::read(&path)?;

        Ok(Some(CacheEntry::new(key, value, expiration)))
    }

    fn upsert(&mut self, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(&entry.key)?;

        if path.is_file() && read_expiration(&path).is_none() {
            return Err(CacheError::InvalidKey(format!(
                "{}: occupied by a file the cache does not own",
                entry.key
            )));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&path)?;
        file.write_all(&entry.value)?;
        write_expiration(&path, entry)?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let path = self.entry_path(key)?;

        if !path.is_file() || read_expiration(&path).is_none() {
            return Ok(false);
        }

        fs::remove_file(&path)?;
        Ok(true)
    }

    fn delete_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let expired: Vec<PathBuf> = self
            .cache_files()
            .filter(|(_, expiration)| *expiration <= now)
            .map(|(path, _)| path)
            .collect();

        let mut deleted = 0;
        for path in expired {
            if self.delete_file(&path) {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    /// Prunes directories left empty by a sweep.
    fn compact(&mut self) -> Result<()> {
        self.prune();
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.cache_files().count())
    }
}
