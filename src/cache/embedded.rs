//! Embedded Record Store
//!
//! Single-file backend built on redb. One table holds the three-field schema
//! `Key` -> (`Value`, `Expires`), with `Expires` stored as ticks.
//!
//! Every mutation is its own committed write transaction. redb commits with
//! immediate durability by default, so each write is on disk before the call
//! returns.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTableMetadata, TableDefinition};
use tracing::debug;

use crate::cache::entry::{self, CacheEntry};
use crate::cache::{BackendKind, StorageBackend};
use crate::error::{CacheError, Result};

/// `Key` -> (`Value`, `Expires` ticks)
const RECORDS: TableDefinition<&str, (&[u8], i64)> = TableDefinition::new("TileCache");

// == Embedded Store ==
/// redb-backed record store.
pub struct EmbeddedStore {
    path: PathBuf,
    db: Option<Database>,
}

impl EmbeddedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            db: None,
        }
    }

    fn database(&self) -> Result<&Database> {
        self.db
            .as_ref()
            .ok_or_else(|| CacheError::Internal("embedded store is closed".to_string()))
    }

    fn database_mut(&mut self) -> Result<&mut Database> {
        self.db
            .as_mut()
            .ok_or_else(|| CacheError::Internal("embedded store is closed".to_string()))
    }
}

impl StorageBackend for EmbeddedStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn is_open(&self) -> bool {
        self.db.is_some()
    }

    fn open(&mut self) -> Result<()> {
        self.close();

        let db = Database::open(&self.path).map_err(redb::Error::from)?;
        ensure_schema(&db)?;

        self.db = Some(db);
        Ok(())
    }

    fn recreate(&mut self) -> Result<()> {
        self.close();

        if self.path.exists() {
            fs::remove_file(&self.path)?;
        } else if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let db = Database::create(&self.path).map_err(redb::Error::from)?;
        ensure_schema(&db)?;

        self.db = Some(db);
        Ok(())
    }

    fn close(&mut self) {
        if self.db.take().is_some() {
            debug!("Closed embedded store {}", self.path.display());
        }
    }

    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(read_record(self.database()?, key)?)
    }

    fn upsert(&mut self, entry: &CacheEntry) -> Result<()> {
        let replaced = write_record(self.database()?, entry)?;

        debug!(
            "Embedded store {} '{}'",
            if replaced { "updated" } else { "added" },
            entry.key
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        Ok(remove_record(self.database()?, key)?)
    }

    fn delete_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        Ok(delete_records_until(self.database()?, entry::to_ticks(now))?)
    }

    fn compact(&mut self) -> Result<()> {
        self.database_mut()?
            .compact()
            .map_err(redb::Error::from)?;
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(count_records(self.database()?)?)
    }

    fn supports_repair(&self) -> bool {
        true
    }

    fn reindex(&mut self) -> Result<()> {
        let intact = self
            .database_mut()?
            .check_integrity()
            .map_err(redb::Error::from)?;

        if !intact {
            debug!("Embedded store {} was repaired in place", self.path.display());
        }
        Ok(())
    }
}

// == Engine Helpers ==
fn ensure_schema(db: &Database) -> std::result::Result<(), redb::Error> {
    let txn = db.begin_write()?;
    txn.open_table(RECORDS)?;
    txn.commit()?;
    Ok(())
}

fn read_record(db: &Database, key: &str) -> std::result::Result<Option<CacheEntry>, redb::Error> {
    let txn = db.begin_read()?;
    let table = txn.open_table(RECORDS)?;

    let entry = table.get(key)?.map(|record| {
        let (value, expires) = record.value();
        CacheEntry::new(key, value.to_vec(), entry::from_ticks(expires))
    });

    Ok(entry)
}

fn write_record(db: &Database, entry: &CacheEntry) -> std::result::Result<bool, redb::Error> {
    let txn = db.begin_write()?;
    let replaced = {
        let mut table = txn.open_table(RECORDS)?;
        let previous = table.insert(
            entry.key.as_str(),
            (entry.value.as_slice(), entry.expiration_ticks()),
        )?;
        previous.is_some()
    };
    txn.commit()?;

    Ok(replaced)
}

fn remove_record(db: &Database, key: &str) -> std::result::Result<bool, redb::Error> {
    let txn = db.begin_write()?;
    let removed = {
        let mut table = txn.open_table(RECORDS)?;
        let previous = table.remove(key)?;
        previous.is_some()
    };
    txn.commit()?;

    Ok(removed)
}

fn delete_records_until(db: &Database, now_ticks: i64) -> std::result::Result<usize, redb::Error> {
    let txn = db.begin_write()?;
    let mut deleted = 0;
    {
        let mut table = txn.open_table(RECORDS)?;
        table.retain(|_, (_, expires)| {
            let expired = expires <= now_ticks;
            if expired {
                deleted += 1;
            }
            !expired
        })?;
    }
    txn.commit()?;

    Ok(deleted)
}

fn count_records(db: &Database) -> std::result::Result<usize, redb::Error> {
    let txn = db.begin_read()?;
    let table = txn.open_table(RECORDS)?;
    Ok(table.len()? as usize)
}
