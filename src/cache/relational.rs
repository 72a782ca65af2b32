//! Relational Store
//!
//! SQLite backend with a single `items` table. Expirations are stored as
//! ticks so comparisons stay numeric.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::cache::entry::{self, CacheEntry};
use crate::cache::{BackendKind, StorageBackend};
use crate::error::{CacheError, Result};

const CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS items (key TEXT PRIMARY KEY, expiration INTEGER, buffer BLOB)";

// == Relational Store ==
/// rusqlite-backed store.
#[derive(Debug)]
pub struct RelationalStore {
    path: PathBuf,
    connection: Option<Connection>,
}

impl RelationalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            connection: None,
        }
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| CacheError::Internal("relational store is closed".to_string()))
    }

    fn connect(&mut self) -> Result<()> {
        let connection = Connection::open(&self.path)?;
        connection.execute_batch(CREATE_TABLE)?;

        self.connection = Some(connection);
        Ok(())
    }
}

impl StorageBackend for RelationalStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    fn open(&mut self) -> Result<()> {
        self.close();
        self.connect()
    }

    fn recreate(&mut self) -> Result<()> {
        self.close();

        if self.path.exists() {
            fs::remove_file(&self.path)?;
        } else if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.connect()
    }

    fn close(&mut self) {
        self.connection = None;
    }

    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row = self
            .connection()?
            .query_row(
                "SELECT expiration, buffer FROM items WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<Vec<u8>>>(1)?)),
            )
            .optional()?;

        Ok(row.map(|(expiration, buffer)| {
            CacheEntry::new(key, buffer.unwrap_or_default(), entry::from_ticks(expiration))
        }))
    }

    fn upsert(&mut self, entry: &CacheEntry) -> Result<()> {
        self.connection()?.execute(
            "INSERT OR REPLACE INTO items (key, expiration, buffer) VALUES (?1, ?2, ?3)",
            params![entry.key, entry.expiration_ticks(), entry.value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let deleted = self
            .connection()?
            .execute("DELETE FROM items WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    fn delete_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let deleted = self.connection()?.execute(
            "DELETE FROM items WHERE expiration <= ?1",
            params![entry::to_ticks(now)],
        )?;
        Ok(deleted)
    }

    fn compact(&mut self) -> Result<()> {
        self.connection()?.execute_batch("VACUUM")?;
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let count: i64 = self
            .connection()?
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn supports_repair(&self) -> bool {
        true
    }

    fn reindex(&mut self) -> Result<()> {
        self.connection()?.execute_batch("REINDEX items")?;
        Ok(())
    }
}
