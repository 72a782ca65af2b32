//! Distributed Cache Adapter
//!
//! Byte-oriented key/value facade over [`CacheStore`] for callers that think
//! in expiration options rather than absolute instants.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::entry::normalize;
use crate::cache::CacheStore;
use crate::error::Result;

/// Lifetime used when no option is set.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Expiration settings for one write.
///
/// The first field set wins, in declaration order. Sliding expiration is
/// applied once as a relative lifetime and is not renewed on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    pub absolute_expiration: Option<DateTime<Utc>>,
    pub absolute_expiration_relative_to_now: Option<Duration>,
    pub sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    pub fn absolute(at: DateTime<Utc>) -> Self {
        Self {
            absolute_expiration: Some(at),
            ..Self::default()
        }
    }

    pub fn relative(lifetime: Duration) -> Self {
        Self {
            absolute_expiration_relative_to_now: Some(lifetime),
            ..Self::default()
        }
    }

    pub fn sliding(lifetime: Duration) -> Self {
        Self {
            sliding_expiration: Some(lifetime),
            ..Self::default()
        }
    }

    /// Resolves the absolute expiration for a write made at `now`.
    ///
    /// Lifetimes too large to represent saturate at the latest instant.
    pub fn expiration_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if let Some(at) = self.absolute_expiration {
            return at;
        }

        let lifetime = self
            .absolute_expiration_relative_to_now
            .or(self.sliding_expiration)
            .unwrap_or(DEFAULT_LIFETIME);

        chrono::Duration::from_std(lifetime)
            .ok()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Distributed-cache style access to a tile store.
///
/// Every operation is best effort: failures are logged and never returned.
#[derive(Clone)]
pub struct DistributedCache {
    store: CacheStore,
}

impl DistributedCache {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Returns the stored bytes for `key`, or `None` on a miss.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.store.get(key).await.map(|entry| entry.value)
    }

    /// Stores `value` under `key`, expiring as `options` describe.
    ///
    /// Returns the resolved expiration. A failed write is logged and the
    /// item simply stays uncached.
    pub async fn set(&self, key: &str, value: Vec<u8>, options: &EntryOptions) -> DateTime<Utc> {
        let expiration = options.expiration_from(self.store.now());

        if let Err(e) = self.store.set(key, value, expiration).await {
            warn!("Not caching '{}': {}", key, e);
        }

        normalize(expiration)
    }

    /// Like [`set`](Self::set), but reports a dropped write to the caller.
    pub async fn try_set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: &EntryOptions,
    ) -> Result<DateTime<Utc>> {
        let expiration = options.expiration_from(self.store.now());
        self.store.set(key, value, expiration).await?;
        Ok(normalize(expiration))
    }

    pub async fn remove(&self, key: &str) {
        self.store.remove(key).await;
    }

    /// Sliding lifetimes are not tracked, so there is nothing to renew.
    pub async fn refresh(&self, _key: &str) {}

    pub fn store(&self) -> &CacheStore {
        &self.store
    }
}
