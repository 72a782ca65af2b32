//! Cache Entry Module
//!
//! Defines a single cached tile and the tick encoding used to persist its
//! expiration.

use chrono::{DateTime, Utc};

// == Tick Constants ==
/// Ticks are 100 ns intervals counted from 0001-01-01T00:00:00Z.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Tick count of 1970-01-01T00:00:00Z.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

// == Cache Entry ==
/// A blob stored against a key, valid until `expiration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Opaque key; may contain path separators
    pub key: String,
    /// Tile bytes, empty rather than absent
    pub value: Vec<u8>,
    /// Absolute expiration, at tick precision
    pub expiration: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry, truncating `expiration` to tick precision so it
    /// reads back identically from every backend.
    pub fn new(key: impl Into<String>, value: Vec<u8>, expiration: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value,
            expiration: normalize(expiration),
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now` has reached its expiration.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }

    /// Expiration as a tick count.
    pub fn expiration_ticks(&self) -> i64 {
        to_ticks(self.expiration)
    }
}

// == Tick Conversion ==
/// Converts a UTC instant to ticks, saturating at the `i64` range.
pub fn to_ticks(time: DateTime<Utc>) -> i64 {
    time.timestamp()
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(i64::from(time.timestamp_subsec_nanos() / 100))
        .saturating_add(UNIX_EPOCH_TICKS)
}

/// Converts ticks back to a UTC instant.
pub fn from_ticks(ticks: i64) -> DateTime<Utc> {
    let since_epoch = ticks.saturating_sub(UNIX_EPOCH_TICKS);
    let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * 100) as u32;

    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}

/// Drops sub-tick precision.
pub fn normalize(time: DateTime<Utc>) -> DateTime<Utc> {
    from_ticks(to_ticks(time))
}
