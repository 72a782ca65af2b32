//! Cache Statistics Module
//!
//! Tracks lookups, writes, sweeps and recovery actions for one store.

use serde::Serialize;

// == Cache Stats ==
/// Counters since the store was constructed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a live entry
    pub hits: u64,
    /// Hits served by the memory tier, included in `hits`
    pub memory_hits: u64,
    /// Lookups that found nothing, an expired entry, or failed
    pub misses: u64,
    /// Successful upserts
    pub writes: u64,
    /// Upserts dropped after the repair ladder
    pub dropped_writes: u64,
    /// Entries deleted by sweeps
    pub swept: u64,
    /// Stores repaired in place
    pub reindexes: u64,
    /// Stores recreated empty (on open or repair)
    pub recreations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_memory_hit(&mut self) {
        self.hits += 1;
        self.memory_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_dropped_write(&mut self) {
        self.dropped_writes += 1;
    }

    pub fn record_swept(&mut self, count: usize) {
        self.swept += count as u64;
    }

    pub fn record_reindex(&mut self) {
        self.reindexes += 1;
    }

    pub fn record_recreation(&mut self) {
        self.recreations += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.writes, 0);
        assert_eq!(stats.swept, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_memory_hits_count_as_hits() {
        let mut stats = CacheStats::new();
        stats.record_memory_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.memory_hits, 1);
        assert_eq!(stats.hit_rate(), 2.0 / 3.0);
    }

    #[test]
    fn test_record_swept_accumulates() {
        let mut stats = CacheStats::new();
        stats.record_swept(3);
        stats.record_swept(0);
        stats.record_swept(2);
        assert_eq!(stats.swept, 5);
    }

    #[test]
    fn test_recovery_counters() {
        let mut stats = CacheStats::new();
        stats.record_reindex();
        stats.record_recreation();
        stats.record_recreation();
        stats.record_dropped_write();
        assert_eq!(stats.reindexes, 1);
        assert_eq!(stats.recreations, 2);
        assert_eq!(stats.dropped_writes, 1);
    }
}
