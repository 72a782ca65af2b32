//! Repair Strategy
//!
//! Two-rung recovery used when a write fails against an open store:
//! a lightweight in-place reindex first, then full recreation of the store.
//!
//! Recreation destroys every cached tile. That is accepted because a cache can
//! always be refilled, but it is logged at a different level than a reindex so
//! operators can tell "repaired" from "wiped". Renaming the broken file aside
//! instead of deleting it would keep it for inspection; that is not done today.

use tracing::{error, info, warn};

use crate::cache::StorageBackend;
use crate::error::{CacheError, Result};

// == Repair Outcome ==
/// Which rung made the store usable again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Repaired in place; entries kept
    Reindexed,
    /// Recreated empty; all entries lost
    Recreated,
}

// == Run Ladder ==
/// Escalates reindex -> recreate.
///
/// On total failure the backend is closed so the store degrades to serving
/// misses until it is opened again.
pub fn run(backend: &mut dyn StorageBackend) -> Result<RepairOutcome> {
    let location = backend.location().display().to_string();

    match backend.reindex() {
        Ok(()) => {
            info!("Repaired {} store {} by reindexing", backend.kind(), location);
            return Ok(RepairOutcome::Reindexed);
        }
        Err(e) => warn!("Reindexing {} failed: {}", location, e),
    }

    match backend.recreate() {
        Ok(()) => {
            warn!(
                "Wiped {} store {}: recreated empty after failed reindex",
                backend.kind(),
                location
            );
            Ok(RepairOutcome::Recreated)
        }
        Err(e) => {
            error!("Failed to recreate {}: {}", location, e);
            backend.close();
            Err(CacheError::RepairFailure(format!("{}: {}", location, e)))
        }
    }
}
