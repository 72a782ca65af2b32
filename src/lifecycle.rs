//! Lifecycle Module
//!
//! Maps host suspend/resume onto store open/close. The host owns the
//! controller and forwards its events; nothing subscribes globally.

use tracing::{error, info};

use crate::cache::CacheStore;

/// Host application state changes the cache cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Suspending,
    Resuming,
}

/// Opens and closes a store around host suspend boundaries.
#[derive(Clone)]
pub struct LifecycleController {
    store: CacheStore,
}

impl LifecycleController {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Reopens the store. Returns whether it is open afterwards.
    ///
    /// A failed open is logged; the store keeps serving misses.
    pub async fn resume(&self) -> bool {
        match self.store.reopen().await {
            Ok(()) => {
                info!("Cache resumed");
                true
            }
            Err(e) => {
                error!("Cache could not be reopened: {}", e);
                false
            }
        }
    }

    /// Closes the store, releasing its file handle or connection.
    pub async fn suspend(&self) {
        self.store.close().await;
        info!("Cache suspended");
    }

    /// Dispatches a host event. Returns whether the store is open afterwards.
    pub async fn handle(&self, event: HostEvent) -> bool {
        match event {
            HostEvent::Suspending => {
                self.suspend().await;
                false
            }
            HostEvent::Resuming => self.resume().await,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }
}
