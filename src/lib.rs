//! Tile Cache - A persistent map tile cache
//!
//! Stores opaque tile blobs with absolute expirations in an embedded record
//! store, a SQLite table or a directory tree, with sweeping, corruption
//! repair and suspend/resume handling. An HTTP service exposes it.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod distributed;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{BackendKind, CacheEntry, CacheStore, StorageBackend, StoreOptions};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use distributed::{DistributedCache, EntryOptions};
pub use error::{CacheError, Result};
pub use lifecycle::{HostEvent, LifecycleController};
pub use tasks::spawn_sweep_task;
