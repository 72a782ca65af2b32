//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is open.
//!
//! # Tasks
//! - Expiration sweep: deletes expired tiles at the configured interval

mod sweeper;

pub use sweeper::{spawn_sweep_task, sweep_once};
