//! Configuration Module
//!
//! Handles loading and managing cache service configuration from environment
//! variables.

use std::env;
use std::path::PathBuf;

use crate::cache::BackendKind;

/// Cache service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage engine
    pub backend: BackendKind,
    /// Cache file, or a directory to hold `TileCache.<ext>` / the tile tree
    pub cache_path: PathBuf,
    /// Seconds between background sweeps; 0 disables them
    pub sweep_interval: u64,
    /// Sweep once right after the store is opened
    pub sweep_on_open: bool,
    /// Tiles kept in memory in front of the backend; 0 disables the tier
    pub memory_capacity: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `embedded`, `relational` or `filesystem` (default: embedded)
    /// - `CACHE_PATH` - Cache location (default: ./cache)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 3600)
    /// - `SWEEP_ON_OPEN` - Sweep after opening (default: true)
    /// - `MEMORY_CAPACITY` - Tiles held in memory (default: 256)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            backend: env::var("CACHE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backend),
            cache_path: env::var("CACHE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
            sweep_on_open: env::var("SWEEP_ON_OPEN")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.sweep_on_open),
            memory_capacity: env::var("MEMORY_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_capacity),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Embedded,
            cache_path: PathBuf::from("./cache"),
            sweep_interval: 3600,
            sweep_on_open: true,
            memory_capacity: 256,
            server_port: 3000,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.backend, BackendKind::Embedded);
        assert_eq!(config.cache_path, PathBuf::from("./cache"));
        assert_eq!(config.sweep_interval, 3600);
        assert!(config.sweep_on_open);
        assert_eq!(config.memory_capacity, 256);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touching the environment so parallel tests don't race
        env::remove_var("CACHE_BACKEND");
        env::remove_var("CACHE_PATH");
        env::remove_var("SWEEP_INTERVAL");
        env::remove_var("SWEEP_ON_OPEN");
        env::remove_var("MEMORY_CAPACITY");
        env::remove_var("SERVER_PORT");

        let config = Config::from_env();
        assert_eq!(config.backend, BackendKind::Embedded);
        assert_eq!(config.sweep_interval, 3600);
        assert_eq!(config.server_port, 3000);

        env::set_var("CACHE_BACKEND", "sqlite");
        env::set_var("CACHE_PATH", "/tmp/tiles");
        env::set_var("SWEEP_INTERVAL", "0");
        env::set_var("SWEEP_ON_OPEN", "off");
        env::set_var("MEMORY_CAPACITY", "0");
        env::set_var("SERVER_PORT", "not-a-port");

        let config = Config::from_env();
        assert_eq!(config.backend, BackendKind::Relational);
        assert_eq!(config.cache_path, PathBuf::from("/tmp/tiles"));
        assert_eq!(config.sweep_interval, 0);
        assert!(!config.sweep_on_open);
        assert_eq!(config.memory_capacity, 0);
        assert_eq!(config.server_port, 3000);

        env::remove_var("CACHE_BACKEND");
        env::remove_var("CACHE_PATH");
        env::remove_var("SWEEP_INTERVAL");
        env::remove_var("SWEEP_ON_OPEN");
        env::remove_var("MEMORY_CAPACITY");
        env::remove_var("SERVER_PORT");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
