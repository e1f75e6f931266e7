//! Manager and per-filter configuration.
//!
//! Plain structs with `Default` plus named presets — no file parsing here,
//! that belongs to an external CLI/config-file layer.

use std::path::PathBuf;
use std::time::Duration;

/// Per-filter parameters. A filter created without an explicit override uses
/// `ManagerConfig::default_filter` verbatim; the wrapper only stores its own
/// copy when the caller supplied one (see [`crate::wrapper::FilterWrapper`]).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Expected number of items the filter is sized for.
    pub capacity: usize,
    /// Target false-positive probability.
    pub fp_probability: f64,
    /// If `false`, `unmap` is permitted to release the filter's in-memory
    /// state between uses.
    pub in_memory: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            fp_probability: 1.0e-4,
            in_memory: true,
        }
    }
}

impl FilterConfig {
    /// A config tuned for filters that are expected to see light traffic and
    /// can be safely unmapped between bursts.
    pub fn on_demand() -> Self {
        Self {
            capacity: 10_000,
            fp_probability: 1.0e-3,
            in_memory: false,
        }
    }
}

/// Global manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Directory scanned at startup for existing `bloomd.<name>` folders.
    pub data_dir: PathBuf,
    /// Config used for `create` calls that do not supply an override.
    pub default_filter: FilterConfig,
    /// Interval between vacuum worker cycles.
    pub vacuum_interval: Duration,
    /// Version-count backlog that triggers the "many concurrent versions"
    /// warning.
    pub warn_threshold: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            default_filter: FilterConfig::default(),
            vacuum_interval: Duration::from_secs(1),
            warn_threshold: 32,
        }
    }
}

impl ManagerConfig {
    /// Configuration rooted at the given data directory, otherwise defaults.
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}
