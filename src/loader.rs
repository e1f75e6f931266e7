//! Startup scan of `data_dir` for existing `bloomd.<name>` folders.
//!
//! The `entry_name.len() >= 8` guard below is load-bearing: it runs against
//! the *raw* folder name before the `"bloomd."` prefix is stripped, so a
//! folder literally named `bloomd.` (7 bytes) fails `7 < 8` and is rejected,
//! not admitted as a filter with an empty name.

use std::path::Path;

use crate::error::Result;
use crate::manager::Manager;

const FOLDER_PREFIX: &str = "bloomd.";

/// Scans `data_dir` for folders matching `bloomd.<name>` and registers one
/// cold filter per match. A single entry's failure (bad encoding, I/O error,
/// filter factory rejection) is logged and skipped rather than aborting the
/// whole scan.
pub fn scan_existing(manager: &Manager, data_dir: &Path) -> Result<usize> {
    if !data_dir.exists() {
        tracing::debug!(dir = %data_dir.display(), "data directory does not exist, nothing to load");
        return Ok(0);
    }

    let mut loaded = 0;
    for entry in std::fs::read_dir(data_dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(%err, "failed to read directory entry during startup scan");
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let entry_name = entry.file_name();
        let Some(entry_name) = entry_name.to_str() else {
            tracing::warn!("skipping non-UTF8 folder name during startup scan");
            continue;
        };

        if entry_name.len() < 8 || !entry_name.starts_with(FOLDER_PREFIX) {
            continue;
        }
        let name = &entry_name[FOLDER_PREFIX.len()..];

        match manager.add_existing_filter(name.as_bytes()) {
            Ok(()) => loaded += 1,
            Err(err) => tracing::warn!(name, %err, "failed to load existing filter"),
        }
    }

    tracing::info!(loaded, "startup scan complete");
    Ok(loaded)
}
