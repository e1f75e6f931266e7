//! Error taxonomy for the filter registry.
//!
//! Mirrors the four-way return-code taxonomy from the original service
//! (`-1` precondition, `-2` internal, `-3` conflict) as a `thiserror` enum
//! instead of raw integers, since callers in idiomatic Rust match on variants.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FiltMgrError>;

#[derive(Debug, Error)]
pub enum FiltMgrError {
    /// The named filter does not exist, or is no longer active.
    #[error("no such filter")]
    NotFound,

    /// `create` was called for a name already present in `latest`.
    #[error("filter already exists")]
    AlreadyExists,

    /// `create` was called for a name that still has an unreclaimed deletion
    /// parked on an older version.
    #[error("filter has a pending delete")]
    PendingDelete,

    /// `clear` was called on a filter that is not proxied.
    #[error("filter is not proxied")]
    NotProxied,

    /// The underlying filter or an allocation failed.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O failure while scanning the data directory at startup.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
