//! Immutable version snapshots forming the MVCC chain.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::index::NameIndex;
use crate::wrapper::FilterWrapper;

/// One immutable snapshot of the filter namespace.
///
/// `deleted` parks the filter this version's *successor* removed from the
/// index — set exactly once, on `prev`, by the operation that builds the
/// version superseding it, before that new version is installed as `latest`.
/// Kept alive until no client can still observe this version or anything
/// older. `prev` chains to the version this one superseded; the vacuum
/// worker prunes it from the leaves inward.
#[derive(Debug)]
pub struct Version {
    pub vsn: u64,
    pub index: NameIndex,
    pub deleted: Mutex<Option<Arc<FilterWrapper>>>,
    pub prev: Mutex<Option<Arc<Version>>>,
}

impl Version {
    pub fn initial() -> Arc<Self> {
        Arc::new(Self {
            vsn: 0,
            index: NameIndex::new(),
            deleted: Mutex::new(None),
            prev: Mutex::new(None),
        })
    }

    /// Builds the next version on top of `prev`, with `index` reflecting the
    /// change. Does not touch `prev.deleted` — callers park a removed
    /// wrapper on `prev` themselves, before superseding it, since the
    /// wrapper belongs to the version it was removed from, not the one being
    /// installed.
    pub fn next(prev: Arc<Version>, index: NameIndex) -> Arc<Self> {
        let vsn = prev.vsn + 1;
        Arc::new(Self {
            vsn,
            index,
            deleted: Mutex::new(None),
            prev: Mutex::new(Some(prev)),
        })
    }
}
