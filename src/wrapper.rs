//! The per-filter wrapper held inside a [`crate::version::Version`]'s index.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::config::FilterConfig;
use crate::filter::BloomFilter;

/// A named filter plus the concurrency control and lifecycle flags the
/// registry needs around it.
///
/// `rwlock` serializes `add` against `contains`/`close`; `flush` is
/// deliberately called without it held. `filter` is owned
/// exclusively by the wrapper — it is never shared outside an `Arc` around
/// the whole wrapper.
#[derive(Debug)]
pub struct FilterWrapper {
    pub name: Vec<u8>,
    pub filter: Box<dyn BloomFilter>,
    pub rwlock: RwLock<()>,
    pub is_active: AtomicBool,
    pub is_hot: AtomicBool,
    pub should_delete: AtomicBool,
    pub custom_config: Option<FilterConfig>,
}

impl FilterWrapper {
    pub fn new(
        name: Vec<u8>,
        filter: Box<dyn BloomFilter>,
        is_hot: bool,
        custom_config: Option<FilterConfig>,
    ) -> Self {
        Self {
            name,
            filter,
            rwlock: RwLock::new(()),
            is_active: AtomicBool::new(true),
            is_hot: AtomicBool::new(is_hot),
            should_delete: AtomicBool::new(false),
            custom_config,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Acquire)
    }

    pub fn is_hot(&self) -> bool {
        self.is_hot.load(Ordering::Acquire)
    }

    pub fn mark_cold(&self) {
        self.is_hot.store(false, Ordering::Release);
    }

    pub fn mark_for_delete(&self) {
        self.should_delete.store(true, Ordering::Release);
        self.is_active.store(false, Ordering::Release);
    }

    pub fn should_delete(&self) -> bool {
        self.should_delete.load(Ordering::Acquire)
    }
}

/// Releases `wrapper`'s underlying filter, honoring `should_delete`: removes
/// backing files if set, otherwise only closes in-memory state. Called once a
/// wrapper's parked version is reclaimed, whether by the vacuum worker or by
/// manager shutdown. Errors are logged, not propagated — teardown never
/// aborts partway through a reclamation pass.
pub fn delete_filter(wrapper: &FilterWrapper) {
    let result = if wrapper.should_delete() {
        wrapper.filter.delete()
    } else {
        wrapper.filter.close()
    };
    if let Err(err) = result {
        tracing::warn!(name = ?wrapper.name, %err, "failed to release filter during reclamation");
    }
}
