//! Client checkpoint registry used for epoch reclamation.
//!
//! List mutation goes through a lock, but the vacuum worker's per-cycle scan
//! for the minimum observed version only needs a snapshot of the `Arc`s plus
//! a lock-free read of each `vsn`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::Mutex;

/// One registered client's last-checkpointed version. `u64::MAX` means the
/// client has left and should be skipped by the minimum-version scan.
#[derive(Debug)]
pub struct ClientRecord {
    pub thread_id: ThreadId,
    vsn: AtomicU64,
}

pub const LEFT: u64 = u64::MAX;

impl ClientRecord {
    pub fn vsn(&self) -> u64 {
        self.vsn.load(Ordering::SeqCst)
    }

    pub fn set_vsn(&self, vsn: u64) {
        self.vsn.store(vsn, Ordering::SeqCst);
    }
}

/// Tracks every live client's most recently checkpointed version.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<Vec<Arc<ClientRecord>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the calling thread (if not already registered) and records
    /// `vsn` as its checkpoint.
    pub fn checkpoint(&self, vsn: u64) -> Arc<ClientRecord> {
        let thread_id = std::thread::current().id();
        let mut clients = self.clients.lock();
        if let Some(existing) = clients.iter().find(|c| c.thread_id == thread_id) {
            existing.set_vsn(vsn);
            return Arc::clone(existing);
        }
        let record = Arc::new(ClientRecord {
            thread_id,
            vsn: AtomicU64::new(vsn),
        });
        clients.push(Arc::clone(&record));
        record
    }

    /// Marks `record` as departed. Leaves it in the list (so concurrent
    /// scanners holding an `Arc` never see a dangling pointer) but flags its
    /// `vsn` as [`LEFT`] so it stops constraining reclamation.
    pub fn leave(&self, record: &Arc<ClientRecord>) {
        record.set_vsn(LEFT);
        let mut clients = self.clients.lock();
        clients.retain(|c| !Arc::ptr_eq(c, record));
    }

    /// The minimum checkpointed version across all live clients, or `None` if
    /// there are no clients with an active checkpoint.
    pub fn min_vsn(&self) -> Option<u64> {
        let snapshot: Vec<Arc<ClientRecord>> = self.clients.lock().clone();
        snapshot
            .iter()
            .map(|c| c.vsn())
            .filter(|&v| v != LEFT)
            .min()
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }
}
