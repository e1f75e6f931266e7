//! Background reclamation worker.
//!
//! Walks the version chain recursively, leaf-first: recurse into `prev`
//! first, then clear the parent's `prev` pointer if the recursive call
//! destroyed it, then decide whether `v` itself can be destroyed by
//! comparing `v.vsn` against the minimum version any client still observes.
//! A version being destroyed first has its `deleted` slot (if any) released
//! through [`delete_filter`], honoring `should_delete`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::clients::ClientRegistry;
use crate::version::Version;
use crate::wrapper::delete_filter;

/// Recursively prunes `version`'s ancestor chain, keeping only versions with
/// `vsn >= min_vsn` (or the chain head, `version` itself, which the caller
/// never wants destroyed out from under it). Before a version is unlinked,
/// whatever filter it has parked in `deleted` is released.
fn clean_old_versions(version: &Arc<Version>, min_vsn: u64) {
    let prev = version.prev.lock().clone();
    let Some(prev) = prev else {
        return;
    };

    clean_old_versions(&prev, min_vsn);

    if prev.vsn < min_vsn {
        if let Some(wrapper) = prev.deleted.lock().take() {
            delete_filter(&wrapper);
        }
        *version.prev.lock() = None;
    }
}

/// Runs one vacuum cycle against `latest`, pruning every ancestor version
/// with `vsn` strictly below the minimum version any registered client still
/// observes. Filters parked in a pruned version's `deleted` slot are released
/// (and their backing storage reclaimed) along with the version.
pub fn run_cycle(latest: &Arc<Version>, clients: &ClientRegistry, warn_threshold: u64) {
    let min_vsn = clients
        .min_vsn()
        .map_or(latest.vsn, |client_min| client_min.min(latest.vsn));
    let gap = latest.vsn.saturating_sub(min_vsn);
    if gap > warn_threshold {
        tracing::warn!(gap, warn_threshold, "many concurrent versions");
    }
    tracing::debug!(latest_vsn = latest.vsn, min_vsn, "running vacuum cycle");
    clean_old_versions(latest, min_vsn);
}

/// Forces an immediate vacuum cycle using `latest.vsn` as the threshold —
/// this reclaims every version strictly older than the current one,
/// regardless of what any client has checkpointed. Intentional: a forced
/// vacuum does not wait for clients to catch up.
pub fn vacuum_now(latest: &Arc<Version>) {
    clean_old_versions(latest, latest.vsn);
}

/// Handle controlling the background vacuum thread's lifetime.
pub struct VacuumHandle {
    should_run: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl VacuumHandle {
    pub fn spawn(
        latest: Arc<arc_swap::ArcSwap<Version>>,
        clients: Arc<ClientRegistry>,
        interval: Duration,
        warn_threshold: u64,
    ) -> Self {
        let should_run = Arc::new(AtomicBool::new(true));
        let should_run_thread = Arc::clone(&should_run);
        let thread = std::thread::Builder::new()
            .name("filtmgr-vacuum".into())
            .spawn(move || {
                tracing::info!("vacuum worker started");
                while should_run_thread.load(Ordering::Acquire) {
                    std::thread::sleep(interval);
                    if !should_run_thread.load(Ordering::Acquire) {
                        break;
                    }
                    let current = latest.load_full();
                    run_cycle(&current, &clients, warn_threshold);
                }
                tracing::info!("vacuum worker stopped");
            })
            .expect("failed to spawn vacuum thread");
        Self {
            should_run,
            thread: Some(thread),
        }
    }

    pub fn shutdown(&mut self) {
        self.should_run.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for VacuumHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
