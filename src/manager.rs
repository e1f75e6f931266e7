//! The filter registry itself.
//!
//! Lock hierarchy, acquired in this order when more than one is needed:
//! `write_lock` (serializes `create`/`drop_filter`/`clear`/`unmap`) ->
//! `vacuum_lock` (guards `clean_old_versions` and `create`'s pending-delete
//! scan) -> a wrapper's own `rwlock` (guards that filter's `add`/`contains`/
//! `close`) -> `clients_lock`, internal to [`crate::clients::ClientRegistry`]
//! (guards only the client list splice, never held across a filter
//! operation). `latest` is read without any lock via `ArcSwap::load`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::clients::{ClientRecord, ClientRegistry};
use crate::config::{FilterConfig, ManagerConfig};
use crate::error::{FiltMgrError, Result};
use crate::filter::FilterFactory;
use crate::index::NameIndex;
use crate::loader;
use crate::vacuum::{self, VacuumHandle};
use crate::version::Version;
use crate::wrapper::{delete_filter, FilterWrapper};

/// A pinned checkpoint held by one client thread, released on `Drop` (or
/// explicitly via [`Manager::leave`]).
pub struct ClientGuard {
    registry: Arc<ClientRegistry>,
    record: Arc<ClientRecord>,
}

impl ClientGuard {
    pub fn vsn(&self) -> u64 {
        self.record.vsn()
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.registry.leave(&self.record);
    }
}

/// Concurrent, versioned registry of named Bloom filters.
pub struct Manager {
    latest: Arc<ArcSwap<Version>>,
    write_lock: Mutex<()>,
    vacuum_lock: Mutex<()>,
    clients: Arc<ClientRegistry>,
    config: ManagerConfig,
    factory: Box<dyn FilterFactory>,
    vacuum: Mutex<Option<VacuumHandle>>,
    closed: AtomicBool,
}

impl Manager {
    /// Brings up a registry rooted at `config.data_dir`, loading any
    /// previously-created filters as cold entries and starting the
    /// background vacuum worker.
    pub fn init(config: ManagerConfig, factory: Box<dyn FilterFactory>) -> Result<Arc<Self>> {
        let latest = Arc::new(ArcSwap::new(Version::initial()));
        let clients = Arc::new(ClientRegistry::new());
        let vacuum = VacuumHandle::spawn(
            Arc::clone(&latest),
            Arc::clone(&clients),
            config.vacuum_interval,
            config.warn_threshold,
        );

        let manager = Arc::new(Self {
            latest,
            write_lock: Mutex::new(()),
            vacuum_lock: Mutex::new(()),
            clients,
            config: config.clone(),
            factory,
            vacuum: Mutex::new(Some(vacuum)),
            closed: AtomicBool::new(false),
        });

        let data_dir = config.data_dir.clone();
        loader::scan_existing(&manager, &data_dir)?;

        Ok(manager)
    }

    /// Registers the calling thread with the registry and pins it to the
    /// current `latest` version until the returned guard is dropped or
    /// passed to [`Manager::leave`].
    pub fn checkpoint(&self) -> ClientGuard {
        let vsn = self.latest.load().vsn;
        let record = self.clients.checkpoint(vsn);
        ClientGuard {
            registry: Arc::clone(&self.clients),
            record,
        }
    }

    /// Explicitly releases a checkpoint. Equivalent to dropping `guard`.
    pub fn leave(&self, guard: ClientGuard) {
        drop(guard);
    }

    fn find_active(&self, name: &[u8]) -> Result<Arc<FilterWrapper>> {
        let latest = self.latest.load();
        let wrapper = latest.index.get(name).ok_or(FiltMgrError::NotFound)?;
        if !wrapper.is_active() {
            return Err(FiltMgrError::NotFound);
        }
        Ok(wrapper)
    }

    /// Tests membership of each of `keys` against the named filter.
    pub fn check_keys(&self, name: &[u8], keys: &[Vec<u8>]) -> Result<Vec<bool>> {
        let wrapper = self.find_active(name)?;
        let _guard = wrapper.rwlock.read();
        let result = keys
            .iter()
            .map(|k| wrapper.filter.contains(k))
            .collect::<Result<Vec<_>>>()?;
        wrapper.is_hot.store(true, Ordering::Release);
        Ok(result)
    }

    /// Sets each of `keys` in the named filter, returning whether each was
    /// newly added.
    pub fn set_keys(&self, name: &[u8], keys: &[Vec<u8>]) -> Result<Vec<bool>> {
        let wrapper = self.find_active(name)?;
        let _guard = wrapper.rwlock.write();
        let result = keys
            .iter()
            .map(|k| wrapper.filter.add(k))
            .collect::<Result<Vec<_>>>()?;
        wrapper.is_hot.store(true, Ordering::Release);
        Ok(result)
    }

    /// Flushes the named filter's buffered state. Deliberately does not take
    /// the wrapper's `rwlock` — callers may flush concurrently with
    /// `check_keys`/`set_keys`.
    pub fn flush(&self, name: &[u8]) -> Result<()> {
        let wrapper = self.find_active(name)?;
        wrapper.filter.flush()
    }

    /// Runs `f` against the named filter's [`crate::filter::BloomFilter`]
    /// with a read lock held, for callers needing a custom operation beyond
    /// `check_keys`/`set_keys`.
    pub fn with_filter<R>(
        &self,
        name: &[u8],
        f: impl FnOnce(&dyn crate::filter::BloomFilter) -> R,
    ) -> Result<R> {
        let wrapper = self.find_active(name)?;
        let _guard = wrapper.rwlock.read();
        Ok(f(wrapper.filter.as_ref()))
    }

    /// Walks the version chain from `latest.prev` backward looking for a
    /// `deleted` wrapper named `name` that has not yet been reclaimed. Must
    /// be called with `vacuum_lock` held, so the worker cannot free the
    /// version out from under the scan.
    fn has_pending_delete(&self, name: &[u8]) -> bool {
        let mut cursor = self.latest.load().prev.lock().clone();
        while let Some(v) = cursor {
            if let Some(deleted) = v.deleted.lock().as_ref() {
                if deleted.name == name {
                    return true;
                }
            }
            cursor = v.prev.lock().clone();
        }
        false
    }

    /// Allocates a wrapper around a freshly constructed underlying filter.
    /// `is_hot` doubles as the factory's `fresh` flag: true creates new
    /// on-disk state, false discovers whatever already exists for `name`.
    /// The custom config is recorded only when it differs from the manager
    /// default. Never installs a version; callers splice the returned
    /// wrapper into an index themselves.
    fn add_filter(&self, name: &[u8], config: Option<FilterConfig>, is_hot: bool) -> Result<Arc<FilterWrapper>> {
        let effective_config = config
            .clone()
            .unwrap_or_else(|| self.config.default_filter.clone());
        let filter = self.factory.init(&effective_config, name, is_hot)?;
        let custom_config = config.filter(|c| *c != self.config.default_filter);
        Ok(Arc::new(FilterWrapper::new(
            name.to_vec(),
            filter,
            is_hot,
            custom_config,
        )))
    }

    /// Creates a new filter named `name`. Fails with
    /// [`FiltMgrError::AlreadyExists`] if a filter by that name is currently
    /// active, or [`FiltMgrError::PendingDelete`] if an earlier delete for
    /// that name has not yet been reclaimed by the vacuum worker.
    pub fn create(&self, name: Vec<u8>, config: Option<FilterConfig>) -> Result<()> {
        let _write = self.write_lock.lock();
        let latest = self.latest.load_full();
        if latest.index.contains(&name) {
            return Err(FiltMgrError::AlreadyExists);
        }

        {
            let _vacuum = self.vacuum_lock.lock();
            if self.has_pending_delete(&name) {
                tracing::warn!(name = ?name, "create blocked by unreclaimed pending delete");
                return Err(FiltMgrError::PendingDelete);
            }
        }

        let wrapper = self.add_filter(&name, config, true)?;
        let new_index = latest.index.with_inserted(name, wrapper);
        let new_version = Version::next(latest, new_index);
        self.latest.store(new_version);
        Ok(())
    }

    /// Registers an already-existing filter discovered on disk as a cold
    /// entry. Used only by the startup scan.
    pub(crate) fn add_existing_filter(&self, name: &[u8]) -> Result<()> {
        let _write = self.write_lock.lock();
        let latest = self.latest.load_full();
        if latest.index.contains(name) {
            return Ok(());
        }
        let wrapper = self.add_filter(name, None, false)?;
        let new_index = latest.index.with_inserted(name.to_vec(), wrapper);
        let new_version = Version::next(latest, new_index);
        self.latest.store(new_version);
        Ok(())
    }

    /// Removes `name` from the active namespace. The filter itself is parked
    /// on `latest` — the version being superseded, not the one this call
    /// installs — so the vacuum worker can reclaim it once no client still
    /// observes that version or anything older.
    pub fn drop_filter(&self, name: &[u8]) -> Result<()> {
        let _write = self.write_lock.lock();
        let latest = self.latest.load_full();
        let wrapper = latest.index.get(name).ok_or(FiltMgrError::NotFound)?;
        if !wrapper.is_active() {
            return Err(FiltMgrError::NotFound);
        }
        wrapper.mark_for_delete();

        let new_index = latest.index.with_removed(name);
        *latest.deleted.lock() = Some(wrapper);
        let new_version = Version::next(latest, new_index);
        self.latest.store(new_version);
        Ok(())
    }

    /// Clears a proxied filter's contents. Fails with
    /// [`FiltMgrError::NotProxied`] for any filter that is not proxied, since
    /// only proxied filters have externally-owned state that can be reset in
    /// place. Otherwise behaves exactly like [`Manager::drop_filter`] except
    /// `should_delete` stays `false`, so reclamation later closes rather
    /// than deletes the underlying filter — a memory-only reset, not an
    /// on-disk removal.
    pub fn clear(&self, name: &[u8]) -> Result<()> {
        let _write = self.write_lock.lock();
        let latest = self.latest.load_full();
        let wrapper = latest.index.get(name).ok_or(FiltMgrError::NotFound)?;
        if !wrapper.is_active() {
            return Err(FiltMgrError::NotFound);
        }
        if !wrapper.filter.is_proxied() {
            return Err(FiltMgrError::NotProxied);
        }
        wrapper.is_active.store(false, Ordering::Release);

        let new_index = latest.index.with_removed(name);
        *latest.deleted.lock() = Some(wrapper);
        let new_version = Version::next(latest, new_index);
        self.latest.store(new_version);
        Ok(())
    }

    /// Releases the named filter's in-memory state while keeping its name
    /// binding and any backing storage, marking it cold. A no-op (but still
    /// successful) for filters whose config keeps them resident in memory —
    /// only on-demand filters (`in_memory = false`) are actually unmapped.
    /// Never installs a new version.
    pub fn unmap(&self, name: &[u8]) -> Result<()> {
        let _write = self.write_lock.lock();
        let wrapper = self.find_active(name)?;
        let in_memory = wrapper
            .custom_config
            .as_ref()
            .map(|c| c.in_memory)
            .unwrap_or(self.config.default_filter.in_memory);
        if in_memory {
            return Ok(());
        }
        let _guard = wrapper.rwlock.write();
        wrapper.filter.close()?;
        wrapper.mark_cold();
        Ok(())
    }

    /// Lists every currently active filter name, optionally restricted to
    /// those starting with `prefix`.
    pub fn list(&self, prefix: Option<&[u8]>) -> Vec<Vec<u8>> {
        let latest = self.latest.load();
        match prefix {
            Some(prefix) => latest
                .index
                .iter_prefix(prefix)
                .filter(|(_, w)| w.is_active())
                .map(|(name, _)| name.to_vec())
                .collect(),
            None => latest
                .index
                .iter()
                .filter(|(_, w)| w.is_active())
                .map(|(name, _)| name.to_vec())
                .collect(),
        }
    }

    /// Lists active filter names that have seen no traffic since the
    /// previous sweep and are not proxied. A filter still marked hot is
    /// demoted to cold and skipped this round rather than reported — it
    /// takes two quiet sweeps in a row to be listed, the sampled
    /// hot-to-cold classification the registry specifies. Proxied filters
    /// have no in-memory state of their own to reclaim, so they are skipped
    /// unconditionally.
    pub fn list_cold(&self) -> Vec<Vec<u8>> {
        let latest = self.latest.load();
        let mut cold = Vec::new();
        for (name, wrapper) in latest.index.iter() {
            if !wrapper.is_active() {
                continue;
            }
            if wrapper.is_hot() {
                wrapper.mark_cold();
                continue;
            }
            if wrapper.filter.is_proxied() {
                continue;
            }
            cold.push(name.to_vec());
        }
        cold
    }

    /// Forces an immediate vacuum cycle, reclaiming every version strictly
    /// older than the current one regardless of client checkpoints.
    pub fn vacuum_now(&self) {
        let _vacuum = self.vacuum_lock.lock();
        let latest = self.latest.load_full();
        vacuum::vacuum_now(&latest);
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Stops the background vacuum worker, then tears down every filter
    /// still reachable from the version chain: every wrapper active in
    /// `latest` is closed (not removed), then every version's deferred
    /// `deleted` wrapper is released honoring `should_delete`. Idempotent.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(mut handle) = self.vacuum.lock().take() {
            handle.shutdown();
        }

        let latest = self.latest.load_full();
        for (_, wrapper) in latest.index.iter() {
            if let Err(err) = wrapper.filter.close() {
                tracing::warn!(name = ?wrapper.name, %err, "failed to close filter during shutdown");
            }
        }

        let mut cursor = Some(latest);
        while let Some(v) = cursor {
            if let Some(wrapper) = v.deleted.lock().take() {
                delete_filter(&wrapper);
            }
            cursor = v.prev.lock().take();
        }
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
