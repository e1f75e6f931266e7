//! The underlying Bloom filter, consumed as an external collaborator.
//!
//! The filter's bit array, hash functions, and on-disk layout are
//! deliberately out of scope here. What the registry needs is a capability
//! set — `contains`/`add`/`flush`/`close`/`delete`/`is_proxied` — plus a
//! factory for `init(config, name, fresh)`. This module defines those two
//! traits; [`memory`] supplies concrete implementations so the manager is
//! testable without a real on-disk filter.

pub mod memory;

use std::fmt;

use crate::config::FilterConfig;
use crate::error::Result;

/// Capability set the registry requires from an underlying Bloom filter.
///
/// All methods take `&self`: the registry's per-wrapper `rwlock` (not any
/// lock internal to the filter) is what gives `check_keys`/`set_keys` their
/// reader/writer discipline, so implementations only need to be internally
/// `Send + Sync`, not internally mutex-free.
pub trait BloomFilter: Send + Sync + fmt::Debug {
    /// Returns whether `key` is (possibly) a member.
    fn contains(&self, key: &[u8]) -> Result<bool>;

    /// Adds `key`. Returns `true` if the key was newly set, `false` if it was
    /// already (possibly) present.
    fn add(&self, key: &[u8]) -> Result<bool>;

    /// Flushes any buffered state. Called without the wrapper's `rwlock`
    /// held — implementations must be safe to call concurrently with
    /// `contains`/`add`.
    fn flush(&self) -> Result<()>;

    /// Releases in-memory state, keeping any backing files.
    fn close(&self) -> Result<()>;

    /// Removes backing files, if any.
    fn delete(&self) -> Result<()>;

    /// Whether this filter's state is provided indirectly (only proxied
    /// filters may be `clear`ed).
    fn is_proxied(&self) -> bool;
}

/// Constructs [`BloomFilter`] instances on behalf of the registry.
///
/// Mirrors the external `init(config, name, fresh)` capability: `fresh =
/// true` means create new on-disk state, `fresh = false` means discover and
/// open whatever already exists for `name`.
pub trait FilterFactory: Send + Sync {
    fn init(
        &self,
        config: &FilterConfig,
        name: &[u8],
        fresh: bool,
    ) -> Result<Box<dyn BloomFilter>>;
}
