//! A concurrent, versioned registry of named Bloom filters.
//!
//! [`Manager`] owns a chain of immutable [`Version`] snapshots, swapped
//! lock-free via `arc_swap`. Readers (`check_keys`) and writers (`set_keys`)
//! hold only a per-filter read/write lock; structural operations
//! (`create`/`drop_filter`/`clear`/`unmap`) install a new `Version` rather
//! than mutating the current one in place. A background worker reclaims
//! versions once no checkpointed client can still observe them.
//!
//! The underlying Bloom filter implementation (bit array, hash functions,
//! on-disk layout) and the production name index are out of scope here: see
//! [`filter`] for the trait boundary and a reference in-memory
//! implementation, and [`index`] for the `BTreeMap`-backed stand-in.
//!
//! ```no_run
//! use filtmgr::{Manager, ManagerConfig};
//! use filtmgr::filter::memory::MemoryFilterFactory;
//!
//! let manager = Manager::init(ManagerConfig::at("/tmp/filtmgr"), Box::new(MemoryFilterFactory))?;
//! manager.create(b"users".to_vec(), None)?;
//! manager.set_keys(b"users", &[b"alice".to_vec()])?;
//! assert_eq!(manager.check_keys(b"users", &[b"alice".to_vec()])?, vec![true]);
//! # Ok::<(), filtmgr::error::FiltMgrError>(())
//! ```

pub mod clients;
pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod loader;
pub mod logging;
pub mod manager;
pub mod vacuum;
pub mod version;
pub mod wrapper;

pub use config::{FilterConfig, ManagerConfig};
pub use error::{FiltMgrError, Result};
pub use manager::{ClientGuard, Manager};
