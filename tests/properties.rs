//! Property tests for the invariants phrased in property form: name
//! uniqueness in `latest`, and the create/drop/vacuum/create round trip.

use proptest::prelude::*;

use filtmgr::filter::memory::MemoryFilterFactory;
use filtmgr::{Manager, ManagerConfig};

fn fresh_manager() -> (tempfile::TempDir, std::sync::Arc<Manager>) {
    let dir = tempfile::tempdir().unwrap();
    let manager =
        Manager::init(ManagerConfig::at(dir.path()), Box::new(MemoryFilterFactory)).unwrap();
    (dir, manager)
}

proptest! {
    /// At most one active entry per name in `latest`, however many times
    /// creation is attempted.
    #[test]
    fn name_uniqueness_holds(names in prop::collection::vec("[a-z]{1,8}", 1..20)) {
        let (_dir, manager) = fresh_manager();
        for name in &names {
            let _ = manager.create(name.as_bytes().to_vec(), None);
        }

        let listed = manager.list(None);
        let mut seen = std::collections::HashSet::new();
        for name in &listed {
            prop_assert!(seen.insert(name.clone()), "duplicate active name in latest.index");
        }
        for name in &names {
            prop_assert!(listed.contains(&name.as_bytes().to_vec()));
        }
    }

    /// create; drop; vacuum; create round-trips to success when no
    /// concurrent checkpoint pins the deleted version.
    #[test]
    fn round_trip_create_drop_vacuum_create(name in "[a-z]{1,8}") {
        let (_dir, manager) = fresh_manager();
        let bytes = name.as_bytes().to_vec();

        manager.create(bytes.clone(), None).unwrap();
        manager.drop_filter(&bytes).unwrap();
        manager.vacuum_now();

        prop_assert!(manager.create(bytes, None).is_ok());
    }
}

/// `create` returns `PendingDelete` exactly when some unreclaimed version
/// still carries a `deleted` wrapper for that name, regardless of whether
/// any client is registered — resurrecting the name under fresh on-disk
/// state while an old incarnation awaits reclamation is never safe.
#[test]
fn pending_delete_exactness() {
    let (_dir, manager) = fresh_manager();
    manager.create(b"n".to_vec(), None).unwrap();
    manager.drop_filter(b"n").unwrap();

    assert!(matches!(
        manager.create(b"n".to_vec(), None).unwrap_err(),
        filtmgr::FiltMgrError::PendingDelete
    ));

    manager.vacuum_now();
    assert!(manager.create(b"n".to_vec(), None).is_ok());
}

/// A live client checkpoint does not change whether `create` observes a
/// pending delete — only whether the background worker is willing to
/// reclaim it. A forced vacuum reclaims unconditionally.
#[test]
fn pending_delete_ignores_client_checkpoints() {
    let (_dir, manager) = fresh_manager();
    manager.create(b"m".to_vec(), None).unwrap();
    let guard = manager.checkpoint();
    manager.drop_filter(b"m").unwrap();

    assert!(manager.create(b"m".to_vec(), None).is_err());
    manager.vacuum_now();
    assert!(manager.create(b"m".to_vec(), None).is_ok());
    manager.leave(guard);
}
