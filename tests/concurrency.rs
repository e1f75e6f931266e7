//! Concurrency scenarios: pending-delete collision and non-blocking MVCC
//! reads. Workers are spawned with `std::thread::scope` and polled against
//! an `Instant` deadline.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use filtmgr::filter::memory::MemoryFilterFactory;
use filtmgr::{FiltMgrError, Manager, ManagerConfig};

fn manager_at(dir: &std::path::Path) -> Arc<Manager> {
    Manager::init(ManagerConfig::at(dir), Box::new(MemoryFilterFactory)).expect("manager init")
}

/// Pending delete collision: a name can't be recreated while its previous
/// incarnation is still physically unreclaimed, even after the client that
/// was active at drop time has left. A forced vacuum clears the way.
#[test]
fn pending_delete_blocks_recreate_until_vacuumed() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_at(dir.path());

    manager.create(b"baz".to_vec(), None).unwrap();
    let guard_a = manager.checkpoint();

    manager.drop_filter(b"baz").unwrap();

    let err = manager.create(b"baz".to_vec(), None).unwrap_err();
    assert!(matches!(err, FiltMgrError::PendingDelete));

    manager.leave(guard_a);

    let err = manager.create(b"baz".to_vec(), None).unwrap_err();
    assert!(matches!(err, FiltMgrError::PendingDelete));

    manager.vacuum_now();

    manager.create(b"baz".to_vec(), None).unwrap();
}

/// MVCC non-blocking reads — a reader repeatedly checking an unrelated
/// filter never observes `NotFound` once created, even while a writer churns
/// through unrelated creates/drops.
#[test]
fn reads_of_unrelated_filter_are_never_blocked() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_at(dir.path());
    manager.create(b"q".to_vec(), None).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let saw_not_found = Arc::new(AtomicBool::new(false));
    let reader_iterations = Arc::new(AtomicUsize::new(0));

    std::thread::scope(|scope| {
        let reader_manager = Arc::clone(&manager);
        let reader_stop = Arc::clone(&stop);
        let reader_saw_not_found = Arc::clone(&saw_not_found);
        let reader_iterations_handle = Arc::clone(&reader_iterations);
        scope.spawn(move || {
            while !reader_stop.load(Ordering::Relaxed) {
                match reader_manager.check_keys(b"q", &[b"x".to_vec()]) {
                    Ok(_) => {}
                    Err(FiltMgrError::NotFound) => {
                        reader_saw_not_found.store(true, Ordering::Relaxed);
                        break;
                    }
                    Err(_) => break,
                }
                reader_iterations_handle.fetch_add(1, Ordering::Relaxed);
            }
        });

        let writer_manager = Arc::clone(&manager);
        scope.spawn(move || {
            for i in 0..200 {
                let name = format!("churn-{i}").into_bytes();
                let _ = writer_manager.create(name.clone(), None);
                let _ = writer_manager.drop_filter(&name);
            }
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while reader_iterations.load(Ordering::Relaxed) < 50 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        stop.store(true, Ordering::Relaxed);
    });

    assert!(!saw_not_found.load(Ordering::Relaxed));
    assert!(manager.list(None).contains(&b"q".to_vec()));
}

#[test]
fn checkpoint_guard_releases_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_at(dir.path());
    {
        let _guard = manager.checkpoint();
        assert_eq!(manager.client_count(), 1);
    }
    assert_eq!(manager.client_count(), 0);
}
