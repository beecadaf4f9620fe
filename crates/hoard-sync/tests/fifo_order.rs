//! Integration test: FIFO service order and exact outstanding counts.
//!
//! Arrival at `lock()` is serialized by waiting until each spawned
//! thread's ticket has been issued (observable through `outstanding()`)
//! before spawning the next one. The grant order must then equal the
//! spawn order exactly.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use hoard_sync::TicketLock;

/// Spin (with sleeps) until `lock.outstanding()` reaches `target`.
fn wait_for_outstanding<T>(lock: &TicketLock<T>, target: u64) {
    while lock.outstanding() < target {
        thread::sleep(Duration::from_micros(50));
    }
}

#[test]
fn serialized_arrivals_are_granted_in_order() {
    const WAITERS: usize = 12;

    let lock = Arc::new(TicketLock::new(Vec::with_capacity(WAITERS)));
    let gate = lock.lock();
    let (granted_tx, granted_rx) = unbounded();

    let mut handles = Vec::with_capacity(WAITERS);
    for i in 0..WAITERS {
        let worker_lock = Arc::clone(&lock);
        let granted_tx = granted_tx.clone();
        handles.push(thread::spawn(move || {
            let mut order = worker_lock.lock();
            order.push(i);
            granted_tx.send((i, order.ticket())).unwrap();
        }));
        // Holder plus every waiter spawned so far.
        wait_for_outstanding(&lock, i as u64 + 2);
    }
    drop(granted_tx);

    assert_eq!(lock.outstanding(), WAITERS as u64 + 1);
    drop(gate);

    for h in handles {
        h.join().unwrap();
    }

    let grants: Vec<(usize, u64)> = granted_rx.iter().collect();
    let expected: Vec<(usize, u64)> = (0..WAITERS).map(|i| (i, i as u64 + 1)).collect();
    assert_eq!(grants, expected);
    assert_eq!(*lock.lock(), (0..WAITERS).collect::<Vec<_>>());
    assert_eq!(lock.outstanding(), 0);
}

#[test]
fn outstanding_tracks_started_minus_released() {
    let lock = Arc::new(TicketLock::new(()));
    let (release_tx, release_rx) = unbounded::<()>();
    let (acquired_tx, acquired_rx) = unbounded::<u64>();

    let gate = lock.lock();
    assert_eq!(lock.outstanding(), 1);

    let mut handles = Vec::new();
    for n in 0..4u64 {
        let worker_lock = Arc::clone(&lock);
        let release_rx = release_rx.clone();
        let acquired_tx = acquired_tx.clone();
        handles.push(thread::spawn(move || {
            let guard = worker_lock.lock();
            acquired_tx.send(guard.ticket()).unwrap();
            // Hold until told to release.
            release_rx.recv().unwrap();
            drop(guard);
        }));
        wait_for_outstanding(&lock, n + 2);
        assert_eq!(lock.outstanding(), n + 2);
    }

    drop(gate);
    for remaining in (1..=4u64).rev() {
        let ticket = acquired_rx.recv().unwrap();
        assert_eq!(ticket, 5 - remaining);
        // The holder has not released yet, so nothing has drained.
        assert_eq!(lock.outstanding(), remaining);
        release_tx.send(()).unwrap();
    }

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(lock.outstanding(), 0);
}

#[test]
fn try_lock_never_overtakes_a_waiter() {
    let lock = Arc::new(TicketLock::new(0u32));
    let gate = lock.lock();

    let waiter = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            let mut guard = lock.lock();
            *guard += 1;
        })
    };
    wait_for_outstanding(&lock, 2);

    drop(gate);
    // Either the waiter still holds the lock, or it already finished.
    // In no case may try_lock grab a ticket ahead of it.
    if let Some(guard) = lock.try_lock() {
        assert_eq!(*guard, 1);
    }
    waiter.join().unwrap();
    assert_eq!(*lock.lock(), 1);
}
