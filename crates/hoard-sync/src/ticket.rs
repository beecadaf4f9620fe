//! The ticket lock and its RAII guard.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::raw::LockCell;

/// Ticket dispenser and service counter.
///
/// Both counters only ever increase. `tail - head` is the number of
/// acquisitions that have started but not yet been released.
#[derive(Debug, Default)]
struct Queue {
    /// Ticket currently being served.
    head: u64,
    /// Next ticket to hand out.
    tail: u64,
}

impl Queue {
    fn outstanding(&self) -> u64 {
        self.tail.wrapping_sub(self.head)
    }
}

/// A FIFO-fair mutual-exclusion lock that owns the value it protects.
///
/// Each call to [`lock`](Self::lock) draws the next ticket and blocks
/// until that ticket is served, so the Nth caller to begin acquiring is
/// the Nth to be granted the lock regardless of scheduling. Releasing
/// happens when the returned [`TicketGuard`] is dropped.
///
/// Unlike [`std::sync::Mutex`], the lock does not poison: a guard dropped
/// during unwinding still hands the lock to the next ticket. Callers that
/// need transactional state must restore it themselves.
///
/// The lock is not reentrant. Acquiring it twice on one thread deadlocks.
pub struct TicketLock<T> {
    queue: Mutex<Queue>,
    served: Condvar,
    data: LockCell<T>,
}

// Compile-time assertion: TicketLock must be Send + Sync for Send data.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<TicketLock<Vec<u8>>>();
};

impl<T> TicketLock<T> {
    /// Create an unlocked ticket lock protecting `value`.
    pub const fn new(value: T) -> Self {
        Self {
            queue: Mutex::new(Queue { head: 0, tail: 0 }),
            served: Condvar::new(),
            data: LockCell::new(value),
        }
    }

    /// Draw a ticket and block until it is served.
    ///
    /// The wait is cooperative: the thread sleeps on a condition variable
    /// and re-checks its ticket on every wake.
    pub fn lock(&self) -> TicketGuard<'_, T> {
        let mut queue = self.queue();
        let ticket = queue.tail;
        queue.tail = queue.tail.wrapping_add(1);
        if queue.head != ticket {
            log::trace!(
                "ticket {ticket} queued behind {} outstanding",
                queue.outstanding() - 1
            );
        }
        while queue.head != ticket {
            queue = self
                .served
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(queue);
        TicketGuard::new(self, ticket)
    }

    /// Acquire the lock only if nobody holds or waits for it.
    ///
    /// Never overtakes a queued waiter: returns `None` whenever any ticket
    /// is outstanding.
    pub fn try_lock(&self) -> Option<TicketGuard<'_, T>> {
        let mut queue = self.queue();
        if queue.outstanding() != 0 {
            return None;
        }
        let ticket = queue.tail;
        queue.tail = queue.tail.wrapping_add(1);
        drop(queue);
        Some(TicketGuard::new(self, ticket))
    }

    /// Number of acquisitions that have started but not yet released.
    ///
    /// Includes the current holder, so a held lock with no waiters
    /// reports 1. Read under the internal mutex, so it is exact with
    /// respect to every `lock()` and release that completed before it.
    pub fn outstanding(&self) -> u64 {
        self.queue().outstanding()
    }

    /// Whether some caller currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.outstanding() != 0
    }

    /// Mutable access without locking; `&mut self` proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Consume the lock and return the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    fn release(&self) {
        let mut queue = self.queue();
        queue.head = queue.head.wrapping_add(1);
        self.served.notify_all();
    }

    /// Lock the short internal critical section.
    ///
    /// The counters are updated with plain integer ops that cannot panic
    /// midway, so a poisoned mutex still guards consistent state.
    fn queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Default> Default for TicketLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for TicketLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue();
        f.debug_struct("TicketLock")
            .field("queue_head", &queue.head)
            .field("queue_tail", &queue.tail)
            .finish_non_exhaustive()
    }
}

/// Proof that the holder's ticket is being served.
///
/// Dereferences to the protected value. Dropping the guard advances
/// `queue_head` and wakes every waiter.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct TicketGuard<'a, T> {
    lock: &'a TicketLock<T>,
    ticket: u64,
    // Send/Sync follow `&mut T`, as for `MutexGuard`.
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> TicketGuard<'a, T> {
    fn new(lock: &'a TicketLock<T>, ticket: u64) -> Self {
        Self {
            lock,
            ticket,
            _marker: PhantomData,
        }
    }

    /// The ticket this guard was granted.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

#[allow(unsafe_code)]
impl<T> Deref for TicketGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: a live guard means `self.ticket` is being served.
        unsafe { self.lock.data.get() }
    }
}

#[allow(unsafe_code)]
impl<T> DerefMut for TicketGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: a live guard means `self.ticket` is being served, and
        // `&mut self` excludes other borrows through this guard.
        unsafe { self.lock.data.get_unchecked_mut() }
    }
}

impl<T> Drop for TicketGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

impl<T: fmt::Debug> fmt::Debug for TicketGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketGuard")
            .field("ticket", &self.ticket)
            .field("data", &**self)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fresh_lock_is_unlocked() {
        let lock = TicketLock::new(0u32);
        assert_eq!(lock.outstanding(), 0);
        assert!(!lock.is_locked());
    }

    #[test]
    fn guard_grants_access_and_releases_on_drop() {
        let lock = TicketLock::new(1u32);
        {
            let mut guard = lock.lock();
            assert_eq!(lock.outstanding(), 1);
            *guard += 41;
        }
        assert_eq!(lock.outstanding(), 0);
        assert_eq!(*lock.lock(), 42);
    }

    #[test]
    fn tickets_are_issued_sequentially() {
        let lock = TicketLock::new(());
        for expected in 0..5 {
            let guard = lock.lock();
            assert_eq!(guard.ticket(), expected);
        }
    }

    #[test]
    fn try_lock_refuses_while_held() {
        let lock = TicketLock::new(());
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        // A refused try_lock must not consume a ticket.
        assert_eq!(lock.outstanding(), 1);
        drop(guard);
        let again = lock.try_lock().expect("lock is free");
        assert_eq!(again.ticket(), 1);
    }

    #[test]
    fn get_mut_and_into_inner_bypass_the_queue() {
        let mut lock = TicketLock::new(vec![1u8]);
        lock.get_mut().push(2);
        assert_eq!(lock.into_inner(), vec![1, 2]);
    }

    #[test]
    fn counter_is_mutually_exclusive() {
        let lock = Arc::new(TicketLock::new(0u64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = Arc::clone(&lock);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        let mut guard = lock.lock();
                        let seen = *guard;
                        thread::yield_now();
                        *guard = seen + 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock.lock(), 8_000);
        assert_eq!(lock.outstanding(), 0);
    }

    #[test]
    fn panic_while_holding_still_releases() {
        let lock = Arc::new(TicketLock::new(0u32));
        let worker = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let mut guard = lock.lock();
                *guard = 7;
                panic!("boom");
            })
        };
        assert!(worker.join().is_err());
        assert_eq!(lock.outstanding(), 0);
        assert_eq!(*lock.lock(), 7);
    }

    #[test]
    fn debug_shows_counters() {
        let lock = TicketLock::new(());
        let _guard = lock.lock();
        let text = format!("{lock:?}");
        assert!(text.contains("queue_head: 0"));
        assert!(text.contains("queue_tail: 1"));
    }
}
