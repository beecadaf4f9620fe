//! Interior-mutability cell handed out only through a served ticket.
//!
//! Every `unsafe` block in the workspace lives here. Each carries a
//! mandatory `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;

/// Storage for the value protected by a [`TicketLock`](crate::TicketLock).
pub(crate) struct LockCell<T> {
    value: UnsafeCell<T>,
}

// SAFETY: references to `value` are only produced while the caller holds
// the ticket being served, and the ticket protocol admits one holder at a
// time. Moving `T` between threads is therefore the only requirement.
unsafe impl<T: Send> Sync for LockCell<T> {}

impl<T> LockCell<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
        }
    }

    pub(crate) fn into_inner(self) -> T {
        self.value.into_inner()
    }

    pub(crate) fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Shared access to the protected value.
    ///
    /// # Safety
    ///
    /// The caller must hold the ticket currently being served.
    pub(crate) unsafe fn get(&self) -> &T {
        // SAFETY: the served ticket excludes every other holder, so no
        // `&mut T` can coexist with this reference.
        unsafe { &*self.value.get() }
    }

    /// Exclusive access to the protected value.
    ///
    /// # Safety
    ///
    /// The caller must hold the ticket currently being served and must
    /// not create overlapping references through [`LockCell::get`].
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn get_unchecked_mut(&self) -> &mut T {
        // SAFETY: the served ticket excludes every other holder; the
        // guard's `&mut self` receiver rules out aliasing within it.
        unsafe { &mut *self.value.get() }
    }
}
