//! FIFO-fair mutual exclusion for the hoard allocator.
//!
//! [`TicketLock`] serves callers strictly in the order they began
//! acquiring it. It is the leaf of the workspace: the arena allocator
//! serializes every mutation through one, and external collaborators may
//! use it directly to protect their own state.
//!
//! # Protocol
//!
//! ```text
//! queue_tail ──► next ticket to issue      (bumped by lock())
//! queue_head ──► ticket currently served   (bumped by guard drop)
//! outstanding = queue_tail - queue_head
//! ```
//!
//! Waiters block on a condition variable, never spin, and re-check their
//! ticket against `queue_head` on every wake.
//!
//! This crate contains the workspace's only `unsafe` code: the `raw`
//! cell and the guard's `Deref` impls that reach through it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

mod raw;
pub mod ticket;

pub use ticket::{TicketGuard, TicketLock};
