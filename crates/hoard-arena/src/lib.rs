//! Growable arena allocator handing out opaque handles.
//!
//! [`Arena`] manages one contiguous byte buffer. Callers receive a
//! [`Handle`] per allocation instead of an address and borrow the payload
//! through [`Arena::resolve`], so growing the buffer never invalidates a
//! caller's reference. Only [`Arena::try_free`] and
//! [`Arena::try_destroy`] invalidate handles.
//!
//! Block metadata lives out of band in two `hoard_index::BlockIndex`
//! trees: one keyed by block id for resolution, one keyed by offset for
//! first-fit placement. Freed spans are marked and reused by later
//! allocations; the buffer is never compacted and never shrinks.
//!
//! All arena state sits behind a FIFO `hoard_sync::TicketLock`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod block;
pub mod buffer;
pub mod config;
pub mod error;
pub mod handle;
pub mod stats;

pub use arena::{Arena, InitStatus, Region};
pub use config::ArenaConfig;
pub use error::{error_string, ArenaError, ErrorCode};
pub use handle::{BlockId, Handle};
pub use stats::ArenaStats;
