//! Hoard: in-process memory management built from three layers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all hoard sub-crates, plus one process-wide arena for collaborators
//! that expect a shared allocator.
//!
//! # Quick start
//!
//! ```rust
//! use hoard::prelude::*;
//!
//! let arena = Arena::new();
//! assert!(arena.init(0, 0));
//!
//! let h = arena.allocate(64).unwrap();
//! arena.write(h, 0, b"hello").unwrap();
//! assert_eq!(&arena.read(h).unwrap()[..5], b"hello");
//!
//! assert!(arena.free(h));
//! assert_eq!(
//!     arena.resolve(h).unwrap_err().code(),
//!     ErrorCode::InvalidInput
//! );
//! assert!(arena.destroy());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`sync`] | `hoard-sync` | FIFO-fair [`sync::TicketLock`] |
//! | [`index`] | `hoard-index` | LLRB ordered map [`index::BlockIndex`] |
//! | [`arena`] | `hoard-arena` | [`arena::Arena`], handles, errors, stats |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Fair queuing lock (`hoard-sync`).
pub use hoard_sync as sync;

/// Ordered block index (`hoard-index`).
///
/// [`index::BlockIndex`] maps `i64` keys to values with an exact
/// element count and in-order cursors.
pub use hoard_index as index;

/// Handle-based arena allocator (`hoard-arena`).
pub use hoard_arena as arena;

use hoard_arena::Arena;

static GLOBAL: Arena = Arena::new();

/// The process-wide arena.
///
/// Starts inactive; activate it with [`Arena::init`] or let the first
/// allocation do so with the default config. [`Arena::destroy`] tears it
/// down and it may be initialized again afterwards.
pub fn global() -> &'static Arena {
    &GLOBAL
}

/// Common imports for typical hoard usage.
///
/// ```rust
/// use hoard::prelude::*;
/// ```
pub mod prelude {
    // Arena
    pub use hoard_arena::{
        error_string, Arena, ArenaConfig, ArenaError, ArenaStats, ErrorCode, Handle, InitStatus,
        Region,
    };

    // Index
    pub use hoard_index::{BlockIndex, IndexError};

    // Lock
    pub use hoard_sync::{TicketGuard, TicketLock};
}
