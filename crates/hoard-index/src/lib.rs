//! Ordered `i64`-keyed map backing the hoard block index.
//!
//! [`BlockIndex`] is a left-leaning red-black tree whose nodes live in a
//! slot vector rather than behind individual boxes. Child and parent
//! links are slot indices, which lets in-order traversal walk up through
//! ancestors the way a pointer-based tree would, without `unsafe`.
//!
//! # Architecture
//!
//! ```text
//! BlockIndex<V>
//! ├── slots: Vec<Option<Node<V>>>   (node storage, reused via free list)
//! ├── free_list: Vec<usize>         (vacated slots)
//! └── root: Option<usize>
//!     Node { key, value, data_size, color, count, left, right, parent }
//! ```
//!
//! The index is independent of the lock and the allocator and can be
//! used as a general ordered map. It is not internally synchronized.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cursor;
pub mod error;
pub mod tree;
mod validate;

pub use cursor::{Entry, Iter};
pub use error::{IndexError, InvariantViolation};
pub use tree::{BlockIndex, NULL_KEY};
