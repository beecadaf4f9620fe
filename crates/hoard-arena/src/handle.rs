//! Opaque block handles.
//!
//! A [`Handle`] stands in for a block's address. It packs the arena
//! incarnation (bumped by every `destroy`) above a per-incarnation block
//! id, so ids may restart after a destroy while no handle value is ever
//! resolvable twice.
//!
//! ```text
//!  63            48 47                                  0
//! ┌────────────────┬─────────────────────────────────────┐
//! │  incarnation   │              block id               │
//! └────────────────┴─────────────────────────────────────┘
//! ```

use std::fmt;
use std::num::NonZeroU64;

/// Monotonic per-incarnation block identifier. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) u64);

impl BlockId {
    /// Largest id that fits in a handle.
    pub const MAX: u64 = (1 << Handle::ID_BITS) - 1;

    /// Key of this block in the handle index.
    pub(crate) fn key(self) -> i64 {
        // Ids are bounded by MAX < 2^48, so the cast is lossless.
        self.0 as i64
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a live block, returned by allocation in place of
/// an address.
///
/// Handles remain valid across buffer growth; only `free` or `destroy`
/// invalidates them. A handle is only meaningful to the arena that issued
/// it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Bits reserved for the block id.
    pub const ID_BITS: u32 = 48;

    /// Pack `incarnation` and `id`. Returns `None` for id zero or an id
    /// wider than [`ID_BITS`](Self::ID_BITS).
    pub(crate) fn new(incarnation: u16, id: BlockId) -> Option<Self> {
        if id.0 == 0 || id.0 > BlockId::MAX {
            return None;
        }
        let raw = (u64::from(incarnation) << Self::ID_BITS) | id.0;
        NonZeroU64::new(raw).map(Self)
    }

    /// Rebuild a handle from its raw value, e.g. one stored by a
    /// collaborator. Returns `None` for zero.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw 64-bit value. Never zero.
    pub fn as_u64(self) -> u64 {
        self.0.get()
    }

    /// Block id within the issuing incarnation.
    pub fn block_id(self) -> BlockId {
        BlockId(self.0.get() & BlockId::MAX)
    }

    pub(crate) fn incarnation(self) -> u16 {
        // The shift leaves exactly 16 significant bits.
        (self.0.get() >> Self::ID_BITS) as u16
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle(id={}, incarnation={})",
            self.block_id(),
            self.incarnation()
        )
    }
}

impl From<Handle> for u64 {
    fn from(h: Handle) -> Self {
        h.as_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_round_trip() {
        let h = Handle::new(3, BlockId(42)).unwrap();
        assert_eq!(h.block_id(), BlockId(42));
        assert_eq!(h.incarnation(), 3);
        assert_eq!(Handle::from_raw(h.as_u64()), Some(h));
    }

    #[test]
    fn zero_is_never_a_handle() {
        assert_eq!(Handle::from_raw(0), None);
        assert!(Handle::new(0, BlockId(0)).is_none());
        assert_ne!(Handle::new(0, BlockId(1)).unwrap().as_u64(), 0);
    }

    #[test]
    fn same_id_different_incarnation_differs() {
        let a = Handle::new(0, BlockId(1)).unwrap();
        let b = Handle::new(1, BlockId(1)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.block_id(), b.block_id());
    }

    #[test]
    fn max_id_fits() {
        let h = Handle::new(u16::MAX, BlockId(BlockId::MAX)).unwrap();
        assert!(Handle::new(0, BlockId(BlockId::MAX + 1)).is_none());
        assert_eq!(h.block_id(), BlockId(BlockId::MAX));
        assert_eq!(h.incarnation(), u16::MAX);
        assert!(BlockId(BlockId::MAX).key() > 0);
    }

    #[test]
    fn display_shows_parts() {
        let h = Handle::new(2, BlockId(9)).unwrap();
        assert_eq!(h.to_string(), "Handle(id=9, incarnation=2)");
    }
}
