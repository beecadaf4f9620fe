//! Point-in-time arena statistics.

/// Capacity and occupancy figures read under the arena lock.
///
/// All sizes are in bytes. An inactive arena reports zeros everywhere
/// except `pending_lock_requests`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Whether the arena currently owns a buffer.
    pub active: bool,
    /// Current buffer capacity.
    pub capacity: usize,
    /// Configured growth ceiling.
    pub max_capacity: usize,
    /// Number of live blocks.
    pub live_blocks: usize,
    /// Number of freed blocks whose spans have not been reused yet.
    pub reclaimed_blocks: usize,
    /// Payload bytes held by live blocks.
    pub live_bytes: usize,
    /// End of the last live block; allocations that find no reusable
    /// span are placed here.
    pub logical_end: usize,
    /// Lock acquisitions outstanding when the stats call arrived,
    /// excluding the stats call itself.
    pub pending_lock_requests: u64,
}

impl ArenaStats {
    /// Capacity not occupied by live payloads.
    pub fn free_bytes(&self) -> usize {
        self.capacity.saturating_sub(self.live_bytes)
    }
}
