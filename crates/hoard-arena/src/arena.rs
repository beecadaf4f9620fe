//! The arena allocator.
//!
//! An [`Arena`] owns one contiguous, growable byte buffer and hands out
//! opaque [`Handle`]s for spans of it. Block metadata lives out of band in
//! a [`BlockTable`]; the buffer holds payload bytes only.
//!
//! Every operation, including reads, runs under the arena's
//! [`TicketLock`], so callers are served strictly in arrival order.
//! [`Arena::resolve`] keeps the lock for as long as the returned
//! [`Region`] lives.
//!
//! Lifecycle: an arena starts inactive. [`Arena::try_init`] (or the first
//! allocation, with the arena's default config) activates it;
//! [`Arena::try_destroy`] releases the buffer and every block, after which
//! the arena may be initialized again. Handles issued before a destroy
//! never resolve afterwards.

use std::fmt;
use std::ops::{Deref, DerefMut, Range};
use std::sync::atomic::{AtomicU64, Ordering};

use hoard_sync::{TicketGuard, TicketLock};

use crate::block::{Block, BlockTable, Mark, Placement};
use crate::buffer::ArenaBuffer;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::{BlockId, Handle};
use crate::stats::ArenaStats;

/// Outcome of a successful [`Arena::try_init`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitStatus {
    /// The arena was inactive and now owns a fresh buffer.
    Initialized,
    /// The arena was already active; nothing changed.
    AlreadyActive,
}

/// Buffer and metadata of an active arena.
struct Active {
    config: ArenaConfig,
    buffer: ArenaBuffer,
    table: BlockTable,
}

/// Everything guarded by the arena lock.
struct ArenaState {
    active: Option<Active>,
    /// Bumped by every destroy of an active arena. Saturates at
    /// `u16::MAX`; from then on destroy stops restarting block ids, so
    /// handle values still never repeat.
    incarnation: u16,
}

impl ArenaState {
    /// The active state, activating with `config` first if needed.
    fn activate(&mut self, config: ArenaConfig) -> Result<(&mut Active, InitStatus), ArenaError> {
        let status = match self.active {
            Some(_) => InitStatus::AlreadyActive,
            None => {
                let config = config.resolved()?;
                let buffer = ArenaBuffer::new(config.initial_capacity, config.max_capacity)?;
                log::debug!(
                    "arena initialized: capacity {} bytes, max {} bytes, incarnation {}",
                    config.initial_capacity,
                    config.max_capacity,
                    self.incarnation
                );
                self.active = Some(Active {
                    config,
                    buffer,
                    table: BlockTable::new(),
                });
                InitStatus::Initialized
            }
        };
        match self.active.as_mut() {
            Some(active) => Ok((active, status)),
            None => Err(ArenaError::Uninitialized),
        }
    }

    /// The active state if `handle` belongs to the current incarnation.
    ///
    /// A handle from another incarnation is invalid whether or not the
    /// arena is active.
    fn active_for(&mut self, handle: Handle) -> Result<&mut Active, ArenaError> {
        if handle.incarnation() != self.incarnation {
            return Err(ArenaError::InvalidHandle { handle });
        }
        self.active.as_mut().ok_or(ArenaError::Uninitialized)
    }

    /// Payload span of the live block behind `handle`.
    fn live_span(&mut self, handle: Handle) -> Result<Range<usize>, ArenaError> {
        let active = self.active_for(handle)?;
        active
            .table
            .live(handle.block_id())
            .map(Block::span)
            .ok_or(ArenaError::InvalidHandle { handle })
    }
}

/// A growable arena handing out opaque handles to zero-filled byte spans.
///
/// `Arena` is `Send + Sync`; share it through an `Arc` or a `static`.
/// [`Arena::new`] is `const`, so a process-wide arena needs no lazy
/// initialisation.
///
/// Each fallible operation comes in two forms: `try_*` returning
/// `Result<_, ArenaError>` (use [`ArenaError::code`] for the coarse
/// [`ErrorCode`](crate::ErrorCode)), and a convenience form that reduces
/// the outcome to `bool` or `Option`.
pub struct Arena {
    state: TicketLock<ArenaState>,
    /// Next block id to issue. Reset to 1 by destroy while incarnations
    /// remain.
    next_id: AtomicU64,
    /// Config used when the first allocation activates the arena.
    defaults: ArenaConfig,
}

impl Arena {
    /// Create an inactive arena using the default config on lazy
    /// activation.
    pub const fn new() -> Self {
        Self::with_config(ArenaConfig::new(
            ArenaConfig::DEFAULT_INITIAL_CAPACITY,
            ArenaConfig::DEFAULT_MAX_CAPACITY,
        ))
    }

    /// Create an inactive arena that lazily activates with `defaults`.
    ///
    /// The config is validated on activation, not here.
    pub const fn with_config(defaults: ArenaConfig) -> Self {
        Self {
            state: TicketLock::new(ArenaState {
                active: None,
                incarnation: 0,
            }),
            next_id: AtomicU64::new(1),
            defaults,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Activate the arena with a buffer of `initial_capacity` bytes that
    /// may grow to `max_capacity`. Zero selects the default for either.
    ///
    /// Idempotent: an active arena is left untouched and reports
    /// [`InitStatus::AlreadyActive`], even when the sizes differ.
    ///
    /// # Errors
    ///
    /// [`ArenaError::InvalidConfig`] if the initial capacity exceeds the
    /// maximum; [`ArenaError::HostAllocationFailed`] if the buffer cannot
    /// be obtained.
    pub fn try_init(
        &self,
        initial_capacity: usize,
        max_capacity: usize,
    ) -> Result<InitStatus, ArenaError> {
        let mut state = self.state.lock();
        let (_, status) = state.activate(ArenaConfig::new(initial_capacity, max_capacity))?;
        Ok(status)
    }

    /// [`try_init`](Self::try_init), reporting only success.
    pub fn init(&self, initial_capacity: usize, max_capacity: usize) -> bool {
        self.try_init(initial_capacity, max_capacity).is_ok()
    }

    /// Release the buffer and all block metadata.
    ///
    /// Capacity returns to zero and every handle issued so far becomes
    /// permanently unresolvable. The id generator restarts under a new
    /// incarnation; once all 65 536 incarnations are used it keeps
    /// counting instead. Destroying an inactive arena succeeds and changes
    /// nothing.
    pub fn try_destroy(&self) -> Result<(), ArenaError> {
        let mut state = self.state.lock();
        let Some(mut active) = state.active.take() else {
            return Ok(());
        };
        let capacity = active.buffer.capacity();
        let live = active.table.live_count();
        active.table.clear();
        match state.incarnation.checked_add(1) {
            Some(next) => {
                state.incarnation = next;
                self.next_id.store(1, Ordering::Relaxed);
            }
            None => log::debug!(
                "incarnations exhausted; block ids continue from {}",
                self.next_id.load(Ordering::Relaxed)
            ),
        }
        log::debug!(
            "arena destroyed: released {capacity} bytes with {live} live blocks, next incarnation {}",
            state.incarnation
        );
        Ok(())
    }

    /// [`try_destroy`](Self::try_destroy), reporting only success.
    pub fn destroy(&self) -> bool {
        self.try_destroy().is_ok()
    }

    /// Whether the arena currently owns a buffer.
    pub fn is_active(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// The resolved config of the active arena.
    pub fn config(&self) -> Option<ArenaConfig> {
        self.state.lock().active.as_ref().map(|a| a.config)
    }

    // ── Allocation ──────────────────────────────────────────────

    /// Allocate a zero-filled block of `size` bytes.
    ///
    /// Activates the arena with its default config if needed. The block
    /// goes into the first run of reusable space large enough, scanning
    /// from offset 0; if none fits, the buffer doubles (capped at the
    /// maximum) until the block fits after the last live block.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::ZeroSize`] if `size` is zero.
    /// - [`ArenaError::CapacityExceeded`] or
    ///   [`ArenaError::HostAllocationFailed`] if the buffer cannot grow
    ///   enough. Capacity and contents are unchanged.
    /// - [`ArenaError::HandlesExhausted`] if no block id is left.
    pub fn try_allocate(&self, size: usize) -> Result<Handle, ArenaError> {
        if size == 0 {
            return Err(ArenaError::ZeroSize);
        }
        let mut guard = self.state.lock();
        let state = &mut *guard;
        // Validate the id first so a refusal leaves the arena untouched.
        let id = self.peek_block_id()?;
        let handle = Handle::new(state.incarnation, id).ok_or(ArenaError::HandlesExhausted)?;
        let (active, _) = state.activate(self.defaults)?;

        let offset = match active.table.find_span(size, active.buffer.capacity()) {
            Placement::Fits { offset } => offset,
            Placement::Grow { end } => {
                let before = active.buffer.capacity();
                let grown = end
                    .checked_add(size)
                    .ok_or(ArenaError::CapacityExceeded {
                        requested: usize::MAX,
                        max_capacity: active.buffer.max_capacity(),
                    })
                    .and_then(|required| active.buffer.grow_to_fit(required));
                match grown {
                    Ok(after) => {
                        log::debug!("arena grew from {before} to {after} bytes");
                        end
                    }
                    Err(e) => {
                        log::warn!("refusing {size}-byte allocation: {e}");
                        return Err(e);
                    }
                }
            }
        };

        self.next_id.store(id.0 + 1, Ordering::Relaxed);
        active.buffer.zero(offset..offset + size);
        active.table.insert(Block {
            id,
            offset,
            size,
            mark: Mark::Live,
        })?;
        debug_assert!(active.table.check_invariants().is_ok());
        log::trace!("allocated {handle}: {size} bytes at offset {offset}");
        Ok(handle)
    }

    /// [`try_allocate`](Self::try_allocate), discarding the error detail.
    pub fn allocate(&self, size: usize) -> Option<Handle> {
        self.try_allocate(size).ok()
    }

    /// Free the block behind `handle` and zero its payload.
    ///
    /// The span becomes reusable by later allocations; the handle never
    /// resolves again.
    ///
    /// # Errors
    ///
    /// [`ArenaError::InvalidHandle`] if the handle is unknown or already
    /// freed; [`ArenaError::Uninitialized`] if the arena is inactive.
    pub fn try_free(&self, handle: Handle) -> Result<(), ArenaError> {
        let mut state = self.state.lock();
        let active = state.active_for(handle)?;
        let span = active
            .table
            .reclaim(handle.block_id())
            .ok_or(ArenaError::InvalidHandle { handle })?;
        log::trace!("freed {handle}: {} bytes at offset {}", span.len(), span.start);
        active.buffer.zero(span);
        debug_assert!(active.table.check_invariants().is_ok());
        Ok(())
    }

    /// [`try_free`](Self::try_free), reporting only success.
    pub fn free(&self, handle: Handle) -> bool {
        self.try_free(handle).is_ok()
    }

    /// The id the next allocation will take. Only called under the arena
    /// lock; the caller commits it once placement has succeeded.
    fn peek_block_id(&self) -> Result<BlockId, ArenaError> {
        let id = self.next_id.load(Ordering::Relaxed);
        if id > BlockId::MAX {
            return Err(ArenaError::HandlesExhausted);
        }
        Ok(BlockId(id))
    }

    // ── Access ──────────────────────────────────────────────────

    /// Borrow the payload of the live block behind `handle`.
    ///
    /// The returned [`Region`] holds the arena lock until dropped; every
    /// other arena call from any thread waits in the meantime, including
    /// calls from the current thread.
    ///
    /// # Errors
    ///
    /// [`ArenaError::InvalidHandle`] if the handle is unknown or freed;
    /// [`ArenaError::Uninitialized`] if the arena is inactive.
    pub fn resolve(&self, handle: Handle) -> Result<Region<'_>, ArenaError> {
        let mut state = self.state.lock();
        let span = state.live_span(handle)?;
        Ok(Region {
            state,
            span,
            handle,
        })
    }

    /// Payload size of the live block behind `handle`.
    pub fn data_size(&self, handle: Handle) -> Result<usize, ArenaError> {
        let mut state = self.state.lock();
        let active = state.active_for(handle)?;
        active
            .table
            .data_size(handle.block_id())
            .ok_or(ArenaError::InvalidHandle { handle })
    }

    /// Copy of the payload behind `handle`.
    pub fn read(&self, handle: Handle) -> Result<Vec<u8>, ArenaError> {
        Ok(self.resolve(handle)?.to_vec())
    }

    /// Copy `bytes` into the payload behind `handle`, starting at `offset`.
    ///
    /// # Errors
    ///
    /// [`ArenaError::OutOfBounds`] if the write would run past the end of
    /// the payload; nothing is written in that case.
    pub fn write(&self, handle: Handle, offset: usize, bytes: &[u8]) -> Result<(), ArenaError> {
        let mut region = self.resolve(handle)?;
        let size = region.len();
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= size)
            .ok_or(ArenaError::OutOfBounds {
                handle,
                offset,
                len: bytes.len(),
                size,
            })?;
        region[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Capacity and occupancy at this instant.
    pub fn stats(&self) -> ArenaStats {
        let state = self.state.lock();
        // The stats call holds one of the outstanding tickets.
        let pending_lock_requests = self.state.outstanding().saturating_sub(1);
        match &state.active {
            Some(active) => ArenaStats {
                active: true,
                capacity: active.buffer.capacity(),
                max_capacity: active.buffer.max_capacity(),
                live_blocks: active.table.live_count(),
                reclaimed_blocks: active.table.reclaimed_count(),
                live_bytes: active.table.live_bytes(),
                logical_end: active.table.logical_end(),
                pending_lock_requests,
            },
            None => ArenaStats {
                pending_lock_requests,
                ..ArenaStats::default()
            },
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("state", &self.state)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Exclusive access to one block's payload.
///
/// Dereferences to exactly the block's bytes. Holds the arena lock until
/// dropped.
pub struct Region<'a> {
    state: TicketGuard<'a, ArenaState>,
    span: Range<usize>,
    handle: Handle,
}

impl Region<'_> {
    /// Handle of the block this region belongs to.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Byte offset of the payload within the arena buffer.
    pub fn offset(&self) -> usize {
        self.span.start
    }
}

impl Deref for Region<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.state.active {
            Some(active) => active.buffer.span(self.span.clone()),
            None => &[],
        }
    }
}

impl DerefMut for Region<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        let span = self.span.clone();
        match &mut self.state.active {
            Some(active) => active.buffer.span_mut(span),
            None => &mut [],
        }
    }
}

impl fmt::Debug for Region<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("handle", &self.handle)
            .field("span", &self.span)
            .finish()
    }
}
