//! Out-of-band block metadata and first-fit placement.
//!
//! [`BlockTable`] keeps two [`BlockIndex`]es over the same set of blocks:
//!
//! - `blocks`: block id → [`Block`], used to resolve handles in O(log n);
//! - `layout`: byte offset → block id, walked in address order by the
//!   first-fit scan.
//!
//! Freeing a block only flips its mark. Reclaimed records stay in both
//! indexes until a later allocation is placed over their span, so the
//! scan sees them as reusable space and `resolve` still recognises the
//! handle as one that was freed.

use std::ops::Range;

use hoard_index::{BlockIndex, InvariantViolation};

use crate::error::ArenaError;
use crate::handle::BlockId;

/// Liveness of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    /// Allocated and resolvable.
    Live,
    /// Freed; its span is reusable and its handle no longer resolves.
    Reclaimed,
}

/// Metadata for one allocated span of the arena buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Identifier encoded in the block's handle.
    pub id: BlockId,
    /// Byte offset of the payload within the buffer.
    pub offset: usize,
    /// Payload size in bytes.
    pub size: usize,
    /// Whether the block is live or reclaimed.
    pub mark: Mark,
}

impl Block {
    /// Whether the block is live.
    pub fn is_live(&self) -> bool {
        self.mark == Mark::Live
    }

    /// Byte range of the payload.
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }

    fn overlaps(&self, span: &Range<usize>) -> bool {
        self.offset < span.end && span.start < self.offset + self.size
    }
}

/// Where the next allocation goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// A run of reusable space inside the current capacity fits.
    Fits {
        /// Offset of the run.
        offset: usize,
    },
    /// Nothing fits; grow the buffer and place at the logical end.
    Grow {
        /// End of the last live block.
        end: usize,
    },
}

/// Handle index plus address-ordered layout over the arena's blocks.
#[derive(Default)]
pub struct BlockTable {
    blocks: BlockIndex<Block>,
    layout: BlockIndex<BlockId>,
    live_count: usize,
    live_bytes: usize,
}

impl BlockTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// First-fit scan in address order.
    ///
    /// Live blocks are skipped in full; reclaimed blocks and the gaps
    /// between live blocks merge into one candidate run. The first run of
    /// at least `size` bytes wins, including the tail up to `capacity`.
    pub fn find_span(&self, size: usize, capacity: usize) -> Placement {
        let mut cursor = 0;
        for (offset, id) in self.layout.iter() {
            let Some(block) = self.blocks.get(id.key()) else {
                continue;
            };
            if !block.is_live() {
                continue;
            }
            let offset = offset as usize;
            if offset - cursor >= size {
                return Placement::Fits { offset: cursor };
            }
            cursor = offset + block.size;
        }
        if capacity.saturating_sub(cursor) >= size {
            Placement::Fits { offset: cursor }
        } else {
            Placement::Grow { end: cursor }
        }
    }

    /// Record a new live block, purging reclaimed records its span covers.
    pub fn insert(&mut self, block: Block) -> Result<(), ArenaError> {
        let span = block.span();
        let covered: Vec<(i64, BlockId)> = self
            .layout
            .iter()
            .take_while(|(offset, _)| (*offset as usize) < span.end)
            .filter_map(|(offset, id)| {
                let old = self.blocks.get(id.key())?;
                (!old.is_live() && old.overlaps(&span)).then_some((offset, *id))
            })
            .collect();
        for (offset, id) in covered {
            self.layout.remove(offset);
            self.blocks.remove(id.key());
        }

        let size = block.size;
        self.layout.put(block.offset as i64, block.id, size)?;
        self.blocks.put(block.id.key(), block, size)?;
        self.live_count += 1;
        self.live_bytes += size;
        Ok(())
    }

    /// The block with `id`, live or reclaimed.
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.key())
    }

    /// The block with `id` if it is live.
    pub fn live(&self, id: BlockId) -> Option<&Block> {
        self.get(id).filter(|b| b.is_live())
    }

    /// Payload size recorded for `id`, if live.
    pub fn data_size(&self, id: BlockId) -> Option<usize> {
        self.live(id)?;
        self.blocks.data_size(id.key()).ok()
    }

    /// Mark a live block reclaimed and return its span.
    pub fn reclaim(&mut self, id: BlockId) -> Option<Range<usize>> {
        let block = self.blocks.get_mut(id.key()).filter(|b| b.is_live())?;
        block.mark = Mark::Reclaimed;
        let span = block.span();
        self.live_count -= 1;
        self.live_bytes -= span.len();
        Some(span)
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.layout.clear();
        self.blocks.clear_with(|block| {
            log::trace!("tearing down block {} ({} bytes)", block.id, block.size);
        });
        self.live_count = 0;
        self.live_bytes = 0;
    }

    /// Number of live blocks.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Number of reclaimed blocks whose records have not been purged.
    pub fn reclaimed_count(&self) -> usize {
        self.blocks.len() - self.live_count
    }

    /// Payload bytes held by live blocks.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// End of the last live block.
    pub fn logical_end(&self) -> usize {
        self.layout
            .iter()
            .rev()
            .filter_map(|(_, id)| self.live(*id))
            .map(|b| b.offset + b.size)
            .next()
            .unwrap_or(0)
    }

    /// Live blocks in address order.
    pub fn live_blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.layout.iter().filter_map(|(_, id)| self.live(*id))
    }

    /// Check the red-black invariants of both indexes.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.blocks.check_invariants()?;
        self.layout.check_invariants()
    }

    /// Check both indexes and the cross-references between them.
    #[cfg(test)]
    pub(crate) fn check(&self) {
        self.check_invariants().unwrap();
        assert_eq!(self.blocks.len(), self.layout.len());
        let mut end = 0;
        for (offset, id) in self.layout.iter() {
            let block = self.blocks.get(id.key()).expect("layout entry has a block");
            assert_eq!(block.offset as i64, offset);
            if block.is_live() {
                assert!(block.offset >= end, "live blocks overlap");
                end = block.offset + block.size;
            }
        }
        let live: usize = self.live_blocks().count();
        assert_eq!(live, self.live_count);
    }
}
