//! The contiguous, growable byte buffer behind an arena.
//!
//! An [`ArenaBuffer`] is a zero-initialised `Vec<u8>` whose length is the
//! arena's current capacity. It grows by doubling up to a fixed ceiling
//! and never shrinks. Growth reserves the new storage fallibly before
//! touching anything, so a refused growth leaves the buffer as it was.

use std::ops::Range;

use crate::error::ArenaError;

/// Contiguous backing storage with bounded doubling growth.
pub struct ArenaBuffer {
    /// Backing storage. `data.len()` is the current capacity.
    data: Vec<u8>,
    /// Ceiling for growth in bytes.
    max_capacity: usize,
}

impl ArenaBuffer {
    /// Obtain a zeroed buffer of `capacity` bytes that may grow to
    /// `max_capacity`.
    ///
    /// Fails with [`ArenaError::HostAllocationFailed`] if the host
    /// allocator refuses the initial storage.
    pub fn new(capacity: usize, max_capacity: usize) -> Result<Self, ArenaError> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| ArenaError::HostAllocationFailed { bytes: capacity })?;
        data.resize(capacity, 0);
        Ok(Self { data, max_capacity })
    }

    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Ceiling for growth in bytes.
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Capacity the buffer must grow to so that `required` bytes fit.
    ///
    /// The smallest power-of-two multiple of the current capacity that is
    /// at least `required`, capped at `max_capacity`. Returns the current
    /// capacity when `required` already fits.
    pub fn growth_target(&self, required: usize) -> Result<usize, ArenaError> {
        let capacity = self.capacity();
        if required <= capacity {
            return Ok(capacity);
        }
        let exceeded = ArenaError::CapacityExceeded {
            requested: required,
            max_capacity: self.max_capacity,
        };
        if required > self.max_capacity || capacity == 0 {
            return Err(exceeded);
        }
        let mut target = capacity;
        while target < required {
            target = target.saturating_mul(2);
        }
        Ok(target.min(self.max_capacity))
    }

    /// Grow so that `required` bytes fit, copying existing contents.
    ///
    /// Returns the new capacity. On error nothing has changed.
    pub fn grow_to_fit(&mut self, required: usize) -> Result<usize, ArenaError> {
        let target = self.growth_target(required)?;
        let extra = target - self.capacity();
        if extra > 0 {
            self.data
                .try_reserve_exact(extra)
                .map_err(|_| ArenaError::HostAllocationFailed { bytes: target })?;
            self.data.resize(target, 0);
        }
        Ok(target)
    }

    /// Shared view of a span.
    ///
    /// # Panics
    ///
    /// Panics if `span` exceeds the current capacity.
    pub fn span(&self, span: Range<usize>) -> &[u8] {
        &self.data[span]
    }

    /// Mutable view of a span.
    ///
    /// # Panics
    ///
    /// Panics if `span` exceeds the current capacity.
    pub fn span_mut(&mut self, span: Range<usize>) -> &mut [u8] {
        &mut self.data[span]
    }

    /// Zero a span.
    pub fn zero(&mut self, span: Range<usize>) {
        self.span_mut(span).fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_zeroed() {
        let buf = ArenaBuffer::new(64, 1024).unwrap();
        assert_eq!(buf.capacity(), 64);
        assert!(buf.span(0..64).iter().all(|&b| b == 0));
    }

    #[test]
    fn fitting_request_needs_no_growth() {
        let buf = ArenaBuffer::new(64, 1024).unwrap();
        assert_eq!(buf.growth_target(64).unwrap(), 64);
    }

    #[test]
    fn growth_doubles_until_large_enough() {
        let buf = ArenaBuffer::new(64, 1 << 20).unwrap();
        assert_eq!(buf.growth_target(65).unwrap(), 128);
        assert_eq!(buf.growth_target(129).unwrap(), 256);
        assert_eq!(buf.growth_target(1000).unwrap(), 1024);
    }

    #[test]
    fn growth_caps_at_max() {
        let buf = ArenaBuffer::new(64, 100).unwrap();
        assert_eq!(buf.growth_target(65).unwrap(), 100);
        assert_eq!(buf.growth_target(100).unwrap(), 100);
    }

    #[test]
    fn growth_past_max_fails() {
        let buf = ArenaBuffer::new(64, 100).unwrap();
        let err = buf.growth_target(101).unwrap_err();
        assert_eq!(
            err,
            ArenaError::CapacityExceeded {
                requested: 101,
                max_capacity: 100
            }
        );
    }

    #[test]
    fn empty_buffer_cannot_grow() {
        let buf = ArenaBuffer::new(0, 100).unwrap();
        assert!(matches!(
            buf.growth_target(1),
            Err(ArenaError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn grow_preserves_contents() {
        let mut buf = ArenaBuffer::new(8, 64).unwrap();
        buf.span_mut(0..4).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(buf.grow_to_fit(20).unwrap(), 32);
        assert_eq!(buf.capacity(), 32);
        assert_eq!(buf.span(0..4), &[1, 2, 3, 4]);
        assert!(buf.span(4..32).iter().all(|&b| b == 0));
    }

    #[test]
    fn failed_grow_leaves_buffer_unchanged() {
        let mut buf = ArenaBuffer::new(8, 16).unwrap();
        buf.span_mut(0..1).copy_from_slice(&[9]);
        assert!(buf.grow_to_fit(17).is_err());
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.span(0..1), &[9]);
    }

    #[test]
    fn zero_clears_span() {
        let mut buf = ArenaBuffer::new(8, 8).unwrap();
        buf.span_mut(0..8).fill(0xff);
        buf.zero(2..6);
        assert_eq!(buf.span(0..8), &[0xff, 0xff, 0, 0, 0, 0, 0xff, 0xff]);
    }
}
