//! Benchmark workloads for the hoard crates.
//!
//! Provides deterministic, seeded operation streams shared by the
//! criterion benches:
//!
//! - [`arena_workload`]: interleaved allocate/free requests with mixed sizes
//! - [`shuffled_keys`]: a permutation of `0..n` for index insert/remove

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// One step of an arena workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaOp {
    /// Allocate this many bytes.
    Allocate(usize),
    /// Free the live block at this position, modulo the live count.
    Free(usize),
}

/// Generate `len` arena operations.
///
/// Roughly three allocations for every two frees, sizes uniform in
/// `1..=max_size` (a `max_size` of zero is treated as 1). The same seed
/// always yields the same stream.
pub fn arena_workload(len: usize, max_size: usize, seed: u64) -> Vec<ArenaOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            if rng.random_bool(0.6) {
                ArenaOp::Allocate(rng.random_range(1..=max_size.max(1)))
            } else {
                ArenaOp::Free(rng.random::<u64>() as usize)
            }
        })
        .collect()
}

/// A seeded random permutation of `0..n`.
pub fn shuffled_keys(n: usize, seed: u64) -> Vec<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut keys: Vec<i64> = (0..n as i64).collect();
    keys.shuffle(&mut rng);
    keys
}
