//! Property tests: live regions are exact, zero-filled at birth and
//! pairwise disjoint for any allocate/free sequence within capacity.

#[cfg(not(miri))]
mod proptests {
    use std::ops::Range;

    use hoard_arena::{Arena, ErrorCode, Handle};
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Allocate(usize),
        /// Free the live block at this position (modulo the live count).
        Free(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (1usize..300).prop_map(Op::Allocate),
            2 => any::<usize>().prop_map(Op::Free),
        ]
    }

    fn span_of(arena: &Arena, h: Handle) -> Range<usize> {
        let region = arena.resolve(h).unwrap();
        region.offset()..region.offset() + region.len()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn live_regions_are_exact_zeroed_and_disjoint(
            ops in prop::collection::vec(op_strategy(), 1..200),
        ) {
            let arena = Arena::new();
            prop_assert!(arena.init(512, 1 << 20));
            let mut live: Vec<(Handle, usize)> = Vec::new();

            for op in &ops {
                match *op {
                    Op::Allocate(size) => {
                        let h = arena.allocate(size).unwrap();
                        {
                            let mut region = arena.resolve(h).unwrap();
                            prop_assert_eq!(region.len(), size);
                            prop_assert!(region.iter().all(|&b| b == 0));
                            // Dirty it so reuse must re-zero.
                            region.fill(0xa5);
                        }
                        live.push((h, size));
                    }
                    Op::Free(i) if !live.is_empty() => {
                        let (h, _) = live.swap_remove(i % live.len());
                        prop_assert!(arena.free(h));
                        prop_assert_eq!(
                            arena.resolve(h).unwrap_err().code(),
                            ErrorCode::InvalidInput
                        );
                    }
                    Op::Free(_) => {}
                }

                let mut spans: Vec<Range<usize>> =
                    live.iter().map(|&(h, _)| span_of(&arena, h)).collect();
                spans.sort_by_key(|s| s.start);
                for pair in spans.windows(2) {
                    prop_assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
                }
                let stats = arena.stats();
                prop_assert_eq!(stats.live_blocks, live.len());
                prop_assert_eq!(stats.live_bytes, live.iter().map(|&(_, s)| s).sum::<usize>());
                prop_assert!(spans.last().map_or(0, |s| s.end) <= stats.capacity);
            }
        }

        #[test]
        fn growth_is_smallest_capped_doubling(
            initial in 1usize..4096,
            extra in 1usize..64,
            size in 1usize..100_000,
        ) {
            let max = initial * extra;
            let arena = Arena::new();
            prop_assert!(arena.init(initial, max));
            let result = arena.try_allocate(size);

            if size > max {
                prop_assert_eq!(result.unwrap_err().code(), ErrorCode::OutOfMemory);
                prop_assert_eq!(arena.stats().capacity, initial);
            } else {
                prop_assert!(result.is_ok());
                let mut expected = initial;
                while expected < size {
                    expected *= 2;
                }
                prop_assert_eq!(arena.stats().capacity, expected.min(max));
            }
        }
    }
}
