//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the arena allocator.
///
/// Controls the size of the backing buffer at activation and the ceiling
/// it may grow to. A zero in either field selects the default; call
/// [`resolved`](Self::resolved) to apply defaults and validate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the backing buffer when the arena is activated, in bytes.
    ///
    /// Default: 524_288 (512 KiB). Zero selects the default.
    pub initial_capacity: usize,

    /// Largest size the backing buffer may grow to, in bytes.
    ///
    /// Default: 536_870_912 (512 MiB). Zero selects the default.
    pub max_capacity: usize,
}

impl ArenaConfig {
    /// Default initial capacity: 512 KiB.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 512 * 1024;

    /// Default maximum capacity: 512 MiB.
    pub const DEFAULT_MAX_CAPACITY: usize = 512 * 1024 * 1024;

    /// Upper bound on `max_capacity`: block offsets are index keys and
    /// must fit in an `i64`.
    pub const CAPACITY_LIMIT: usize = i64::MAX as usize;

    /// Create a config with the given sizes (zero meaning "default").
    pub const fn new(initial_capacity: usize, max_capacity: usize) -> Self {
        Self {
            initial_capacity,
            max_capacity,
        }
    }

    /// Substitute defaults for zero fields and validate the result.
    ///
    /// A defaulted initial capacity is clamped to an explicit smaller
    /// maximum. An explicit initial capacity above the maximum is
    /// rejected with [`ArenaError::InvalidConfig`].
    pub fn resolved(self) -> Result<Self, ArenaError> {
        let max_capacity = match self.max_capacity {
            0 => Self::DEFAULT_MAX_CAPACITY,
            n => n,
        };
        let initial_capacity = match self.initial_capacity {
            0 => Self::DEFAULT_INITIAL_CAPACITY.min(max_capacity),
            n => n,
        };
        if initial_capacity > max_capacity || max_capacity > Self::CAPACITY_LIMIT {
            return Err(ArenaError::InvalidConfig {
                initial_capacity,
                max_capacity,
            });
        }
        Ok(Self {
            initial_capacity,
            max_capacity,
        })
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY, Self::DEFAULT_MAX_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_select_defaults() {
        let config = ArenaConfig::new(0, 0).resolved().unwrap();
        assert_eq!(config, ArenaConfig::default());
        assert_eq!(config.initial_capacity, 512 * 1024);
        assert_eq!(config.max_capacity, 512 * 1024 * 1024);
    }

    #[test]
    fn explicit_sizes_preserved() {
        let config = ArenaConfig::new(4096, 65536).resolved().unwrap();
        assert_eq!(config.initial_capacity, 4096);
        assert_eq!(config.max_capacity, 65536);
    }

    #[test]
    fn defaulted_initial_clamps_to_small_max() {
        let config = ArenaConfig::new(0, 1024).resolved().unwrap();
        assert_eq!(config.initial_capacity, 1024);
    }

    #[test]
    fn explicit_initial_above_max_rejected() {
        let err = ArenaConfig::new(2048, 1024).resolved().unwrap_err();
        assert!(matches!(err, ArenaError::InvalidConfig { .. }));
    }
}
