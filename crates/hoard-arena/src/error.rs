//! Arena-specific error types and stable error codes.
//!
//! [`ArenaError`] carries the detail; [`ErrorCode`] is the coarse,
//! ABI-stable classification callers receive from the explicit API forms.

use std::error::Error;
use std::fmt;

use hoard_index::IndexError;

use crate::handle::Handle;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// Satisfying the request would grow the buffer past `max_capacity`,
    /// or the buffer is empty and cannot be doubled.
    CapacityExceeded {
        /// Buffer size in bytes the request needed.
        requested: usize,
        /// Configured maximum capacity in bytes.
        max_capacity: usize,
    },
    /// The host allocator refused to provide the buffer.
    HostAllocationFailed {
        /// Size in bytes of the buffer that could not be obtained.
        bytes: usize,
    },
    /// Every block id representable in a handle has been issued.
    HandlesExhausted,
    /// A zero-byte allocation was requested.
    ZeroSize,
    /// Initial capacity above maximum, or maximum above the offset limit.
    InvalidConfig {
        /// Initial capacity after defaults were applied.
        initial_capacity: usize,
        /// Maximum capacity after defaults were applied.
        max_capacity: usize,
    },
    /// The handle was never issued by this arena incarnation, or its block
    /// has been freed.
    InvalidHandle {
        /// The rejected handle.
        handle: Handle,
    },
    /// A write would run past the end of the block's payload.
    OutOfBounds {
        /// Handle of the target block.
        handle: Handle,
        /// Payload offset the write started at.
        offset: usize,
        /// Length of the write.
        len: usize,
        /// Size of the block's payload.
        size: usize,
    },
    /// The arena has not been initialized (or was destroyed).
    Uninitialized,
    /// The block index rejected an operation.
    Index(IndexError),
}

impl ArenaError {
    /// The stable code classifying this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::CapacityExceeded { .. }
            | Self::HostAllocationFailed { .. }
            | Self::HandlesExhausted => ErrorCode::OutOfMemory,
            Self::ZeroSize
            | Self::InvalidConfig { .. }
            | Self::InvalidHandle { .. }
            | Self::OutOfBounds { .. }
            | Self::Index(_) => ErrorCode::InvalidInput,
            Self::Uninitialized => ErrorCode::Uninitialized,
        }
    }
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                max_capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, max capacity {max_capacity} bytes"
                )
            }
            Self::HostAllocationFailed { bytes } => {
                write!(f, "host allocator refused a {bytes}-byte buffer")
            }
            Self::HandlesExhausted => write!(f, "handle id space exhausted"),
            Self::ZeroSize => write!(f, "allocation size must be greater than zero"),
            Self::InvalidConfig {
                initial_capacity,
                max_capacity,
            } => {
                write!(
                    f,
                    "invalid arena config: initial {initial_capacity} bytes, max {max_capacity} bytes"
                )
            }
            Self::InvalidHandle { handle } => write!(f, "invalid handle: {handle}"),
            Self::OutOfBounds {
                handle,
                offset,
                len,
                size,
            } => {
                write!(
                    f,
                    "write of {len} bytes at offset {offset} overruns {handle} ({size} bytes)"
                )
            }
            Self::Uninitialized => write!(f, "arena is not initialized"),
            Self::Index(e) => write!(f, "block index: {e}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Index(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IndexError> for ArenaError {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}

/// Coarse classification of arena outcomes.
///
/// Values are stable and may be stored or passed across a C boundary.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Success.
    NoError = 0x00,
    /// The buffer could not be obtained or grown.
    OutOfMemory = 0x10,
    /// A size, handle or configuration value was rejected.
    InvalidInput = 0x11,
    /// The arena was used before `init` (or after `destroy`).
    Uninitialized = 0x12,
}

impl ErrorCode {
    /// Stable human-readable description, for diagnostics only.
    pub const fn description(self) -> &'static str {
        match self {
            Self::NoError => "no error",
            Self::OutOfMemory => "out of memory",
            Self::InvalidInput => "invalid input",
            Self::Uninitialized => "arena not initialized",
        }
    }

    /// Classify the outcome of an explicit-form call.
    pub fn of<T>(result: &Result<T, ArenaError>) -> Self {
        match result {
            Ok(_) => Self::NoError,
            Err(e) => e.code(),
        }
    }
}

impl From<&ArenaError> for ErrorCode {
    fn from(e: &ArenaError) -> Self {
        e.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Description of `code`; equivalent to [`ErrorCode::description`].
pub const fn error_string(code: ErrorCode) -> &'static str {
    code.description()
}
