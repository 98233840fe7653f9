use thiserror::Error;

use super::heap::Address;

/// Reasons an allocation or a release can fail. None of them is
/// fatal: the heap and the directory are left exactly as they
/// were before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The request is not positive, or the block it needs (after
    /// padding and bookkeeping) is larger than the whole heap.
    #[error("invalid size request")]
    InvalidSize { requested: isize },

    /// No contiguous run of `block_size` bytes is free.
    #[error("could not find contiguous space in heap")]
    HeapExhausted { requested: isize, block_size: usize },

    /// No live block starts at `address`.
    #[error("supplied pointer was never allocated")]
    InvalidFree { address: Address },
}

impl AllocError {
    /// Name of the entry point that reports this error, as it
    /// appears in diagnostic lines.
    pub fn operation(&self) -> &'static str {
        match self {
            AllocError::InvalidSize { .. } | AllocError::HeapExhausted { .. } => "alloc",
            AllocError::InvalidFree { .. } => "mfree",
        }
    }
}
