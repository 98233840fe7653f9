//! A fixed-capacity first-fit allocator for targets without an
//! operating system.
//!
//! All memory comes from one arena of `SIZE` bytes owned by an
//! [`Allocator`]. Every block keeps its own bookkeeping (a
//! [`BlockDescriptor`] and a directory node) right after the bytes
//! handed out to the user, so no separate metadata table is needed.
//!
//! ```
//! use arena_heap::{Allocator, AllocError};
//!
//! let mut allocator = Allocator::<64>::new();
//!
//! let first = allocator.allocate(8).unwrap();
//! let second = allocator.allocate(8).unwrap();
//! assert_eq!((first, second), (0, 24));
//!
//! allocator.release(first).unwrap();
//! assert_eq!(allocator.allocate(4), Ok(0));
//! assert_eq!(allocator.release(7), Err(AllocError::InvalidFree { address: 7 }));
//! ```

pub mod allocator;

pub use allocator::{
    block_size_for, Address, AllocError, Allocator, BlockDescriptor, Diagnostics,
    LogDiagnostics, Marker, HEAP_SIZE,
};
