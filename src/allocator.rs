mod diagnostics;
mod directory;
mod error;
mod heap;

use log::*;

pub use diagnostics::{Diagnostics, LogDiagnostics};
pub use directory::{BlockDescriptor, Blocks, DESCRIPTOR_SIZE, METADATA_SIZE, NODE_SIZE};
pub use error::AllocError;
pub use heap::{Address, Marker, HEAP_SIZE, WORD_SIZE};

use directory::Directory;
use heap::{align_up, HeapStore};

/// Size of the block needed to serve a request of
/// `requested_size` bytes: the request padded to a whole number
/// of words, plus the descriptor and directory node stored at the
/// tail of the block. Returns `None` for non-positive requests
/// and on overflow.
pub fn block_size_for(requested_size: isize) -> Option<usize> {
    let requested = usize::try_from(requested_size).ok().filter(|&size| size > 0)?;
    align_up(requested, WORD_SIZE)?.checked_add(METADATA_SIZE)
}

/// First-fit allocator over a fixed arena of `SIZE` bytes.
///
/// The allocator owns both the arena and the directory of live
/// blocks. Each block carries its own bookkeeping: the user
/// region is followed by a [`BlockDescriptor`] and by the
/// directory node that links it to the other live blocks. An
/// 8-byte request on a 64-byte heap therefore looks like this:
///
/// ```text
/// 0000  aa aa aa aa aa aa aa aa  00 00 00 00 18 00 00 00
/// 0010  ff ff ff ff 08 00 00 00  fe fe fe fe fe fe fe fe
///       '-- node (next, desc) -'
/// ```
///
/// The allocator is not thread-safe and must not be re-entered:
/// every operation takes `&mut self`. Failures are returned to
/// the caller and also reported through `D`.
pub struct Allocator<const SIZE: usize = HEAP_SIZE, D = LogDiagnostics> {
    /// The arena blocks are carved from.
    heap: HeapStore<SIZE>,
    /// Live blocks, in allocation order.
    directory: Directory,
    /// Where failed requests are reported.
    diagnostics: D,
}

impl<const SIZE: usize> Allocator<SIZE> {
    /// Create an initialized allocator that reports failures to
    /// the `log` facade. Usable in a `static`.
    pub const fn new() -> Self {
        Self::with_diagnostics(LogDiagnostics)
    }
}

impl<const SIZE: usize> Default for Allocator<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize, D> Allocator<SIZE, D> {
    pub const fn with_diagnostics(diagnostics: D) -> Self {
        Self {
            heap: HeapStore::new(),
            directory: Directory::new(),
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut D {
        &mut self.diagnostics
    }
}

impl<const SIZE: usize, D: Diagnostics> Allocator<SIZE, D> {
    /// Empty the directory and mark every heap byte as
    /// uninitialized. Blocks that were live are forgotten: their
    /// addresses can no longer be released.
    pub fn heap_init(&mut self) {
        self.directory.clear();
        self.heap.reset();
        debug!("Heap initialized ({} bytes).", SIZE);
    }

    /// Reserve a block for `requested_size` bytes and return the
    /// address of its first byte. The block is placed at the
    /// lowest address where it overlaps no live block.
    pub fn allocate(&mut self, requested_size: isize) -> Result<Address, AllocError> {
        // The block must at least fit in an empty heap,
        // bookkeeping included.
        let block_size = match block_size_for(requested_size) {
            Some(size) if size <= SIZE => size,
            _ => {
                return Err(self.fail(AllocError::InvalidSize {
                    requested: requested_size,
                }))
            }
        };

        let address = match self.find_free(block_size) {
            Some(address) => address,
            None => {
                return Err(self.fail(AllocError::HeapExhausted {
                    requested: requested_size,
                    block_size,
                }))
            }
        };

        // The space is ours: mark the user region and append the
        // block's bookkeeping to its tail.
        let block = BlockDescriptor {
            address,
            length: block_size,
        };
        self.heap
            .fill(address..address + block.user_size(), Marker::Allocated);
        self.directory.register(&mut self.heap, block);

        trace!(
            "Allocated {} bytes at {:#06x} (block of {} bytes, {} live).",
            requested_size,
            address,
            block_size,
            self.directory.len()
        );
        Ok(address)
    }

    /// Release the block that starts at `address` and scrub it,
    /// bookkeeping included.
    pub fn release(&mut self, address: Address) -> Result<(), AllocError> {
        match self.directory.unregister(&mut self.heap, address) {
            Some(block) => {
                self.heap.fill(block.address..block.end(), Marker::Freed);
                trace!(
                    "Released block at {:#06x} ({} bytes, {} live).",
                    address,
                    block.length,
                    self.directory.len()
                );
                Ok(())
            }
            None => Err(self.fail(AllocError::InvalidFree { address })),
        }
    }

    fn fail(&mut self, error: AllocError) -> AllocError {
        self.diagnostics
            .report(&format!("{}() error: {}", error.operation(), error));
        error
    }

    fn find_free(&self, block_size: usize) -> Option<Address> {
        // Start at the base of the heap and compare the candidate
        // range against every live block. On a collision, the
        // candidate moves right after the block it hit; every
        // address in between would hit that same block, so no
        // valid address is skipped. The directory is in
        // allocation order, not address order, so the new
        // candidate may now hit a block that was already checked:
        // the scan starts over until a whole pass finds nothing.
        let mut candidate = 0;

        'scan: loop {
            for block in self.directory.iter(&self.heap) {
                if block.overlaps(candidate, block_size) {
                    candidate = block.end();

                    if candidate + block_size > SIZE {
                        return None;
                    }
                    continue 'scan;
                }
            }

            return Some(candidate);
        }
    }
}

impl<const SIZE: usize, D> Allocator<SIZE, D> {
    pub const fn capacity(&self) -> usize {
        SIZE
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// Live blocks, in allocation order.
    pub fn blocks(&self) -> Blocks<'_, SIZE> {
        self.directory.iter(&self.heap)
    }

    /// The raw arena, bookkeeping and markers included.
    pub fn heap(&self) -> &[u8] {
        self.heap.bytes()
    }

    /// User bytes of the live block starting at `address`.
    pub fn user_region(&self, address: Address) -> Option<&[u8]> {
        let block = self.block_at(address)?;
        Some(self.heap.slice(block.address..block.address + block.user_size()))
    }

    /// Writable user bytes of the live block starting at
    /// `address`. The block's bookkeeping is out of reach.
    pub fn user_region_mut(&mut self, address: Address) -> Option<&mut [u8]> {
        let block = self.block_at(address)?;
        Some(
            self.heap
                .slice_mut(block.address..block.address + block.user_size()),
        )
    }

    /// Hex dump of the whole arena.
    pub fn dump(&self) -> String {
        self.heap.dump()
    }

    fn block_at(&self, address: Address) -> Option<BlockDescriptor> {
        self.blocks().find(|block| block.address == address)
    }
}
