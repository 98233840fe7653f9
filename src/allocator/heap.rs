use std::fmt::Write;
use std::ops::Range;

/// Offset of a byte within the heap. The heap base is address
/// `0`.
pub type Address = usize;

/// Capacity of the heap used when no explicit size is given.
pub const HEAP_SIZE: usize = 1024;

/// Size of a machine word on the target. Every user region is
/// padded to a multiple of this, and the block bookkeeping is
/// stored as words of this size.
pub const WORD_SIZE: usize = std::mem::size_of::<u32>();

/// Number of bytes shown on each line of a heap dump.
const DUMP_ROW: usize = 16;

/// Byte values written over the heap to make its state visible
/// in a dump. They are never read back to take decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Marker {
    /// Written over the whole heap on initialization.
    Uninitialized = 0xFE,
    /// Written over the user region of a new block.
    Allocated = 0xAA,
    /// Written over a whole block (metadata included) when it
    /// is released.
    Freed = 0xEE,
}

impl Marker {
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Classify a heap byte. User data and block metadata
    /// return `None`.
    pub fn of(byte: u8) -> Option<Self> {
        match byte {
            0xFE => Some(Marker::Uninitialized),
            0xAA => Some(Marker::Allocated),
            0xEE => Some(Marker::Freed),
            _ => None,
        }
    }
}

/// The fixed-size byte arena all blocks are carved from. It is
/// never resized, and it lives as long as its owner.
pub struct HeapStore<const SIZE: usize> {
    bytes: [u8; SIZE],
}

impl<const SIZE: usize> HeapStore<SIZE> {
    // Offsets are stored in the heap as 32-bit words, with
    // `u32::MAX` reserved as the "no node" link.
    const FITS_WORD: () = assert!(
        SIZE < u32::MAX as usize,
        "heap size must be addressable with 32-bit offsets"
    );

    pub const fn new() -> Self {
        let () = Self::FITS_WORD;

        Self {
            bytes: [Marker::Uninitialized.byte(); SIZE],
        }
    }

    /// Put every byte back in the uninitialized state.
    pub fn reset(&mut self) {
        self.fill(0..SIZE, Marker::Uninitialized);
    }

    pub fn fill(&mut self, range: Range<Address>, marker: Marker) {
        self.bytes[range].fill(marker.byte());
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn slice(&self, range: Range<Address>) -> &[u8] {
        &self.bytes[range]
    }

    pub fn slice_mut(&mut self, range: Range<Address>) -> &mut [u8] {
        &mut self.bytes[range]
    }

    /// Read the little-endian word stored at `offset`.
    pub fn read_word(&self, offset: Address) -> u32 {
        let mut word = [0; WORD_SIZE];
        word.copy_from_slice(&self.bytes[offset..offset + WORD_SIZE]);
        u32::from_le_bytes(word)
    }

    pub fn write_word(&mut self, offset: Address, value: u32) {
        self.bytes[offset..offset + WORD_SIZE].copy_from_slice(&value.to_le_bytes());
    }

    /// Hex view of the heap, 16 bytes per line with the offset
    /// of the first byte in front:
    ///
    /// ```text
    /// 0000  aa aa aa aa aa aa aa aa  00 00 00 00 18 00 00 00
    /// 0010  ff ff ff ff 08 00 00 00  fe fe fe fe fe fe fe fe
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::with_capacity(SIZE / DUMP_ROW * 56 + 56);

        for (row, chunk) in self.bytes.chunks(DUMP_ROW).enumerate() {
            // Writing into a String cannot fail, so the results
            // are discarded.
            let _ = write!(out, "{:04x} ", row * DUMP_ROW);
            for (column, byte) in chunk.iter().enumerate() {
                if column == DUMP_ROW / 2 {
                    out.push(' ');
                }
                let _ = write!(out, " {byte:02x}");
            }
            out.push('\n');
        }

        out
    }
}

impl<const SIZE: usize> Default for HeapStore<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Round `value` up to the next multiple of `alignment`, which
/// must be a power of two. Returns `None` on overflow.
pub fn align_up(value: usize, alignment: usize) -> Option<usize> {
    // Adding `alignment - 1` pushes any value that is not
    // already aligned past the next boundary, then masking the
    // low bits brings it back down onto that boundary:
    //
    //  V = 5, A = 4
    //  V + (A-1) = 8 = 0000 1000
    //  !(A-1)        = 1111 1100
    //  -----------------------
    //                  0000 1000 = 8
    debug_assert!(alignment.is_power_of_two());
    Some(value.checked_add(alignment - 1)? & !(alignment - 1))
}
