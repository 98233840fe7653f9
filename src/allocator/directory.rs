use super::heap::{Address, HeapStore, WORD_SIZE};

/// Bytes taken by a block descriptor: its address and its
/// length, one word each.
pub const DESCRIPTOR_SIZE: usize = 2 * WORD_SIZE;

/// Bytes taken by a directory node: the link to the next node
/// and the offset of its descriptor, one word each.
pub const NODE_SIZE: usize = 2 * WORD_SIZE;

/// Bookkeeping overhead reserved at the tail of every block.
pub const METADATA_SIZE: usize = DESCRIPTOR_SIZE + NODE_SIZE;

/// Link value stored in the last node of the directory.
const NIL: u32 = u32::MAX;

/// Placement of a live block within the heap. The descriptor is
/// stored in the heap itself, right after the user region of the
/// block it describes, so the block accounts for its own
/// bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Offset of the first byte handed out to the user.
    pub address: Address,
    /// Total size of the block: user region, descriptor and
    /// directory node.
    pub length: usize,
}

impl BlockDescriptor {
    /// Offset one past the last byte of the block.
    pub fn end(&self) -> Address {
        self.address + self.length
    }

    /// Number of bytes the user can write to.
    pub fn user_size(&self) -> usize {
        self.length - METADATA_SIZE
    }

    /// Check whether `[start, start + length)` shares at least
    /// one byte with this block.
    pub fn overlaps(&self, start: Address, length: usize) -> bool {
        // Two half-open ranges overlap when each one starts
        // before the other ends.
        start < self.end() && self.address < start + length
    }

    fn descriptor_offset(&self) -> Address {
        self.end() - METADATA_SIZE
    }

    fn node_offset(&self) -> Address {
        self.end() - NODE_SIZE
    }

    fn read<const SIZE: usize>(heap: &HeapStore<SIZE>, offset: Address) -> Self {
        Self {
            address: heap.read_word(offset) as Address,
            length: heap.read_word(offset + WORD_SIZE) as usize,
        }
    }

    fn write<const SIZE: usize>(&self, heap: &mut HeapStore<SIZE>, offset: Address) {
        heap.write_word(offset, self.address as u32);
        heap.write_word(offset + WORD_SIZE, self.length as u32);
    }
}

/// Link of the directory, stored in the heap after its
/// descriptor.
#[derive(Clone, Copy, Debug)]
struct Node {
    next: Option<Address>,
    descriptor: Address,
}

impl Node {
    fn read<const SIZE: usize>(heap: &HeapStore<SIZE>, offset: Address) -> Self {
        let next = match heap.read_word(offset) {
            NIL => None,
            next => Some(next as Address),
        };

        Self {
            next,
            descriptor: heap.read_word(offset + WORD_SIZE) as Address,
        }
    }

    fn write<const SIZE: usize>(&self, heap: &mut HeapStore<SIZE>, offset: Address) {
        let next = self.next.map_or(NIL, |next| next as u32);
        heap.write_word(offset, next);
        heap.write_word(offset + WORD_SIZE, self.descriptor as u32);
    }
}

/// Singly linked list of the live blocks, in the order they were
/// allocated. Only the head lives outside of the heap; every node
/// sits inside the block it describes.
#[derive(Debug, Default)]
pub struct Directory {
    /// Offset of the first node, `None` when no block is live.
    head: Option<Address>,
    /// Number of nodes reachable from `head`.
    len: usize,
}

impl Directory {
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Forget every block. Nothing is written to the heap.
    pub fn clear(&mut self) {
        self.head = None;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Walk the live blocks in directory order.
    pub fn iter<'h, const SIZE: usize>(&self, heap: &'h HeapStore<SIZE>) -> Blocks<'h, SIZE> {
        Blocks {
            heap,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Write the descriptor and node of `block` at its tail and
    /// append the node to the end of the list. The caller has
    /// already checked that the block fits and overlaps nothing.
    pub fn register<const SIZE: usize>(
        &mut self,
        heap: &mut HeapStore<SIZE>,
        block: BlockDescriptor,
    ) {
        let descriptor = block.descriptor_offset();
        let offset = block.node_offset();

        block.write(heap, descriptor);
        Node {
            next: None,
            descriptor,
        }
        .write(heap, offset);

        // The new node becomes the head of an empty list, or is
        // linked after the current tail.
        match self.tail(heap) {
            None => self.head = Some(offset),
            Some(tail) => {
                let mut node = Node::read(heap, tail);
                node.next = Some(offset);
                node.write(heap, tail);
            }
        }

        self.len += 1;
    }

    /// Unlink the block that starts at `address` and return its
    /// descriptor. The block bytes are left untouched. Returns
    /// `None`, without changing anything, if no live block starts
    /// there.
    pub fn unregister<const SIZE: usize>(
        &mut self,
        heap: &mut HeapStore<SIZE>,
        address: Address,
    ) -> Option<BlockDescriptor> {
        let mut previous: Option<Address> = None;
        let mut cursor = self.head;

        for _ in 0..self.len {
            let offset = cursor?;
            let node = Node::read(heap, offset);
            let block = BlockDescriptor::read(heap, node.descriptor);

            if block.address == address {
                // Rewire whatever pointed at this node to the node
                // that follows it.
                match previous {
                    None => self.head = node.next,
                    Some(previous) => {
                        let mut link = Node::read(heap, previous);
                        link.next = node.next;
                        link.write(heap, previous);
                    }
                }

                self.len -= 1;
                return Some(block);
            }

            previous = Some(offset);
            cursor = node.next;
        }

        None
    }

    fn tail<const SIZE: usize>(&self, heap: &HeapStore<SIZE>) -> Option<Address> {
        let mut tail = self.head?;
        while let Some(next) = Node::read(heap, tail).next {
            tail = next;
        }
        Some(tail)
    }
}

/// Iterator over the live blocks of a [`Directory`].
pub struct Blocks<'h, const SIZE: usize> {
    heap: &'h HeapStore<SIZE>,
    cursor: Option<Address>,
    remaining: usize,
}

impl<const SIZE: usize> Iterator for Blocks<'_, SIZE> {
    type Item = BlockDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = Node::read(self.heap, self.cursor?);
        self.cursor = node.next;
        self.remaining -= 1;

        Some(BlockDescriptor::read(self.heap, node.descriptor))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
