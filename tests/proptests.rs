use proptest::collection::vec;
use proptest::prelude::*;

use arena_heap::{block_size_for, Allocator, BlockDescriptor};

const SIZE: usize = 512;

#[derive(Clone, Debug)]
enum Op {
    Alloc(isize),
    /// Release the n-th live address (modulo the live count), or
    /// an address that was never handed out if nothing is live.
    Free(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (-4isize..160).prop_map(Op::Alloc),
        2 => any::<usize>().prop_map(Op::Free),
    ]
}

fn assert_disjoint(blocks: &[BlockDescriptor]) -> Result<(), TestCaseError> {
    for (i, a) in blocks.iter().enumerate() {
        prop_assert!(a.end() <= SIZE);
        for b in &blocks[i + 1..] {
            prop_assert!(!a.overlaps(b.address, b.length), "{:?} overlaps {:?}", a, b);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn live_blocks_never_overlap(ops in vec(op(), 1..64)) {
        let mut allocator = Allocator::<SIZE, Vec<String>>::with_diagnostics(Vec::new());
        let mut live: Vec<usize> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc(size) => {
                    if let Ok(address) = allocator.allocate(size) {
                        prop_assert!(size > 0);
                        prop_assert!(address + size as usize <= SIZE);
                        prop_assert!(!live.contains(&address));
                        live.push(address);
                    }
                }
                Op::Free(n) if !live.is_empty() => {
                    let address = live.remove(n % live.len());
                    prop_assert!(allocator.release(address).is_ok());
                }
                Op::Free(_) => {
                    prop_assert!(allocator.release(SIZE + 1).is_err());
                }
            }

            let blocks: Vec<_> = allocator.blocks().collect();
            prop_assert_eq!(blocks.len(), live.len());
            assert_disjoint(&blocks)?;
        }
    }
}

proptest! {
    #[test]
    fn allocate_then_release_is_neutral(
        sizes in vec(1isize..48, 0..8),
        size in 1isize..48,
    ) {
        let mut allocator = Allocator::<SIZE, Vec<String>>::with_diagnostics(Vec::new());
        for size in sizes {
            let _ = allocator.allocate(size);
        }
        let before: Vec<_> = allocator.blocks().collect();

        if let Ok(address) = allocator.allocate(size) {
            prop_assert!(allocator.release(address).is_ok());
        }

        prop_assert_eq!(allocator.blocks().collect::<Vec<_>>(), before);
    }
}

proptest! {
    #[test]
    fn block_size_is_word_padded(size in 1isize..4096) {
        let block = block_size_for(size).unwrap();
        prop_assert_eq!(block % 4, 0);
        prop_assert!(block >= size as usize + 16);
        prop_assert!(block < size as usize + 20);
    }
}

proptest! {
    #[test]
    fn rejected_sizes_change_nothing(size in -1024isize..=0) {
        let mut allocator = Allocator::<SIZE, Vec<String>>::with_diagnostics(Vec::new());
        allocator.allocate(12).unwrap();
        let heap = allocator.heap().to_vec();

        prop_assert!(allocator.allocate(size).is_err());
        prop_assert_eq!(allocator.heap(), &heap[..]);
        prop_assert_eq!(allocator.len(), 1);
        prop_assert_eq!(allocator.diagnostics().len(), 1);
    }
}
