use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use arena_heap::{Address, Allocator};
use log::*;

/// The demo heap is kept small so that a dump fits on screen.
const DEMO_HEAP_SIZE: usize = 64;

/// Script replayed when no step is given on the command line.
const DEFAULT_SCRIPT: &[&str] = &[
    "alloc:8", "alloc:8", "free:0", "alloc:4", "alloc:40", "free:12", "alloc:0",
];

/// One step of a demo script.
enum Step {
    /// `init`: reset the heap.
    Init,
    /// `alloc:N`: request N bytes.
    Alloc(isize),
    /// `free:ADDR`: release the block at ADDR (decimal or `0x`
    /// hexadecimal).
    Free(Address),
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(step: &str) -> Result<Self> {
        let (command, argument) = match step.split_once(':') {
            Some((command, argument)) => (command, Some(argument)),
            None => (step, None),
        };

        match (command, argument) {
            ("init", None) => Ok(Step::Init),
            ("alloc", Some(size)) => size
                .parse()
                .map(Step::Alloc)
                .with_context(|| format!("Invalid size in '{step}'.")),
            ("free", Some(address)) => parse_address(address)
                .map(Step::Free)
                .with_context(|| format!("Invalid address in '{step}'.")),
            _ => Err(anyhow!(
                "Unknown step '{step}' (expected init, alloc:N or free:ADDR)."
            )),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Init => write!(f, "init"),
            Step::Alloc(size) => write!(f, "alloc({size})"),
            Step::Free(address) => write!(f, "free({address:#06x})"),
        }
    }
}

fn parse_address(address: &str) -> Result<Address> {
    let parsed = match address.strip_prefix("0x") {
        Some(hex) => Address::from_str_radix(hex, 16)?,
        None => address.parse()?,
    };
    Ok(parsed)
}

fn main() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    // Steps come from the command line, or from the default
    // script if there are none. A bad step aborts before anything
    // runs.
    let args: Vec<String> = std::env::args().skip(1).collect();
    let steps = if args.is_empty() {
        DEFAULT_SCRIPT.iter().map(|s| s.parse()).collect::<Result<Vec<Step>>>()?
    } else {
        args.iter().map(|s| s.parse()).collect::<Result<Vec<Step>>>()?
    };

    let mut allocator = Allocator::<DEMO_HEAP_SIZE>::new();
    info!("Heap of {} bytes:\n{}", allocator.capacity(), allocator.dump());

    for step in steps {
        // Failures are reported by the allocator itself, so the
        // demo only logs what succeeded.
        match step {
            Step::Init => allocator.heap_init(),
            Step::Alloc(size) => {
                if let Ok(address) = allocator.allocate(size) {
                    info!("{step} -> {address:#06x}");
                }
            }
            Step::Free(address) => {
                if allocator.release(address).is_ok() {
                    info!("{step} -> ok");
                }
            }
        }

        info!(
            "After {step} ({} live blocks):\n{}",
            allocator.len(),
            allocator.dump()
        );
    }

    Ok(())
}
