//! Specialized collection types and identifier allocation

use std::sync::atomic::{AtomicU32, Ordering};

pub use slotmap::{new_key_type, SlotMap};

/// Process-wide monotonically increasing identifier source
///
/// Declared as a `static` with [`IdAllocator::new`]; every call to
/// [`IdAllocator::allocate`] returns a value never handed out before by the
/// same allocator for the lifetime of the process.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU32,
}

impl IdAllocator {
    /// Create an allocator whose first identifier is `first`
    pub const fn new(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Allocate the next identifier
    pub fn allocate(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Peek at the identifier the next call to `allocate` will return
    pub fn peek(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }
}
