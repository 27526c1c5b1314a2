//! `SystemSource`: the global allocator as a memory source.
//!
//! Unlike `std::alloc::alloc` callers that abort through `handle_alloc_error`,
//! this source reports exhaustion as [`AllocError`] so the packed allocator can
//! surface it as an out-of-memory error.

use core::alloc::Layout;
use core::ptr::NonNull;
use std::alloc::{alloc, dealloc};

use super::allocator::{AllocError, MemorySource};

/// A memory source backed by the global allocator.
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemSource;

impl SystemSource {
    /// Creates a new system source.
    pub const fn new() -> Self {
        Self
    }
}

impl MemorySource for SystemSource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return Err(AllocError);
        }
        // SAFETY: the layout has a non-zero size.
        let ptr = unsafe { alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        dealloc(ptr.as_ptr(), layout);
    }
}
