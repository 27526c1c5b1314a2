//! `PageSource`: anonymous OS page mappings as a memory source.
//!
//! Every request is rounded up to whole pages and mapped on its own, which
//! suits large packed regions that should not live on the general heap.

use core::alloc::Layout;
use core::ptr::NonNull;

use super::allocator::{AllocError, MemorySource};

/// Granularity of every mapping made by [`PageSource`].
pub const PAGE_SIZE: usize = 4096;

/// Rounds `value` up to a multiple of `align` (a power of two).
pub const fn align_up(value: usize, align: usize) -> usize {
    if align == 0 {
        value
    } else {
        (value + (align - 1)) & !(align - 1)
    }
}

/// A memory source that maps fresh pages for each allocation.
///
/// Alignments up to [`PAGE_SIZE`] are satisfied by the mapping itself; larger
/// alignments are rejected.
#[derive(Default, Clone, Copy, Debug)]
pub struct PageSource;

impl PageSource {
    /// Creates a new page source.
    pub const fn new() -> Self {
        Self
    }

    /// Number of bytes actually mapped for `layout`.
    pub const fn mapped_len(layout: Layout) -> usize {
        align_up(layout.size(), PAGE_SIZE)
    }
}

impl MemorySource for PageSource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 || layout.align() > PAGE_SIZE {
            return Err(AllocError);
        }
        if layout.size() > isize::MAX as usize - PAGE_SIZE {
            return Err(AllocError);
        }
        // SAFETY: the length is non-zero and page-rounded.
        unsafe { map_pages(Self::mapped_len(layout)) }.ok_or(AllocError)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unmap_pages(ptr, Self::mapped_len(layout));
    }
}

#[cfg(unix)]
unsafe fn map_pages(len: usize) -> Option<NonNull<u8>> {
    let ptr = libc::mmap(
        core::ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANON,
        -1,
        0,
    );
    if ptr == libc::MAP_FAILED {
        None
    } else {
        NonNull::new(ptr.cast::<u8>())
    }
}

#[cfg(unix)]
unsafe fn unmap_pages(ptr: NonNull<u8>, len: usize) {
    libc::munmap(ptr.as_ptr().cast::<libc::c_void>(), len);
}

#[cfg(windows)]
unsafe fn map_pages(len: usize) -> Option<NonNull<u8>> {
    use windows_sys::Win32::System::Memory::{VirtualAlloc, MEM_COMMIT, MEM_RESERVE, PAGE_READWRITE};
    let ptr = VirtualAlloc(core::ptr::null_mut(), len, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE);
    NonNull::new(ptr.cast::<u8>())
}

#[cfg(windows)]
unsafe fn unmap_pages(ptr: NonNull<u8>, _len: usize) {
    use windows_sys::Win32::System::Memory::{VirtualFree, MEM_RELEASE};
    // MEM_RELEASE frees the whole reservation and requires a size of 0.
    VirtualFree(ptr.as_ptr().cast::<core::ffi::c_void>(), 0, MEM_RELEASE);
}
