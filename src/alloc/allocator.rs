use core::alloc::Layout;
use core::ptr::NonNull;

use crate::layout::StorageUnit;

/// A pluggable source of raw memory.
///
/// This trait is similar to `std::alloc::Allocator` but only covers what the
/// packed allocator needs: one request and one release per region. Sources
/// make no thread-safety promise beyond their own implementation; the packed
/// allocator adds no shared state on top.
pub trait MemorySource {
    /// Allocates memory according to the given layout.
    ///
    /// The returned pointer must be aligned to `layout.align()`.
    ///
    /// # Errors
    /// Returns `AllocError` if the request cannot be satisfied.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Deallocates memory.
    ///
    /// # Safety
    /// `ptr` must denote a block of memory currently allocated by this source.
    /// `layout` must be the same layout that was used to allocate that block of memory.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Allocates `count` storage units.
    ///
    /// This is the typed hook the packed allocator calls; the default forwards
    /// to [`MemorySource::allocate`] with the unit's array layout.
    ///
    /// # Errors
    /// Returns `AllocError` if the request cannot be satisfied or if the
    /// array layout overflows.
    fn allocate_units(&self, unit: StorageUnit, count: usize) -> Result<NonNull<u8>, AllocError> {
        let layout = unit.layout_for(count).ok_or(AllocError)?;
        self.allocate(layout)
    }

    /// Deallocates `count` storage units previously returned by
    /// [`MemorySource::allocate_units`].
    ///
    /// # Safety
    /// `ptr`, `unit` and `count` must be exactly the values of a previous
    /// successful `allocate_units` call on this source.
    unsafe fn deallocate_units(&self, ptr: NonNull<u8>, unit: StorageUnit, count: usize) {
        if let Some(layout) = unit.layout_for(count) {
            self.deallocate(ptr, layout);
        }
    }
}

impl<M: MemorySource + ?Sized> MemorySource for &M {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout);
    }

    fn allocate_units(&self, unit: StorageUnit, count: usize) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate_units(unit, count)
    }

    unsafe fn deallocate_units(&self, ptr: NonNull<u8>, unit: StorageUnit, count: usize) {
        (**self).deallocate_units(ptr, unit, count);
    }
}

/// The error type for allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl std::error::Error for AllocError {}
