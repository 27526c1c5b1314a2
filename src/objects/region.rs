use core::ptr::NonNull;

use crate::alloc::MemorySource;
use crate::layout::StorageUnit;
use crate::trace::debug_event;

/// The raw allocation behind a packed layout: a base pointer plus the number
/// of storage units requested from the memory source.
///
/// A region of zero units was never requested; its pointer is dangling but
/// aligned to the unit, and releasing it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    ptr: NonNull<u8>,
    unit: StorageUnit,
    units: usize,
}

impl Region {
    pub(crate) fn new(ptr: NonNull<u8>, unit: StorageUnit, units: usize) -> Self {
        Self { ptr, unit, units }
    }

    /// A placeholder for layouts that occupy no bytes.
    pub(crate) fn empty(unit: StorageUnit) -> Self {
        // SAFETY: a unit's alignment is a non-zero power of two.
        let ptr = unsafe { NonNull::new_unchecked(core::ptr::null_mut::<u8>().wrapping_add(unit.align())) };
        Self { ptr, unit, units: 0 }
    }

    /// Base address of the region.
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// The storage unit the region was requested in.
    pub fn unit(&self) -> StorageUnit {
        self.unit
    }

    /// Number of storage units.
    pub fn units(&self) -> usize {
        self.units
    }

    /// Size in bytes.
    pub fn byte_len(&self) -> usize {
        self.units * self.unit.size()
    }

    /// Whether a real allocation backs the region.
    pub fn is_allocated(&self) -> bool {
        self.units != 0
    }

    /// Returns the region to `source`.
    ///
    /// # Safety
    /// The region must come from `source` and must not be used afterwards.
    pub(crate) unsafe fn release<M: MemorySource + ?Sized>(self, source: &M) {
        if !self.is_allocated() {
            return;
        }
        debug_event!(
            addr = self.ptr.as_ptr() as usize,
            units = self.units,
            unit_size = self.unit.size(),
            "releasing packed region"
        );
        source.deallocate_units(self.ptr, self.unit, self.units);
    }
}
