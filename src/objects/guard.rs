//! Scope guards for all-or-nothing construction.
//!
//! A `RegionGuard` owns the raw allocation and a `SequenceGuard` owns the
//! constructed prefix of one sequence. Guards are created in construction
//! order, so on an early return or a panic they drop in reverse: the
//! failing sequence's prefix first, then each completed sequence from last
//! to first, and finally the region itself.

use core::mem;

use super::region::Region;
use super::view::{destroy_prefix, View};
use crate::alloc::MemorySource;
use crate::trace::debug_event;

/// Frees the region on drop unless disarmed.
pub(crate) struct RegionGuard<'a, M: MemorySource + ?Sized> {
    source: &'a M,
    region: Region,
}

impl<'a, M: MemorySource + ?Sized> RegionGuard<'a, M> {
    pub(crate) fn new(source: &'a M, region: Region) -> Self {
        Self { source, region }
    }

    /// Hands the region to the caller.
    pub(crate) fn disarm(self) -> Region {
        let region = self.region;
        mem::forget(self);
        region
    }
}

impl<M: MemorySource + ?Sized> Drop for RegionGuard<'_, M> {
    fn drop(&mut self) {
        debug_event!(units = self.region.units(), "construction aborted; freeing region");
        // SAFETY: the region was obtained from `source` and nothing in it is live.
        unsafe { self.region.release(self.source) };
    }
}

/// Destroys the constructed prefix of one sequence on drop unless completed.
pub(crate) struct SequenceGuard<T> {
    view: View<T>,
    sequence: usize,
    constructed: usize,
}

impl<T> SequenceGuard<T> {
    pub(crate) fn new(view: View<T>, sequence: usize) -> Self {
        Self {
            view,
            sequence,
            constructed: 0,
        }
    }

    /// Writes the next element in place.
    ///
    /// # Safety
    /// Must be called at most `view.len()` times.
    #[inline]
    pub(crate) unsafe fn push(&mut self, value: T) {
        debug_assert!(self.constructed < self.view.len());
        self.view.as_ptr().add(self.constructed).write(value);
        self.constructed += 1;
    }

    pub(crate) fn constructed(&self) -> usize {
        self.constructed
    }

    /// Keeps the constructed elements alive.
    pub(crate) fn complete(self) {
        debug_assert_eq!(self.constructed, self.view.len());
        mem::forget(self);
    }
}

impl<T> Drop for SequenceGuard<T> {
    fn drop(&mut self) {
        debug_event!(
            sequence = self.sequence,
            constructed = self.constructed,
            "rolling back sequence"
        );
        // SAFETY: exactly the first `constructed` elements were written.
        unsafe { destroy_prefix(self.view.as_ptr(), self.constructed) };
    }
}
