//! Packed construction of several typed sequences in one allocation.
//!
//! [`make_contiguous_objects`] plans the layout, requests the region from a
//! [`MemorySource`] exactly once, and constructs every sequence in declared
//! order. Construction is all or nothing: if any element fails (by error or
//! by panic) every element built so far is dropped in reverse construction
//! order and the region is returned to the source before the failure
//! reaches the caller.
//!
//! ```rust
//! use contiguous::{init, make_contiguous_objects, destroy_contiguous_objects, SystemSource};
//! use core::convert::Infallible;
//!
//! let source = SystemSource;
//! let objects = make_contiguous_objects::<(u32, f64), Infallible>(
//!     &source,
//!     (init::from_iter(3, [1, 2, 3]), init::fill(2, 0.5)),
//! )
//! .unwrap();
//!
//! let (ids, weights) = *objects.views();
//! assert_eq!(unsafe { ids.as_slice() }, &[1, 2, 3]);
//! assert_eq!(unsafe { weights.as_slice() }, &[0.5, 0.5]);
//!
//! unsafe { destroy_contiguous_objects(&source, objects) };
//! ```

use core::convert::Infallible;
use core::fmt;
use core::ptr::NonNull;

use crate::alloc::{align_up, MemorySource};
use crate::error::PackError;
use crate::layout::{plan_layout, LayoutPlan};
use crate::trace::debug_event;

mod guard;
mod packed;
mod region;
mod sequences;
mod view;


use guard::RegionGuard;
pub use packed::Packed;
pub use region::Region;
pub use sequences::{Initializers, Sequences};
pub use view::View;

/// The views of a packed allocation together with the region behind them.
///
/// This is a raw handle: it neither drops its elements nor frees its region.
/// Pass it to [`destroy_contiguous_objects`] (or use [`Packed`]) to do so.
pub struct Contiguous<S: Sequences> {
    views: S::Views,
    region: Region,
}

impl<S: Sequences> Contiguous<S> {
    /// One view per element type, in declared order.
    pub fn views(&self) -> &S::Views {
        &self.views
    }

    /// The allocation backing the views.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Splits the handle into its views and region.
    pub fn into_parts(self) -> (S::Views, Region) {
        (self.views, self.region)
    }

    /// Reassembles a handle from [`Contiguous::into_parts`].
    ///
    /// # Safety
    /// `views` and `region` must come from the same `into_parts` call.
    pub unsafe fn from_parts(views: S::Views, region: Region) -> Self {
        Self { views, region }
    }

    /// Derives the region from the views alone: the first view's start and
    /// the last view's end, each rounded up to the storage unit.
    ///
    /// This matches [`Contiguous::region`] as long as the views are the ones
    /// produced by the allocation, in their original order.
    pub fn recompute_region(&self) -> Region {
        let unit = self.region.unit();
        let (first, last) = S::bounds(&self.views);
        let first_addr = first.as_ptr() as usize;
        let begin = align_up(first_addr, unit.align());
        let end = align_up(last.as_ptr() as usize, unit.align());
        // SAFETY: `first` is non-null and rounding up only moves it forward.
        let ptr = unsafe { NonNull::new_unchecked(first.as_ptr().wrapping_add(begin - first_addr)) };
        Region::new(ptr, unit, (end - begin) / unit.size())
    }
}

impl<S: Sequences> fmt::Debug for Contiguous<S>
where
    S::Views: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contiguous")
            .field("views", &self.views)
            .field("region", &self.region)
            .finish()
    }
}

/// Plans the layout for the given initializers without allocating.
///
/// # Errors
/// Returns `PackError::Layout` if the sizes overflow.
pub fn plan_for<S: Sequences, E>(inits: &impl Initializers<S, E>) -> Result<LayoutPlan, PackError<E>> {
    Ok(plan_layout(&S::descriptors(&inits.counts())?)?)
}

fn allocate_region<S: Sequences, M, E>(source: &M, plan: &LayoutPlan) -> Result<Region, PackError<E>>
where
    M: MemorySource + ?Sized,
{
    let unit = plan.unit();
    let units = plan.units();
    if units == 0 {
        return Ok(Region::empty(unit));
    }

    debug_event!(
        sequences = S::LEN,
        bytes = plan.total_bytes(),
        units,
        unit_size = unit.size(),
        "allocating packed region"
    );
    match source.allocate_units(unit, units) {
        Ok(ptr) => {
            debug_assert_eq!(ptr.as_ptr() as usize % unit.align(), 0, "memory source returned a misaligned region");
            Ok(Region::new(ptr, unit, units))
        }
        Err(_) => Err(PackError::OutOfMemory {
            bytes: plan.total_bytes(),
            align: unit.align(),
        }),
    }
}

/// Allocates one region for the sequences of `S` and constructs them.
///
/// `S` is the tuple of element types and `inits` the tuple of matching
/// initializers (see [`crate::init`]). `E` is the error type the
/// initializers may fail with; use `Infallible` when none can.
///
/// # Errors
/// * `PackError::Layout` when the combined size overflows; nothing was allocated.
/// * `PackError::OutOfMemory` when the source refuses; nothing was constructed.
/// * `PackError::Construction` / `PackError::InputExhausted` when an element
///   could not be built; everything has been rolled back and freed.
pub fn make_contiguous_objects<S: Sequences, E>(
    source: &impl MemorySource,
    inits: impl Initializers<S, E>,
) -> Result<Contiguous<S>, PackError<E>> {
    let plan = plan_for::<S, E>(&inits)?;
    let region = allocate_region::<S, _, E>(source, &plan)?;
    let guard = RegionGuard::new(source, region);

    // SAFETY: the region holds `plan.total_bytes()` bytes aligned to the unit.
    let views = unsafe { S::views(region.as_ptr(), &plan) };
    // SAFETY: the views are fresh, disjoint, and sized from the same counts.
    unsafe { inits.construct(&views)? };

    Ok(Contiguous {
        views,
        region: guard.disarm(),
    })
}

/// Allocates one region for `counts` elements of each type in `S` without
/// constructing anything.
///
/// The views point at uninitialized memory. Release the region with
/// [`release_contiguous_layout`], or construct every element and use
/// [`destroy_contiguous_objects`].
///
/// # Errors
/// Returns `PackError::Layout` for a bad count list or size overflow, and
/// `PackError::OutOfMemory` when the source refuses.
pub fn make_contiguous_layout<S: Sequences>(
    source: &impl MemorySource,
    counts: &[usize],
) -> Result<Contiguous<S>, PackError<Infallible>> {
    let plan = plan_layout(&S::descriptors(counts)?)?;
    let region = allocate_region::<S, _, Infallible>(source, &plan)?;
    // SAFETY: the region holds `plan.total_bytes()` bytes aligned to the unit.
    let views = unsafe { S::views(region.as_ptr(), &plan) };
    Ok(Contiguous { views, region })
}

/// Returns a region to its source without dropping any element.
///
/// # Safety
/// `contiguous` must come from `source`, and nothing in it may be used
/// afterwards. Constructed elements are leaked.
pub unsafe fn release_contiguous_layout<S: Sequences>(source: &impl MemorySource, contiguous: Contiguous<S>) {
    contiguous.region.release(source);
}

/// Drops every element and returns the region to its source.
///
/// Views are destroyed in declared order, each from its last element to its
/// first.
///
/// # Safety
/// `contiguous` must come from [`make_contiguous_objects`] with the same
/// `source` (or have every element constructed), and none of its elements
/// may be used afterwards.
pub unsafe fn destroy_contiguous_objects<S: Sequences>(source: &impl MemorySource, contiguous: Contiguous<S>) {
    destroy_in_place(source, &contiguous);
}

unsafe fn destroy_in_place<S: Sequences, M: MemorySource + ?Sized>(source: &M, contiguous: &Contiguous<S>) {
    S::destroy(&contiguous.views);
    debug_assert_eq!(contiguous.recompute_region(), contiguous.region);
    contiguous.region.release(source);
}
