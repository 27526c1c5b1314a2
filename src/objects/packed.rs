use core::fmt;
use core::marker::PhantomData;

use super::{destroy_in_place, make_contiguous_objects, Contiguous, Initializers, Region, Sequences};
use crate::alloc::MemorySource;
use crate::error::PackError;

/// An owning packed allocation.
///
/// Holds the memory source alongside the views, hands out safe slices, and
/// destroys every element and frees the region on drop.
///
/// ```rust
/// use contiguous::{init, Packed, SystemSource};
/// use core::convert::Infallible;
///
/// let mut packed = Packed::<(u16, [f32; 3]), _>::new::<Infallible>(
///     SystemSource,
///     (4usize, init::fill(2, [1.0, 0.0, 0.0])),
/// )
/// .unwrap();
///
/// let (counters, axes) = packed.as_mut_slices();
/// counters[1] = 7;
/// axes[0][2] = 1.0;
///
/// let (counters, axes) = packed.as_slices();
/// assert_eq!(counters, &[0, 7, 0, 0]);
/// assert_eq!(axes[0], [1.0, 0.0, 1.0]);
/// ```
pub struct Packed<S: Sequences, M: MemorySource> {
    contiguous: Contiguous<S>,
    source: M,
    _owns: PhantomData<S>,
}

impl<S: Sequences, M: MemorySource> Packed<S, M> {
    /// Allocates from `source` and constructs every sequence.
    ///
    /// # Errors
    /// See [`make_contiguous_objects`].
    pub fn new<E>(source: M, inits: impl Initializers<S, E>) -> Result<Self, PackError<E>> {
        let contiguous = make_contiguous_objects::<S, E>(&source, inits)?;
        Ok(Self {
            contiguous,
            source,
            _owns: PhantomData,
        })
    }

    /// Shared slices over every sequence.
    pub fn as_slices(&self) -> S::Slices<'_> {
        // SAFETY: every element is constructed and `&self` prevents mutation.
        unsafe { S::slices(self.contiguous.views()) }
    }

    /// Mutable slices over every sequence.
    pub fn as_mut_slices(&mut self) -> S::SlicesMut<'_> {
        // SAFETY: every element is constructed and `&mut self` is exclusive.
        unsafe { S::slices_mut(self.contiguous.views()) }
    }

    /// The raw views.
    pub fn views(&self) -> &S::Views {
        self.contiguous.views()
    }

    /// The allocation backing the sequences.
    pub fn region(&self) -> Region {
        self.contiguous.region()
    }

    /// The memory source the region came from.
    pub fn source(&self) -> &M {
        &self.source
    }
}

impl<S: Sequences, M: MemorySource> Drop for Packed<S, M> {
    fn drop(&mut self) {
        // SAFETY: built by `make_contiguous_objects` from `self.source`.
        unsafe { destroy_in_place(&self.source, &self.contiguous) };
    }
}

// SAFETY: `Packed` owns its elements exactly like a tuple of boxed slices would.
unsafe impl<S: Sequences + Send, M: MemorySource + Send> Send for Packed<S, M> {}
// SAFETY: shared access only hands out shared slices.
unsafe impl<S: Sequences + Sync, M: MemorySource + Sync> Sync for Packed<S, M> {}

impl<S: Sequences, M: MemorySource + fmt::Debug> fmt::Debug for Packed<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packed")
            .field("region", &self.contiguous.region())
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
