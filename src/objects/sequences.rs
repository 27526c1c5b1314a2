//! Tuple plumbing: a type list `(A, B, ..)` and its matching initializers.

use core::ptr::NonNull;

use super::guard::SequenceGuard;
use super::view::View;
use crate::error::{LayoutError, PackError};
use crate::init::{Command, Initializer};
use crate::layout::{LayoutPlan, SequenceDescriptor};
use crate::trace::trace_event;

mod private {
    pub trait SealedSequences {}
    pub trait SealedInitializers {}
}

/// A list of element types packed into one region, written as a tuple.
///
/// Implemented for tuples of one to eight types.
pub trait Sequences: private::SealedSequences + Sized {
    /// One [`View`] per element type.
    type Views: Copy;
    /// One shared slice per element type.
    type Slices<'a>
    where
        Self: 'a;
    /// One mutable slice per element type.
    type SlicesMut<'a>
    where
        Self: 'a;

    /// Number of element types.
    const LEN: usize;

    /// Describes the sequences for the given per-type counts.
    ///
    /// # Errors
    /// Returns `LayoutError::ArityMismatch` unless `counts.len() == LEN`.
    fn descriptors(counts: &[usize]) -> Result<Vec<SequenceDescriptor>, LayoutError>;

    /// Places the views at the planned offsets from `base`.
    ///
    /// # Safety
    /// `base` must start a region of at least `plan.total_bytes()` bytes aligned
    /// to `plan.unit()`, and `plan` must come from `Self::descriptors`.
    unsafe fn views(base: NonNull<u8>, plan: &LayoutPlan) -> Self::Views;

    /// Start of the first view and end of the last view.
    fn bounds(views: &Self::Views) -> (NonNull<u8>, NonNull<u8>);

    /// Drops every element: views in declared order, each view last to first.
    ///
    /// # Safety
    /// Every element must be constructed and unused afterwards.
    unsafe fn destroy(views: &Self::Views);

    /// Borrows every view as a slice.
    ///
    /// # Safety
    /// Every element must be constructed and not mutably aliased for `'a`.
    unsafe fn slices<'a>(views: &Self::Views) -> Self::Slices<'a>
    where
        Self: 'a;

    /// Borrows every view as a mutable slice.
    ///
    /// # Safety
    /// Every element must be constructed and not otherwise aliased for `'a`.
    unsafe fn slices_mut<'a>(views: &Self::Views) -> Self::SlicesMut<'a>
    where
        Self: 'a;
}

/// A tuple of [`Initializer`]s, one per element type of `S`.
pub trait Initializers<S: Sequences, E>: private::SealedInitializers {
    /// Element count of every sequence, in declared order.
    fn counts(&self) -> Vec<usize>;

    /// Strategy of every sequence, in declared order.
    fn commands(&self) -> Vec<Command>;

    /// Constructs every sequence in declared order, all or nothing.
    ///
    /// On failure every element constructed so far has been dropped, the
    /// failing sequence's prefix first and then earlier sequences last to
    /// first.
    ///
    /// # Errors
    /// Returns the first construction failure or input exhaustion.
    ///
    /// # Safety
    /// `views` must be uninitialized, non-overlapping, and sized by `counts`.
    unsafe fn construct(self, views: &S::Views) -> Result<(), PackError<E>>;
}

/// Fills one view, returning a guard that still owns the elements.
///
/// # Safety
/// `view` must be uninitialized and writable.
unsafe fn construct_sequence<T, E, I>(
    sequence: usize,
    view: View<T>,
    mut init: I,
) -> Result<SequenceGuard<T>, PackError<E>>
where
    I: Initializer<T, E>,
{
    debug_assert_eq!(init.count(), view.len());
    let mut guard = SequenceGuard::new(view, sequence);
    while guard.constructed() < view.len() {
        match init.next_element() {
            Some(Ok(value)) => guard.push(value),
            Some(Err(source)) => {
                return Err(PackError::Construction {
                    sequence,
                    element: guard.constructed(),
                    source,
                })
            }
            None => {
                return Err(PackError::InputExhausted {
                    sequence,
                    expected: view.len(),
                    produced: guard.constructed(),
                })
            }
        }
    }
    trace_event!(
        sequence,
        command = ?init.command(),
        len = view.len(),
        "sequence constructed"
    );
    Ok(guard)
}

macro_rules! impl_sequences {
    ($len:literal, $last:tt; $($T:ident $I:ident $idx:tt $guard:ident),+) => {
        impl<$($T),+> private::SealedSequences for ($($T,)+) {}

        impl<$($T),+> Sequences for ($($T,)+) {
            type Views = ($(View<$T>,)+);
            type Slices<'a> = ($(&'a [$T],)+) where Self: 'a;
            type SlicesMut<'a> = ($(&'a mut [$T],)+) where Self: 'a;

            const LEN: usize = $len;

            fn descriptors(counts: &[usize]) -> Result<Vec<SequenceDescriptor>, LayoutError> {
                if counts.len() != $len {
                    return Err(LayoutError::ArityMismatch {
                        expected: $len,
                        found: counts.len(),
                    });
                }
                Ok(vec![$(SequenceDescriptor::of::<$T>(counts[$idx])),+])
            }

            unsafe fn views(base: NonNull<u8>, plan: &LayoutPlan) -> Self::Views {
                let ranges = plan.ranges();
                ($(
                    View::from_raw_parts(
                        NonNull::new_unchecked(base.as_ptr().add(ranges[$idx].start).cast::<$T>()),
                        ranges[$idx].count,
                    ),
                )+)
            }

            fn bounds(views: &Self::Views) -> (NonNull<u8>, NonNull<u8>) {
                (views.0.begin().cast::<u8>(), views.$last.end().cast::<u8>())
            }

            unsafe fn destroy(views: &Self::Views) {
                $( views.$idx.destroy(); )+
            }

            unsafe fn slices<'a>(views: &Self::Views) -> Self::Slices<'a>
            where
                Self: 'a,
            {
                ($( views.$idx.as_slice(), )+)
            }

            unsafe fn slices_mut<'a>(views: &Self::Views) -> Self::SlicesMut<'a>
            where
                Self: 'a,
            {
                ($( views.$idx.as_mut_slice(), )+)
            }
        }

        impl<$($I),+> private::SealedInitializers for ($($I,)+) {}

        impl<$($T,)+ $($I,)+ E> Initializers<($($T,)+), E> for ($($I,)+)
        where
            $($I: Initializer<$T, E>,)+
        {
            fn counts(&self) -> Vec<usize> {
                vec![$(<$I as Initializer<$T, E>>::count(&self.$idx)),+]
            }

            fn commands(&self) -> Vec<Command> {
                vec![$(<$I as Initializer<$T, E>>::command(&self.$idx)),+]
            }

            unsafe fn construct(self, views: &<($($T,)+) as Sequences>::Views) -> Result<(), PackError<E>> {
                // Guards drop in reverse on early return, unwinding the
                // sequences built so far from last to first.
                $( let $guard = construct_sequence($idx, views.$idx, self.$idx)?; )+
                $( $guard.complete(); )+
                Ok(())
            }
        }
    };
}

impl_sequences!(1, 0; A IA 0 ga);
impl_sequences!(2, 1; A IA 0 ga, B IB 1 gb);
impl_sequences!(3, 2; A IA 0 ga, B IB 1 gb, C IC 2 gc);
impl_sequences!(4, 3; A IA 0 ga, B IB 1 gb, C IC 2 gc, D ID 3 gd);
impl_sequences!(5, 4; A IA 0 ga, B IB 1 gb, C IC 2 gc, D ID 3 gd, F IF 4 gf);
impl_sequences!(6, 5; A IA 0 ga, B IB 1 gb, C IC 2 gc, D ID 3 gd, F IF 4 gf, G IG 5 gg);
impl_sequences!(7, 6; A IA 0 ga, B IB 1 gb, C IC 2 gc, D ID 3 gd, F IF 4 gf, G IG 5 gg, H IH 6 gh);
impl_sequences!(8, 7; A IA 0 ga, B IB 1 gb, C IC 2 gc, D ID 3 gd, F IF 4 gf, G IG 5 gg, H IH 6 gh, J IJ 7 gj);
