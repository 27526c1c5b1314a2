//! # `contiguous` - Packed Multi-Sequence Allocation
//!
//! Builds several typed sequences inside one memory region obtained with a
//! single request to a pluggable memory source, and tears them down again.
//!
//! ## Guarantees
//!
//! ### Layout
//! - **Minimal padding**: sequences are placed in declared order; each starts
//!   at the first offset aligned for its element type, never later.
//! - **One request**: the region is asked for as a whole number of storage
//!   units whose size and alignment equal the largest element alignment.
//! - **Deterministic**: the layout is a pure function of the type list and
//!   the counts.
//!
//! ### Construction
//! - **All or nothing**: if any element constructor fails, by returning an
//!   error or by panicking, every element built so far is dropped in exact
//!   reverse construction order and the region is returned to its source
//!   before the failure reaches the caller.
//! - **Unchanged errors**: the constructor's error value is handed back as is.
//! - **No double drops**: an element is dropped at most once on every path.
//!
//! ## Architecture
//!
//! 1. **Layout planning** ([`layout`]): descriptors → byte ranges + [`StorageUnit`].
//! 2. **Memory sources** ([`alloc`]): the [`MemorySource`] trait with
//!    [`SystemSource`], [`PageSource`] and the recording [`TrackingSource`].
//! 3. **Initializers** ([`init`]): default, ctor, value, fill, from-iterator
//!    and from-functor strategies.
//! 4. **Construction** ([`objects`]): scope guards nested in construction
//!    order drive cascading rollback; [`Packed`] is the owning handle.
//!
//! ## Example
//!
//! ```rust
//! use contiguous::{init, Packed, SystemSource};
//! use core::convert::Infallible;
//!
//! let packed = Packed::<(u32, [u8; 4], f64), _>::new::<Infallible>(
//!     SystemSource,
//!     (
//!         init::from_iter(3, 10..),
//!         init::value(2),
//!         init::fill(1, 2.5),
//!     ),
//! )
//! .unwrap();
//!
//! let (ids, bytes, scale) = packed.as_slices();
//! assert_eq!(ids, &[10, 11, 12]);
//! assert_eq!(bytes, &[[0; 4]; 2]);
//! assert_eq!(scale, &[2.5]);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod alloc;
pub mod error;
pub mod init;
pub mod layout;
pub mod objects;
mod trace;

pub use alloc::{AllocError, MemorySource, PageSource, SystemSource, TrackingSource};
pub use objects::{
    destroy_contiguous_objects,
    make_contiguous_layout,
    make_contiguous_objects,
    release_contiguous_layout,
    Contiguous,
    Initializers,
    Packed,
    Region,
    Sequences,
    View,
};
pub use error::{LayoutError, PackError};
pub use init::{Command, Construct, Initializer};
pub use layout::{plan_layout, LayoutPlan, SequenceDescriptor, SequenceRange, StorageUnit};

// Compile-time assertions for layout claims.
const _: () = {
    use core::mem;

    // Views are a pointer and a length.
    assert!(mem::size_of::<View<u64>>() == 2 * mem::size_of::<usize>());

    // The placement rule the planner relies on.
    assert!(layout::distance_to_next_aligned(0, 64) == 0);
    assert!(layout::distance_to_next_aligned(12, 8) == 4);
    assert!(layout::distance_to_next_aligned(16, 8) == 0);
};
