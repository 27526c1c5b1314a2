//! Initialization strategies for one packed sequence.
//!
//! Each strategy knows its element count and hands out elements one at a
//! time; the construction executor writes them into place and owns rollback.
//! A bare `usize` is the implicit strategy: `count` default-constructed
//! elements through the [`Command::Ctor`] path with no arguments.
//!
//! ```rust
//! use contiguous::init;
//!
//! let ids = init::from_iter(3, [7u32, 8, 9]);
//! let weights = init::fill(3, 0.5f32);
//! let scratch = init::value::<[[u8; 4]; 4]>(2);
//! # let _ = (ids, weights, scratch);
//! ```

use core::convert::Infallible;

use serde::{Deserialize, Serialize};

mod strategies;

pub use strategies::{Ctor, DefaultCtor, FillCtor, FromFn, FromIter, TryFromFn, ValueCtor};

/// Tag identifying how a sequence is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// `T::default()` for every element.
    Default,
    /// The same argument tuple forwarded to every element.
    Ctor,
    /// Zero-valued construction, element-wise through nested arrays.
    ValueCtor,
    /// A clone of one value for every element.
    FillCtor,
    /// One item of an input sequence per element.
    FromIterator,
    /// One call of a generator per element.
    FromFunctor,
}

/// Produces the elements of one sequence.
///
/// `E` is the error type shared by every initializer in one allocation
/// request. Infallible strategies are generic over it.
pub trait Initializer<T, E> {
    /// Which strategy this is.
    fn command(&self) -> Command;

    /// Number of elements the sequence will hold.
    fn count(&self) -> usize;

    /// Produces the next element.
    ///
    /// Returns `None` when an input sequence is exhausted early.
    fn next_element(&mut self) -> Option<Result<T, E>>;
}

/// Construction of `Self` from a borrowed argument tuple.
///
/// Implement this generically over `E` for constructors that cannot fail:
///
/// ```rust
/// use contiguous::init::Construct;
///
/// struct Particle { mass: f32, charge: i8 }
///
/// impl<E> Construct<(f32, i8), E> for Particle {
///     fn construct(&(mass, charge): &(f32, i8)) -> Result<Self, E> {
///         Ok(Particle { mass, charge })
///     }
/// }
/// ```
pub trait Construct<Args, E = Infallible>: Sized {
    /// Builds one value from `args`.
    ///
    /// # Errors
    /// Returns the constructor's own failure.
    fn construct(args: &Args) -> Result<Self, E>;
}

impl<T: Default, E> Initializer<T, E> for usize {
    fn command(&self) -> Command {
        Command::Ctor
    }

    fn count(&self) -> usize {
        *self
    }

    fn next_element(&mut self) -> Option<Result<T, E>> {
        Some(Ok(T::default()))
    }
}

/// `count` elements built with `T::default()`.
pub const fn default(count: usize) -> DefaultCtor {
    DefaultCtor { count }
}

/// `count` elements built with `T::construct(&args)`.
pub const fn ctor<A>(count: usize, args: A) -> Ctor<A> {
    Ctor { count, args }
}

/// `count` zero-valued elements.
pub const fn value<T>(count: usize) -> ValueCtor<T> {
    ValueCtor::new(count)
}

/// `count` clones of `value`.
pub const fn fill<T>(count: usize, value: T) -> FillCtor<T> {
    FillCtor { count, value }
}

/// The first `count` items of `iter`, in order.
pub fn from_iter<I: IntoIterator>(count: usize, iter: I) -> FromIter<I::IntoIter> {
    FromIter {
        count,
        iter: iter.into_iter(),
    }
}

/// `count` results of calling `f`.
pub const fn from_fn<F>(count: usize, f: F) -> FromFn<F> {
    FromFn { count, f }
}

/// `count` results of calling the fallible generator `f`.
pub const fn try_from_fn<F>(count: usize, f: F) -> TryFromFn<F> {
    TryFromFn { count, f }
}
