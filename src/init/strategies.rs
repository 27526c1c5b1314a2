use core::fmt;
use core::marker::PhantomData;

use zerocopy::FromZeroes;

use super::{Command, Construct, Initializer};

/// Default-constructs every element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultCtor {
    pub(crate) count: usize,
}

impl<T: Default, E> Initializer<T, E> for DefaultCtor {
    fn command(&self) -> Command {
        Command::Default
    }

    fn count(&self) -> usize {
        self.count
    }

    fn next_element(&mut self) -> Option<Result<T, E>> {
        Some(Ok(T::default()))
    }
}

/// Forwards one argument tuple to every element's constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctor<A> {
    pub(crate) count: usize,
    pub(crate) args: A,
}

impl<A> Ctor<A> {
    /// The forwarded arguments.
    pub fn args(&self) -> &A {
        &self.args
    }
}

impl<T: Construct<A, E>, A, E> Initializer<T, E> for Ctor<A> {
    fn command(&self) -> Command {
        Command::Ctor
    }

    fn count(&self) -> usize {
        self.count
    }

    fn next_element(&mut self) -> Option<Result<T, E>> {
        Some(T::construct(&self.args))
    }
}

/// Zero-value construction.
///
/// Nested arrays such as `[[f32; 4]; 4]` are zeroed element by element, so
/// multi-dimensional element types need no special casing.
pub struct ValueCtor<T> {
    count: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ValueCtor<T> {
    pub(crate) const fn new(count: usize) -> Self {
        Self {
            count,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for ValueCtor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ValueCtor<T> {}

impl<T> fmt::Debug for ValueCtor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCtor")
            .field("count", &self.count)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}

impl<T: FromZeroes, E> Initializer<T, E> for ValueCtor<T> {
    fn command(&self) -> Command {
        Command::ValueCtor
    }

    fn count(&self) -> usize {
        self.count
    }

    fn next_element(&mut self) -> Option<Result<T, E>> {
        Some(Ok(T::new_zeroed()))
    }
}

/// Clones one value into every element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillCtor<T> {
    pub(crate) count: usize,
    pub(crate) value: T,
}

impl<T: Clone, E> Initializer<T, E> for FillCtor<T> {
    fn command(&self) -> Command {
        Command::FillCtor
    }

    fn count(&self) -> usize {
        self.count
    }

    fn next_element(&mut self) -> Option<Result<T, E>> {
        Some(Ok(self.value.clone()))
    }
}

/// Takes one item of an input sequence per element.
#[derive(Debug, Clone)]
pub struct FromIter<I> {
    pub(crate) count: usize,
    pub(crate) iter: I,
}

impl<I: Iterator, E> Initializer<I::Item, E> for FromIter<I> {
    fn command(&self) -> Command {
        Command::FromIterator
    }

    fn count(&self) -> usize {
        self.count
    }

    fn next_element(&mut self) -> Option<Result<I::Item, E>> {
        self.iter.next().map(Ok)
    }
}

/// Calls a generator once per element.
#[derive(Clone)]
pub struct FromFn<F> {
    pub(crate) count: usize,
    pub(crate) f: F,
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").field("count", &self.count).finish_non_exhaustive()
    }
}

impl<T, E, F: FnMut() -> T> Initializer<T, E> for FromFn<F> {
    fn command(&self) -> Command {
        Command::FromFunctor
    }

    fn count(&self) -> usize {
        self.count
    }

    fn next_element(&mut self) -> Option<Result<T, E>> {
        Some(Ok((self.f)()))
    }
}

/// Calls a fallible generator once per element.
#[derive(Clone)]
pub struct TryFromFn<F> {
    pub(crate) count: usize,
    pub(crate) f: F,
}

impl<F> fmt::Debug for TryFromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryFromFn").field("count", &self.count).finish_non_exhaustive()
    }
}

impl<T, E, F: FnMut() -> Result<T, E>> Initializer<T, E> for TryFromFn<F> {
    fn command(&self) -> Command {
        Command::FromFunctor
    }

    fn count(&self) -> usize {
        self.count
    }

    fn next_element(&mut self) -> Option<Result<T, E>> {
        Some((self.f)())
    }
}
