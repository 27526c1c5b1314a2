use core::fmt;
use core::ptr::NonNull;

/// A typed, non-owning window onto one sequence of a packed region.
///
/// The view stores its start and element count; `end()` is derived. It is
/// valid from successful construction until the region is destroyed, and it
/// never frees anything itself.
pub struct View<T> {
    begin: NonNull<T>,
    len: usize,
}

impl<T> View<T> {
    /// Creates a view over `len` elements starting at `begin`.
    ///
    /// # Safety
    /// `begin` must be aligned for `T` and valid for `len` elements for as
    /// long as the view is used.
    pub const unsafe fn from_raw_parts(begin: NonNull<T>, len: usize) -> Self {
        Self { begin, len }
    }

    /// Pointer to the first element.
    #[inline]
    pub const fn begin(&self) -> NonNull<T> {
        self.begin
    }

    /// Pointer one past the last element.
    #[inline]
    pub fn end(&self) -> NonNull<T> {
        // SAFETY: stays within (or one past) the sequence's own range.
        unsafe { NonNull::new_unchecked(self.begin.as_ptr().add(self.len)) }
    }

    /// Number of elements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence holds no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw pointer to the first element.
    #[inline]
    pub const fn as_ptr(&self) -> *mut T {
        self.begin.as_ptr()
    }

    /// Borrows the elements as a slice.
    ///
    /// # Safety
    /// Every element must be constructed and not mutably aliased for `'a`.
    #[inline]
    pub unsafe fn as_slice<'a>(&self) -> &'a [T] {
        core::slice::from_raw_parts(self.begin.as_ptr(), self.len)
    }

    /// Borrows the elements as a mutable slice.
    ///
    /// # Safety
    /// Every element must be constructed and not otherwise aliased for `'a`.
    #[inline]
    pub unsafe fn as_mut_slice<'a>(&self) -> &'a mut [T] {
        core::slice::from_raw_parts_mut(self.begin.as_ptr(), self.len)
    }

    /// Drops every element, last to first.
    ///
    /// # Safety
    /// Every element must be constructed, and none may be used afterwards.
    pub(crate) unsafe fn destroy(&self) {
        destroy_prefix(self.begin.as_ptr(), self.len);
    }
}

/// Drops `ptr[..len]` in reverse order.
///
/// # Safety
/// The first `len` elements at `ptr` must be initialized and unused afterwards.
pub(crate) unsafe fn destroy_prefix<T>(ptr: *mut T, len: usize) {
    if !core::mem::needs_drop::<T>() {
        return;
    }
    for i in (0..len).rev() {
        core::ptr::drop_in_place(ptr.add(i));
    }
}

impl<T> Clone for View<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for View<T> {}

impl<T> PartialEq for View<T> {
    fn eq(&self, other: &Self) -> bool {
        self.begin == other.begin && self.len == other.len
    }
}

impl<T> Eq for View<T> {}

impl<T> fmt::Debug for View<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("begin", &self.begin)
            .field("len", &self.len)
            .finish()
    }
}
