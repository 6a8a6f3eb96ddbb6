//! Vectors: owning handles, views, and the traits they share.
//!
//! [`VectorRef`] is implemented by [`Vector`], by `View<RawVector<T>>` and
//! by `ViewMut<RawVector<T>>`; [`VectorMut`] by the first and last. Code
//! written against the traits works on all of them:
//!
//! ```rust
//! use numhandle::prelude::*;
//!
//! fn total<V: VectorRef<f64>>(v: &V) -> f64 {
//!     v.iter().sum()
//! }
//!
//! let v = VectorF64::from_slice(&[1.0, 2.0, 3.0, 4.0])?;
//! assert_eq!(total(&v), 10.0);
//! assert_eq!(total(&v.subvector_with_stride(1, 2, 2)), 6.0);
//! # Ok::<(), numhandle::Error>(())
//! ```
//!
//! Elements are read and written by value through the foreign pointers;
//! no Rust slice into foreign memory is ever handed out, since shared
//! handles and views may alias it.

use std::marker::PhantomData;

use numhandle_foreign::vector::{
    vector_alloc_from_vector, vector_ptr, vector_set_all, vector_set_zero, vector_swap_elements,
};
use numhandle_foreign::{Element, RawVector};

use crate::handle::Handle;
use crate::iter::{Cursor, Iter, Projection, ReadOnlyProjection};
use crate::view::{View, ViewMut};
use crate::{check_status, report, Error, ErrorCode, Result, CHECKS_ENABLED};

/// An owning, reference-counted vector.
pub type Vector<T> = Handle<RawVector<T>>;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Header of a possibly null vector pointer.
///
/// # Safety
///
/// `v` must be null or live for `'a`.
#[inline]
unsafe fn header<'a, T>(v: *const RawVector<T>) -> Option<&'a RawVector<T>> {
    // SAFETY: forwarded contract.
    unsafe { v.as_ref() }
}

/// Read access shared by vectors and vector views.
pub trait VectorRef<T: Element>: sealed::Sealed {
    /// The foreign vector; null for an empty handle or view.
    fn as_raw(&self) -> *mut RawVector<T>;

    /// Number of elements.
    #[inline]
    fn len(&self) -> usize {
        // SAFETY: implementors return null or a live vector.
        unsafe { header(self.as_raw()) }.map_or(0, |v| v.size)
    }

    /// Whether there are no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance between elements in the underlying block.
    #[inline]
    fn stride(&self) -> usize {
        // SAFETY: implementors return null or a live vector.
        unsafe { header(self.as_raw()) }.map_or(1, |v| v.stride)
    }

    /// Element `i`, `None` when out of range.
    #[inline]
    fn try_get(&self, i: usize) -> Option<T> {
        // SAFETY: i is below len.
        (i < self.len()).then(|| unsafe { vector_ptr(self.as_raw(), i).read() })
    }

    /// Element `i`. Out of range reports and returns `T::default()`.
    fn get(&self, i: usize) -> T {
        self.try_get(i).unwrap_or_else(|| {
            report!(
                ErrorCode::InvalidArgument,
                "index {i} out of range for vector of length {}",
                self.len()
            );
            T::default()
        })
    }

    /// Copy the elements out.
    fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Iterate the elements by value.
    fn iter(&self) -> Iter<Elements<'_, T>> {
        Iter::new(Elements::new(self.as_raw()))
    }

    /// Cursor at the first element.
    fn cursor_begin(&self) -> Cursor<Elements<'_, T>, false> {
        Cursor::begin(Elements::new(self.as_raw()))
    }

    /// Cursor one past the last element.
    fn cursor_end(&self) -> Cursor<Elements<'_, T>, false> {
        Cursor::end(Elements::new(self.as_raw()))
    }

    /// Reverse cursor at the last element.
    fn cursor_rbegin(&self) -> Cursor<Elements<'_, T>, true> {
        Cursor::begin(Elements::new(self.as_raw()))
    }

    /// Reverse cursor one before the first element.
    fn cursor_rend(&self) -> Cursor<Elements<'_, T>, true> {
        Cursor::end(Elements::new(self.as_raw()))
    }

    /// View of `n` consecutive elements starting at `offset`.
    fn subvector(&self, offset: usize, n: usize) -> View<'_, RawVector<T>> {
        self.subvector_with_stride(offset, 1, n)
    }

    /// View of `n` elements starting at `offset`, taking every `stride`-th.
    ///
    /// A request that does not fit reports and gives an empty view.
    fn subvector_with_stride(&self, offset: usize, stride: usize, n: usize) -> View<'_, RawVector<T>> {
        // SAFETY: the view borrows self, which keeps the data alive.
        unsafe { View::from_raw(derive_subvector(self.as_raw(), offset, stride, n)) }
    }

    /// Copy into a new owning vector. Strides collapse.
    ///
    /// # Errors
    ///
    /// See [`Handle::deep_clone`].
    fn to_vector(&self) -> Result<Vector<T>> {
        let mut out = Vector::<T>::alloc(self.len())?;
        out.copy_from(self)?;
        Ok(out)
    }
}

/// Write access shared by vectors and mutable vector views.
pub trait VectorMut<T: Element>: VectorRef<T> {
    /// Set element `i`. Out of range reports and does nothing.
    fn set(&mut self, i: usize, x: T) {
        if i < self.len() {
            // SAFETY: i is below len.
            unsafe { vector_ptr(self.as_raw(), i).write(x) };
        } else {
            report!(
                ErrorCode::InvalidArgument,
                "index {i} out of range for vector of length {}",
                self.len()
            );
        }
    }

    /// Set every element to `x`. An empty handle reports a fault.
    fn fill(&mut self, x: T) {
        let v = self.as_raw();
        if v.is_null() {
            report!(ErrorCode::Fault, "fill on an empty vector");
            return;
        }
        // SAFETY: v is live.
        unsafe { vector_set_all(v, x) };
    }

    /// Set every element to zero.
    fn set_zero(&mut self) {
        let v = self.as_raw();
        if v.is_null() {
            report!(ErrorCode::Fault, "set_zero on an empty vector");
            return;
        }
        // SAFETY: v is live.
        unsafe { vector_set_zero(v) };
    }

    /// Exchange elements `i` and `j`.
    ///
    /// # Errors
    ///
    /// [`Error::Foreign`] when either index is out of range.
    fn swap_elements(&mut self, i: usize, j: usize) -> Result<()> {
        let v = self.as_raw();
        if v.is_null() {
            report!(ErrorCode::Fault, "swap on an empty vector");
            return Err(Error::Fault("vector"));
        }
        // SAFETY: v is live; the foreign call checks the indices.
        check_status(unsafe { vector_swap_elements(v, i, j) }, "swap elements")
    }

    /// Copy `src` element by element into this vector.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLength`] when the lengths differ, [`Error::Fault`]
    /// when either side is empty.
    fn copy_from<V: VectorRef<T> + ?Sized>(&mut self, src: &V) -> Result<()> {
        let (dst, src) = (self.as_raw(), src.as_raw());
        if dst.is_null() || src.is_null() {
            report!(ErrorCode::Fault, "copy involving an empty vector");
            return Err(Error::Fault("vector"));
        }
        // SAFETY: both live.
        let (expected, actual) = unsafe { ((*dst).size, (*src).size) };
        if CHECKS_ENABLED && expected != actual {
            report!(ErrorCode::BadLength, "copy of length {actual} into length {expected}");
            return Err(Error::InvalidLength { expected, actual });
        }
        // SAFETY: both live.
        check_status(
            unsafe { numhandle_foreign::vector::vector_memcpy(dst, src) },
            "vector copy",
        )
    }

    /// Mutable view of `n` consecutive elements starting at `offset`.
    fn subvector_mut(&mut self, offset: usize, n: usize) -> ViewMut<'_, RawVector<T>> {
        self.subvector_with_stride_mut(offset, 1, n)
    }

    /// Mutable view of `n` elements from `offset`, every `stride`-th.
    fn subvector_with_stride_mut(&mut self, offset: usize, stride: usize, n: usize) -> ViewMut<'_, RawVector<T>> {
        // SAFETY: the view borrows self mutably, which keeps the data alive.
        unsafe { ViewMut::from_raw(derive_subvector(self.as_raw(), offset, stride, n)) }
    }
}

/// Build a foreign subvector header, reporting on failure.
fn derive_subvector<T: Element>(v: *mut RawVector<T>, offset: usize, stride: usize, n: usize) -> *mut RawVector<T> {
    // SAFETY: callers pass null or a live vector.
    let Some(parent) = (unsafe { header(v) }) else {
        report!(ErrorCode::Fault, "subvector of an empty vector");
        return std::ptr::null_mut();
    };
    if CHECKS_ENABLED {
        let last = n
            .checked_sub(1)
            .and_then(|k| k.checked_mul(stride))
            .and_then(|d| d.checked_add(offset));
        if stride == 0 || !last.is_some_and(|last| last < parent.size) {
            report!(
                ErrorCode::InvalidArgument,
                "subvector of {n} elements from {offset} with stride {stride} does not fit length {}",
                parent.size
            );
            return std::ptr::null_mut();
        }
    }
    // SAFETY: v is live.
    let raw = unsafe { vector_alloc_from_vector(v, offset, n, stride) };
    if raw.is_null() {
        let code = numhandle_foreign::take_last_status();
        report!(
            ErrorCode::from_status(code),
            "subvector ({offset}, {stride}, {n}) rejected: {}",
            numhandle_foreign::status::name(code)
        );
    }
    raw
}

// ============================================================================
// Owning vectors
// ============================================================================

impl<T: Element> Vector<T> {
    /// Allocate a vector of `n` elements. `n == 0` gives a sentinel.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] when the foreign allocator fails.
    pub fn alloc(n: usize) -> Result<Self> {
        Self::allocate(n)
    }

    /// Allocate a vector of `n` zeros.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] when the foreign allocator fails.
    pub fn zeros(n: usize) -> Result<Self> {
        let mut v = Self::allocate(n)?;
        v.set_zero();
        Ok(v)
    }

    /// Allocate a vector holding a copy of `data`.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] when the foreign allocator fails.
    pub fn from_slice(data: &[T]) -> Result<Self> {
        let mut v = Self::allocate(data.len())?;
        for (i, &x) in data.iter().enumerate() {
            v.set(i, x);
        }
        Ok(v)
    }
}

impl<T: Element> sealed::Sealed for Vector<T> {}
impl<T: Element> sealed::Sealed for View<'_, RawVector<T>> {}
impl<T: Element> sealed::Sealed for ViewMut<'_, RawVector<T>> {}

impl<T: Element> VectorRef<T> for Vector<T> {
    #[inline]
    fn as_raw(&self) -> *mut RawVector<T> {
        self.as_ptr()
    }
}

impl<T: Element> VectorMut<T> for Vector<T> {}

impl<T: Element> VectorRef<T> for View<'_, RawVector<T>> {
    #[inline]
    fn as_raw(&self) -> *mut RawVector<T> {
        self.as_ptr()
    }
}

impl<T: Element> VectorRef<T> for ViewMut<'_, RawVector<T>> {
    #[inline]
    fn as_raw(&self) -> *mut RawVector<T> {
        self.as_ptr()
    }
}

impl<T: Element> VectorMut<T> for ViewMut<'_, RawVector<T>> {}

impl<'a, T: Element> IntoIterator for &'a Vector<T> {
    type Item = T;
    type IntoIter = Iter<Elements<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Element projection
// ============================================================================

/// Projects a vector position onto its element, by value.
pub struct Elements<'a, T: Element> {
    v: *mut RawVector<T>,
    _owner: PhantomData<&'a RawVector<T>>,
}

impl<T: Element> Elements<'_, T> {
    fn new(v: *mut RawVector<T>) -> Self {
        Self { v, _owner: PhantomData }
    }
}

impl<T: Element> Clone for Elements<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Element> Copy for Elements<'_, T> {}

impl<T: Element> ReadOnlyProjection for Elements<'_, T> {}

impl<T: Element> Projection for Elements<'_, T> {
    type Item = T;

    fn owner(&self) -> *const () {
        self.v.cast_const().cast()
    }

    fn len(&self) -> usize {
        // SAFETY: null or live for the projection's borrow.
        unsafe { header(self.v) }.map_or(0, |v| v.size)
    }

    unsafe fn project(&self, index: usize) -> T {
        // SAFETY: index below len, owner alive.
        unsafe { vector_ptr(self.v, index).read() }
    }

    fn fallback(&self) -> T {
        T::default()
    }
}
