//! Matrices: owning handles, views, and row iteration.
//!
//! Rows, columns, the diagonal and submatrices are views into the
//! matrix's block. Iterating a matrix yields one fresh row view per row,
//! in index order:
//!
//! ```rust
//! use numhandle::prelude::*;
//!
//! let mut m = MatrixF64::zeros(3, 4)?;
//! for (i, mut row) in m.rows_mut().enumerate() {
//!     row.fill(i as f64);
//! }
//! assert_eq!(m.get(2, 3), 2.0);
//! assert_eq!(m.column(0).to_vec(), vec![0.0, 1.0, 2.0]);
//! # Ok::<(), numhandle::Error>(())
//! ```

use std::marker::PhantomData;

use numhandle_foreign::matrix::{
    matrix_alloc_from_matrix, matrix_memcpy, matrix_ptr, matrix_set_all, matrix_set_identity, matrix_set_zero,
    matrix_swap_rows,
};
use numhandle_foreign::vector::{
    vector_alloc_col_from_matrix, vector_alloc_diag_from_matrix, vector_alloc_row_from_matrix,
};
use numhandle_foreign::{status, take_last_status, Element, RawMatrix, RawVector};

use crate::handle::Handle;
use crate::iter::{Cursor, Iter, Projection, ReadOnlyProjection};
use crate::vector::sealed::Sealed;
use crate::view::{View, ViewMut};
use crate::{check_status, report, Error, ErrorCode, Result, CHECKS_ENABLED};

/// An owning, reference-counted row-major matrix.
pub type Matrix<T> = Handle<RawMatrix<T>>;

/// Header of a possibly null matrix pointer.
///
/// # Safety
///
/// `m` must be null or live for `'a`.
#[inline]
unsafe fn header<'a, T>(m: *const RawMatrix<T>) -> Option<&'a RawMatrix<T>> {
    // SAFETY: forwarded contract.
    unsafe { m.as_ref() }
}

/// Report a null result from a foreign view constructor.
fn rejected<P>(raw: *mut P, what: std::fmt::Arguments<'_>) -> *mut P {
    if raw.is_null() {
        let code = take_last_status();
        report!(ErrorCode::from_status(code), "{what} rejected: {}", status::name(code));
    }
    raw
}

/// Read access shared by matrices and matrix views.
pub trait MatrixRef<T: Element>: Sealed {
    /// The foreign matrix; null for an empty handle or view.
    fn as_raw(&self) -> *mut RawMatrix<T>;

    /// Number of rows.
    #[inline]
    fn nrows(&self) -> usize {
        // SAFETY: implementors return null or a live matrix.
        unsafe { header(self.as_raw()) }.map_or(0, |m| m.size1)
    }

    /// Number of columns.
    #[inline]
    fn ncols(&self) -> usize {
        // SAFETY: implementors return null or a live matrix.
        unsafe { header(self.as_raw()) }.map_or(0, |m| m.size2)
    }

    /// Number of elements.
    #[inline]
    fn len(&self) -> usize {
        self.nrows() * self.ncols()
    }

    /// Whether there are no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Trailing dimension of the underlying block.
    #[inline]
    fn tda(&self) -> usize {
        // SAFETY: implementors return null or a live matrix.
        unsafe { header(self.as_raw()) }.map_or(0, |m| m.tda)
    }

    /// Element `(i, j)`, `None` when out of range.
    #[inline]
    fn try_get(&self, i: usize, j: usize) -> Option<T> {
        // SAFETY: (i, j) inside the shape.
        (i < self.nrows() && j < self.ncols()).then(|| unsafe { matrix_ptr(self.as_raw(), i, j).read() })
    }

    /// Element `(i, j)`. Out of range reports and returns `T::default()`.
    fn get(&self, i: usize, j: usize) -> T {
        self.try_get(i, j).unwrap_or_else(|| {
            report!(
                ErrorCode::InvalidArgument,
                "index ({i}, {j}) out of range for {}x{} matrix",
                self.nrows(),
                self.ncols()
            );
            T::default()
        })
    }

    /// Copy out as nested rows.
    fn to_rows(&self) -> Vec<Vec<T>> {
        self.rows().map(|row| crate::VectorRef::to_vec(&row)).collect()
    }

    /// View of row `i`. Out of range reports and gives an empty view.
    fn row(&self, i: usize) -> View<'_, RawVector<T>> {
        // SAFETY: the view borrows self.
        unsafe { View::from_raw(derive_row(self.as_raw(), i)) }
    }

    /// View of column `j`. Out of range reports and gives an empty view.
    fn column(&self, j: usize) -> View<'_, RawVector<T>> {
        // SAFETY: the view borrows self.
        unsafe { View::from_raw(derive_column(self.as_raw(), j)) }
    }

    /// View of the leading diagonal.
    fn diagonal(&self) -> View<'_, RawVector<T>> {
        // SAFETY: the view borrows self.
        unsafe { View::from_raw(derive_diagonal(self.as_raw())) }
    }

    /// View of the `n1 x n2` block whose top-left element is `(k1, k2)`.
    fn submatrix(&self, k1: usize, k2: usize, n1: usize, n2: usize) -> View<'_, RawMatrix<T>> {
        // SAFETY: the view borrows self.
        unsafe { View::from_raw(derive_submatrix(self.as_raw(), k1, k2, n1, n2)) }
    }

    /// Iterate the rows as views.
    fn rows(&self) -> Iter<Rows<'_, T>> {
        Iter::new(Rows::new(self.as_raw()))
    }

    /// Cursor at row 0.
    fn row_begin(&self) -> Cursor<Rows<'_, T>, false> {
        Cursor::begin(Rows::new(self.as_raw()))
    }

    /// Cursor one past the last row.
    fn row_end(&self) -> Cursor<Rows<'_, T>, false> {
        Cursor::end(Rows::new(self.as_raw()))
    }

    /// Reverse cursor at the last row.
    fn row_rbegin(&self) -> Cursor<Rows<'_, T>, true> {
        Cursor::begin(Rows::new(self.as_raw()))
    }

    /// Reverse cursor one before row 0.
    fn row_rend(&self) -> Cursor<Rows<'_, T>, true> {
        Cursor::end(Rows::new(self.as_raw()))
    }

    /// Copy into a new owning matrix.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] or [`Error::Foreign`].
    fn to_matrix(&self) -> Result<Matrix<T>> {
        let mut out = Matrix::<T>::alloc(self.nrows(), self.ncols())?;
        out.copy_from(self)?;
        Ok(out)
    }
}

/// Write access shared by matrices and mutable matrix views.
pub trait MatrixMut<T: Element>: MatrixRef<T> {
    /// Set element `(i, j)`. Out of range reports and does nothing.
    fn set(&mut self, i: usize, j: usize, x: T) {
        if i < self.nrows() && j < self.ncols() {
            // SAFETY: (i, j) inside the shape.
            unsafe { matrix_ptr(self.as_raw(), i, j).write(x) };
        } else {
            report!(
                ErrorCode::InvalidArgument,
                "index ({i}, {j}) out of range for {}x{} matrix",
                self.nrows(),
                self.ncols()
            );
        }
    }

    /// Set every element to `x`. An empty handle reports a fault.
    fn fill(&mut self, x: T) {
        let m = self.as_raw();
        if m.is_null() {
            report!(ErrorCode::Fault, "fill on an empty matrix");
            return;
        }
        // SAFETY: m is live.
        unsafe { matrix_set_all(m, x) };
    }

    /// Set every element to zero.
    fn set_zero(&mut self) {
        let m = self.as_raw();
        if m.is_null() {
            report!(ErrorCode::Fault, "set_zero on an empty matrix");
            return;
        }
        // SAFETY: m is live.
        unsafe { matrix_set_zero(m) };
    }

    /// Ones on the diagonal, zeros elsewhere.
    fn set_identity(&mut self) {
        let m = self.as_raw();
        if m.is_null() {
            report!(ErrorCode::Fault, "set_identity on an empty matrix");
            return;
        }
        // SAFETY: m is live.
        unsafe { matrix_set_identity(m) };
    }

    /// Exchange rows `i` and `j`.
    ///
    /// # Errors
    ///
    /// [`Error::Foreign`] when either row is out of range.
    fn swap_rows(&mut self, i: usize, j: usize) -> Result<()> {
        let m = self.as_raw();
        if m.is_null() {
            report!(ErrorCode::Fault, "swap on an empty matrix");
            return Err(Error::Fault("matrix"));
        }
        // SAFETY: m is live; the foreign call checks the indices.
        check_status(unsafe { matrix_swap_rows(m, i, j) }, "swap rows")
    }

    /// Copy `src` element by element into this matrix.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLength`] when the shapes differ, [`Error::Fault`]
    /// when either side is empty.
    fn copy_from<M: MatrixRef<T> + ?Sized>(&mut self, src: &M) -> Result<()> {
        let (dst, src) = (self.as_raw(), src.as_raw());
        if dst.is_null() || src.is_null() {
            report!(ErrorCode::Fault, "copy involving an empty matrix");
            return Err(Error::Fault("matrix"));
        }
        // SAFETY: both live.
        let (d, s) = unsafe { (&*dst, &*src) };
        if CHECKS_ENABLED && (d.size1, d.size2) != (s.size1, s.size2) {
            report!(
                ErrorCode::BadLength,
                "copy of {}x{} matrix into {}x{}",
                s.size1,
                s.size2,
                d.size1,
                d.size2
            );
            return Err(Error::InvalidLength {
                expected: d.size1 * d.size2,
                actual: s.size1 * s.size2,
            });
        }
        // SAFETY: both live.
        check_status(unsafe { matrix_memcpy(dst, src) }, "matrix copy")
    }

    /// Mutable view of row `i`.
    fn row_mut(&mut self, i: usize) -> ViewMut<'_, RawVector<T>> {
        // SAFETY: the view borrows self mutably.
        unsafe { ViewMut::from_raw(derive_row(self.as_raw(), i)) }
    }

    /// Mutable view of column `j`.
    fn column_mut(&mut self, j: usize) -> ViewMut<'_, RawVector<T>> {
        // SAFETY: the view borrows self mutably.
        unsafe { ViewMut::from_raw(derive_column(self.as_raw(), j)) }
    }

    /// Mutable view of the leading diagonal.
    fn diagonal_mut(&mut self) -> ViewMut<'_, RawVector<T>> {
        // SAFETY: the view borrows self mutably.
        unsafe { ViewMut::from_raw(derive_diagonal(self.as_raw())) }
    }

    /// Mutable view of an `n1 x n2` block at `(k1, k2)`.
    fn submatrix_mut(&mut self, k1: usize, k2: usize, n1: usize, n2: usize) -> ViewMut<'_, RawMatrix<T>> {
        // SAFETY: the view borrows self mutably.
        unsafe { ViewMut::from_raw(derive_submatrix(self.as_raw(), k1, k2, n1, n2)) }
    }

    /// Iterate the rows as mutable views.
    fn rows_mut(&mut self) -> Iter<RowsMut<'_, T>> {
        Iter::new(RowsMut {
            m: self.as_raw(),
            _owner: PhantomData,
        })
    }
}

// ============================================================================
// View derivation
// ============================================================================

fn non_null<'a, T>(m: *mut RawMatrix<T>, what: &str) -> Option<&'a RawMatrix<T>> {
    // SAFETY: callers pass null or a live matrix.
    let header = unsafe { header(m) };
    if header.is_none() {
        report!(ErrorCode::Fault, "{what} of an empty matrix");
    }
    header
}

/// A sentinel with one zero dimension has nothing to view: an in-range
/// row or column of it is an empty view, not an error.
fn is_zero_sized<T>(h: &RawMatrix<T>) -> bool {
    h.size1 == 0 || h.size2 == 0
}

fn derive_row<T: Element>(m: *mut RawMatrix<T>, i: usize) -> *mut RawVector<T> {
    let Some(h) = non_null(m, "row") else {
        return std::ptr::null_mut();
    };
    if CHECKS_ENABLED && i >= h.size1 {
        report!(ErrorCode::InvalidArgument, "row {i} out of range for {} rows", h.size1);
        return std::ptr::null_mut();
    }
    if is_zero_sized(h) {
        return std::ptr::null_mut();
    }
    // SAFETY: m is live.
    rejected(unsafe { vector_alloc_row_from_matrix(m, i) }, format_args!("row {i}"))
}

fn derive_column<T: Element>(m: *mut RawMatrix<T>, j: usize) -> *mut RawVector<T> {
    let Some(h) = non_null(m, "column") else {
        return std::ptr::null_mut();
    };
    if CHECKS_ENABLED && j >= h.size2 {
        report!(ErrorCode::InvalidArgument, "column {j} out of range for {} columns", h.size2);
        return std::ptr::null_mut();
    }
    if is_zero_sized(h) {
        return std::ptr::null_mut();
    }
    // SAFETY: m is live.
    rejected(unsafe { vector_alloc_col_from_matrix(m, j) }, format_args!("column {j}"))
}

fn derive_diagonal<T: Element>(m: *mut RawMatrix<T>) -> *mut RawVector<T> {
    if non_null(m, "diagonal").map_or(true, is_zero_sized) {
        return std::ptr::null_mut();
    }
    // SAFETY: m is live.
    rejected(unsafe { vector_alloc_diag_from_matrix(m) }, format_args!("diagonal"))
}

fn derive_submatrix<T: Element>(m: *mut RawMatrix<T>, k1: usize, k2: usize, n1: usize, n2: usize) -> *mut RawMatrix<T> {
    let Some(h) = non_null(m, "submatrix") else {
        return std::ptr::null_mut();
    };
    if CHECKS_ENABLED {
        let rows_fit = k1.checked_add(n1).is_some_and(|end| end <= h.size1);
        let cols_fit = k2.checked_add(n2).is_some_and(|end| end <= h.size2);
        if n1 == 0 || n2 == 0 || !rows_fit || !cols_fit {
            report!(
                ErrorCode::InvalidArgument,
                "submatrix {n1}x{n2} at ({k1}, {k2}) does not fit {}x{} matrix",
                h.size1,
                h.size2
            );
            return std::ptr::null_mut();
        }
    }
    // SAFETY: m is live.
    rejected(
        unsafe { matrix_alloc_from_matrix(m, k1, k2, n1, n2) },
        format_args!("submatrix ({k1}, {k2}, {n1}, {n2})"),
    )
}

// ============================================================================
// Owning matrices
// ============================================================================

impl<T: Element> Matrix<T> {
    /// Allocate an `n1 x n2` matrix. A zero dimension gives a sentinel.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] when the foreign allocator fails.
    pub fn alloc(n1: usize, n2: usize) -> Result<Self> {
        Self::allocate((n1, n2))
    }

    /// Allocate an `n1 x n2` matrix of zeros.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] when the foreign allocator fails.
    pub fn zeros(n1: usize, n2: usize) -> Result<Self> {
        let mut m = Self::allocate((n1, n2))?;
        m.set_zero();
        Ok(m)
    }

    /// Allocate the `n x n` identity.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] when the foreign allocator fails.
    pub fn identity(n: usize) -> Result<Self> {
        let mut m = Self::allocate((n, n))?;
        m.set_identity();
        Ok(m)
    }

    /// Allocate an `n1 x n2` matrix filled from row-major `data`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLength`] when `data.len() != n1 * n2`.
    pub fn from_row_major(n1: usize, n2: usize, data: &[T]) -> Result<Self> {
        let expected = n1.saturating_mul(n2);
        if data.len() != expected {
            report!(
                ErrorCode::BadLength,
                "{} values for a {n1}x{n2} matrix",
                data.len()
            );
            return Err(Error::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        let mut m = Self::allocate((n1, n2))?;
        for (k, &x) in data.iter().enumerate() {
            m.set(k / n2, k % n2, x);
        }
        Ok(m)
    }
}

impl<T: Element> Sealed for Matrix<T> {}
impl<T: Element> Sealed for View<'_, RawMatrix<T>> {}
impl<T: Element> Sealed for ViewMut<'_, RawMatrix<T>> {}

impl<T: Element> MatrixRef<T> for Matrix<T> {
    #[inline]
    fn as_raw(&self) -> *mut RawMatrix<T> {
        self.as_ptr()
    }
}

impl<T: Element> MatrixMut<T> for Matrix<T> {}

impl<T: Element> MatrixRef<T> for View<'_, RawMatrix<T>> {
    #[inline]
    fn as_raw(&self) -> *mut RawMatrix<T> {
        self.as_ptr()
    }
}

impl<T: Element> MatrixRef<T> for ViewMut<'_, RawMatrix<T>> {
    #[inline]
    fn as_raw(&self) -> *mut RawMatrix<T> {
        self.as_ptr()
    }
}

impl<T: Element> MatrixMut<T> for ViewMut<'_, RawMatrix<T>> {}

impl<'a, T: Element> IntoIterator for &'a Matrix<T> {
    type Item = View<'a, RawVector<T>>;
    type IntoIter = Iter<Rows<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

impl<'a, T: Element> IntoIterator for &'a mut Matrix<T> {
    type Item = ViewMut<'a, RawVector<T>>;
    type IntoIter = Iter<RowsMut<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows_mut()
    }
}

// ============================================================================
// Row projections
// ============================================================================

/// Projects a row index onto a fresh read-only row view.
pub struct Rows<'a, T: Element> {
    m: *mut RawMatrix<T>,
    _owner: PhantomData<&'a RawMatrix<T>>,
}

/// Projects a row index onto a fresh mutable row view.
pub struct RowsMut<'a, T: Element> {
    m: *mut RawMatrix<T>,
    _owner: PhantomData<&'a mut RawMatrix<T>>,
}

impl<T: Element> Rows<'_, T> {
    fn new(m: *mut RawMatrix<T>) -> Self {
        Self { m, _owner: PhantomData }
    }
}

macro_rules! row_projection {
    ($name:ident, $view:ident) => {
        impl<T: Element> Clone for $name<'_, T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T: Element> Copy for $name<'_, T> {}

        impl<'a, T: Element> Projection for $name<'a, T> {
            type Item = $view<'a, RawVector<T>>;

            fn owner(&self) -> *const () {
                self.m.cast_const().cast()
            }

            fn len(&self) -> usize {
                // SAFETY: null or live for the projection's borrow.
                unsafe { header(self.m) }.map_or(0, |m| if is_zero_sized(m) { 0 } else { m.size1 })
            }

            unsafe fn project(&self, index: usize) -> Self::Item {
                // SAFETY: row below size1; the view lives no longer than 'a.
                unsafe {
                    let raw = vector_alloc_row_from_matrix(self.m, index);
                    $view::from_raw(rejected(raw, format_args!("row {index}")))
                }
            }

            fn fallback(&self) -> Self::Item {
                $view::empty()
            }
        }
    };
}

row_projection!(Rows, View);
row_projection!(RowsMut, ViewMut);

impl<T: Element> ReadOnlyProjection for Rows<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::testing::capture;
    use crate::{MatrixF64, MatrixU32, VectorMut, VectorRef};

    fn counting(n1: usize, n2: usize) -> MatrixF64 {
        let data: Vec<f64> = (0..n1 * n2).map(|k| k as f64).collect();
        MatrixF64::from_row_major(n1, n2, &data).unwrap()
    }

    #[test]
    fn test_shape_and_get() {
        let m = counting(3, 4);
        assert_eq!((m.nrows(), m.ncols()), (3, 4));
        assert_eq!(m.len(), 12);
        assert_eq!(m.get(2, 1), 9.0);
        assert_eq!(m.try_get(3, 0), None);
    }

    #[test]
    fn test_get_out_of_range_reports() {
        let m = counting(2, 2);
        let (x, reports) = capture(|| m.get(0, 2));
        assert_eq!(x, 0.0);
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_row_column_diagonal() {
        let m = counting(3, 3);
        assert_eq!(m.row(1).to_vec(), vec![3.0, 4.0, 5.0]);
        assert_eq!(m.column(2).to_vec(), vec![2.0, 5.0, 8.0]);
        assert_eq!(m.diagonal().to_vec(), vec![0.0, 4.0, 8.0]);
    }

    #[test]
    fn test_submatrix_and_nested_views() {
        let m = counting(4, 5);
        let sub = m.submatrix(1, 2, 2, 3);
        assert_eq!(sub.to_rows(), vec![vec![7.0, 8.0, 9.0], vec![12.0, 13.0, 14.0]]);
        assert_eq!(sub.tda(), 5);
        assert_eq!(sub.column(0).to_vec(), vec![7.0, 12.0]);
        let (bad, reports) = capture(|| sub.submatrix(1, 1, 2, 2));
        assert!(bad.is_null());
        assert_eq!(reports[0].code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_row_out_of_range_is_empty_view() {
        let m = counting(2, 3);
        let (row, reports) = capture(|| m.row(2));
        assert!(row.is_null());
        assert_eq!(row.len(), 0);
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_zero_sized_matrix_views_are_empty_and_silent() {
        for (n1, n2) in [(3, 0), (0, 4)] {
            let m = MatrixF64::alloc(n1, n2).unwrap();
            let (count, reports) = capture(|| {
                assert!(m.diagonal().is_null());
                assert!(m.row_begin() == m.row_end());
                m.rows().count()
            });
            assert_eq!(count, 0);
            assert!(reports.is_empty(), "{n1}x{n2}: {reports:?}");
        }

        let m = MatrixF64::alloc(3, 0).unwrap();
        let (row, reports) = capture(|| m.row(2));
        assert!(row.is_null());
        assert!(reports.is_empty());
        let (col, reports) = capture(|| m.column(0));
        assert!(col.is_null());
        assert_eq!(reports.len(), usize::from(CHECKS_ENABLED));

        let m = MatrixF64::alloc(0, 4).unwrap();
        let (col, reports) = capture(|| m.column(3));
        assert!(col.is_null());
        assert!(reports.is_empty());
        let (row, reports) = capture(|| m.row(0));
        assert!(row.is_null());
        assert_eq!(reports.len(), usize::from(CHECKS_ENABLED));
    }

    #[test]
    fn test_fill_on_empty_matrix_faults() {
        let mut m = MatrixF64::default();
        let ((), reports) = capture(|| {
            m.fill(1.0);
            m.set_zero();
            m.set_identity();
        });
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.code == ErrorCode::Fault));

        let mut sentinel = MatrixF64::alloc(2, 0).unwrap();
        let ((), reports) = capture(|| sentinel.set_identity());
        assert!(reports.is_empty());
    }

    #[test]
    fn test_mutation_through_views() {
        let mut m = MatrixF64::zeros(3, 3).unwrap();
        m.row_mut(0).fill(1.0);
        m.column_mut(2).set(1, 5.0);
        m.diagonal_mut().set(2, 9.0);
        m.submatrix_mut(1, 0, 2, 2).set(1, 1, 4.0);
        assert_eq!(
            m.to_rows(),
            vec![vec![1.0, 1.0, 1.0], vec![0.0, 0.0, 5.0], vec![0.0, 4.0, 9.0]]
        );
    }

    #[test]
    fn test_identity_and_swap_rows() {
        let mut m = MatrixU32::identity(3).unwrap();
        m.swap_rows(0, 2).unwrap();
        assert_eq!(m.to_rows(), vec![vec![0, 0, 1], vec![0, 1, 0], vec![1, 0, 0]]);
        let (result, _) = capture(|| m.swap_rows(0, 3));
        assert!(result.is_err());
    }

    #[test]
    fn test_rows_iterate_in_order_both_ways() {
        let m = counting(3, 2);
        let firsts: Vec<f64> = m.rows().map(|row| row.get(0)).collect();
        assert_eq!(firsts, vec![0.0, 2.0, 4.0]);
        let backwards: Vec<f64> = m.rows().rev().map(|row| row.get(1)).collect();
        assert_eq!(backwards, vec![5.0, 3.0, 1.0]);
        assert_eq!(m.rows().len(), 3);
    }

    #[test]
    fn test_row_cursor_distance_and_ends() {
        let m = counting(3, 2);
        assert_eq!(m.row_end() - m.row_begin(), 3);
        assert_eq!(m.row_rend() - m.row_rbegin(), 3);
        assert_eq!(m.row_begin().get().get(0), 0.0);
        assert_eq!((m.row_end() - 1).get().get(0), 4.0);
        let (row, reports) = capture(|| m.row_end().get());
        assert!(row.is_null());
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_repeated_dereference_gives_independent_aliases() {
        let mut m = MatrixF64::zeros(2, 2).unwrap();
        let it = m.rows_mut();
        let mut rows: Vec<_> = it.collect();
        rows[1].set(0, 3.0);
        drop(rows);
        let cursor = m.row_begin() + 1;
        let a = cursor.get();
        let b = cursor.get();
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_eq!(a.get(0), 3.0);
        assert_eq!(b.get(0), 3.0);
    }

    #[test]
    fn test_copy_and_to_matrix() {
        let m = counting(2, 3);
        let copy = m.submatrix(0, 1, 2, 2).to_matrix().unwrap();
        assert_eq!(copy.to_rows(), vec![vec![1.0, 2.0], vec![4.0, 5.0]]);
        assert_eq!(copy.tda(), 2);

        let mut other = MatrixF64::zeros(3, 2).unwrap();
        let (result, _) = capture(|| other.copy_from(&m));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_dimension_sentinel() {
        let m = MatrixF64::alloc(0, 4).unwrap();
        assert!(m.is_sentinel());
        assert_eq!(m.len(), 0);
        assert_eq!(m.rows().count(), 0);
        let (x, reports) = capture(|| m.get(0, 0));
        assert_eq!(x, 0.0);
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_from_row_major_checks_length() {
        let (result, reports) = capture(|| MatrixF64::from_row_major(2, 2, &[1.0]));
        assert_eq!(result.unwrap_err(), Error::InvalidLength { expected: 4, actual: 1 });
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_for_loop_over_reference() {
        let mut m = MatrixF64::zeros(2, 2).unwrap();
        for mut row in &mut m {
            row.fill(1.0);
        }
        let mut count = 0;
        for row in &m {
            assert_eq!(row.to_vec(), vec![1.0, 1.0]);
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
