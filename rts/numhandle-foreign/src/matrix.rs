//! Row-major matrices over a data block.

use std::os::raw::c_int;

use crate::block::{block_alloc, block_free, RawBlock};
use crate::{alloc_header, fail, free_header, status, Element};

/// A `size1 x size2` row-major matrix whose rows are `tda` elements apart.
#[repr(C)]
#[derive(Debug)]
pub struct RawMatrix<T> {
    /// Number of rows.
    pub size1: usize,
    /// Number of columns.
    pub size2: usize,
    /// Trailing dimension: distance between rows, in elements.
    pub tda: usize,
    /// Element `(0, 0)`.
    pub data: *mut T,
    /// Backing block when owning.
    pub block: *mut RawBlock<T>,
    /// Ownership flag.
    pub owner: c_int,
}

/// Allocate an owning `n1 x n2` matrix (contents zeroed).
///
/// Returns null with [`status::INVAL`] when either dimension is zero.
#[must_use]
pub fn matrix_alloc<T: Element>(n1: usize, n2: usize) -> *mut RawMatrix<T> {
    if n1 == 0 || n2 == 0 {
        return fail(status::INVAL);
    }
    let Some(len) = n1.checked_mul(n2) else {
        return fail(status::INVAL);
    };
    let block = block_alloc::<T>(len);
    if block.is_null() {
        return fail(status::NOMEM);
    }
    // SAFETY: block was just allocated.
    let data = unsafe { (*block).data };
    let m = alloc_header(RawMatrix {
        size1: n1,
        size2: n2,
        tda: n2,
        data,
        block,
        owner: 1,
    });
    if m.is_null() {
        // SAFETY: block was just allocated and is not referenced elsewhere.
        unsafe { block_free(block) };
        return fail(status::NOMEM);
    }
    m
}

/// Allocate an owning `n1 x n2` matrix with every element set to zero.
#[must_use]
pub fn matrix_calloc<T: Element>(n1: usize, n2: usize) -> *mut RawMatrix<T> {
    let m = matrix_alloc::<T>(n1, n2);
    if !m.is_null() {
        // SAFETY: m was just allocated.
        unsafe { matrix_set_zero(m) };
    }
    m
}

/// Release a matrix header and, when it owns one, its block.
///
/// # Safety
///
/// `m` must be null or a live matrix from this module.
pub unsafe fn matrix_free<T: Element>(m: *mut RawMatrix<T>) {
    if m.is_null() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        if (*m).owner == 1 {
            block_free((*m).block);
        }
        free_header(m);
    }
}

/// Allocate a non-owning header over an `n1 x n2` region at `base`.
///
/// # Safety
///
/// `base` must address the whole region for as long as the header is used.
#[must_use]
pub unsafe fn matrix_alloc_view<T: Element>(base: *mut T, n1: usize, n2: usize, tda: usize) -> *mut RawMatrix<T> {
    if base.is_null() {
        return fail(status::FAULT);
    }
    if n1 == 0 || n2 == 0 || tda < n2 {
        return fail(status::INVAL);
    }
    alloc_header(RawMatrix {
        size1: n1,
        size2: n2,
        tda,
        data: base,
        block: std::ptr::null_mut(),
        owner: 0,
    })
}

/// Allocate a view of the `n1 x n2` submatrix of `m` whose top-left
/// element is `(k1, k2)`.
///
/// # Safety
///
/// `m` must be null or a live matrix.
#[must_use]
pub unsafe fn matrix_alloc_from_matrix<T: Element>(
    m: *const RawMatrix<T>,
    k1: usize,
    k2: usize,
    n1: usize,
    n2: usize,
) -> *mut RawMatrix<T> {
    if m.is_null() {
        return fail(status::FAULT);
    }
    // SAFETY: guaranteed by the caller.
    let m = unsafe { &*m };
    let rows_fit = k1.checked_add(n1).is_some_and(|end| end <= m.size1);
    let cols_fit = k2.checked_add(n2).is_some_and(|end| end <= m.size2);
    if n1 == 0 || n2 == 0 || !rows_fit || !cols_fit {
        return fail(status::INVAL);
    }
    // SAFETY: region checked above.
    unsafe { matrix_alloc_view(m.data.add(k1 * m.tda + k2), n1, n2, m.tda) }
}

/// Pointer to element `(i, j)`. No range check.
///
/// # Safety
///
/// `m` must be live, `i < size1` and `j < size2`.
#[inline]
#[must_use]
pub unsafe fn matrix_ptr<T: Element>(m: *const RawMatrix<T>, i: usize, j: usize) -> *mut T {
    // SAFETY: guaranteed by the caller.
    unsafe { (*m).data.add(i * (*m).tda + j) }
}

/// Copy `src` into `dst`; both must have the same shape.
///
/// # Safety
///
/// Both pointers must be null or live matrices.
pub unsafe fn matrix_memcpy<T: Element>(dst: *mut RawMatrix<T>, src: *const RawMatrix<T>) -> c_int {
    if dst.is_null() || src.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        if (*dst).size1 != (*src).size1 || (*dst).size2 != (*src).size2 {
            return status::BADLEN;
        }
        for i in 0..(*src).size1 {
            for j in 0..(*src).size2 {
                matrix_ptr(dst, i, j).write(matrix_ptr(src, i, j).read());
            }
        }
    }
    status::SUCCESS
}

/// Set every element to `x`.
///
/// # Safety
///
/// `m` must be live.
pub unsafe fn matrix_set_all<T: Element>(m: *mut RawMatrix<T>, x: T) {
    // SAFETY: guaranteed by the caller.
    unsafe {
        for i in 0..(*m).size1 {
            for j in 0..(*m).size2 {
                matrix_ptr(m, i, j).write(x);
            }
        }
    }
}

/// Set every element to zero.
///
/// # Safety
///
/// `m` must be live.
pub unsafe fn matrix_set_zero<T: Element>(m: *mut RawMatrix<T>) {
    // SAFETY: guaranteed by the caller.
    unsafe { matrix_set_all(m, T::default()) }
}

/// Set the diagonal to one and everything else to zero.
///
/// # Safety
///
/// `m` must be live.
pub unsafe fn matrix_set_identity<T: Element>(m: *mut RawMatrix<T>) {
    // SAFETY: guaranteed by the caller.
    unsafe {
        for i in 0..(*m).size1 {
            for j in 0..(*m).size2 {
                let x = if i == j { T::from_f64(1.0) } else { T::default() };
                matrix_ptr(m, i, j).write(x);
            }
        }
    }
}

/// Exchange rows `i` and `j`.
///
/// # Safety
///
/// `m` must be live.
pub unsafe fn matrix_swap_rows<T: Element>(m: *mut RawMatrix<T>, i: usize, j: usize) -> c_int {
    // SAFETY: guaranteed by the caller.
    unsafe {
        if i >= (*m).size1 || j >= (*m).size1 {
            return status::INVAL;
        }
        if i != j {
            for k in 0..(*m).size2 {
                std::ptr::swap(matrix_ptr(m, i, k), matrix_ptr(m, j, k));
            }
        }
    }
    status::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stats, take_last_status};

    #[test]
    fn test_matrix_alloc_shape() {
        let before = stats().live();
        let m = matrix_calloc::<f64>(3, 4);
        unsafe {
            assert_eq!((*m).size1, 3);
            assert_eq!((*m).size2, 4);
            assert_eq!((*m).tda, 4);
            matrix_free(m);
        }
        assert_eq!(stats().live(), before);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matrix_alloc::<f64>(0, 4).is_null());
        assert_eq!(take_last_status(), status::INVAL);
        assert!(matrix_alloc::<f64>(4, 0).is_null());
    }

    #[test]
    fn test_submatrix_aliases_parent() {
        let m = matrix_alloc::<f64>(4, 4);
        unsafe {
            matrix_set_identity(m);
            let sub = matrix_alloc_from_matrix(m, 1, 1, 2, 3);
            assert_eq!((*sub).tda, 4);
            assert_eq!(*matrix_ptr(sub, 0, 0), 1.0);
            assert_eq!(*matrix_ptr(sub, 0, 1), 0.0);
            matrix_ptr(sub, 1, 2).write(9.0);
            assert_eq!(*matrix_ptr(m, 2, 3), 9.0);

            assert!(matrix_alloc_from_matrix(m, 3, 0, 2, 1).is_null());
            assert_eq!(take_last_status(), status::INVAL);

            matrix_free(sub);
            matrix_free(m);
        }
    }

    #[test]
    fn test_swap_rows() {
        let m = matrix_alloc::<i32>(2, 2);
        unsafe {
            matrix_ptr(m, 0, 0).write(1);
            matrix_ptr(m, 1, 0).write(2);
            assert_eq!(matrix_swap_rows(m, 0, 1), status::SUCCESS);
            assert_eq!(*matrix_ptr(m, 0, 0), 2);
            assert_eq!(matrix_swap_rows(m, 0, 2), status::INVAL);
            matrix_free(m);
        }
    }
}
