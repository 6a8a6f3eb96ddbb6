//! Strided vectors over a data block.

use std::os::raw::c_int;

use crate::block::{block_alloc, block_free, RawBlock};
use crate::matrix::RawMatrix;
use crate::{alloc_header, fail, free_header, status, Element};

/// A vector of `size` elements spaced `stride` apart in `data`.
///
/// `owner == 1` means `block` belongs to this vector and is released by
/// [`vector_free`]; views carry `owner == 0` and a null `block`.
#[repr(C)]
#[derive(Debug)]
pub struct RawVector<T> {
    /// Number of elements.
    pub size: usize,
    /// Distance between consecutive elements, in elements.
    pub stride: usize,
    /// First element.
    pub data: *mut T,
    /// Backing block when owning.
    pub block: *mut RawBlock<T>,
    /// Ownership flag.
    pub owner: c_int,
}

/// Allocate an owning vector of length `n` (contents zeroed).
///
/// Returns null with [`status::INVAL`] for `n == 0`, [`status::NOMEM`] on
/// allocation failure.
#[must_use]
pub fn vector_alloc<T: Element>(n: usize) -> *mut RawVector<T> {
    if n == 0 {
        return fail(status::INVAL);
    }
    let block = block_alloc::<T>(n);
    if block.is_null() {
        return fail(status::NOMEM);
    }
    // SAFETY: block was just allocated.
    let data = unsafe { (*block).data };
    let v = alloc_header(RawVector {
        size: n,
        stride: 1,
        data,
        block,
        owner: 1,
    });
    if v.is_null() {
        // SAFETY: block was just allocated and is not referenced elsewhere.
        unsafe { block_free(block) };
        return fail(status::NOMEM);
    }
    v
}

/// Allocate an owning vector of length `n` and set every element to zero.
#[must_use]
pub fn vector_calloc<T: Element>(n: usize) -> *mut RawVector<T> {
    let v = vector_alloc::<T>(n);
    if !v.is_null() {
        // SAFETY: v was just allocated.
        unsafe { vector_set_zero(v) };
    }
    v
}

/// Release a vector header and, when it owns one, its block.
///
/// # Safety
///
/// `v` must be null or a live vector returned by one of the `vector_alloc*`
/// constructors of this module.
pub unsafe fn vector_free<T: Element>(v: *mut RawVector<T>) {
    if v.is_null() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        if (*v).owner == 1 {
            block_free((*v).block);
        }
        free_header(v);
    }
}

// ============================================================================
// Header-only views
// ============================================================================

/// Allocate a non-owning header over `n` elements at `base` with `stride`.
///
/// # Safety
///
/// `base` must address at least `(n - 1) * stride + 1` elements that stay
/// valid while the header is used.
#[must_use]
pub unsafe fn vector_alloc_view<T: Element>(base: *mut T, n: usize, stride: usize) -> *mut RawVector<T> {
    if base.is_null() {
        return fail(status::FAULT);
    }
    if n == 0 || stride == 0 {
        return fail(status::INVAL);
    }
    alloc_header(RawVector {
        size: n,
        stride,
        data: base,
        block: std::ptr::null_mut(),
        owner: 0,
    })
}

/// Allocate a view of `n` elements of `v` starting at `offset`, taking
/// every `stride`-th element.
///
/// # Safety
///
/// `v` must be null or a live vector.
#[must_use]
pub unsafe fn vector_alloc_from_vector<T: Element>(
    v: *const RawVector<T>,
    offset: usize,
    n: usize,
    stride: usize,
) -> *mut RawVector<T> {
    if v.is_null() {
        return fail(status::FAULT);
    }
    // SAFETY: guaranteed by the caller.
    let v = unsafe { &*v };
    if n == 0 || stride == 0 {
        return fail(status::INVAL);
    }
    let last = (n - 1).checked_mul(stride).and_then(|d| d.checked_add(offset));
    match last {
        Some(last) if last < v.size => {}
        _ => return fail(status::INVAL),
    }
    // SAFETY: bounds checked above.
    unsafe { vector_alloc_view(v.data.add(offset * v.stride), n, v.stride * stride) }
}

/// Allocate a view of row `i` of `m`.
///
/// # Safety
///
/// `m` must be null or a live matrix.
#[must_use]
pub unsafe fn vector_alloc_row_from_matrix<T: Element>(m: *const RawMatrix<T>, i: usize) -> *mut RawVector<T> {
    if m.is_null() {
        return fail(status::FAULT);
    }
    // SAFETY: guaranteed by the caller.
    let m = unsafe { &*m };
    // A matrix with a zero dimension may have null data.
    if i >= m.size1 || m.size2 == 0 {
        return fail(status::INVAL);
    }
    // SAFETY: row index checked above.
    unsafe { vector_alloc_view(m.data.add(i * m.tda), m.size2, 1) }
}

/// Allocate a view of column `j` of `m`.
///
/// # Safety
///
/// `m` must be null or a live matrix.
#[must_use]
pub unsafe fn vector_alloc_col_from_matrix<T: Element>(m: *const RawMatrix<T>, j: usize) -> *mut RawVector<T> {
    if m.is_null() {
        return fail(status::FAULT);
    }
    // SAFETY: guaranteed by the caller.
    let m = unsafe { &*m };
    if j >= m.size2 || m.size1 == 0 {
        return fail(status::INVAL);
    }
    // SAFETY: column index checked above.
    unsafe { vector_alloc_view(m.data.add(j), m.size1, m.tda) }
}

/// Allocate a view of the leading diagonal of `m`.
///
/// # Safety
///
/// `m` must be null or a live matrix.
#[must_use]
pub unsafe fn vector_alloc_diag_from_matrix<T: Element>(m: *const RawMatrix<T>) -> *mut RawVector<T> {
    if m.is_null() {
        return fail(status::FAULT);
    }
    // SAFETY: guaranteed by the caller.
    let m = unsafe { &*m };
    if m.size1 == 0 || m.size2 == 0 {
        return fail(status::INVAL);
    }
    // SAFETY: the diagonal stays inside the matrix.
    unsafe { vector_alloc_view(m.data, m.size1.min(m.size2), m.tda + 1) }
}

// ============================================================================
// Element access and bulk operations
// ============================================================================

/// Pointer to element `i`. No range check.
///
/// # Safety
///
/// `v` must be live and `i < size`.
#[inline]
#[must_use]
pub unsafe fn vector_ptr<T: Element>(v: *const RawVector<T>, i: usize) -> *mut T {
    // SAFETY: guaranteed by the caller.
    unsafe { (*v).data.add(i * (*v).stride) }
}

/// Copy the elements of `src` into `dst`.
///
/// Returns [`status::BADLEN`] when the lengths differ.
///
/// # Safety
///
/// Both pointers must be null or live vectors.
pub unsafe fn vector_memcpy<T: Element>(dst: *mut RawVector<T>, src: *const RawVector<T>) -> c_int {
    if dst.is_null() || src.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        if (*dst).size != (*src).size {
            return status::BADLEN;
        }
        for i in 0..(*src).size {
            vector_ptr(dst, i).write(vector_ptr(src, i).read());
        }
    }
    status::SUCCESS
}

/// Set every element to `x`.
///
/// # Safety
///
/// `v` must be live.
pub unsafe fn vector_set_all<T: Element>(v: *mut RawVector<T>, x: T) {
    // SAFETY: guaranteed by the caller.
    unsafe {
        for i in 0..(*v).size {
            vector_ptr(v, i).write(x);
        }
    }
}

/// Set every element to zero.
///
/// # Safety
///
/// `v` must be live.
pub unsafe fn vector_set_zero<T: Element>(v: *mut RawVector<T>) {
    // SAFETY: guaranteed by the caller.
    unsafe { vector_set_all(v, T::default()) }
}

/// Exchange elements `i` and `j`.
///
/// # Safety
///
/// `v` must be live.
pub unsafe fn vector_swap_elements<T: Element>(v: *mut RawVector<T>, i: usize, j: usize) -> c_int {
    // SAFETY: guaranteed by the caller.
    unsafe {
        if i >= (*v).size || j >= (*v).size {
            return status::INVAL;
        }
        std::ptr::swap(vector_ptr(v, i), vector_ptr(v, j));
    }
    status::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{matrix_alloc, matrix_free, matrix_ptr};
    use crate::{stats, take_last_status};

    #[test]
    fn test_alloc_free_balances() {
        let before = stats().live();
        let v = vector_calloc::<f64>(5);
        assert!(!v.is_null());
        unsafe {
            assert_eq!((*v).size, 5);
            assert_eq!((*v).owner, 1);
            vector_free(v);
        }
        assert_eq!(stats().live(), before);
    }

    #[test]
    fn test_view_free_leaves_data() {
        let v = vector_alloc::<f64>(6);
        unsafe {
            for i in 0..6 {
                vector_ptr(v, i).write(i as f64);
            }
            let sub = vector_alloc_from_vector(v, 1, 3, 2);
            assert!(!sub.is_null());
            assert_eq!((*sub).owner, 0);
            assert_eq!(*vector_ptr(sub, 0), 1.0);
            assert_eq!(*vector_ptr(sub, 2), 5.0);

            let live = stats().live();
            vector_free(sub);
            assert_eq!(stats().live(), live - 1);
            assert_eq!(*vector_ptr(v, 5), 5.0);
            vector_free(v);
        }
    }

    #[test]
    fn test_subvector_out_of_range() {
        let v = vector_alloc::<f64>(4);
        unsafe {
            assert!(vector_alloc_from_vector(v, 2, 2, 2).is_null());
            assert_eq!(take_last_status(), status::INVAL);
            vector_free(v);
        }
    }

    #[test]
    fn test_row_and_column_views() {
        let m = matrix_alloc::<u32>(3, 4);
        unsafe {
            for i in 0..3 {
                for j in 0..4 {
                    matrix_ptr(m, i, j).write((10 * i + j) as u32);
                }
            }
            let row = vector_alloc_row_from_matrix(m, 1);
            let col = vector_alloc_col_from_matrix(m, 2);
            assert_eq!((*row).size, 4);
            assert_eq!(*vector_ptr(row, 3), 13);
            assert_eq!((*col).size, 3);
            assert_eq!(*vector_ptr(col, 2), 22);
            assert!(vector_alloc_row_from_matrix(m, 3).is_null());
            vector_free(row);
            vector_free(col);
            matrix_free(m);
        }
    }

    #[test]
    fn test_views_of_zero_sized_matrix_are_rejected() {
        for (size1, size2) in [(0_usize, 4_usize), (3, 0)] {
            let m = RawMatrix::<f64> {
                size1,
                size2,
                tda: size2,
                data: std::ptr::null_mut(),
                block: std::ptr::null_mut(),
                owner: 0,
            };
            let before = stats().live();
            unsafe {
                assert!(vector_alloc_row_from_matrix(&m, 0).is_null());
                assert_eq!(take_last_status(), status::INVAL);
                assert!(vector_alloc_col_from_matrix(&m, 0).is_null());
                assert_eq!(take_last_status(), status::INVAL);
                assert!(vector_alloc_col_from_matrix(&m, 2).is_null());
                assert_eq!(take_last_status(), status::INVAL);
                assert!(vector_alloc_diag_from_matrix(&m).is_null());
                assert_eq!(take_last_status(), status::INVAL);
            }
            assert_eq!(stats().live(), before);
        }
    }

    #[test]
    fn test_memcpy_length_mismatch() {
        let a = vector_alloc::<f32>(3);
        let b = vector_alloc::<f32>(4);
        unsafe {
            assert_eq!(vector_memcpy(a, b), status::BADLEN);
            assert_eq!(vector_memcpy(a, std::ptr::null()), status::FAULT);
            vector_free(a);
            vector_free(b);
        }
    }
}
