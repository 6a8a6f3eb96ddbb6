//! Level 1 BLAS over strided vectors.

use std::os::raw::c_int;

use crate::vector::{vector_ptr, RawVector};
use crate::{status, Element};

/// Dot product `x · y`, written through `result`.
///
/// Returns [`status::BADLEN`] when the lengths differ.
///
/// # Safety
///
/// `x`, `y` must be live vectors and `result` valid for writes.
pub unsafe fn blas_dot<T: Element>(x: *const RawVector<T>, y: *const RawVector<T>, result: *mut f64) -> c_int {
    if x.is_null() || y.is_null() || result.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        if (*x).size != (*y).size {
            return status::BADLEN;
        }
        *result = (0..(*x).size)
            .map(|i| vector_ptr(x, i).read().to_f64() * vector_ptr(y, i).read().to_f64())
            .sum();
    }
    status::SUCCESS
}

/// Scale in place: `x = alpha * x`.
///
/// # Safety
///
/// `x` must be a live vector.
pub unsafe fn blas_scal<T: Element>(alpha: f64, x: *mut RawVector<T>) {
    // SAFETY: guaranteed by the caller.
    unsafe {
        for i in 0..(*x).size {
            let p = vector_ptr(x, i);
            p.write(T::from_f64(alpha * p.read().to_f64()));
        }
    }
}

/// `y = alpha * x + y`.
///
/// # Safety
///
/// `x` and `y` must be live vectors.
pub unsafe fn blas_axpy<T: Element>(alpha: f64, x: *const RawVector<T>, y: *mut RawVector<T>) -> c_int {
    if x.is_null() || y.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        if (*x).size != (*y).size {
            return status::BADLEN;
        }
        for i in 0..(*x).size {
            let py = vector_ptr(y, i);
            let sum = alpha * vector_ptr(x, i).read().to_f64() + py.read().to_f64();
            py.write(T::from_f64(sum));
        }
    }
    status::SUCCESS
}

/// Euclidean norm `||x||_2`.
///
/// # Safety
///
/// `x` must be a live vector.
#[must_use]
pub unsafe fn blas_nrm2<T: Element>(x: *const RawVector<T>) -> f64 {
    // Scaled sum of squares to avoid overflow.
    let mut scale = 0.0_f64;
    let mut ssq = 1.0_f64;
    // SAFETY: guaranteed by the caller.
    for i in 0..unsafe { (*x).size } {
        let v = unsafe { vector_ptr(x, i).read() }.to_f64().abs();
        if v != 0.0 {
            if scale < v {
                ssq = 1.0 + ssq * (scale / v) * (scale / v);
                scale = v;
            } else {
                ssq += (v / scale) * (v / scale);
            }
        }
    }
    scale * ssq.sqrt()
}

/// Sum of absolute values `||x||_1`.
///
/// # Safety
///
/// `x` must be a live vector.
#[must_use]
pub unsafe fn blas_asum<T: Element>(x: *const RawVector<T>) -> f64 {
    // SAFETY: guaranteed by the caller.
    unsafe { (0..(*x).size).map(|i| vector_ptr(x, i).read().to_f64().abs()).sum() }
}
