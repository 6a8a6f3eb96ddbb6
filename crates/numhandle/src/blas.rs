//! Level 1 BLAS forwarding.
//!
//! Operands may be owners, views or aliases of each other; the foreign
//! routines work element by element through the headers, so an `axpy`
//! whose `x` and `y` share storage is well defined.

use numhandle_foreign::blas::{blas_asum, blas_axpy, blas_dot, blas_nrm2, blas_scal};
use numhandle_foreign::{Element, RawVector};

use crate::vector::{VectorMut, VectorRef};
use crate::{check_status, report, Error, ErrorCode, Result, CHECKS_ENABLED};

fn live<T: Element, V: VectorRef<T> + ?Sized>(v: &V, what: &str) -> Result<*mut RawVector<T>> {
    let raw = v.as_raw();
    if raw.is_null() {
        report!(ErrorCode::Fault, "{what} on an empty vector");
        return Err(Error::Fault("vector"));
    }
    Ok(raw)
}

fn same_length<T: Element>(x: *const RawVector<T>, y: *const RawVector<T>, what: &str) -> Result<()> {
    // SAFETY: callers pass live vectors.
    let (expected, actual) = unsafe { ((*x).size, (*y).size) };
    if CHECKS_ENABLED && expected != actual {
        report!(ErrorCode::BadLength, "{what} of lengths {expected} and {actual}");
        return Err(Error::InvalidLength { expected, actual });
    }
    Ok(())
}

/// Dot product `x · y`, accumulated in `f64`.
///
/// # Errors
///
/// [`Error::Fault`] for an empty handle, [`Error::InvalidLength`] when the
/// lengths differ.
pub fn dot<T, X, Y>(x: &X, y: &Y) -> Result<f64>
where
    T: Element,
    X: VectorRef<T> + ?Sized,
    Y: VectorRef<T> + ?Sized,
{
    let (xr, yr) = (live(x, "dot")?, live(y, "dot")?);
    same_length(xr, yr, "dot")?;
    let mut result = 0.0;
    // SAFETY: both live; result is a valid out-pointer.
    check_status(unsafe { blas_dot(xr, yr, &mut result) }, "dot product")?;
    Ok(result)
}

/// Scale in place: `x = alpha * x`. An empty handle reports and is left
/// alone.
pub fn scale<T: Element, X: VectorMut<T> + ?Sized>(alpha: f64, x: &mut X) {
    if let Ok(raw) = live(x, "scale") {
        // SAFETY: raw is live.
        unsafe { blas_scal(alpha, raw) };
    }
}

/// `y = alpha * x + y`.
///
/// # Errors
///
/// As for [`dot`].
pub fn axpy<T, X, Y>(alpha: f64, x: &X, y: &mut Y) -> Result<()>
where
    T: Element,
    X: VectorRef<T> + ?Sized,
    Y: VectorMut<T> + ?Sized,
{
    let (xr, yr) = (live(x, "axpy")?, live(y, "axpy")?);
    same_length(xr, yr, "axpy")?;
    // SAFETY: both live.
    check_status(unsafe { blas_axpy(alpha, xr, yr) }, "axpy")
}

/// Euclidean norm.
///
/// # Errors
///
/// [`Error::Fault`] for an empty handle.
pub fn nrm2<T: Element, X: VectorRef<T> + ?Sized>(x: &X) -> Result<f64> {
    let raw = live(x, "nrm2")?;
    // SAFETY: raw is live.
    Ok(unsafe { blas_nrm2(raw) })
}

/// Sum of absolute values.
///
/// # Errors
///
/// [`Error::Fault`] for an empty handle.
pub fn asum<T: Element, X: VectorRef<T> + ?Sized>(x: &X) -> Result<f64> {
    let raw = live(x, "asum")?;
    // SAFETY: raw is live.
    Ok(unsafe { blas_asum(raw) })
}
