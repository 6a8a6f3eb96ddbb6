//! Descriptive statistics.
//!
//! Each function forwards the vector's data pointer, stride and length to
//! the foreign routine, so strided views are summarised in place without
//! copying. Like the library, an empty vector gives NaN rather than an
//! error; only an empty *handle* is rejected.
//!
//! ```rust
//! use numhandle::prelude::*;
//! use numhandle::stats;
//!
//! let v = VectorF64::from_slice(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])?;
//! assert_eq!(stats::mean(&v)?, 5.0);
//! assert_eq!(stats::max(&v.subvector_with_stride(0, 2, 4))?, 5.0);
//! # Ok::<(), numhandle::Error>(())
//! ```

use numhandle_foreign::stats::{
    stats_absdev, stats_correlation, stats_covariance, stats_max, stats_mean, stats_min, stats_sd,
    stats_variance,
};
use numhandle_foreign::{Element, RawVector};

use crate::vector::VectorRef;
use crate::{report, Error, ErrorCode, Result};

/// The `(data, stride, size)` triple of a non-empty handle.
fn strided<T: Element, V: VectorRef<T> + ?Sized>(v: &V, what: &'static str) -> Result<(*const T, usize, usize)> {
    let raw: *const RawVector<T> = v.as_raw();
    // SAFETY: VectorRef implementors return null or a live vector.
    match unsafe { raw.as_ref() } {
        Some(header) => Ok((header.data.cast_const(), header.stride, header.size)),
        None => {
            report!(ErrorCode::Fault, "{what} of an empty vector");
            Err(Error::Fault("vector"))
        }
    }
}

macro_rules! unary_stat {
    ($(#[$doc:meta])* $name:ident => $foreign:ident) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// [`Error::Fault`] for an empty handle.
        pub fn $name<T: Element, V: VectorRef<T> + ?Sized>(v: &V) -> Result<f64> {
            let (data, stride, n) = strided(v, stringify!($name))?;
            // SAFETY: the header describes n live elements `stride` apart.
            Ok(unsafe { $foreign(data, stride, n) })
        }
    };
}

unary_stat! {
    /// Arithmetic mean.
    mean => stats_mean
}

unary_stat! {
    /// Sample variance, normalised by `n - 1`.
    variance => stats_variance
}

unary_stat! {
    /// Sample standard deviation.
    sd => stats_sd
}

unary_stat! {
    /// Mean absolute deviation from the mean.
    absdev => stats_absdev
}

unary_stat! {
    /// Largest element.
    max => stats_max
}

unary_stat! {
    /// Smallest element.
    min => stats_min
}

type Pair<T> = ((*const T, usize), (*const T, usize), usize);

fn paired<T, A, B>(a: &A, b: &B, what: &'static str) -> Result<Pair<T>>
where
    T: Element,
    A: VectorRef<T> + ?Sized,
    B: VectorRef<T> + ?Sized,
{
    let (d1, s1, n1) = strided(a, what)?;
    let (d2, s2, n2) = strided(b, what)?;
    if n1 != n2 {
        report!(ErrorCode::BadLength, "{what} of series with lengths {n1} and {n2}");
        return Err(Error::InvalidLength { expected: n1, actual: n2 });
    }
    Ok(((d1, s1), (d2, s2), n1))
}

/// Sample covariance of two series of equal length.
///
/// # Errors
///
/// [`Error::Fault`] for an empty handle, [`Error::InvalidLength`] when the
/// lengths differ.
pub fn covariance<T, A, B>(a: &A, b: &B) -> Result<f64>
where
    T: Element,
    A: VectorRef<T> + ?Sized,
    B: VectorRef<T> + ?Sized,
{
    let ((d1, s1), (d2, s2), n) = paired(a, b, "covariance")?;
    // SAFETY: both headers describe n live elements.
    Ok(unsafe { stats_covariance(d1, s1, d2, s2, n) })
}

/// Pearson correlation of two series of equal length.
///
/// # Errors
///
/// As for [`covariance`].
pub fn correlation<T, A, B>(a: &A, b: &B) -> Result<f64>
where
    T: Element,
    A: VectorRef<T> + ?Sized,
    B: VectorRef<T> + ?Sized,
{
    let ((d1, s1), (d2, s2), n) = paired(a, b, "correlation")?;
    // SAFETY: both headers describe n live elements.
    Ok(unsafe { stats_correlation(d1, s1, d2, s2, n) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::testing::capture;
    use crate::matrix::MatrixRef;
    use crate::{MatrixF64, VectorF64, VectorU32};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_summary_of_owned_vector() {
        let v = VectorF64::from_slice(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(close(mean(&v).unwrap(), 5.0));
        assert!(close(variance(&v).unwrap(), 32.0 / 7.0));
        assert!(close(sd(&v).unwrap(), (32.0_f64 / 7.0).sqrt()));
        assert!(close(absdev(&v).unwrap(), 1.5));
        assert_eq!(max(&v).unwrap(), 9.0);
        assert_eq!(min(&v).unwrap(), 2.0);
    }

    #[test]
    fn test_strided_view_is_read_in_place() {
        let v = VectorF64::from_slice(&[1.0, 100.0, 3.0, 100.0, 5.0]).unwrap();
        let odd = v.subvector_with_stride(0, 2, 3);
        assert!(close(mean(&odd).unwrap(), 3.0));
        assert_eq!(max(&odd).unwrap(), 5.0);
    }

    #[test]
    fn test_matrix_column() {
        let m = MatrixF64::from_row_major(3, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0]).unwrap();
        assert!(close(mean(&m.column(1)).unwrap(), 20.0));
        assert!(close(variance(&m.column(0)).unwrap(), 1.0));
    }

    #[test]
    fn test_integer_elements() {
        let v = VectorU32::from_slice(&[1, 2, 3, 4]).unwrap();
        assert!(close(mean(&v).unwrap(), 2.5));
    }

    #[test]
    fn test_empty_handle_and_sentinel() {
        let empty = VectorF64::default();
        let (result, reports) = capture(|| mean(&empty));
        assert_eq!(result, Err(Error::Fault("vector")));
        assert_eq!(reports[0].code, ErrorCode::Fault);

        let sentinel = VectorF64::alloc(0).unwrap();
        assert!(mean(&sentinel).unwrap().is_nan());
    }

    #[test]
    fn test_covariance_and_correlation() {
        let x = VectorF64::from_slice(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = VectorF64::from_slice(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!(close(covariance(&x, &y).unwrap(), 10.0 / 3.0));
        assert!(close(correlation(&x, &y).unwrap(), 1.0));
    }

    #[test]
    fn test_pairwise_length_mismatch() {
        let x = VectorF64::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        let y = VectorF64::from_slice(&[1.0, 2.0]).unwrap();
        let (result, reports) = capture(|| correlation(&x, &y));
        assert_eq!(result, Err(Error::InvalidLength { expected: 3, actual: 2 }));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].code, ErrorCode::BadLength);
    }
}
