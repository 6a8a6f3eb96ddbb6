//! Descriptive statistics over strided arrays.
//!
//! Every routine takes `(data, stride, n)` and reads
//! `data[0], data[stride], ..., data[(n-1)*stride]`. Results for `n == 0`
//! are NaN, as with the real library.

use crate::Element;

/// # Safety
///
/// `data` must address `n` elements spaced `stride` apart.
unsafe fn values<T: Element>(data: *const T, stride: usize, n: usize) -> impl Iterator<Item = f64> {
    // SAFETY: guaranteed by the caller.
    (0..n).map(move |i| unsafe { data.add(i * stride).read() }.to_f64())
}

/// Arithmetic mean.
///
/// # Safety
///
/// `data` must address `n` elements spaced `stride` apart.
#[must_use]
pub unsafe fn stats_mean<T: Element>(data: *const T, stride: usize, n: usize) -> f64 {
    // Running mean, as the library computes it, for stability.
    let mut mean = 0.0;
    // SAFETY: guaranteed by the caller.
    for (i, x) in unsafe { values(data, stride, n) }.enumerate() {
        mean += (x - mean) / (i + 1) as f64;
    }
    if n == 0 {
        f64::NAN
    } else {
        mean
    }
}

/// Sample variance about a known mean.
///
/// # Safety
///
/// `data` must address `n` elements spaced `stride` apart.
#[must_use]
pub unsafe fn stats_variance_m<T: Element>(data: *const T, stride: usize, n: usize, mean: f64) -> f64 {
    if n < 2 {
        return f64::NAN;
    }
    let mut var = 0.0;
    // SAFETY: guaranteed by the caller.
    for (i, x) in unsafe { values(data, stride, n) }.enumerate() {
        let delta = x - mean;
        var += (delta * delta - var) / (i + 1) as f64;
    }
    var * (n as f64 / (n - 1) as f64)
}

/// Sample variance (divides by `n - 1`).
///
/// # Safety
///
/// `data` must address `n` elements spaced `stride` apart.
#[must_use]
pub unsafe fn stats_variance<T: Element>(data: *const T, stride: usize, n: usize) -> f64 {
    // SAFETY: guaranteed by the caller.
    unsafe { stats_variance_m(data, stride, n, stats_mean(data, stride, n)) }
}

/// Sample standard deviation.
///
/// # Safety
///
/// `data` must address `n` elements spaced `stride` apart.
#[must_use]
pub unsafe fn stats_sd<T: Element>(data: *const T, stride: usize, n: usize) -> f64 {
    // SAFETY: guaranteed by the caller.
    unsafe { stats_variance(data, stride, n) }.sqrt()
}

/// Mean absolute deviation from the mean.
///
/// # Safety
///
/// `data` must address `n` elements spaced `stride` apart.
#[must_use]
pub unsafe fn stats_absdev<T: Element>(data: *const T, stride: usize, n: usize) -> f64 {
    // SAFETY: guaranteed by the caller.
    let mean = unsafe { stats_mean(data, stride, n) };
    let sum: f64 = unsafe { values(data, stride, n) }.map(|x| (x - mean).abs()).sum();
    sum / n as f64
}

/// Largest element, NaN for `n == 0`.
///
/// # Safety
///
/// `data` must address `n` elements spaced `stride` apart.
#[must_use]
pub unsafe fn stats_max<T: Element>(data: *const T, stride: usize, n: usize) -> f64 {
    // SAFETY: guaranteed by the caller.
    unsafe { values(data, stride, n) }.fold(f64::NAN, f64::max)
}

/// Smallest element, NaN for `n == 0`.
///
/// # Safety
///
/// `data` must address `n` elements spaced `stride` apart.
#[must_use]
pub unsafe fn stats_min<T: Element>(data: *const T, stride: usize, n: usize) -> f64 {
    // SAFETY: guaranteed by the caller.
    unsafe { values(data, stride, n) }.fold(f64::NAN, f64::min)
}

/// Sample covariance of two equally long series.
///
/// # Safety
///
/// Both arrays must address `n` elements spaced by their strides.
#[must_use]
pub unsafe fn stats_covariance<T: Element>(
    data1: *const T,
    stride1: usize,
    data2: *const T,
    stride2: usize,
    n: usize,
) -> f64 {
    if n < 2 {
        return f64::NAN;
    }
    // SAFETY: guaranteed by the caller.
    let (mean1, mean2) = unsafe { (stats_mean(data1, stride1, n), stats_mean(data2, stride2, n)) };
    let mut cov = 0.0;
    // SAFETY: guaranteed by the caller.
    let pairs = unsafe { values(data1, stride1, n).zip(values(data2, stride2, n)) };
    for (i, (x, y)) in pairs.enumerate() {
        cov += ((x - mean1) * (y - mean2) - cov) / (i + 1) as f64;
    }
    cov * (n as f64 / (n - 1) as f64)
}

/// Pearson correlation coefficient of two equally long series.
///
/// # Safety
///
/// Both arrays must address `n` elements spaced by their strides.
#[must_use]
pub unsafe fn stats_correlation<T: Element>(
    data1: *const T,
    stride1: usize,
    data2: *const T,
    stride2: usize,
    n: usize,
) -> f64 {
    // SAFETY: guaranteed by the caller.
    unsafe {
        let cov = stats_covariance(data1, stride1, data2, stride2, n);
        cov / (stats_sd(data1, stride1, n) * stats_sd(data2, stride2, n))
    }
}
