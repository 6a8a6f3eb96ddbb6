//! Combinations: `k` strictly increasing indices drawn from `0..n`.

use std::os::raw::c_int;

use crate::{alloc_header, fail, free_header, raw_alloc, raw_free, status};

/// A combination of `k` elements out of `n`.
#[repr(C)]
#[derive(Debug)]
pub struct RawCombination {
    /// Size of the set drawn from.
    pub n: usize,
    /// Number of chosen elements.
    pub k: usize,
    /// The `k` chosen indices, in increasing order.
    pub data: *mut usize,
}

/// Allocate a combination of `k` out of `n`. Contents are unspecified
/// until initialised.
///
/// Returns null with [`status::INVAL`] for `n == 0`, `k == 0` or `k > n`.
#[must_use]
pub fn combination_alloc(n: usize, k: usize) -> *mut RawCombination {
    if n == 0 || k == 0 || k > n {
        return fail(status::INVAL);
    }
    let data = raw_alloc::<usize>(k, true);
    if data.is_null() {
        return fail(status::NOMEM);
    }
    let c = alloc_header(RawCombination { n, k, data });
    if c.is_null() {
        // SAFETY: data was just allocated with k elements.
        unsafe { raw_free(data, k) };
        return fail(status::NOMEM);
    }
    c
}

/// Allocate a combination and initialise it to the lexicographically
/// first one, `{0, 1, ..., k-1}`.
#[must_use]
pub fn combination_calloc(n: usize, k: usize) -> *mut RawCombination {
    let c = combination_alloc(n, k);
    if !c.is_null() {
        // SAFETY: c was just allocated.
        unsafe { combination_init_first(c) };
    }
    c
}

/// Release a combination.
///
/// # Safety
///
/// `c` must be null or a live combination from this module.
pub unsafe fn combination_free(c: *mut RawCombination) {
    if c.is_null() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        raw_free((*c).data, (*c).k);
        free_header(c);
    }
}

/// The indices as a slice.
///
/// # Safety
///
/// `c` must be live, and the slice must not outlive it nor overlap a
/// mutation of it.
unsafe fn indices<'a>(c: *const RawCombination) -> &'a mut [usize] {
    // SAFETY: guaranteed by the caller.
    unsafe {
        if (*c).k == 0 || (*c).data.is_null() {
            return &mut [];
        }
        std::slice::from_raw_parts_mut((*c).data, (*c).k)
    }
}

/// Set `c` to `{0, 1, ..., k-1}`.
///
/// # Safety
///
/// `c` must be live.
pub unsafe fn combination_init_first(c: *mut RawCombination) {
    // SAFETY: guaranteed by the caller.
    for (i, slot) in unsafe { indices(c) }.iter_mut().enumerate() {
        *slot = i;
    }
}

/// Set `c` to `{n-k, ..., n-1}`.
///
/// # Safety
///
/// `c` must be live.
pub unsafe fn combination_init_last(c: *mut RawCombination) {
    // SAFETY: guaranteed by the caller.
    let (n, k) = unsafe { ((*c).n, (*c).k) };
    for (i, slot) in unsafe { indices(c) }.iter_mut().enumerate() {
        *slot = n - k + i;
    }
}

/// Index `i` of the combination. No range check.
///
/// # Safety
///
/// `c` must be live and `i < k`.
#[inline]
#[must_use]
pub unsafe fn combination_get(c: *const RawCombination, i: usize) -> usize {
    // SAFETY: guaranteed by the caller.
    unsafe { *(*c).data.add(i) }
}

/// Advance to the lexicographically next combination.
///
/// Returns [`status::FAILURE`] and leaves `c` unchanged when `c` is
/// already the last one.
///
/// # Safety
///
/// `c` must be live.
pub unsafe fn combination_next(c: *mut RawCombination) -> c_int {
    // SAFETY: guaranteed by the caller.
    let (n, k) = unsafe { ((*c).n, (*c).k) };
    let data = unsafe { indices(c) };
    if k == 0 {
        return status::FAILURE;
    }
    let mut i = k - 1;
    while i > 0 && data[i] == n - k + i {
        i -= 1;
    }
    if i == 0 && data[0] == n - k {
        return status::FAILURE;
    }
    data[i] += 1;
    while i < k - 1 {
        data[i + 1] = data[i] + 1;
        i += 1;
    }
    status::SUCCESS
}

/// Step back to the lexicographically previous combination.
///
/// Returns [`status::FAILURE`] and leaves `c` unchanged when `c` is
/// already the first one.
///
/// # Safety
///
/// `c` must be live.
pub unsafe fn combination_prev(c: *mut RawCombination) -> c_int {
    // SAFETY: guaranteed by the caller.
    let (n, k) = unsafe { ((*c).n, (*c).k) };
    let data = unsafe { indices(c) };
    if k == 0 {
        return status::FAILURE;
    }
    let mut i = k - 1;
    while i > 0 && data[i] == data[i - 1] + 1 {
        i -= 1;
    }
    if i == 0 && data[0] == 0 {
        return status::FAILURE;
    }
    data[i] -= 1;
    for (j, slot) in data.iter_mut().enumerate().skip(i + 1) {
        *slot = n - k + j;
    }
    status::SUCCESS
}

/// Check that every index is below `n` and the indices increase strictly.
///
/// # Safety
///
/// `c` must be live.
pub unsafe fn combination_valid(c: *const RawCombination) -> c_int {
    if c.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    let (n, k) = unsafe { ((*c).n, (*c).k) };
    if k > n {
        return status::FAILURE;
    }
    let data = unsafe { indices(c) };
    let in_range = data.iter().all(|&x| x < n);
    let increasing = data.windows(2).all(|w| w[0] < w[1]);
    if in_range && increasing {
        status::SUCCESS
    } else {
        status::FAILURE
    }
}

/// Copy `src` into `dst`; both must have the same `n` and `k`.
///
/// # Safety
///
/// Both pointers must be null or live combinations.
pub unsafe fn combination_memcpy(dst: *mut RawCombination, src: *const RawCombination) -> c_int {
    if dst.is_null() || src.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        if (*dst).n != (*src).n || (*dst).k != (*src).k {
            return status::BADLEN;
        }
        if (*src).k > 0 {
            std::ptr::copy((*src).data, (*dst).data, (*src).k);
        }
    }
    status::SUCCESS
}
