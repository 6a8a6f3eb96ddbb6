//! Foreign numerical library layer for numhandle.
//!
//! This crate plays the part of the external C numerical library that the
//! `numhandle` adapters wrap. Everything here follows the C conventions of
//! such a library:
//!
//! - objects are plain `#[repr(C)]` structs reached through raw pointers,
//! - constructors return a null pointer on failure and record a status,
//! - every other entry point returns an integer status code,
//! - a vector or matrix owns its data block only when `owner == 1`;
//!   header-only views carry `owner == 0` and their `free` releases just
//!   the header.
//!
//! # Allocation
//!
//! Memory comes from the system allocator. Zero-sized requests are
//! rejected with [`status::INVAL`], the way the real library's allocators
//! refuse them. Every header and data block is counted in per-thread
//! [`AllocStats`] so callers can verify that each object is released
//! exactly once.
//!
//! # Fault injection
//!
//! [`fail_allocations_after`] makes the allocator start returning null
//! after a number of successful allocations on the current thread. It
//! exists to exercise the cleanup paths of callers.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod blas;
pub mod block;
pub mod combination;
pub mod integration;
pub mod io;
pub mod matrix;
pub mod stats;
pub mod vector;

pub use block::RawBlock;
pub use combination::RawCombination;
pub use integration::{Function, RawWorkspace};
pub use matrix::RawMatrix;
pub use vector::RawVector;

use std::alloc::Layout;
use std::cell::Cell;
use std::os::raw::c_int;

/// Status codes returned by the foreign entry points.
pub mod status {
    use std::os::raw::c_int;

    /// Success.
    pub const SUCCESS: c_int = 0;
    /// Generic failure; also "no further combination".
    pub const FAILURE: c_int = -1;
    /// Input domain error.
    pub const EDOM: c_int = 1;
    /// Invalid pointer.
    pub const FAULT: c_int = 3;
    /// Invalid argument supplied by the caller.
    pub const INVAL: c_int = 4;
    /// Generic failure inside the library (I/O and the like).
    pub const FAILED: c_int = 5;
    /// Memory allocation failed.
    pub const NOMEM: c_int = 8;
    /// Iteration limit exceeded.
    pub const MAXITER: c_int = 11;
    /// User-specified tolerance is invalid.
    pub const BADTOL: c_int = 13;
    /// Roundoff error prevented the requested tolerance.
    pub const ROUND: c_int = 18;
    /// Operands have incompatible lengths.
    pub const BADLEN: c_int = 19;
    /// End of file reached before all data was read.
    pub const EOF: c_int = 32;

    /// Symbolic name of a status code.
    #[must_use]
    pub fn name(code: c_int) -> &'static str {
        match code {
            SUCCESS => "success",
            FAILURE => "failure",
            EDOM => "domain error",
            FAULT => "invalid pointer",
            INVAL => "invalid argument",
            FAILED => "generic failure",
            NOMEM => "malloc failed",
            MAXITER => "exceeded max number of iterations",
            BADTOL => "invalid tolerance",
            ROUND => "failed because of roundoff error",
            BADLEN => "matrix/vector lengths are not conformant",
            EOF => "end of file",
            _ => "unknown error code",
        }
    }
}

// ============================================================================
// Element types
// ============================================================================

/// Marker trait for element types the library stores in its blocks.
///
/// # Safety
///
/// Implementors must be plain old data: `Copy`, no drop glue, no padding
/// and every bit pattern of `size_of::<Self>()` bytes a valid value. The
/// binary I/O routines copy elements byte-for-byte.
pub unsafe trait Element: Copy + Default + PartialEq + std::fmt::Debug + 'static {
    /// The C-equivalent type name.
    const C_TYPE_NAME: &'static str;

    /// Widen to `f64` for the statistics and BLAS kernels.
    fn to_f64(self) -> f64;

    /// Narrow from `f64` (truncating for integer types).
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            unsafe impl Element for $ty {
                const C_TYPE_NAME: &'static str = $name;

                #[inline]
                #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_element! {
    f64 => "double",
    f32 => "float",
    i32 => "int",
    u32 => "unsigned int",
    u64 => "unsigned long",
    usize => "size_t",
}

// ============================================================================
// Allocation statistics
// ============================================================================

/// Per-thread allocation statistics of the foreign allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Total bytes currently allocated.
    pub bytes_allocated: usize,
    /// Total number of allocations performed.
    pub allocation_count: usize,
    /// Total number of deallocations performed.
    pub deallocation_count: usize,
    /// Peak memory usage in bytes.
    pub peak_bytes: usize,
    /// Number of failed allocations.
    pub failed_allocations: usize,
}

impl AllocStats {
    /// Create new empty statistics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes_allocated: 0,
            allocation_count: 0,
            deallocation_count: 0,
            peak_bytes: 0,
            failed_allocations: 0,
        }
    }

    /// Number of allocations not yet released.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.allocation_count - self.deallocation_count
    }

    fn record_alloc(&mut self, size: usize) {
        self.bytes_allocated += size;
        self.allocation_count += 1;
        self.peak_bytes = self.peak_bytes.max(self.bytes_allocated);
    }

    fn record_dealloc(&mut self, size: usize) {
        self.bytes_allocated = self.bytes_allocated.saturating_sub(size);
        self.deallocation_count += 1;
    }

    fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }
}

thread_local! {
    static STATS: Cell<AllocStats> = const { Cell::new(AllocStats::new()) };
    static FAIL_AFTER: Cell<Option<usize>> = const { Cell::new(None) };
    static LAST_STATUS: Cell<c_int> = const { Cell::new(status::SUCCESS) };
}

/// Snapshot of the current thread's allocation statistics.
#[must_use]
pub fn stats() -> AllocStats {
    STATS.with(Cell::get)
}

fn update_stats(f: impl FnOnce(&mut AllocStats)) {
    STATS.with(|cell| {
        let mut stats = cell.get();
        f(&mut stats);
        cell.set(stats);
    });
}

/// Let the next `n` allocations on this thread succeed, then fail every
/// following one until [`clear_allocation_faults`] is called.
pub fn fail_allocations_after(n: usize) {
    FAIL_AFTER.with(|cell| cell.set(Some(n)));
}

/// Stop injecting allocation failures on this thread.
pub fn clear_allocation_faults() {
    FAIL_AFTER.with(|cell| cell.set(None));
}

fn injected_failure() -> bool {
    FAIL_AFTER.with(|cell| match cell.get() {
        None => false,
        Some(0) => true,
        Some(n) => {
            cell.set(Some(n - 1));
            false
        }
    })
}

/// Status recorded by the last constructor that returned null on this
/// thread. Reading it resets it to [`status::SUCCESS`].
#[must_use]
pub fn take_last_status() -> c_int {
    LAST_STATUS.with(|cell| cell.replace(status::SUCCESS))
}

pub(crate) fn set_last_status(code: c_int) {
    LAST_STATUS.with(|cell| cell.set(code));
}

/// Record `code` as the last status and hand back a null pointer.
pub(crate) fn fail<P>(code: c_int) -> *mut P {
    set_last_status(code);
    std::ptr::null_mut()
}

// ============================================================================
// Raw allocation
// ============================================================================

/// Allocate room for `count` values of `U`.
///
/// Returns null (status [`status::NOMEM`] or [`status::INVAL`]) when the
/// request is empty, overflows, or the allocator refuses it.
pub(crate) fn raw_alloc<U>(count: usize, zeroed: bool) -> *mut U {
    let Ok(layout) = Layout::array::<U>(count) else {
        return fail(status::INVAL);
    };
    if layout.size() == 0 {
        return fail(status::INVAL);
    }
    if injected_failure() {
        update_stats(AllocStats::record_failure);
        return fail(status::NOMEM);
    }
    // SAFETY: layout has a non-zero size.
    let raw = unsafe {
        if zeroed {
            std::alloc::alloc_zeroed(layout)
        } else {
            std::alloc::alloc(layout)
        }
    };
    if raw.is_null() {
        update_stats(AllocStats::record_failure);
        return fail(status::NOMEM);
    }
    update_stats(|s| s.record_alloc(layout.size()));
    raw.cast()
}

/// Release memory obtained from [`raw_alloc`].
///
/// # Safety
///
/// `ptr` must come from `raw_alloc::<U>(count, _)` with the same `count`
/// and must not have been released before.
pub(crate) unsafe fn raw_free<U>(ptr: *mut U, count: usize) {
    if ptr.is_null() {
        return;
    }
    let Ok(layout) = Layout::array::<U>(count) else {
        return;
    };
    // SAFETY: guaranteed by the caller.
    unsafe { std::alloc::dealloc(ptr.cast(), layout) };
    update_stats(|s| s.record_dealloc(layout.size()));
}

/// Allocate a single header struct initialised with `value`.
pub(crate) fn alloc_header<H>(value: H) -> *mut H {
    let ptr = raw_alloc::<H>(1, false);
    if !ptr.is_null() {
        // SAFETY: freshly allocated, properly aligned for H.
        unsafe { ptr.write(value) };
    }
    ptr
}

/// Release a header obtained from [`alloc_header`].
///
/// # Safety
///
/// Same contract as [`raw_free`] with a count of one.
pub(crate) unsafe fn free_header<H>(ptr: *mut H) {
    // SAFETY: guaranteed by the caller.
    unsafe { raw_free(ptr, 1) }
}
