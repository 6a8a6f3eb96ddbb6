//! What a foreign object must provide to live inside a [`Handle`].
//!
//! [`ForeignResource`] ties each foreign struct to its allocator and its
//! `free`, and says which shapes are zero-sized. [`ForeignCopy`] adds the
//! library's `memcpy` for types that support deep copies.
//!
//! Zero-sized shapes never reach the foreign allocator (it rejects them).
//! The handle builds a *sentinel* instead: a header with null data,
//! constructed in Rust and released through `Box`, never through the
//! foreign `free`.
//!
//! [`Handle`]: crate::Handle

use std::fmt;
use std::os::raw::c_int;

use numhandle_foreign::combination::{combination_calloc, combination_free, combination_memcpy};
use numhandle_foreign::integration::{integration_workspace_alloc, integration_workspace_free};
use numhandle_foreign::matrix::{matrix_alloc, matrix_free, matrix_memcpy, matrix_ptr};
use numhandle_foreign::vector::{vector_alloc, vector_free, vector_memcpy, vector_ptr};
use numhandle_foreign::{Element, RawCombination, RawMatrix, RawVector, RawWorkspace};

/// A struct allocated and released by the foreign library.
///
/// # Safety
///
/// Implementations must pair [`alloc`](Self::alloc) with the matching
/// [`free`](Self::free) and report shapes truthfully: every method that
/// takes a pointer may assume it came from `alloc`, from a foreign view
/// constructor of the same type, or from [`sentinel`](Self::sentinel).
pub unsafe trait ForeignResource: Sized + 'static {
    /// Dimensions requested at allocation.
    type Shape: Copy + fmt::Debug + PartialEq;

    /// Short name used in diagnostics.
    const KIND: &'static str;

    /// Call the foreign allocator. Null on failure.
    fn alloc(shape: Self::Shape) -> *mut Self;

    /// Call the foreign `free`.
    ///
    /// # Safety
    ///
    /// `ptr` must be live and not released before.
    unsafe fn free(ptr: *mut Self);

    /// Whether `shape` has no elements.
    fn is_zero(shape: Self::Shape) -> bool;

    /// A header for a zero-sized `shape` with no data.
    fn sentinel(shape: Self::Shape) -> Self;

    /// The shape of a live object.
    ///
    /// # Safety
    ///
    /// `ptr` must be live.
    unsafe fn shape(ptr: *const Self) -> Self::Shape;

    /// Write the contents of a live object for `Debug` output.
    ///
    /// # Safety
    ///
    /// `ptr` must be live.
    unsafe fn fmt_contents(ptr: *const Self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// A foreign resource the library can copy element by element.
///
/// # Safety
///
/// Same contract as [`ForeignResource`].
pub unsafe trait ForeignCopy: ForeignResource {
    /// Call the foreign `memcpy`, returning its status.
    ///
    /// # Safety
    ///
    /// Both pointers must be live objects of the same shape.
    unsafe fn copy(dst: *mut Self, src: *const Self) -> c_int;
}

// ============================================================================
// Vectors
// ============================================================================

unsafe impl<T: Element> ForeignResource for RawVector<T> {
    type Shape = usize;

    const KIND: &'static str = "vector";

    fn alloc(n: usize) -> *mut Self {
        vector_alloc::<T>(n)
    }

    unsafe fn free(ptr: *mut Self) {
        // SAFETY: forwarded contract.
        unsafe { vector_free(ptr) }
    }

    fn is_zero(n: usize) -> bool {
        n == 0
    }

    fn sentinel(_n: usize) -> Self {
        RawVector {
            size: 0,
            stride: 1,
            data: std::ptr::null_mut(),
            block: std::ptr::null_mut(),
            owner: 0,
        }
    }

    unsafe fn shape(ptr: *const Self) -> usize {
        // SAFETY: forwarded contract.
        unsafe { (*ptr).size }
    }

    unsafe fn fmt_contents(ptr: *const Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: forwarded contract; indices stay below size.
        let n = unsafe { (*ptr).size };
        f.debug_list()
            .entries((0..n).map(|i| unsafe { vector_ptr(ptr, i).read() }))
            .finish()
    }
}

unsafe impl<T: Element> ForeignCopy for RawVector<T> {
    unsafe fn copy(dst: *mut Self, src: *const Self) -> c_int {
        // SAFETY: forwarded contract.
        unsafe { vector_memcpy(dst, src) }
    }
}

// ============================================================================
// Matrices
// ============================================================================

unsafe impl<T: Element> ForeignResource for RawMatrix<T> {
    type Shape = (usize, usize);

    const KIND: &'static str = "matrix";

    fn alloc((n1, n2): (usize, usize)) -> *mut Self {
        matrix_alloc::<T>(n1, n2)
    }

    unsafe fn free(ptr: *mut Self) {
        // SAFETY: forwarded contract.
        unsafe { matrix_free(ptr) }
    }

    fn is_zero((n1, n2): (usize, usize)) -> bool {
        n1 == 0 || n2 == 0
    }

    fn sentinel((n1, n2): (usize, usize)) -> Self {
        RawMatrix {
            size1: n1,
            size2: n2,
            tda: n2,
            data: std::ptr::null_mut(),
            block: std::ptr::null_mut(),
            owner: 0,
        }
    }

    unsafe fn shape(ptr: *const Self) -> (usize, usize) {
        // SAFETY: forwarded contract.
        unsafe { ((*ptr).size1, (*ptr).size2) }
    }

    unsafe fn fmt_contents(ptr: *const Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: forwarded contract.
        let (rows, cols) = unsafe { Self::shape(ptr) };
        if rows == 0 || cols == 0 {
            return f.write_str("[]");
        }
        let mut list = f.debug_list();
        for i in 0..rows {
            // SAFETY: (i, j) inside the shape.
            let row: Vec<T> = (0..cols).map(|j| unsafe { matrix_ptr(ptr, i, j).read() }).collect();
            list.entry(&row);
        }
        list.finish()
    }
}

unsafe impl<T: Element> ForeignCopy for RawMatrix<T> {
    unsafe fn copy(dst: *mut Self, src: *const Self) -> c_int {
        // SAFETY: forwarded contract.
        unsafe { matrix_memcpy(dst, src) }
    }
}

// ============================================================================
// Combinations
// ============================================================================

unsafe impl ForeignResource for RawCombination {
    /// `(n, k)`.
    type Shape = (usize, usize);

    const KIND: &'static str = "combination";

    fn alloc((n, k): (usize, usize)) -> *mut Self {
        combination_calloc(n, k)
    }

    unsafe fn free(ptr: *mut Self) {
        // SAFETY: forwarded contract.
        unsafe { combination_free(ptr) }
    }

    fn is_zero((_, k): (usize, usize)) -> bool {
        k == 0
    }

    fn sentinel((n, _): (usize, usize)) -> Self {
        RawCombination {
            n,
            k: 0,
            data: std::ptr::null_mut(),
        }
    }

    unsafe fn shape(ptr: *const Self) -> (usize, usize) {
        // SAFETY: forwarded contract.
        unsafe { ((*ptr).n, (*ptr).k) }
    }

    unsafe fn fmt_contents(ptr: *const Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: forwarded contract.
        let (_, k) = unsafe { Self::shape(ptr) };
        f.debug_set()
            .entries((0..k).map(|i| unsafe { (*ptr).data.add(i).read() }))
            .finish()
    }
}

unsafe impl ForeignCopy for RawCombination {
    unsafe fn copy(dst: *mut Self, src: *const Self) -> c_int {
        // SAFETY: forwarded contract.
        unsafe { combination_memcpy(dst, src) }
    }
}

// ============================================================================
// Integration workspaces
// ============================================================================

unsafe impl ForeignResource for RawWorkspace {
    /// Subinterval limit.
    type Shape = usize;

    const KIND: &'static str = "integration workspace";

    fn alloc(limit: usize) -> *mut Self {
        integration_workspace_alloc(limit)
    }

    unsafe fn free(ptr: *mut Self) {
        // SAFETY: forwarded contract.
        unsafe { integration_workspace_free(ptr) }
    }

    fn is_zero(limit: usize) -> bool {
        limit == 0
    }

    fn sentinel(_limit: usize) -> Self {
        RawWorkspace {
            limit: 0,
            size: 0,
            alist: std::ptr::null_mut(),
            blist: std::ptr::null_mut(),
            rlist: std::ptr::null_mut(),
            elist: std::ptr::null_mut(),
            level: std::ptr::null_mut(),
        }
    }

    unsafe fn shape(ptr: *const Self) -> usize {
        // SAFETY: forwarded contract.
        unsafe { (*ptr).limit }
    }

    unsafe fn fmt_contents(ptr: *const Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: forwarded contract.
        let (limit, size) = unsafe { ((*ptr).limit, (*ptr).size) };
        write!(f, "{size}/{limit} subintervals")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shapes() {
        assert!(RawVector::<f64>::is_zero(0));
        assert!(!RawVector::<f64>::is_zero(1));
        assert!(RawMatrix::<f64>::is_zero((0, 4)));
        assert!(RawMatrix::<f64>::is_zero((3, 0)));
        assert!(RawCombination::is_zero((5, 0)));
        assert!(RawWorkspace::is_zero(0));
    }

    #[test]
    fn test_sentinel_headers_have_no_data() {
        let v = RawVector::<f32>::sentinel(0);
        assert_eq!(v.size, 0);
        assert!(v.data.is_null());
        assert_eq!(v.owner, 0);

        let m = RawMatrix::<f64>::sentinel((0, 4));
        assert_eq!((m.size1, m.size2), (0, 4));
        assert!(m.data.is_null());
        assert!(m.block.is_null());
    }

    #[test]
    fn test_shape_reads_live_object() {
        let m = RawMatrix::<u32>::alloc((2, 5));
        assert!(!m.is_null());
        unsafe {
            assert_eq!(RawMatrix::shape(m), (2, 5));
            RawMatrix::free(m);
        }
    }
}
