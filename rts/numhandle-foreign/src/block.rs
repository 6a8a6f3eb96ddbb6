//! Data blocks: the contiguous storage owned by vectors and matrices.

use crate::{alloc_header, fail, free_header, raw_alloc, raw_free, status, Element};

/// A contiguous array of `size` elements.
#[repr(C)]
#[derive(Debug)]
pub struct RawBlock<T> {
    /// Number of elements.
    pub size: usize,
    /// Element storage.
    pub data: *mut T,
}

/// Allocate a block of `n` elements.
///
/// Returns null with [`status::INVAL`] for `n == 0` and
/// [`status::NOMEM`] when memory runs out. Storage is always handed out
/// zeroed so that reading an element nobody wrote is still defined.
#[must_use]
pub fn block_alloc<T: Element>(n: usize) -> *mut RawBlock<T> {
    if n == 0 {
        return fail(status::INVAL);
    }
    let block = alloc_header(RawBlock {
        size: n,
        data: std::ptr::null_mut(),
    });
    if block.is_null() {
        return block;
    }
    let data = raw_alloc::<T>(n, true);
    if data.is_null() {
        // SAFETY: header allocated just above.
        unsafe { free_header(block) };
        return fail(status::NOMEM);
    }
    // SAFETY: header allocated just above.
    unsafe { (*block).data = data };
    block
}

/// Release a block and its storage.
///
/// # Safety
///
/// `block` must be null or come from [`block_alloc`] and
/// not have been released before.
pub unsafe fn block_free<T: Element>(block: *mut RawBlock<T>) {
    if block.is_null() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        raw_free((*block).data, (*block).size);
        free_header(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stats, take_last_status};

    #[test]
    fn test_block_alloc_and_free() {
        let before = stats().live();
        let block = block_alloc::<f64>(8);
        assert!(!block.is_null());
        unsafe {
            assert_eq!((*block).size, 8);
            assert_eq!(*(*block).data.add(7), 0.0);
        }
        assert_eq!(stats().live(), before + 2);

        unsafe { block_free(block) };
        assert_eq!(stats().live(), before);
    }

    #[test]
    fn test_zero_length_block_rejected() {
        assert!(block_alloc::<f32>(0).is_null());
        assert_eq!(take_last_status(), status::INVAL);
    }

    #[test]
    fn test_storage_failure_releases_header() {
        let before = stats().live();
        crate::fail_allocations_after(1);
        let block = block_alloc::<u32>(4);
        crate::clear_allocation_faults();

        assert!(block.is_null());
        assert_eq!(take_last_status(), status::NOMEM);
        assert_eq!(stats().live(), before);
    }
}
