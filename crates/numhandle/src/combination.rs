//! Combinations of `k` indices out of `n`, stepped in lexicographic order.
//!
//! ```rust
//! use numhandle::Combination;
//!
//! let mut c = Combination::new(4, 2)?;
//! let mut all = vec![c.to_vec()];
//! while c.next() {
//!     all.push(c.to_vec());
//! }
//! assert_eq!(all.len(), 6);
//! assert_eq!(all.last(), Some(&vec![2, 3]));
//! # Ok::<(), numhandle::Error>(())
//! ```

use std::marker::PhantomData;

use numhandle_foreign::combination::{
    combination_get, combination_init_first, combination_init_last, combination_next, combination_prev,
    combination_valid,
};
use numhandle_foreign::{status, RawCombination};

use crate::handle::Handle;
use crate::iter::{Cursor, Iter, Projection, ReadOnlyProjection};
use crate::{check_status, report, Error, ErrorCode, Result, CHECKS_ENABLED};

/// An owning, reference-counted combination.
pub type Combination = Handle<RawCombination>;

impl Combination {
    /// Allocate a combination of `k` out of `n`, set to `{0, ..., k-1}`.
    ///
    /// `k == 0` gives a sentinel with no indices.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `k > n`, and
    /// [`Error::AllocationFailure`] when the foreign allocator fails.
    pub fn new(n: usize, k: usize) -> Result<Self> {
        if CHECKS_ENABLED && k > n {
            report!(ErrorCode::InvalidArgument, "combination of {k} out of {n}");
            return Err(Error::InvalidArgument(format!("k = {k} exceeds n = {n}")));
        }
        Self::allocate((n, k))
    }

    /// Size of the set drawn from.
    #[must_use]
    pub fn n(&self) -> usize {
        self.shape().map_or(0, |(n, _)| n)
    }

    /// Number of chosen indices.
    #[must_use]
    pub fn k(&self) -> usize {
        self.shape().map_or(0, |(_, k)| k)
    }

    /// Index `i`. Out of range reports and returns 0.
    #[must_use]
    pub fn get(&self, i: usize) -> usize {
        self.try_get(i).unwrap_or_else(|| {
            report!(
                ErrorCode::InvalidArgument,
                "index {i} out of range for combination of {}",
                self.k()
            );
            0
        })
    }

    /// Index `i`, `None` when out of range.
    #[must_use]
    pub fn try_get(&self, i: usize) -> Option<usize> {
        // SAFETY: i below k of a live combination.
        (i < self.k()).then(|| unsafe { combination_get(self.as_ptr(), i) })
    }

    /// Copy the indices out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// The live, non-sentinel header, or `None`. An empty handle reports.
    fn stepping(&self, what: &str) -> Option<*mut RawCombination> {
        let c = self.as_ptr();
        if c.is_null() {
            report!(ErrorCode::Fault, "{what} on an empty combination");
            return None;
        }
        (self.k() > 0).then_some(c)
    }

    /// Reset to the lexicographically first combination.
    pub fn init_first(&mut self) {
        if let Some(c) = self.stepping("init_first") {
            // SAFETY: live, non-sentinel.
            unsafe { combination_init_first(c) };
        }
    }

    /// Reset to the lexicographically last combination.
    pub fn init_last(&mut self) {
        if let Some(c) = self.stepping("init_last") {
            // SAFETY: live, non-sentinel.
            unsafe { combination_init_last(c) };
        }
    }

    /// Advance to the next combination. Returns `false`, leaving `self`
    /// unchanged, when already at the last one.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        self.stepping("next")
            // SAFETY: live, non-sentinel.
            .is_some_and(|c| unsafe { combination_next(c) } == status::SUCCESS)
    }

    /// Step back to the previous combination. Returns `false`, leaving
    /// `self` unchanged, when already at the first one.
    pub fn prev(&mut self) -> bool {
        self.stepping("prev")
            // SAFETY: live, non-sentinel.
            .is_some_and(|c| unsafe { combination_prev(c) } == status::SUCCESS)
    }

    /// Check that the indices are in range and strictly increasing.
    ///
    /// # Errors
    ///
    /// [`Error::Fault`] for an empty handle, [`Error::Foreign`] when the
    /// indices are not a valid combination.
    pub fn valid(&self) -> Result<()> {
        let c = self.as_ptr();
        if c.is_null() {
            report!(ErrorCode::Fault, "validating an empty combination");
            return Err(Error::Fault("combination"));
        }
        // SAFETY: c is live.
        check_status(unsafe { combination_valid(c) }, "combination is not valid")
    }

    /// Overwrite index `i` without keeping the combination valid.
    ///
    /// Out of range reports and does nothing.
    pub fn overwrite(&mut self, i: usize, x: usize) {
        if i < self.k() {
            // SAFETY: i below k of a live combination.
            unsafe { (*self.as_ptr()).data.add(i).write(x) };
        } else {
            report!(
                ErrorCode::InvalidArgument,
                "index {i} out of range for combination of {}",
                self.k()
            );
        }
    }

    /// Iterate the indices.
    #[must_use]
    pub fn iter(&self) -> Iter<Indices<'_>> {
        Iter::new(Indices::new(self.as_ptr()))
    }

    /// Cursor at the first index.
    #[must_use]
    pub fn cursor_begin(&self) -> Cursor<Indices<'_>, false> {
        Cursor::begin(Indices::new(self.as_ptr()))
    }

    /// Cursor one past the last index.
    #[must_use]
    pub fn cursor_end(&self) -> Cursor<Indices<'_>, false> {
        Cursor::end(Indices::new(self.as_ptr()))
    }

    /// Reverse cursor at the last index.
    #[must_use]
    pub fn cursor_rbegin(&self) -> Cursor<Indices<'_>, true> {
        Cursor::begin(Indices::new(self.as_ptr()))
    }

    /// Reverse cursor one before the first index.
    #[must_use]
    pub fn cursor_rend(&self) -> Cursor<Indices<'_>, true> {
        Cursor::end(Indices::new(self.as_ptr()))
    }
}

impl<'a> IntoIterator for &'a Combination {
    type Item = usize;
    type IntoIter = Iter<Indices<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Projects a position onto the combination's index there.
#[derive(Clone, Copy)]
pub struct Indices<'a> {
    c: *mut RawCombination,
    _owner: PhantomData<&'a RawCombination>,
}

impl Indices<'_> {
    fn new(c: *mut RawCombination) -> Self {
        Self { c, _owner: PhantomData }
    }
}

impl ReadOnlyProjection for Indices<'_> {}

impl Projection for Indices<'_> {
    type Item = usize;

    fn owner(&self) -> *const () {
        self.c.cast_const().cast()
    }

    fn len(&self) -> usize {
        // SAFETY: null or live for the projection's borrow.
        unsafe { self.c.as_ref() }.map_or(0, |c| c.k)
    }

    unsafe fn project(&self, index: usize) -> usize {
        // SAFETY: index below k, owner alive.
        unsafe { combination_get(self.c, index) }
    }

    fn fallback(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::testing::capture;

    #[test]
    fn test_starts_at_first() {
        let c = Combination::new(5, 3).unwrap();
        assert_eq!((c.n(), c.k()), (5, 3));
        assert_eq!(c.to_vec(), vec![0, 1, 2]);
        assert!(c.valid().is_ok());
    }

    #[test]
    fn test_walk_forward_then_back() {
        let mut c = Combination::new(4, 2).unwrap();
        let mut steps = 0;
        while c.next() {
            steps += 1;
        }
        assert_eq!(steps, 5);
        assert_eq!(c.to_vec(), vec![2, 3]);
        assert!(!c.next());
        while c.prev() {}
        assert_eq!(c.to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_init_last() {
        let mut c = Combination::new(6, 2).unwrap();
        c.init_last();
        assert_eq!(c.to_vec(), vec![4, 5]);
        c.init_first();
        assert_eq!(c.to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_k_greater_than_n() {
        let (result, reports) = capture(|| Combination::new(2, 3));
        assert!(result.is_err());
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_zero_k_is_sentinel() {
        let mut c = Combination::new(3, 0).unwrap();
        assert!(c.is_sentinel());
        assert_eq!(c.n(), 3);
        assert_eq!(c.k(), 0);
        assert!(!c.next());
        assert!(c.iter().next().is_none());
        let (x, reports) = capture(|| c.get(0));
        assert_eq!(x, 0);
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_stepping_an_empty_handle_faults() {
        let mut c = Combination::default();
        let (moved, reports) = capture(|| {
            c.init_first();
            c.init_last();
            c.next() || c.prev()
        });
        assert!(!moved);
        assert_eq!(reports.len(), 4);
        assert!(reports.iter().all(|r| r.code == ErrorCode::Fault));

        let mut sentinel = Combination::new(3, 0).unwrap();
        let (moved, reports) = capture(|| {
            sentinel.init_first();
            sentinel.next()
        });
        assert!(!moved);
        assert!(reports.is_empty());
    }

    #[test]
    fn test_invalid_after_manual_edit() {
        let mut c = Combination::new(4, 2).unwrap();
        c.overwrite(0, 3);
        let (result, reports) = capture(|| c.valid());
        assert_eq!(result, Err(Error::Foreign { code: status::FAILURE }));
        assert_eq!(reports[0].code, ErrorCode::Failure);
    }

    #[test]
    fn test_deep_clone_and_share() {
        let mut c = Combination::new(5, 2).unwrap();
        c.next();
        let copy = c.deep_clone().unwrap();
        let alias = c.share();
        c.next();
        assert_eq!(copy.to_vec(), vec![0, 2]);
        assert_eq!(alias.to_vec(), vec![0, 3]);
    }

    #[test]
    fn test_cursors() {
        let c = Combination::new(5, 3).unwrap();
        assert_eq!(c.cursor_end() - c.cursor_begin(), 3);
        assert_eq!(c.cursor_rbegin().get(), 2);
        let reversed: Vec<usize> = c.iter().rev().collect();
        assert_eq!(reversed, vec![2, 1, 0]);
        let mut sum = 0;
        for x in &c {
            sum += x;
        }
        assert_eq!(sum, 3);
    }
}
