//! Position-based cursors and the iterators built on them.
//!
//! A [`Cursor`] pairs a [`Projection`] (a non-owning back-reference to
//! the thing being walked) with a signed position. Dereferencing builds a
//! fresh item every time: a row cursor over a matrix hands out a new row
//! [`View`](crate::View) on each [`Cursor::get`], all aliasing the same
//! memory.
//!
//! ## Positions
//!
//! ```text
//!   rend   rbegin                       end
//!    -1      0      1     ...   n-1      n
//!     ·  [  item   item   ...   item  ]  ·
//!           begin                 rbegin (reverse)
//! ```
//!
//! Only `[0, n)` can be dereferenced; `-1` and `n` are the reverse and
//! forward end sentinels. The direction is the `REVERSE` parameter:
//! a reverse cursor moves toward `-1` on [`Cursor::increment`].
//!
//! [`Cursor::offset`] does not clamp. A result outside `[-1, n]` keeps
//! its position and is reported when it is built (only with
//! [`CHECKS_ENABLED`](crate::CHECKS_ENABLED)); dereferencing it reports
//! again and yields the projection's fallback value.

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::{Add, Sub};

use crate::{report, ErrorCode, CHECKS_ENABLED};

/// How a cursor turns a position into an item.
pub trait Projection: Copy {
    /// What dereferencing yields.
    type Item;

    /// Identity of the object being walked.
    fn owner(&self) -> *const ();

    /// Number of dereferenceable positions.
    fn len(&self) -> usize;

    /// Whether there are no positions to visit.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `index`.
    ///
    /// # Safety
    ///
    /// `index < self.len()`, and the owner is still alive.
    unsafe fn project(&self, index: usize) -> Self::Item;

    /// The safe default returned for an invalid dereference.
    fn fallback(&self) -> Self::Item;
}

/// A position over a [`Projection`].
#[derive(Clone, Copy)]
pub struct Cursor<P: Projection, const REVERSE: bool> {
    proj: P,
    position: isize,
}

#[allow(clippy::cast_possible_wrap)]
fn signed(n: usize) -> isize {
    n as isize
}

impl<P: Projection, const REVERSE: bool> Cursor<P, REVERSE> {
    /// A cursor at an arbitrary position.
    #[must_use]
    pub fn new(proj: P, position: isize) -> Self {
        Self { proj, position }
    }

    /// First position in this direction: `0`, or `n - 1` when reversed.
    #[must_use]
    pub fn begin(proj: P) -> Self {
        let position = if REVERSE { signed(proj.len()) - 1 } else { 0 };
        Self::new(proj, position)
    }

    /// One past the last position: `n`, or `-1` when reversed.
    #[must_use]
    pub fn end(proj: P) -> Self {
        let position = if REVERSE { -1 } else { signed(proj.len()) };
        Self::new(proj, position)
    }

    #[inline]
    fn step() -> isize {
        if REVERSE {
            -1
        } else {
            1
        }
    }

    /// The raw position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> isize {
        self.position
    }

    /// Number of dereferenceable positions of the owner.
    #[inline]
    #[must_use]
    pub fn owner_len(&self) -> usize {
        self.proj.len()
    }

    fn index(&self) -> Option<usize> {
        usize::try_from(self.position).ok().filter(|&i| i < self.proj.len())
    }

    fn in_bounds(&self, position: isize) -> bool {
        (-1..=signed(self.proj.len())).contains(&position)
    }

    /// Step once in this cursor's direction, stopping at the end sentinel.
    pub fn increment(&mut self) -> &mut Self {
        self.position = self.position.saturating_add(Self::step()).clamp(-1, signed(self.proj.len()));
        self
    }

    /// Step once against this cursor's direction.
    pub fn decrement(&mut self) -> &mut Self {
        self.position = self.position.saturating_sub(Self::step()).clamp(-1, signed(self.proj.len()));
        self
    }

    /// The item at the current position.
    ///
    /// Outside `[0, n)` this reports through the error hook and returns
    /// the projection's fallback.
    pub fn get(&self) -> P::Item {
        match self.try_get() {
            Some(item) => item,
            None => {
                report!(
                    ErrorCode::InvalidArgument,
                    "cursor position {} is not dereferenceable (length {})",
                    self.position,
                    self.proj.len()
                );
                self.proj.fallback()
            }
        }
    }

    /// The item at the current position, `None` outside `[0, n)`.
    #[must_use]
    pub fn try_get(&self) -> Option<P::Item> {
        // SAFETY: index() is below len.
        self.index().map(|i| unsafe { self.proj.project(i) })
    }

    /// `self[n]`: the item `n` steps away.
    pub fn at(&self, n: isize) -> P::Item {
        Self::new(self.proj, self.shifted(n)).get()
    }

    fn shifted(&self, n: isize) -> isize {
        self.position.saturating_add(n.saturating_mul(Self::step()))
    }

    /// `self + n`. The result is not clamped.
    #[must_use]
    pub fn offset(&self, n: isize) -> Self {
        let position = self.shifted(n);
        if CHECKS_ENABLED && !self.in_bounds(position) {
            report!(
                ErrorCode::InvalidArgument,
                "cursor offset {n} from {} leaves [-1, {}]",
                self.position,
                self.proj.len()
            );
        }
        Self::new(self.proj, position)
    }

    /// `self - other`: steps from `other` to `self` in this direction.
    ///
    /// Cursors over different owners report and give 0. A distance that
    /// does not fit `isize` reports and saturates.
    #[must_use]
    pub fn distance(&self, other: &Self) -> isize {
        if self.proj.owner() != other.proj.owner() {
            report!(ErrorCode::InvalidArgument, "distance between cursors of different owners");
            return 0;
        }
        match self
            .position
            .checked_sub(other.position)
            .and_then(|d| d.checked_mul(Self::step()))
        {
            Some(d) => d,
            None => {
                report!(
                    ErrorCode::InvalidArgument,
                    "distance from {} to {} overflows",
                    other.position,
                    self.position
                );
                if (self.position > other.position) != REVERSE {
                    isize::MAX
                } else {
                    isize::MIN
                }
            }
        }
    }
}

impl<P: Projection, const REVERSE: bool> PartialEq for Cursor<P, REVERSE> {
    fn eq(&self, other: &Self) -> bool {
        self.proj.owner() == other.proj.owner() && self.position == other.position
    }
}

impl<P: Projection, const REVERSE: bool> PartialOrd for Cursor<P, REVERSE> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.proj.owner() != other.proj.owner() {
            report!(ErrorCode::InvalidArgument, "comparing cursors of different owners");
            return None;
        }
        let ord = self.position.cmp(&other.position);
        Some(if REVERSE { ord.reverse() } else { ord })
    }
}

impl<P: Projection, const REVERSE: bool> Add<isize> for Cursor<P, REVERSE> {
    type Output = Self;

    fn add(self, n: isize) -> Self {
        self.offset(n)
    }
}

impl<P: Projection, const REVERSE: bool> Sub<isize> for Cursor<P, REVERSE> {
    type Output = Self;

    fn sub(self, n: isize) -> Self {
        self.offset(n.saturating_neg())
    }
}

impl<P: Projection, const REVERSE: bool> Sub for Cursor<P, REVERSE> {
    type Output = isize;

    fn sub(self, other: Self) -> isize {
        self.distance(&other)
    }
}

impl<P: Projection, const REVERSE: bool> fmt::Debug for Cursor<P, REVERSE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("owner", &self.proj.owner())
            .field("position", &self.position)
            .field("len", &self.proj.len())
            .field("reverse", &REVERSE)
            .finish()
    }
}

// ============================================================================
// Iterator
// ============================================================================

/// A projection whose items only read the owner.
///
/// Only iterators over such projections are `Clone`: cloning an iterator
/// of mutable row views would hand out two `ViewMut`s of one row.
///
/// ```compile_fail
/// use numhandle::prelude::*;
///
/// fn duplicate<I: Clone>(it: &I) -> I {
///     it.clone()
/// }
///
/// let mut m = MatrixF64::zeros(2, 2).unwrap();
/// let rows = m.rows_mut();
/// let _again = duplicate(&rows);
/// ```
pub trait ReadOnlyProjection: Projection {}

/// Double-ended iterator over a [`Projection`], driven by a forward cursor
/// from the front and a reverse cursor from the back.
pub struct Iter<P: Projection> {
    front: Cursor<P, false>,
    back: Cursor<P, true>,
    remaining: usize,
}

impl<P: ReadOnlyProjection> Clone for Iter<P> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<P: Projection> Iter<P> {
    /// Iterate every position of `proj`.
    #[must_use]
    pub fn new(proj: P) -> Self {
        Self {
            front: Cursor::begin(proj),
            back: Cursor::begin(proj),
            remaining: proj.len(),
        }
    }
}

impl<P: Projection> Iterator for Iter<P> {
    type Item = P::Item;

    fn next(&mut self) -> Option<P::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.front.try_get();
        self.front.increment();
        self.remaining -= 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<P: Projection> DoubleEndedIterator for Iter<P> {
    fn next_back(&mut self) -> Option<P::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.back.try_get();
        self.back.increment();
        self.remaining -= 1;
        item
    }
}

impl<P: Projection> ExactSizeIterator for Iter<P> {}

impl<P: Projection> FusedIterator for Iter<P> {}

impl<P: Projection> fmt::Debug for Iter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("front", &self.front.position())
            .field("back", &self.back.position())
            .field("remaining", &self.remaining)
            .finish()
    }
}
