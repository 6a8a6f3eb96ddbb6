//! Reference-counted handles to foreign objects.
//!
//! A [`Handle`] is in one of three states:
//!
//! | State      | Pointer     | `use_count()` | Released by            |
//! |------------|-------------|---------------|------------------------|
//! | empty      | null        | 0             | nothing                |
//! | counted    | live object | strong count  | last handle to go away |
//! | borrowed   | caller's    | 0             | never (caller's job)   |
//!
//! Counted handles share one release guard through an `Rc`. The guard is
//! built around the freshly allocated object *before* the `Rc` exists, so
//! no failure on the way to a handle can leak the object, and the guard's
//! `Drop` releases it exactly once through the path its construction
//! requires:
//!
//! - objects from the foreign allocator (or adopted from the caller) go
//!   back through the foreign `free`;
//! - zero-sized sentinels were built in Rust and go back through `Box`.
//!
//! [`Handle::share`] and [`Handle::deep_clone`] are separate, named
//! operations. `Handle` deliberately does not implement `Clone`.

use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::resource::{ForeignCopy, ForeignResource};
use crate::{report, Error, ErrorCode, Result};

/// How a guarded object is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    /// Through [`ForeignResource::free`].
    Foreign,
    /// Through `Box` drop.
    Sentinel,
}

/// Sole owner of one foreign object.
struct ReleaseGuard<R: ForeignResource> {
    ptr: NonNull<R>,
    release: Release,
}

impl<R: ForeignResource> Drop for ReleaseGuard<R> {
    fn drop(&mut self) {
        tracing::trace!(kind = R::KIND, ptr = ?self.ptr, release = ?self.release, "releasing");
        match self.release {
            // SAFETY: the guard is the only owner and runs once.
            Release::Foreign => unsafe { R::free(self.ptr.as_ptr()) },
            // SAFETY: sentinels come from Box::leak in Handle::allocate.
            Release::Sentinel => drop(unsafe { Box::from_raw(self.ptr.as_ptr()) }),
        }
    }
}

enum Slot<R: ForeignResource> {
    Empty,
    Counted(Rc<ReleaseGuard<R>>),
    Borrowed(NonNull<R>),
}

/// A shared handle to a foreign object of type `R`.
///
/// Handles are `!Send` and `!Sync`: the count is not atomic.
pub struct Handle<R: ForeignResource> {
    slot: Slot<R>,
}

impl<R: ForeignResource> Handle<R> {
    /// An empty handle: null pointer, no count.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self { slot: Slot::Empty }
    }

    /// Allocate a new object of the given shape.
    ///
    /// A shape with a zero dimension yields a sentinel without calling the
    /// foreign allocator: constructed (not [`is_null`](Self::is_null)),
    /// but with no elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] when the foreign allocator
    /// returns null.
    pub fn allocate(shape: R::Shape) -> Result<Self> {
        if R::is_zero(shape) {
            let ptr = NonNull::from(Box::leak(Box::new(R::sentinel(shape))));
            tracing::trace!(kind = R::KIND, ?shape, ?ptr, "allocated sentinel");
            return Ok(Self::guarded(ptr, Release::Sentinel));
        }
        let Some(ptr) = NonNull::new(R::alloc(shape)) else {
            let code = numhandle_foreign::take_last_status();
            report!(
                ErrorCode::from_status(code),
                "failed to allocate {} of shape {:?}",
                R::KIND,
                shape
            );
            return Err(Error::AllocationFailure(format!(
                "{} of shape {shape:?}: {}",
                R::KIND,
                numhandle_foreign::status::name(code)
            )));
        };
        tracing::trace!(kind = R::KIND, ?shape, ?ptr, "allocated");
        Ok(Self::guarded(ptr, Release::Foreign))
    }

    /// Take ownership of an object the caller allocated through the
    /// foreign library. A null pointer gives an empty handle.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live object from the foreign allocator (or a
    /// foreign view constructor) of type `R` that nobody else will free.
    #[must_use]
    pub unsafe fn adopt(raw: *mut R) -> Self {
        match NonNull::new(raw) {
            Some(ptr) => {
                tracing::trace!(kind = R::KIND, ?ptr, "adopted");
                Self::guarded(ptr, Release::Foreign)
            }
            None => Self::empty(),
        }
    }

    fn guarded(ptr: NonNull<R>, release: Release) -> Self {
        let guard = ReleaseGuard { ptr, release };
        Self {
            slot: Slot::Counted(Rc::new(guard)),
        }
    }

    /// Another handle to the same object, bumping the count.
    ///
    /// Sharing a borrowed alias gives another borrowed alias.
    #[must_use]
    pub fn share(&self) -> Self {
        let slot = match &self.slot {
            Slot::Empty => Slot::Empty,
            Slot::Counted(guard) => Slot::Counted(Rc::clone(guard)),
            Slot::Borrowed(ptr) => Slot::Borrowed(*ptr),
        };
        Self { slot }
    }

    /// Drop this handle's reference and share `other` instead.
    ///
    /// Assigning a handle to itself is a no-op.
    pub fn assign(&mut self, other: &Self) {
        *self = other.share();
    }

    /// Move the reference out, leaving this handle empty.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Drop this handle's reference and become empty.
    pub fn reset(&mut self) {
        self.slot = Slot::Empty;
    }

    /// Drop this handle's reference and alias `raw` without counting it.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a live object of type `R` that stays alive,
    /// and is released by someone else, for as long as this handle or any
    /// handle shared from it is used.
    pub unsafe fn alias_unchecked(&mut self, raw: *mut R) {
        self.slot = NonNull::new(raw).map_or(Slot::Empty, Slot::Borrowed);
    }

    /// Number of counted handles sharing the object; 0 when empty or
    /// borrowed.
    #[inline]
    #[must_use]
    pub fn use_count(&self) -> usize {
        match &self.slot {
            Slot::Counted(guard) => Rc::strong_count(guard),
            Slot::Empty | Slot::Borrowed(_) => 0,
        }
    }

    /// Whether this is the only counted handle to its object.
    #[inline]
    #[must_use]
    pub fn unique(&self) -> bool {
        self.use_count() == 1
    }

    /// The raw foreign pointer; null when empty.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *mut R {
        match &self.slot {
            Slot::Empty => std::ptr::null_mut(),
            Slot::Counted(guard) => guard.ptr.as_ptr(),
            Slot::Borrowed(ptr) => ptr.as_ptr(),
        }
    }

    /// Whether the handle is empty.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.slot, Slot::Empty)
    }

    /// Whether the handle holds a zero-sized sentinel.
    #[inline]
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(&self.slot, Slot::Counted(guard) if guard.release == Release::Sentinel)
    }

    /// Whether the handle is an uncounted alias.
    #[inline]
    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.slot, Slot::Borrowed(_))
    }

    /// The shape of the object, `None` when empty.
    #[must_use]
    pub fn shape(&self) -> Option<R::Shape> {
        let ptr = self.as_ptr();
        // SAFETY: a non-null pointer held by a handle is live.
        (!ptr.is_null()).then(|| unsafe { R::shape(ptr) })
    }
}

impl<R: ForeignCopy> Handle<R> {
    /// A new object with the same shape and contents.
    ///
    /// The copy has its own count (`use_count() == 1`) and pointer.
    /// Cloning an empty handle gives an empty handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] if allocation fails and
    /// [`Error::Foreign`] if the foreign copy does.
    pub fn deep_clone(&self) -> Result<Self> {
        let Some(shape) = self.shape() else {
            return Ok(Self::empty());
        };
        let copy = Self::allocate(shape)?;
        if !copy.is_sentinel() {
            // SAFETY: both live, same shape.
            let code = unsafe { R::copy(copy.as_ptr(), self.as_ptr()) };
            crate::check_status(code, &format!("copy of {}", R::KIND))?;
        }
        tracing::debug!(kind = R::KIND, ?shape, from = ?self.as_ptr(), to = ?copy.as_ptr(), "deep clone");
        Ok(copy)
    }
}

impl<R: ForeignResource> Default for Handle<R> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Writes the object's contents through [`ForeignResource::fmt_contents`].
pub(crate) struct Contents<R>(pub(crate) *const R);

impl<R: ForeignResource> fmt::Debug for Contents<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_null() {
            return f.write_str("null");
        }
        // SAFETY: only built from pointers held by live handles.
        unsafe { R::fmt_contents(self.0, f) }
    }
}

impl<R: ForeignResource> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &R::KIND)
            .field("shape", &self.shape())
            .field("use_count", &self.use_count())
            .field("contents", &Contents(self.as_ptr()))
            .finish()
    }
}
