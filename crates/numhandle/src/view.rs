//! Non-owning views into a handle's memory.
//!
//! A view is a foreign header built by one of the library's view
//! constructors (`owner == 0`): it points into its owner's data block but
//! never frees it. The header itself is refcounted like any other foreign
//! object, so views can be cloned and dropped freely.
//!
//! The lifetime parameter borrows the owner:
//!
//! ```compile_fail
//! use numhandle::prelude::*;
//!
//! let m = MatrixF64::alloc(2, 2).unwrap();
//! let row = m.row(0);
//! drop(m); // error: `m` is still borrowed by `row`
//! row.get(0);
//! ```
//!
//! A request that does not fit the owner is reported through the error
//! hook and yields an *empty* view: `len() == 0`, every read returns the
//! element type's default.

use std::fmt;
use std::marker::PhantomData;

use crate::handle::{Contents, Handle};
use crate::resource::{ForeignCopy, ForeignResource};
use crate::Result;

/// A read-only view borrowing its owner for `'a`.
pub struct View<'a, R: ForeignResource> {
    handle: Handle<R>,
    _owner: PhantomData<&'a R>,
}

/// A mutable view borrowing its owner exclusively for `'a`.
pub struct ViewMut<'a, R: ForeignResource> {
    handle: Handle<R>,
    _owner: PhantomData<&'a mut R>,
}

macro_rules! common_view_methods {
    () => {
        /// An empty view.
        #[must_use]
        pub fn empty() -> Self {
            Self {
                handle: Handle::empty(),
                _owner: PhantomData,
            }
        }

        /// Wrap a header returned by a foreign view constructor.
        ///
        /// # Safety
        ///
        /// `raw` must be null or a fresh foreign view header whose data
        /// stays valid for `'a`.
        pub(crate) unsafe fn from_raw(raw: *mut R) -> Self {
            Self {
                // SAFETY: forwarded contract.
                handle: unsafe { Handle::adopt(raw) },
                _owner: PhantomData,
            }
        }

        /// Whether this is an empty view.
        #[inline]
        #[must_use]
        pub fn is_null(&self) -> bool {
            self.handle.is_null()
        }

        /// The foreign view header; null when empty.
        #[inline]
        #[must_use]
        pub fn as_ptr(&self) -> *mut R {
            self.handle.as_ptr()
        }

        /// Number of views sharing this header.
        #[inline]
        #[must_use]
        pub fn use_count(&self) -> usize {
            self.handle.use_count()
        }

        /// The view's shape, `None` when empty.
        #[must_use]
        pub fn shape(&self) -> Option<R::Shape> {
            self.handle.shape()
        }
    };
}

impl<'a, R: ForeignResource> View<'a, R> {
    common_view_methods!();
}

impl<'a, R: ForeignResource> ViewMut<'a, R> {
    common_view_methods!();

    /// A read-only view of the same region, borrowing this one.
    #[must_use]
    pub fn as_view(&self) -> View<'_, R> {
        View {
            handle: self.handle.share(),
            _owner: PhantomData,
        }
    }

    /// Give up mutable access.
    #[must_use]
    pub fn into_view(self) -> View<'a, R> {
        View {
            handle: self.handle,
            _owner: PhantomData,
        }
    }
}

impl<R: ForeignCopy> View<'_, R> {
    /// Copy the viewed elements into a new owning handle. Strides collapse.
    ///
    /// # Errors
    ///
    /// See [`Handle::deep_clone`].
    pub fn deep_clone(&self) -> Result<Handle<R>> {
        self.handle.deep_clone()
    }
}

impl<R: ForeignCopy> ViewMut<'_, R> {
    /// Copy the viewed elements into a new owning handle. Strides collapse.
    ///
    /// # Errors
    ///
    /// See [`Handle::deep_clone`].
    pub fn deep_clone(&self) -> Result<Handle<R>> {
        self.handle.deep_clone()
    }
}

impl<R: ForeignResource> Clone for View<'_, R> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.share(),
            _owner: PhantomData,
        }
    }
}

impl<R: ForeignResource> Default for View<'_, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: ForeignResource> Default for ViewMut<'_, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: ForeignResource> fmt::Debug for View<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("kind", &R::KIND)
            .field("shape", &self.shape())
            .field("contents", &Contents(self.as_ptr()))
            .finish()
    }
}

impl<R: ForeignResource> fmt::Debug for ViewMut<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewMut")
            .field("kind", &R::KIND)
            .field("shape", &self.shape())
            .field("contents", &Contents(self.as_ptr()))
            .finish()
    }
}
