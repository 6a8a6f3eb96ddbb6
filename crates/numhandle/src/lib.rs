//! # numhandle
//!
//! Value-semantics adapters over objects allocated by a foreign numerical
//! library. The library hands out opaque C structs (vectors, matrices,
//! combinations, integration workspaces) that must be released through
//! its own `free` functions; this crate wraps them so Rust code can share,
//! copy, slice and iterate them without tracking ownership by hand.
//!
//! ## Overview
//!
//! - **[`Handle`]**: a reference-counted owner of one foreign object.
//!   [`Handle::share`] aliases, [`Handle::deep_clone`] copies. The foreign
//!   `free` runs exactly once, when the last counted handle goes away.
//! - **[`View`] / [`ViewMut`]**: non-owning aliases of a region inside an
//!   owner (a row, a column, a strided subvector, a submatrix). A view
//!   borrows its owner, so dropping the owner first does not compile.
//! - **[`Cursor`]** and [`Iter`]: position-based iteration that builds a
//!   fresh item (a row view, an element) on every dereference.
//! - **Error hook**: misuse detected here is reported through
//!   [`hook::report_error`] before the operation degrades or fails.
//!
//! ## Ownership Model
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          Rust side                            │
//! │                                                               │
//! │  Handle ──share──> Handle        View<'a> ─borrows─> Handle   │
//! │     │                 │              │                        │
//! │     └──────┬──────────┘              │ (own header only)      │
//! │            ▼                         ▼                        │
//! │     Rc<ReleaseGuard>          Rc<ReleaseGuard>                │
//! │            │                         │                        │
//! ├────────────┼─────────────────────────┼────────────────────────┤
//! │            ▼      Foreign library    ▼                        │
//! │   RawMatrix { owner: 1 }      RawVector { owner: 0 }          │
//! │        │                            │                         │
//! │        └──────> RawBlock <──────────┘ (aliases, never frees)  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use numhandle::prelude::*;
//!
//! let mut m = MatrixF64::alloc(3, 4)?;
//! m.set(1, 2, 5.0);
//!
//! let row = m.row(1);
//! assert_eq!(row.len(), 4);
//! assert_eq!(row.get(2), 5.0);
//!
//! for (i, row) in m.rows().enumerate() {
//!     assert_eq!(row.len(), 4, "row {i}");
//! }
//! # Ok::<(), numhandle::Error>(())
//! ```
//!
//! ## Configuration
//!
//! The `unchecked` cargo feature turns [`CHECKS_ENABLED`] off. Argument
//! checks that the foreign library repeats itself are then skipped; the
//! bounds checks that keep safe code memory-safe always stay.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod blas;
pub mod combination;
pub mod handle;
pub mod hook;
pub mod integration;
pub mod io;
pub mod iter;
pub mod matrix;
pub mod resource;
pub mod stats;
pub mod vector;
pub mod view;

pub use combination::Combination;
pub use handle::Handle;
pub use hook::{report_error, set_error_handler, take_error_handler, ErrorHandler, ErrorReport};
pub use integration::{qag, Estimate, Workspace};
pub use io::{ReadBinary, WriteBinary};
pub use iter::{Cursor, Iter, Projection, ReadOnlyProjection};
pub use matrix::{Matrix, MatrixMut, MatrixRef};
pub use resource::{ForeignCopy, ForeignResource};
pub use vector::{Vector, VectorMut, VectorRef};
pub use view::{View, ViewMut};

pub use numhandle_foreign::Element;

use numhandle_foreign::status;
use serde::{Deserialize, Serialize};
use std::os::raw::c_int;
use thiserror::Error;

/// Whether the locally added argument checks run.
///
/// `false` only with the `unchecked` feature; every guarded branch then
/// folds away at compile time.
pub const CHECKS_ENABLED: bool = !cfg!(feature = "unchecked");

/// Vector of `f64`.
pub type VectorF64 = Vector<f64>;
/// Vector of `f32`.
pub type VectorF32 = Vector<f32>;
/// Vector of `u32`.
pub type VectorU32 = Vector<u32>;
/// Matrix of `f64`.
pub type MatrixF64 = Matrix<f64>;
/// Matrix of `f32`.
pub type MatrixF32 = Matrix<f32>;
/// Matrix of `u32`.
pub type MatrixU32 = Matrix<u32>;

/// Everything needed for day-to-day use.
pub mod prelude {
    pub use crate::{
        Combination, Element, Handle, MatrixF32, MatrixF64, MatrixMut, MatrixRef, MatrixU32, ReadBinary,
        VectorF32, VectorF64, VectorMut, VectorRef, VectorU32, View, ViewMut, Workspace, WriteBinary,
    };
    pub use crate::{Matrix, Vector};
}

// ============================================================================
// Errors
// ============================================================================

/// Coarse classification passed to the error hook.
///
/// Each code corresponds to one foreign status value; see
/// [`ErrorCode::from_status`] and [`ErrorCode::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Generic failure.
    Failure,
    /// Input outside the function's domain.
    Domain,
    /// Null or empty object where a live one was required.
    Fault,
    /// Invalid argument, including out-of-range indices.
    InvalidArgument,
    /// Failure inside the library, such as an I/O error.
    Failed,
    /// Memory could not be allocated.
    NoMemory,
    /// Iteration limit reached before convergence.
    MaxIterations,
    /// Unusable tolerance.
    BadTolerance,
    /// Roundoff prevented the requested accuracy.
    Roundoff,
    /// Operands of different lengths.
    BadLength,
    /// Input ended before the object was filled.
    EndOfFile,
    /// A status this crate does not know.
    Unknown(i32),
}

impl ErrorCode {
    /// Classify a foreign status value.
    #[must_use]
    pub fn from_status(code: c_int) -> Self {
        match code {
            status::FAILURE => Self::Failure,
            status::EDOM => Self::Domain,
            status::FAULT => Self::Fault,
            status::INVAL => Self::InvalidArgument,
            status::FAILED => Self::Failed,
            status::NOMEM => Self::NoMemory,
            status::MAXITER => Self::MaxIterations,
            status::BADTOL => Self::BadTolerance,
            status::ROUND => Self::Roundoff,
            status::BADLEN => Self::BadLength,
            status::EOF => Self::EndOfFile,
            other => Self::Unknown(other),
        }
    }

    /// The foreign status value for this code.
    #[must_use]
    pub fn status(self) -> c_int {
        match self {
            Self::Failure => status::FAILURE,
            Self::Domain => status::EDOM,
            Self::Fault => status::FAULT,
            Self::InvalidArgument => status::INVAL,
            Self::Failed => status::FAILED,
            Self::NoMemory => status::NOMEM,
            Self::MaxIterations => status::MAXITER,
            Self::BadTolerance => status::BADTOL,
            Self::Roundoff => status::ROUND,
            Self::BadLength => status::BADLEN,
            Self::EndOfFile => status::EOF,
            Self::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(status::name(self.status()))
    }
}

/// Errors returned by allocating and forwarding operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The foreign allocator returned null.
    #[error("allocation failed: {0}")]
    AllocationFailure(String),

    /// An argument was rejected before reaching the foreign library.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two operands that must have equal lengths do not.
    #[error("length mismatch: expected {expected}, got {actual}")]
    InvalidLength {
        /// Length of the first operand.
        expected: usize,
        /// Length of the offending operand.
        actual: usize,
    },

    /// Operation on an empty handle or view.
    #[error("operation on an empty {0}")]
    Fault(&'static str),

    /// The foreign library returned a non-zero status.
    #[error("foreign call failed: {} (status {code})", status::name(*code))]
    Foreign {
        /// The status value returned.
        code: c_int,
    },
}

impl Error {
    /// The hook code matching this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AllocationFailure(_) => ErrorCode::NoMemory,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::InvalidLength { .. } => ErrorCode::BadLength,
            Self::Fault(_) => ErrorCode::Fault,
            Self::Foreign { code } => ErrorCode::from_status(*code),
        }
    }
}

/// Result type for numhandle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Turn a foreign status into a `Result`, reporting failures to the hook.
pub(crate) fn check_status(code: c_int, what: &str) -> Result<()> {
    if code == status::SUCCESS {
        Ok(())
    } else {
        crate::report!(ErrorCode::from_status(code), "{what}: {}", status::name(code));
        Err(Error::Foreign { code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_round_trips_status() {
        for code in [
            status::FAILURE,
            status::EDOM,
            status::FAULT,
            status::INVAL,
            status::NOMEM,
            status::BADLEN,
            status::EOF,
            77,
        ] {
            assert_eq!(ErrorCode::from_status(code).status(), code);
        }
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidLength { expected: 3, actual: 4 };
        assert_eq!(err.to_string(), "length mismatch: expected 3, got 4");
        assert_eq!(err.code(), ErrorCode::BadLength);

        let err = Error::Foreign { code: status::EOF };
        assert_eq!(err.to_string(), "foreign call failed: end of file (status 32)");
    }

    #[test]
    fn test_error_code_serde() {
        let json = serde_json::to_string(&ErrorCode::InvalidArgument).unwrap();
        assert_eq!(json, "\"invalid_argument\"");
        let back: ErrorCode = serde_json::from_str("{\"unknown\":7}").unwrap();
        assert_eq!(back, ErrorCode::Unknown(7));
    }

    #[test]
    fn test_check_status_reports() {
        let (result, reports) = hook::testing::capture(|| check_status(status::BADLEN, "vector copy"));
        assert_eq!(result, Err(Error::Foreign { code: status::BADLEN }));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].code, ErrorCode::BadLength);
        assert!(reports[0].message.starts_with("vector copy"));
    }
}
