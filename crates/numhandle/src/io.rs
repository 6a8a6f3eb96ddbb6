//! Raw binary I/O.
//!
//! Elements travel in native byte order with no header, exactly as the
//! library's `fwrite`/`fread` lay them out. A strided view writes only
//! the elements it covers, and reading fills an object that already has
//! the right shape:
//!
//! ```rust
//! use numhandle::prelude::*;
//!
//! let src = VectorF64::from_slice(&[1.0, 2.0, 3.0])?;
//! let mut bytes = Vec::new();
//! src.write_to(&mut bytes)?;
//!
//! let mut dst = VectorF64::alloc(3)?;
//! dst.read_from(&mut bytes.as_slice())?;
//! assert_eq!(dst.to_vec(), vec![1.0, 2.0, 3.0]);
//! # Ok::<(), numhandle::Error>(())
//! ```

use std::io::{Read, Write};
use std::os::raw::c_int;

use numhandle_foreign::io::{
    combination_fread, combination_fwrite, matrix_fread, matrix_fwrite, vector_fread, vector_fwrite,
};
use numhandle_foreign::{Element, RawCombination, RawMatrix, RawVector};

use crate::handle::Handle;
use crate::resource::ForeignResource;
use crate::view::{View, ViewMut};
use crate::{check_status, report, Error, ErrorCode, Result};

/// A foreign resource with stream routines.
///
/// # Safety
///
/// Same contract as [`ForeignResource`].
pub unsafe trait BinaryFormat: ForeignResource {
    /// Call the foreign `fwrite`.
    ///
    /// # Safety
    ///
    /// `ptr` must be live.
    unsafe fn fwrite(stream: &mut dyn Write, ptr: *const Self) -> c_int;

    /// Call the foreign `fread`.
    ///
    /// # Safety
    ///
    /// `ptr` must be live.
    unsafe fn fread(stream: &mut dyn Read, ptr: *mut Self) -> c_int;
}

unsafe impl<T: Element> BinaryFormat for RawVector<T> {
    unsafe fn fwrite(stream: &mut dyn Write, ptr: *const Self) -> c_int {
        // SAFETY: forwarded contract.
        unsafe { vector_fwrite(stream, ptr) }
    }

    unsafe fn fread(stream: &mut dyn Read, ptr: *mut Self) -> c_int {
        // SAFETY: forwarded contract.
        unsafe { vector_fread(stream, ptr) }
    }
}

unsafe impl<T: Element> BinaryFormat for RawMatrix<T> {
    unsafe fn fwrite(stream: &mut dyn Write, ptr: *const Self) -> c_int {
        // SAFETY: forwarded contract.
        unsafe { matrix_fwrite(stream, ptr) }
    }

    unsafe fn fread(stream: &mut dyn Read, ptr: *mut Self) -> c_int {
        // SAFETY: forwarded contract.
        unsafe { matrix_fread(stream, ptr) }
    }
}

unsafe impl BinaryFormat for RawCombination {
    unsafe fn fwrite(stream: &mut dyn Write, ptr: *const Self) -> c_int {
        // SAFETY: forwarded contract.
        unsafe { combination_fwrite(stream, ptr) }
    }

    unsafe fn fread(stream: &mut dyn Read, ptr: *mut Self) -> c_int {
        // SAFETY: forwarded contract.
        unsafe { combination_fread(stream, ptr) }
    }
}

/// Serialise the covered elements to a byte stream.
pub trait WriteBinary {
    /// Write every element in order (row by row for matrices).
    ///
    /// # Errors
    ///
    /// [`Error::Fault`] for an empty handle or view, [`Error::Foreign`]
    /// with `FAILED` when the stream rejects the bytes.
    fn write_to<W: Write>(&self, stream: &mut W) -> Result<()>;
}

/// Fill an existing object from a byte stream.
pub trait ReadBinary {
    /// Overwrite every element in order.
    ///
    /// # Errors
    ///
    /// [`Error::Fault`] for an empty handle or view, [`Error::Foreign`]
    /// with `EOF` when the stream ends early.
    fn read_from<R: Read>(&mut self, stream: &mut R) -> Result<()>;
}

fn write_raw<R: BinaryFormat>(ptr: *mut R, stream: &mut dyn Write) -> Result<()> {
    if ptr.is_null() {
        report!(ErrorCode::Fault, "writing an empty {}", R::KIND);
        return Err(Error::Fault(R::KIND));
    }
    // SAFETY: ptr is live.
    let shape = unsafe { R::shape(ptr) };
    // SAFETY: ptr is live.
    check_status(unsafe { R::fwrite(stream, ptr) }, &format!("writing {}", R::KIND))?;
    tracing::debug!(kind = R::KIND, ?shape, "wrote binary");
    Ok(())
}

fn read_raw<R: BinaryFormat>(ptr: *mut R, stream: &mut dyn Read) -> Result<()> {
    if ptr.is_null() {
        report!(ErrorCode::Fault, "reading into an empty {}", R::KIND);
        return Err(Error::Fault(R::KIND));
    }
    // SAFETY: ptr is live.
    let shape = unsafe { R::shape(ptr) };
    // SAFETY: ptr is live.
    check_status(unsafe { R::fread(stream, ptr) }, &format!("reading {}", R::KIND))?;
    tracing::debug!(kind = R::KIND, ?shape, "read binary");
    Ok(())
}

impl<R: BinaryFormat> WriteBinary for Handle<R> {
    fn write_to<W: Write>(&self, stream: &mut W) -> Result<()> {
        write_raw(self.as_ptr(), stream)
    }
}

impl<R: BinaryFormat> WriteBinary for View<'_, R> {
    fn write_to<W: Write>(&self, stream: &mut W) -> Result<()> {
        write_raw(self.as_ptr(), stream)
    }
}

impl<R: BinaryFormat> WriteBinary for ViewMut<'_, R> {
    fn write_to<W: Write>(&self, stream: &mut W) -> Result<()> {
        write_raw(self.as_ptr(), stream)
    }
}

impl<R: BinaryFormat> ReadBinary for Handle<R> {
    fn read_from<S: Read>(&mut self, stream: &mut S) -> Result<()> {
        read_raw(self.as_ptr(), stream)
    }
}

impl<R: BinaryFormat> ReadBinary for ViewMut<'_, R> {
    fn read_from<S: Read>(&mut self, stream: &mut S) -> Result<()> {
        read_raw(self.as_ptr(), stream)
    }
}
