//! Raw binary stream I/O.
//!
//! Elements are written in native byte order with no header or framing,
//! honouring strides and trailing dimensions, so a strided view writes
//! only the elements it covers. Reading fills an existing object of the
//! right shape.

use std::io::{ErrorKind, Read, Write};
use std::os::raw::c_int;

use crate::combination::RawCombination;
use crate::matrix::{matrix_ptr, RawMatrix};
use crate::vector::{vector_ptr, RawVector};
use crate::{status, Element};

fn write_element<T: Element>(stream: &mut dyn Write, x: T) -> c_int {
    // SAFETY: Element types are plain old data.
    let bytes = unsafe { std::slice::from_raw_parts((&x as *const T).cast::<u8>(), std::mem::size_of::<T>()) };
    match stream.write_all(bytes) {
        Ok(()) => status::SUCCESS,
        Err(_) => status::FAILED,
    }
}

fn read_element<T: Element>(stream: &mut dyn Read) -> Result<T, c_int> {
    let mut x = T::default();
    // SAFETY: Element types are plain old data; any byte pattern is valid.
    let bytes = unsafe { std::slice::from_raw_parts_mut((&mut x as *mut T).cast::<u8>(), std::mem::size_of::<T>()) };
    match stream.read_exact(bytes) {
        Ok(()) => Ok(x),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(status::EOF),
        Err(_) => Err(status::FAILED),
    }
}

/// Write the elements of `v`.
///
/// # Safety
///
/// `v` must be null or a live vector.
pub unsafe fn vector_fwrite<T: Element>(stream: &mut dyn Write, v: *const RawVector<T>) -> c_int {
    if v.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    for i in 0..unsafe { (*v).size } {
        let code = write_element(stream, unsafe { vector_ptr(v, i).read() });
        if code != status::SUCCESS {
            return code;
        }
    }
    status::SUCCESS
}

/// Fill `v` from the stream. Returns [`status::EOF`] on a short read.
///
/// # Safety
///
/// `v` must be null or a live vector.
pub unsafe fn vector_fread<T: Element>(stream: &mut dyn Read, v: *mut RawVector<T>) -> c_int {
    if v.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    for i in 0..unsafe { (*v).size } {
        match read_element::<T>(stream) {
            Ok(x) => unsafe { vector_ptr(v, i).write(x) },
            Err(code) => return code,
        }
    }
    status::SUCCESS
}

/// Write the elements of `m` row by row.
///
/// # Safety
///
/// `m` must be null or a live matrix.
pub unsafe fn matrix_fwrite<T: Element>(stream: &mut dyn Write, m: *const RawMatrix<T>) -> c_int {
    if m.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    let (rows, cols) = unsafe { ((*m).size1, (*m).size2) };
    for i in 0..rows {
        for j in 0..cols {
            let code = write_element(stream, unsafe { matrix_ptr(m, i, j).read() });
            if code != status::SUCCESS {
                return code;
            }
        }
    }
    status::SUCCESS
}

/// Fill `m` row by row from the stream.
///
/// # Safety
///
/// `m` must be null or a live matrix.
pub unsafe fn matrix_fread<T: Element>(stream: &mut dyn Read, m: *mut RawMatrix<T>) -> c_int {
    if m.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    let (rows, cols) = unsafe { ((*m).size1, (*m).size2) };
    for i in 0..rows {
        for j in 0..cols {
            match read_element::<T>(stream) {
                Ok(x) => unsafe { matrix_ptr(m, i, j).write(x) },
                Err(code) => return code,
            }
        }
    }
    status::SUCCESS
}

/// Write the `k` indices of `c`.
///
/// # Safety
///
/// `c` must be null or a live combination.
pub unsafe fn combination_fwrite(stream: &mut dyn Write, c: *const RawCombination) -> c_int {
    if c.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    for i in 0..unsafe { (*c).k } {
        let code = write_element(stream, unsafe { (*c).data.add(i).read() });
        if code != status::SUCCESS {
            return code;
        }
    }
    status::SUCCESS
}

/// Fill the `k` indices of `c` from the stream.
///
/// # Safety
///
/// `c` must be null or a live combination.
pub unsafe fn combination_fread(stream: &mut dyn Read, c: *mut RawCombination) -> c_int {
    if c.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    for i in 0..unsafe { (*c).k } {
        match read_element::<usize>(stream) {
            Ok(x) => unsafe { (*c).data.add(i).write(x) },
            Err(code) => return code,
        }
    }
    status::SUCCESS
}
