// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Byte-level primitives for the feature container.
//!
//! Everything on the wire is little-endian. Variable-length fields carry a
//! `u32` length prefix and are bounded by a caller-supplied maximum, so a
//! hostile length never turns into a large allocation.

use core::str;
use thiserror::Error;

/// Errors produced by codec readers and writers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A read needed more bytes than were left.
    #[error("buffer too short: wanted {wanted} bytes, {remaining} left")]
    OutOfBounds {
        /// Bytes the read needed.
        wanted: usize,
        /// Bytes that were left.
        remaining: usize,
    },
    /// A string field was not UTF-8.
    #[error("invalid utf-8")]
    InvalidUtf8,
    /// A string exceeded its field's bound on write.
    #[error("string too long")]
    StringTooLong,
    /// A length prefix exceeded its field's bound (or `u32`).
    #[error("length too large")]
    LengthTooLarge,
}

/// Fixed-width scalar with a little-endian wire form.
pub trait LeScalar: Sized + Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Appends the little-endian bytes of `self`.
    fn put(self, out: &mut Vec<u8>);

    /// Decodes from exactly [`LeScalar::WIDTH`] bytes.
    fn get(raw: &[u8]) -> Self;
}

macro_rules! le_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl LeScalar for $ty {
            const WIDTH: usize = core::mem::size_of::<$ty>();

            fn put(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn get(raw: &[u8]) -> Self {
                let mut buf = [0_u8; core::mem::size_of::<$ty>()];
                buf.copy_from_slice(raw);
                <$ty>::from_le_bytes(buf)
            }
        }
    )*};
}

le_scalar!(u8, u16, u32, i64, f64);

/// Append-only buffer for building containers.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Writer whose buffer starts with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Appends any [`LeScalar`].
    pub fn put<T: LeScalar>(&mut self, value: T) {
        value.put(&mut self.buf);
    }

    /// Appends raw bytes with no prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends one byte (a tag or flag).
    pub fn write_u8(&mut self, value: u8) {
        self.put(value);
    }

    /// Appends a `u16` (header fields, attribute counts).
    pub fn write_u16_le(&mut self, value: u16) {
        self.put(value);
    }

    /// Appends a `u32` (frame lengths, coordinate counts).
    pub fn write_u32_le(&mut self, value: u32) {
        self.put(value);
    }

    /// Appends an `i64` timestamp.
    pub fn write_i64_le(&mut self, value: i64) {
        self.put(value);
    }

    /// Appends an IEEE-754 `f64`.
    pub fn write_f64_le(&mut self, value: f64) {
        self.put(value);
    }

    /// Appends a `u32` length and then `bytes`.
    pub fn write_len_prefixed_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        let len = u32::try_from(bytes.len()).map_err(|_| CodecError::LengthTooLarge)?;
        self.put(len);
        self.write_bytes(bytes);
        Ok(())
    }

    /// Appends a length-prefixed UTF-8 string no longer than `max_len` bytes.
    pub fn write_string(&mut self, value: &str, max_len: usize) -> Result<(), CodecError> {
        if value.len() > max_len {
            return Err(CodecError::StringTooLong);
        }
        self.write_len_prefixed_bytes(value.as_bytes())
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The finished buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a borrowed buffer. A failed read leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Cursor at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Returns `true` once every byte has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.offset == self.bytes.len()
    }

    /// Offset of the next unread byte.
    #[must_use]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Borrows the next `len` bytes and advances past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| CodecError::OutOfBounds {
                wanted: len,
                remaining: self.remaining(),
            })?;
        let out = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    /// Reads any [`LeScalar`].
    pub fn get<T: LeScalar>(&mut self) -> Result<T, CodecError> {
        self.take(T::WIDTH).map(T::get)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        self.get()
    }

    /// Reads a `u16`.
    pub fn read_u16_le(&mut self) -> Result<u16, CodecError> {
        self.get()
    }

    /// Reads a `u32`.
    pub fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        self.get()
    }

    /// Reads an `i64`.
    pub fn read_i64_le(&mut self) -> Result<i64, CodecError> {
        self.get()
    }

    /// Reads an `f64`.
    pub fn read_f64_le(&mut self) -> Result<f64, CodecError> {
        self.get()
    }

    /// Reads a `u32` length and then that many bytes, rejecting lengths above `max_len`.
    ///
    /// On any error the cursor is restored to before the prefix.
    pub fn read_len_prefixed_bytes(&mut self, max_len: usize) -> Result<&'a [u8], CodecError> {
        let start = self.offset;
        let result = self.read_u32_le().and_then(|len| {
            let len = len as usize;
            if len > max_len {
                return Err(CodecError::LengthTooLarge);
            }
            self.take(len)
        });
        if result.is_err() {
            self.offset = start;
        }
        result
    }

    /// Reads a length-prefixed UTF-8 string no longer than `max_len` bytes.
    pub fn read_string(&mut self, max_len: usize) -> Result<String, CodecError> {
        let start = self.offset;
        let bytes = self.read_len_prefixed_bytes(max_len)?;
        match str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => {
                self.offset = start;
                Err(CodecError::InvalidUtf8)
            }
        }
    }
}
