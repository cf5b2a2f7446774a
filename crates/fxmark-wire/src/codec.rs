//! Big-endian primitives.
//!
//! Strings are an `i32` byte length followed by UTF-8. Arrays are an `i32`
//! element count followed by the elements. Floats travel as IEEE-754 bits.

use crate::error::{DecodeError, EncodeError};

/// Cursor over an input buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `buf`.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(DecodeError::UnexpectedEof {
                needed: n,
                remaining,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// One byte.
    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    /// Unsigned 32-bit integer.
    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    /// Signed 32-bit integer.
    pub fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    /// 32-bit float, unvalidated.
    pub fn f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.u32()?))
    }

    /// 32-bit float clamped into `[min, max]`; non-finite values read as `min`.
    pub fn f32_clamped(&mut self, min: f32, max: f32) -> Result<f32, DecodeError> {
        let value = self.f32()?;
        Ok(if value.is_finite() {
            value.clamp(min, max)
        } else {
            min
        })
    }

    /// An `i32` count in `0..=max`.
    pub fn count(&mut self, field: &'static str, max: usize) -> Result<usize, DecodeError> {
        let raw = self.i32()?;
        match usize::try_from(raw) {
            Ok(count) if count <= max => Ok(count),
            _ => Err(DecodeError::CountOutOfRange {
                field,
                count: i64::from(raw),
                max,
            }),
        }
    }

    /// A length-prefixed UTF-8 string of at most `max` bytes.
    pub fn string(&mut self, field: &'static str, max: usize) -> Result<String, DecodeError> {
        let len = self.count(field, max)?;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// Fail unless every byte was consumed.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(DecodeError::TrailingBytes { remaining }),
        }
    }
}

/// Growable output buffer.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// An empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One byte.
    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Unsigned 32-bit integer.
    pub fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Signed 32-bit integer.
    pub fn i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// 32-bit float.
    pub fn f32(&mut self, value: f32) {
        self.u32(value.to_bits());
    }

    /// An element count, rejected above `max`.
    pub fn count(&mut self, field: &'static str, len: usize, max: usize) -> Result<(), EncodeError> {
        let value = i32::try_from(len)
            .ok()
            .filter(|_| len <= max)
            .ok_or(EncodeError::TooLong { field, len, max })?;
        self.i32(value);
        Ok(())
    }

    /// A length-prefixed string, rejected above `max` bytes.
    pub fn string(&mut self, field: &'static str, value: &str, max: usize) -> Result<(), EncodeError> {
        self.count(field, value.len(), max)?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The finished buffer.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
