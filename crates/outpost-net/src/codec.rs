//! Binary wire codec for remote-call arguments and snapshot payloads.
//!
//! All integers and floats are fixed-width big-endian. Compound values use
//! the following layouts:
//!
//! ```text
//! bool          1 byte (0 = false)
//! string        u16 length + UTF-8 bytes
//! opt string    u8 presence flag + string
//! byte array    u32 length + bytes
//! entity ref    i32 id, -1 when absent
//! string list   u16 count + strings
//! ```
//!
//! [`WireReader`] checks every read against the remaining length, so a
//! truncated buffer surfaces as [`DecodeError::Truncated`] rather than a panic.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Sentinel written for an absent entity reference.
pub const NO_ENTITY: i32 = -1;

/// Errors produced while decoding wire data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ended before the value was complete.
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes required by the read.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },
    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
    /// A record named a type tag with no registered constructor.
    #[error("unknown type tag {0}")]
    UnknownTypeTag(u8),
    /// A declared length exceeds what the field allows.
    #[error("length {len} exceeds limit {max}")]
    LengthOverflow {
        /// Declared length.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },
    /// A value decoded but is outside its domain.
    #[error("invalid value: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Checked reader over a reusable byte buffer.
#[derive(Debug, Default, Clone)]
pub struct WireReader {
    buf: Bytes,
}

impl WireReader {
    /// Create a reader positioned at the start of `bytes`.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { buf: bytes.into() }
    }

    /// Replace the underlying buffer, discarding anything unread.
    pub fn reset(&mut self, bytes: impl Into<Bytes>) {
        self.buf = bytes.into();
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Returns `true` when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(DecodeError::Truncated { needed, remaining });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_f32())
    }

    /// Split off the next `len` bytes without copying.
    pub fn take(&mut self, len: usize) -> Result<Bytes, DecodeError> {
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Read a `u16`-length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u16()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Read a string preceded by a presence flag.
    pub fn read_str_opt(&mut self) -> Result<Option<String>, DecodeError> {
        if self.read_bool()? {
            self.read_str().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read a `u16`-count-prefixed list of strings.
    pub fn read_str_list(&mut self) -> Result<Vec<String>, DecodeError> {
        let count = self.read_u16()? as usize;
        let mut out = Vec::with_capacity(count.min(self.remaining() / 2));
        for _ in 0..count {
            out.push(self.read_str()?);
        }
        Ok(out)
    }

    /// Read a `u32`-length-prefixed byte array.
    pub fn read_bytes(&mut self) -> Result<Bytes, DecodeError> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    /// Read an entity reference; [`NO_ENTITY`] decodes as `None`.
    pub fn read_entity_ref(&mut self) -> Result<Option<i32>, DecodeError> {
        let id = self.read_i32()?;
        Ok((id != NO_ENTITY).then_some(id))
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Growable writer producing the layouts [`WireReader`] consumes.
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.put_u8(v);
        self
    }

    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.write_u8(u8::from(v))
    }

    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        self.buf.put_u16(v);
        self
    }

    pub fn write_i16(&mut self, v: i16) -> &mut Self {
        self.buf.put_i16(v);
        self
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.put_u32(v);
        self
    }

    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.buf.put_i32(v);
        self
    }

    pub fn write_i64(&mut self, v: i64) -> &mut Self {
        self.buf.put_i64(v);
        self
    }

    pub fn write_f32(&mut self, v: f32) -> &mut Self {
        self.buf.put_f32(v);
        self
    }

    /// Append raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Write a string, truncating at the last char boundary that fits in
    /// `u16::MAX` bytes.
    pub fn write_str(&mut self, s: &str) -> &mut Self {
        let mut end = s.len().min(u16::MAX as usize);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.buf.put_u16(end as u16);
        self.buf.put_slice(&s.as_bytes()[..end]);
        self
    }

    pub fn write_str_opt(&mut self, s: Option<&str>) -> &mut Self {
        match s {
            Some(s) => self.write_bool(true).write_str(s),
            None => self.write_bool(false),
        }
    }

    pub fn write_str_list<S: AsRef<str>>(&mut self, items: &[S]) -> &mut Self {
        let count = items.len().min(u16::MAX as usize);
        self.buf.put_u16(count as u16);
        for item in &items[..count] {
            self.write_str(item.as_ref());
        }
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_u32(bytes.len() as u32);
        self.buf.put_slice(bytes);
        self
    }

    pub fn write_entity_ref(&mut self, id: Option<i32>) -> &mut Self {
        self.write_i32(id.unwrap_or(NO_ENTITY))
    }

    /// Freeze the written bytes.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}
