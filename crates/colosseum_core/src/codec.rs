//! # Record Codec
//!
//! Entities are persisted as a version byte followed by an ordered,
//! length-prefixed field sequence. The writer and the reader of a record
//! MUST agree on the exact field order; the codec carries no field names or
//! tags. Adding a field to an entity means bumping its record version, not
//! reordering in place.
//!
//! Integers are little-endian. Strings are u16-length-prefixed UTF-8.

use thiserror::Error;

use crate::error::StoreError;

/// A failed decode: the byte stream did not match the expected field order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(
    /// What the reader choked on.
    pub String,
);

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Runs an entity field decoder against a record, mapping any failure to
/// `StoreError::Corrupt` tagged with the record's key.
///
/// # Errors
///
/// `StoreError::Corrupt` on a version mismatch or field-order mismatch.
pub fn decode_record<T>(
    key: &str,
    bytes: &[u8],
    version: u8,
    fields: impl FnOnce(&mut RecordReader<'_>) -> DecodeResult<T>,
) -> Result<T, StoreError> {
    let mut r = RecordReader::new(bytes, version).map_err(|e| StoreError::corrupt(key, &e))?;
    fields(&mut r).map_err(|e| StoreError::corrupt(key, &e))
}

/// Sequential field writer.
///
/// ```rust,ignore
/// let mut w = RecordWriter::new(1);
/// w.str("owner").u64(level).bool(finished);
/// store.set(&key, w.finish());
/// ```
#[derive(Debug, Default)]
pub struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    /// Starts a record with the given version byte.
    #[must_use]
    pub fn new(version: u8) -> Self {
        Self { buf: vec![version] }
    }

    /// Appends a u8 field.
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    /// Appends a bool field (one byte, 0 or 1).
    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.buf.push(u8::from(v));
        self
    }

    /// Appends a u16 field.
    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Appends a u32 field.
    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Appends a u64 field.
    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Appends a u128 field.
    pub fn u128(&mut self, v: u128) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Appends a length-prefixed UTF-8 string field.
    ///
    /// Strings longer than `u16::MAX` bytes are truncated at the prefix
    /// limit; entity ids and addresses never approach it.
    pub fn str(&mut self, v: &str) -> &mut Self {
        let bytes = v.as_bytes();
        let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(&bytes[..len as usize]);
        self
    }

    /// Consumes the writer and returns the encoded record.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Sequential field reader. Reads MUST occur in the exact order the fields
/// were written.
#[derive(Debug)]
pub struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    /// Wraps a record and checks its version byte.
    ///
    /// # Errors
    ///
    /// Fails on an empty record or a version other than `expected`.
    pub fn new(buf: &'a [u8], expected: u8) -> DecodeResult<Self> {
        let mut r = Self { buf, pos: 0 };
        let found = r.u8()?;
        if found != expected {
            return Err(DecodeError(format!(
                "record version {found}, expected {expected}"
            )));
        }
        Ok(r)
    }

    fn take(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| DecodeError("length overflow".into()))?;
        if end > self.buf.len() {
            return Err(DecodeError(format!(
                "truncated record: need {n} bytes at offset {}",
                self.pos
            )));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads a u8 field.
    ///
    /// # Errors
    ///
    /// Fails if the record is exhausted.
    pub fn u8(&mut self) -> DecodeResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a bool field.
    ///
    /// # Errors
    ///
    /// Fails on exhaustion or a byte other than 0/1.
    pub fn bool(&mut self) -> DecodeResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError(format!("invalid bool byte {other}"))),
        }
    }

    /// Reads a u16 field.
    ///
    /// # Errors
    ///
    /// Fails if the record is exhausted.
    pub fn u16(&mut self) -> DecodeResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Reads a u32 field.
    ///
    /// # Errors
    ///
    /// Fails if the record is exhausted.
    pub fn u32(&mut self) -> DecodeResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a u64 field.
    ///
    /// # Errors
    ///
    /// Fails if the record is exhausted.
    pub fn u64(&mut self) -> DecodeResult<u64> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(u64::from_le_bytes(raw))
    }

    /// Reads a u128 field.
    ///
    /// # Errors
    ///
    /// Fails if the record is exhausted.
    pub fn u128(&mut self) -> DecodeResult<u128> {
        let b = self.take(16)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(b);
        Ok(u128::from_le_bytes(raw))
    }

    /// Reads a length-prefixed UTF-8 string field.
    ///
    /// # Errors
    ///
    /// Fails on exhaustion or invalid UTF-8.
    pub fn str(&mut self) -> DecodeResult<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DecodeError(format!("invalid utf-8 in string field: {e}")))
    }

    /// True once every byte of the record has been consumed.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.pos == self.buf.len()
    }
}
