//! Positional byte reader/writer
//!
//! `ByteStream` backs both the DER decoder and the TLS-style encodings used
//! by signed certificate timestamps. Reads advance an internal cursor and
//! fail with [`Error::Truncated`] instead of panicking when the buffer runs
//! out. Appends always go to the end of the buffer.

use crate::error::{Error, Result};

/// Growable byte buffer with a read cursor
#[derive(Debug, Clone, Default)]
pub struct ByteStream {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteStream {
    /// An empty stream, ready for appending
    pub fn new() -> Self {
        Self::default()
    }

    /// A stream positioned at the start of `bytes`
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            buf: bytes.into(),
            pos: 0,
        }
    }

    /// Current read offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total buffer length
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Move the read cursor to an absolute offset
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(Error::Truncated {
                needed: pos,
                offset: 0,
                available: self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Look at the next byte without consuming it
    pub fn peek(&self) -> Result<u8> {
        self.buf.get(self.pos).copied().ok_or(Error::Truncated {
            needed: 1,
            offset: self.pos,
            available: 0,
        })
    }

    /// Read `len` bytes
    pub fn get_block(&mut self, len: usize) -> Result<&[u8]> {
        let available = self.remaining();
        if len > available {
            return Err(Error::Truncated {
                needed: len,
                offset: self.pos,
                available,
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    fn get_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.get_block(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.get_array::<1>()?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.get_array()?))
    }

    /// Read a 24-bit big-endian integer
    pub fn get_u24(&mut self) -> Result<u32> {
        let [a, b, c] = self.get_array::<3>()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.get_array()?))
    }

    pub fn append_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn append_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Append the low 24 bits of `value`, big-endian
    pub fn append_u24(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes()[1..]);
    }

    pub fn append_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn append_block(&mut self, block: &[u8]) {
        self.buf.extend_from_slice(block);
    }

    /// Borrow the whole buffer, independent of the cursor
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the stream, returning its buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers() {
        let mut s = ByteStream::from_bytes(vec![
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0x01, 0x00,
        ]);
        assert_eq!(s.get_u8().unwrap(), 0x01);
        assert_eq!(s.get_u16().unwrap(), 0x0203);
        assert_eq!(s.get_u24().unwrap(), 0x040506);
        assert_eq!(s.get_u64().unwrap(), 0x100);
        assert_eq!(s.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_fails() {
        let mut s = ByteStream::from_bytes(vec![0x01, 0x02]);
        s.get_u8().unwrap();
        let err = s.get_u16().unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                needed: 2,
                offset: 1,
                available: 1
            }
        ));
        // a failed read does not move the cursor
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn test_append_and_seek() {
        let mut s = ByteStream::new();
        s.append_u8(7);
        s.append_u24(0x00ab_cdef);
        s.append_u16(0x0102);
        s.append_block(b"xy");
        assert_eq!(s.buffer(), &[7, 0xab, 0xcd, 0xef, 0x01, 0x02, b'x', b'y']);

        s.seek(4).unwrap();
        assert_eq!(s.get_u16().unwrap(), 0x0102);
        assert_eq!(s.peek().unwrap(), b'x');
        assert!(s.seek(9).is_err());
    }
}
