//! Buffer utilities for reading and writing wire-format data.

use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// A cursor-tracked buffer for reading wire-format data.
///
/// Reads are big-endian and bounds-checked. Byte-slice reads are zero-copy
/// views into the underlying [`Bytes`].
pub struct ReadBuffer {
    data: Bytes,
    pos: usize,
}

impl ReadBuffer {
    /// Create a new read buffer from bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Get the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the remaining bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if the buffer has at least `n` bytes remaining.
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Get a slice of the remaining data.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Move the cursor to an absolute position, or by a signed offset from
    /// the current position when `relative` is set.
    pub fn seek(&mut self, offset: i64, relative: bool) -> Result<()> {
        let target = if relative {
            self.pos as i64 + offset
        } else {
            offset
        };
        if target < 0 || target as usize > self.data.len() {
            return Err(Error::SeekOutOfRange {
                target,
                len: self.data.len(),
            });
        }
        self.pos = target as usize;
        Ok(())
    }

    /// Fork the buffer: an independent cursor over the same bytes.
    ///
    /// The clone of the underlying [`Bytes`] is reference-counted, so the
    /// fork shares storage with the original.
    pub fn fork(&self) -> ReadBuffer {
        ReadBuffer {
            data: self.data.clone(),
            pos: self.pos,
        }
    }

    /// Skip `n` bytes.
    #[track_caller]
    pub fn skip(&mut self, n: usize) -> Result<()> {
        if !self.has_remaining(n) {
            return Err(Error::BufferTooSmall {
                needed: n,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        self.pos += n;
        Ok(())
    }

    /// Peek at the next byte without advancing the cursor.
    #[track_caller]
    pub fn peek_u8(&self) -> Result<u8> {
        if !self.has_remaining(1) {
            return Err(Error::BufferTooSmall {
                needed: 1,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        Ok(self.data[self.pos])
    }

    /// Read a single byte.
    #[track_caller]
    pub fn read_u8(&mut self) -> Result<u8> {
        if !self.has_remaining(1) {
            return Err(Error::BufferTooSmall {
                needed: 1,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        let val = self.data[self.pos];
        self.pos += 1;
        Ok(val)
    }

    /// Read a big-endian u16.
    #[track_caller]
    pub fn read_u16_be(&mut self) -> Result<u16> {
        if !self.has_remaining(2) {
            return Err(Error::BufferTooSmall {
                needed: 2,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        let val = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(val)
    }

    /// Read a big-endian u32.
    #[track_caller]
    pub fn read_u32_be(&mut self) -> Result<u32> {
        if !self.has_remaining(4) {
            return Err(Error::BufferTooSmall {
                needed: 4,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        let val = u32::from_be_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(val)
    }

    /// Read a big-endian u64.
    #[track_caller]
    pub fn read_u64_be(&mut self) -> Result<u64> {
        if !self.has_remaining(8) {
            return Err(Error::BufferTooSmall {
                needed: 8,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Read a big-endian u128.
    #[track_caller]
    pub fn read_u128_be(&mut self) -> Result<u128> {
        if !self.has_remaining(16) {
            return Err(Error::BufferTooSmall {
                needed: 16,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 16]);
        self.pos += 16;
        Ok(u128::from_be_bytes(bytes))
    }

    /// Read a big-endian 256-bit value as its raw bytes.
    #[track_caller]
    pub fn read_u256_be(&mut self) -> Result<[u8; 32]> {
        if !self.has_remaining(32) {
            return Err(Error::BufferTooSmall {
                needed: 32,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 32]);
        self.pos += 32;
        Ok(bytes)
    }

    /// Peek at `n` bytes starting `offset` past the cursor without
    /// advancing.
    #[track_caller]
    pub fn peek_bytes(&self, offset: usize, n: usize) -> Result<Bytes> {
        if !self.has_remaining(offset + n) {
            return Err(Error::BufferTooSmall {
                needed: offset + n,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        Ok(self.data.slice(self.pos + offset..self.pos + offset + n))
    }

    /// Read raw bytes as a zero-copy view.
    #[track_caller]
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        if !self.has_remaining(n) {
            return Err(Error::BufferTooSmall {
                needed: n,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }
}

/// A growable buffer for writing wire-format data.
pub struct WriteBuffer {
    data: BytesMut,
}

impl WriteBuffer {
    /// Create a new write buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new write buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the current length of the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the buffer contents as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Freeze the buffer into immutable bytes.
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Ensure capacity for `additional` more bytes.
    ///
    /// Growth is geometric: when the buffer must grow, capacity at least
    /// doubles relative to the required new size, keeping appends amortized
    /// constant-time.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.data.len() + additional;
        if required > self.data.capacity() {
            let target = required.max(self.data.capacity() * 2);
            self.data.reserve(target - self.data.len());
        }
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, val: u8) {
        self.reserve(1);
        self.data.put_u8(val);
    }

    /// Write a big-endian u16.
    pub fn write_u16_be(&mut self, val: u16) {
        self.reserve(2);
        self.data.put_u16(val);
    }

    /// Write a big-endian u32.
    pub fn write_u32_be(&mut self, val: u32) {
        self.reserve(4);
        self.data.put_u32(val);
    }

    /// Write a big-endian u64.
    pub fn write_u64_be(&mut self, val: u64) {
        self.reserve(8);
        self.data.put_u64(val);
    }

    /// Write a big-endian u128.
    pub fn write_u128_be(&mut self, val: u128) {
        self.reserve(16);
        self.data.put_u128(val);
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.data.extend_from_slice(bytes);
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers_big_endian() {
        let data = Bytes::from_static(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        let mut buf = ReadBuffer::new(data);
        assert_eq!(buf.read_u8().unwrap(), 0x01);
        assert_eq!(buf.read_u16_be().unwrap(), 0x0203);
        assert_eq!(buf.read_u32_be().unwrap(), 0x04050607);
        assert_eq!(buf.remaining(), 1);
    }

    #[test]
    fn test_read_u64_be() {
        let data = Bytes::from_static(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        let mut buf = ReadBuffer::new(data);
        assert_eq!(buf.read_u64_be().unwrap(), 0x0102030405060708);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let mut buf = ReadBuffer::new(Bytes::from_static(&[0x01]));
        buf.read_u8().unwrap();
        let err = buf.read_u8().unwrap_err();
        match err {
            Error::BufferTooSmall {
                needed, available, ..
            } => {
                assert_eq!(needed, 1);
                assert_eq!(available, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_bytes_is_view() {
        let data = Bytes::from_static(b"abcdef");
        let mut buf = ReadBuffer::new(data);
        buf.skip(1).unwrap();
        let view = buf.read_bytes(3).unwrap();
        assert_eq!(&view[..], b"bcd");
        assert_eq!(buf.position(), 4);
    }

    #[test]
    fn test_fork_is_independent() {
        let mut buf = ReadBuffer::new(Bytes::from_static(&[1, 2, 3]));
        buf.read_u8().unwrap();
        let mut fork = buf.fork();
        assert_eq!(fork.read_u8().unwrap(), 2);
        assert_eq!(fork.read_u8().unwrap(), 3);
        // original cursor is unaffected by the fork's reads
        assert_eq!(buf.position(), 1);
        assert_eq!(buf.read_u8().unwrap(), 2);
    }

    #[test]
    fn test_seek_absolute_and_relative() {
        let mut buf = ReadBuffer::new(Bytes::from_static(&[1, 2, 3]));
        buf.seek(2, false).unwrap();
        assert_eq!(buf.read_u8().unwrap(), 3);
        buf.seek(-3, true).unwrap();
        assert_eq!(buf.read_u8().unwrap(), 1);
        assert!(matches!(
            buf.seek(4, false),
            Err(Error::SeekOutOfRange { target: 4, len: 3 })
        ));
        assert!(matches!(
            buf.seek(-2, true),
            Err(Error::SeekOutOfRange { target: -1, len: 3 })
        ));
    }

    #[test]
    fn test_wide_reads() {
        let mut raw = [0u8; 48];
        raw[15] = 7;
        raw[16] = 0xaa;
        raw[47] = 0xbb;
        let mut buf = ReadBuffer::new(Bytes::copy_from_slice(&raw));
        assert_eq!(buf.read_u128_be().unwrap(), 7);
        let wide = buf.read_u256_be().unwrap();
        assert_eq!(wide[0], 0xaa);
        assert_eq!(wide[31], 0xbb);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_peek_bytes_does_not_advance() {
        let buf = ReadBuffer::new(Bytes::from_static(b"abcdef"));
        assert_eq!(&buf.peek_bytes(2, 3).unwrap()[..], b"cde");
        assert_eq!(buf.position(), 0);
        assert!(buf.peek_bytes(4, 3).is_err());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut buf = ReadBuffer::new(Bytes::from_static(&[9, 8]));
        assert_eq!(buf.peek_u8().unwrap(), 9);
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.read_u8().unwrap(), 9);
    }

    #[test]
    fn test_write_integers_big_endian() {
        let mut buf = WriteBuffer::new();
        buf.write_u8(0x01);
        buf.write_u16_be(0x0203);
        buf.write_u32_be(0x04050607);
        buf.write_u64_be(0x08090a0b0c0d0e0f);
        assert_eq!(
            buf.as_bytes(),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f]
        );
    }

    #[test]
    fn test_reserve_growth_is_geometric() {
        let mut buf = WriteBuffer::with_capacity(4);
        buf.write_bytes(&[0u8; 4]);
        let before = buf.data.capacity();
        buf.write_bytes(&[0u8; 1]);
        // growth at least doubles the required size
        assert!(buf.data.capacity() >= before * 2 || buf.data.capacity() >= 10);
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_freeze_round_trip() {
        let mut buf = WriteBuffer::new();
        buf.write_bytes(b"hello");
        let frozen = buf.freeze();
        let mut rd = ReadBuffer::new(frozen);
        assert_eq!(&rd.read_bytes(5).unwrap()[..], b"hello");
    }

    #[test]
    fn test_clear_and_remaining_slice() {
        let mut buf = WriteBuffer::new();
        buf.write_u128_be(1);
        assert_eq!(buf.len(), 16);
        buf.clear();
        assert!(buf.is_empty());

        let mut rd = ReadBuffer::new(Bytes::from_static(b"abc"));
        rd.skip(1).unwrap();
        assert_eq!(rd.as_slice(), b"bc");
    }
}
