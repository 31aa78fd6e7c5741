//! CBOR item encoding.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::buffer::WriteBuffer;
use crate::protocol::constants::*;
use crate::protocol::types::BigUint;

/// Append-only encoder for CBOR data items.
///
/// Integer arguments always use the minimal-width encoding, so identical
/// write sequences produce byte-identical output. Containers use the
/// indefinite-length framing; `depth` tracks open containers and
/// [`CborWriter::into_bytes`] refuses to finish while any remain open.
pub struct CborWriter {
    buf: WriteBuffer,
    depth: usize,
}

impl CborWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self {
            buf: WriteBuffer::new(),
            depth: 0,
        }
    }

    /// Number of encoded bytes so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of currently open containers.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Open an indefinite-length array.
    pub fn start_array(&mut self) {
        self.buf
            .write_u8(CBOR_MAJOR_ARRAY << 5 | CBOR_AI_INDEFINITE);
        self.depth += 1;
    }

    /// Open an indefinite-length map.
    pub fn start_map(&mut self) {
        self.buf.write_u8(CBOR_MAJOR_MAP << 5 | CBOR_AI_INDEFINITE);
        self.depth += 1;
    }

    /// Close the innermost open container.
    pub fn end_sequence(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::invalid_cbor("no open sequence to end"));
        }
        self.buf.write_u8(CBOR_BREAK);
        self.depth -= 1;
        Ok(())
    }

    /// Write an unsigned integer.
    pub fn write_unsigned(&mut self, value: u64) {
        self.write_header(CBOR_MAJOR_UNSIGNED, value);
    }

    /// Write a signed integer. Negative values encode their wire magnitude
    /// `-1 - value`; the representable range is `[-2^64, 2^64 - 1]`.
    pub fn write_integer(&mut self, value: i128) -> Result<()> {
        if value >= 0 {
            if value > u64::MAX as i128 {
                return Err(Error::invalid_cbor("integer above the 64-bit range"));
            }
            self.write_unsigned(value as u64);
        } else {
            let magnitude = -(value + 1) as u128;
            if magnitude > u64::MAX as u128 {
                return Err(Error::invalid_cbor("integer below the 64-bit range"));
            }
            self.write_header(CBOR_MAJOR_NEGATIVE, magnitude as u64);
        }
        Ok(())
    }

    /// Write a text string.
    pub fn write_text(&mut self, text: &str) {
        self.write_header(CBOR_MAJOR_TEXT, text.len() as u64);
        self.buf.write_bytes(text.as_bytes());
    }

    /// Write a byte string.
    pub fn write_byte_string(&mut self, bytes: &[u8]) {
        self.write_header(CBOR_MAJOR_BYTES, bytes.len() as u64);
        self.buf.write_bytes(bytes);
    }

    /// Write a boolean.
    pub fn write_bool(&mut self, value: bool) {
        let simple = if value {
            CBOR_SIMPLE_TRUE
        } else {
            CBOR_SIMPLE_FALSE
        };
        self.buf.write_u8(CBOR_MAJOR_PRIMITIVE << 5 | simple);
    }

    /// Write a null.
    pub fn write_null(&mut self) {
        self.buf
            .write_u8(CBOR_MAJOR_PRIMITIVE << 5 | CBOR_SIMPLE_NULL);
    }

    /// Write an unsigned value that may exceed 64 bits. Values that fit are
    /// written inline; wider values use the positive-bignum tag with a
    /// minimal-length payload.
    pub fn write_unsigned_big(&mut self, value: u128) {
        if value <= u64::MAX as u128 {
            self.write_unsigned(value as u64);
            return;
        }
        self.write_header(CBOR_MAJOR_TAG, CBOR_TAG_POSITIVE_BIGNUM);
        let bytes = value.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(15);
        self.write_byte_string(&bytes[start..]);
    }

    /// Write a wide integer from its magnitude. A set `negative` flag means
    /// the value `-1 - magnitude`, matching the negative wire forms.
    pub fn write_big(&mut self, magnitude: &BigUint, negative: bool) {
        if let Some(small) = magnitude.to_u128() {
            if small <= u64::MAX as u128 {
                if negative {
                    self.write_header(CBOR_MAJOR_NEGATIVE, small as u64);
                } else {
                    self.write_unsigned(small as u64);
                }
                return;
            }
        }
        let tag = if negative {
            CBOR_TAG_NEGATIVE_BIGNUM
        } else {
            CBOR_TAG_POSITIVE_BIGNUM
        };
        self.write_header(CBOR_MAJOR_TAG, tag);
        self.write_byte_string(magnitude.minimal_bytes());
    }

    /// Finish encoding. Fails while any container is still open.
    pub fn into_bytes(self) -> Result<Bytes> {
        if self.depth != 0 {
            return Err(Error::invalid_cbor("unclosed sequence"));
        }
        Ok(self.buf.freeze())
    }

    /// Minimal-width header: the argument inlines below 24, then takes the
    /// smallest of the 1/2/4/8-byte forms.
    fn write_header(&mut self, major: u8, argument: u64) {
        if argument <= CBOR_AI_MAX_INLINE as u64 {
            self.buf.write_u8(major << 5 | argument as u8);
        } else if argument <= u8::MAX as u64 {
            self.buf.write_u8(major << 5 | CBOR_AI_ONE_BYTE);
            self.buf.write_u8(argument as u8);
        } else if argument <= u16::MAX as u64 {
            self.buf.write_u8(major << 5 | CBOR_AI_TWO_BYTES);
            self.buf.write_u16_be(argument as u16);
        } else if argument <= u32::MAX as u64 {
            self.buf.write_u8(major << 5 | CBOR_AI_FOUR_BYTES);
            self.buf.write_u32_be(argument as u32);
        } else {
            self.buf.write_u8(major << 5 | CBOR_AI_EIGHT_BYTES);
            self.buf.write_u64_be(argument);
        }
    }
}

impl Default for CborWriter {
    fn default() -> Self {
        Self::new()
    }
}
