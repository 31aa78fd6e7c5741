//! CBOR item decoding.

use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::cbor::float;
use crate::protocol::constants::*;
use crate::protocol::types::{BigNum, BigUint, CborValue, FixedDecimal};

/// Decoder for CBOR data items over a [`ReadBuffer`].
///
/// Tags are transparent: they are consumed and only the outermost one is
/// inspected, to recognize the bignum forms. Byte strings decode as
/// zero-copy views into the underlying buffer.
pub struct CborReader {
    buf: ReadBuffer,
}

impl CborReader {
    /// Create a reader over an existing buffer.
    pub fn new(buf: ReadBuffer) -> Self {
        Self { buf }
    }

    /// Create a reader directly over bytes.
    pub fn from_bytes(data: Bytes) -> Self {
        Self::new(ReadBuffer::new(data))
    }

    /// Check whether undecoded bytes remain.
    pub fn has_more(&self) -> bool {
        self.buf.remaining() > 0
    }

    /// Number of undecoded bytes.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Read the next item as an unsigned integer.
    pub fn read_unsigned(&mut self) -> Result<u64> {
        let (major, ai) = self.next_header_skipping_tags()?;
        if major != CBOR_MAJOR_UNSIGNED {
            return Err(Error::UnexpectedMajorType {
                expected: CBOR_MAJOR_UNSIGNED,
                actual: major,
            });
        }
        self.require_argument(ai)
    }

    /// Read the next item as a signed integer. Accepts both integer major
    /// types; a negative item with argument `v` decodes exactly as `-1 - v`.
    pub fn read_integer(&mut self) -> Result<i128> {
        let (major, ai) = self.next_header_skipping_tags()?;
        match major {
            CBOR_MAJOR_UNSIGNED => Ok(self.require_argument(ai)? as i128),
            CBOR_MAJOR_NEGATIVE => Ok(-1 - self.require_argument(ai)? as i128),
            actual => Err(Error::UnexpectedMajorType {
                expected: CBOR_MAJOR_NEGATIVE,
                actual,
            }),
        }
    }

    /// Read the next item as a text string.
    pub fn read_text(&mut self) -> Result<String> {
        let (major, ai) = self.next_header_skipping_tags()?;
        if major != CBOR_MAJOR_TEXT {
            return Err(Error::UnexpectedMajorType {
                expected: CBOR_MAJOR_TEXT,
                actual: major,
            });
        }
        self.read_text_body(ai)
    }

    /// Read the next item as a byte string.
    pub fn read_byte_string(&mut self) -> Result<Bytes> {
        let (major, ai) = self.next_header_skipping_tags()?;
        if major != CBOR_MAJOR_BYTES {
            return Err(Error::UnexpectedMajorType {
                expected: CBOR_MAJOR_BYTES,
                actual: major,
            });
        }
        self.read_byte_string_body(ai)
    }

    /// Read the next item as a boolean.
    pub fn read_bool(&mut self) -> Result<bool> {
        let (major, ai) = self.next_header_skipping_tags()?;
        if major != CBOR_MAJOR_PRIMITIVE {
            return Err(Error::UnexpectedMajorType {
                expected: CBOR_MAJOR_PRIMITIVE,
                actual: major,
            });
        }
        match self.read_simple_value(ai)? {
            CborValue::Bool(b) => Ok(b),
            CborValue::Null => Err(Error::UnsupportedPrimitive {
                value: CBOR_SIMPLE_NULL as u64,
            }),
            CborValue::Undefined => Err(Error::UnsupportedPrimitive {
                value: CBOR_SIMPLE_UNDEFINED as u64,
            }),
            _ => Err(Error::invalid_cbor("expected a boolean item")),
        }
    }

    /// Read the next item as a float, decoded to a fixed decimal.
    pub fn read_float(&mut self) -> Result<FixedDecimal> {
        let (major, ai) = self.next_header_skipping_tags()?;
        if major != CBOR_MAJOR_PRIMITIVE {
            return Err(Error::UnexpectedMajorType {
                expected: CBOR_MAJOR_PRIMITIVE,
                actual: major,
            });
        }
        match ai {
            CBOR_AI_FLOAT16 => float::decode_f16(self.buf.read_u16_be()?),
            CBOR_AI_FLOAT32 => float::decode_f32(self.buf.read_u32_be()?),
            CBOR_AI_FLOAT64 => float::decode_f64(self.buf.read_u64_be()?),
            other => Err(Error::UnsupportedPrimitive {
                value: other as u64,
            }),
        }
    }

    /// Decode one complete data item, recursing into arrays and maps.
    pub fn read_value(&mut self) -> Result<CborValue> {
        self.read_value_at_depth(0)
    }

    fn read_value_at_depth(&mut self, depth: usize) -> Result<CborValue> {
        if depth >= CBOR_MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                limit: CBOR_MAX_NESTING_DEPTH,
            });
        }
        let mut outer_tag = None;
        loop {
            let (major, ai) = self.read_header()?;
            if major == CBOR_MAJOR_TAG {
                let tag = self.require_argument(ai)?;
                if outer_tag.is_none() {
                    outer_tag = Some(tag);
                }
                continue;
            }
            return self.read_item_body(major, ai, outer_tag, depth);
        }
    }

    fn read_item_body(
        &mut self,
        major: u8,
        ai: u8,
        tag: Option<u64>,
        depth: usize,
    ) -> Result<CborValue> {
        match major {
            CBOR_MAJOR_UNSIGNED => Ok(CborValue::Unsigned(self.require_argument(ai)?)),
            CBOR_MAJOR_NEGATIVE => {
                Ok(CborValue::Negative(-1 - self.require_argument(ai)? as i128))
            }
            CBOR_MAJOR_BYTES => {
                let payload = self.read_byte_string_body(ai)?;
                match tag {
                    Some(CBOR_TAG_POSITIVE_BIGNUM) => {
                        Ok(CborValue::Big(BigNum::positive(bignum_magnitude(&payload)?)))
                    }
                    Some(CBOR_TAG_NEGATIVE_BIGNUM) => {
                        Ok(CborValue::Big(BigNum::negative(bignum_magnitude(&payload)?)))
                    }
                    _ => Ok(CborValue::Bytes(payload)),
                }
            }
            CBOR_MAJOR_TEXT => Ok(CborValue::Text(self.read_text_body(ai)?)),
            CBOR_MAJOR_ARRAY => {
                let mut items = Vec::new();
                match self.require_length(ai)? {
                    Some(n) => {
                        for _ in 0..n {
                            items.push(self.read_value_at_depth(depth + 1)?);
                        }
                    }
                    None => loop {
                        if self.buf.peek_u8()? == CBOR_BREAK {
                            self.buf.skip(1)?;
                            break;
                        }
                        items.push(self.read_value_at_depth(depth + 1)?);
                    },
                }
                Ok(CborValue::Array(items))
            }
            CBOR_MAJOR_MAP => {
                let mut entries = Vec::new();
                match self.require_length(ai)? {
                    Some(n) => {
                        for _ in 0..n {
                            let key = self.read_map_key()?;
                            let value = self.read_value_at_depth(depth + 1)?;
                            entries.push((key, value));
                        }
                    }
                    None => loop {
                        if self.buf.peek_u8()? == CBOR_BREAK {
                            self.buf.skip(1)?;
                            break;
                        }
                        let key = self.read_map_key()?;
                        let value = self.read_value_at_depth(depth + 1)?;
                        entries.push((key, value));
                    },
                }
                Ok(CborValue::Map(entries))
            }
            CBOR_MAJOR_PRIMITIVE => match ai {
                CBOR_AI_FLOAT16 => Ok(CborValue::Fixed(float::decode_f16(
                    self.buf.read_u16_be()?,
                )?)),
                CBOR_AI_FLOAT32 => Ok(CborValue::Fixed(float::decode_f32(
                    self.buf.read_u32_be()?,
                )?)),
                CBOR_AI_FLOAT64 => Ok(CborValue::Fixed(float::decode_f64(
                    self.buf.read_u64_be()?,
                )?)),
                CBOR_AI_INDEFINITE => Err(Error::invalid_cbor("unexpected break code")),
                _ => self.read_simple_value(ai),
            },
            // three header bits cannot exceed 7, kept as a decode guard
            other => Err(Error::UnsupportedMajorType { major_type: other }),
        }
    }

    /// Map keys must be text items. Tags on keys are transparent like
    /// everywhere else.
    fn read_map_key(&mut self) -> Result<String> {
        let (major, ai) = self.next_header_skipping_tags()?;
        if major != CBOR_MAJOR_TEXT {
            return Err(Error::InvalidMapKey { major_type: major });
        }
        self.read_text_body(ai)
    }

    fn read_simple_value(&mut self, ai: u8) -> Result<CborValue> {
        let value = match ai {
            0..=CBOR_AI_MAX_INLINE => ai as u64,
            CBOR_AI_ONE_BYTE => self.buf.read_u8()? as u64,
            other => {
                return Err(Error::InvalidLengthEncoding {
                    additional_information: other,
                })
            }
        };
        match value {
            v if v == CBOR_SIMPLE_FALSE as u64 => Ok(CborValue::Bool(false)),
            v if v == CBOR_SIMPLE_TRUE as u64 => Ok(CborValue::Bool(true)),
            v if v == CBOR_SIMPLE_NULL as u64 => Ok(CborValue::Null),
            v if v == CBOR_SIMPLE_UNDEFINED as u64 => Ok(CborValue::Undefined),
            other => Err(Error::UnsupportedPrimitive { value: other }),
        }
    }

    fn read_text_body(&mut self, ai: u8) -> Result<String> {
        let payload = self.read_byte_string_payload(ai, CBOR_MAJOR_TEXT)?;
        String::from_utf8(payload.to_vec()).map_err(|_| Error::InvalidUtf8)
    }

    fn read_byte_string_body(&mut self, ai: u8) -> Result<Bytes> {
        self.read_byte_string_payload(ai, CBOR_MAJOR_BYTES)
    }

    /// Definite-length strings decode as a single zero-copy view.
    /// Indefinite-length strings concatenate definite chunks of the same
    /// major type up to the break code.
    fn read_byte_string_payload(&mut self, ai: u8, chunk_major: u8) -> Result<Bytes> {
        match self.require_length(ai)? {
            Some(n) => self.buf.read_bytes(n),
            None => {
                let mut assembled = BytesMut::new();
                loop {
                    if self.buf.peek_u8()? == CBOR_BREAK {
                        self.buf.skip(1)?;
                        return Ok(assembled.freeze());
                    }
                    let (major, chunk_ai) = self.read_header()?;
                    if major != chunk_major || chunk_ai == CBOR_AI_INDEFINITE {
                        return Err(Error::InvalidLengthEncoding {
                            additional_information: chunk_ai,
                        });
                    }
                    let len = self.require_argument(chunk_ai)? as usize;
                    let chunk = self.buf.read_bytes(len)?;
                    assembled.extend_from_slice(&chunk);
                }
            }
        }
    }

    fn read_header(&mut self) -> Result<(u8, u8)> {
        let byte = self.buf.read_u8()?;
        Ok((byte >> 5, byte & 0x1f))
    }

    fn next_header_skipping_tags(&mut self) -> Result<(u8, u8)> {
        loop {
            let (major, ai) = self.read_header()?;
            if major == CBOR_MAJOR_TAG {
                self.require_argument(ai)?;
                continue;
            }
            return Ok((major, ai));
        }
    }

    /// Length argument of a header. `None` means indefinite.
    fn read_argument(&mut self, ai: u8) -> Result<Option<u64>> {
        match ai {
            0..=CBOR_AI_MAX_INLINE => Ok(Some(ai as u64)),
            CBOR_AI_ONE_BYTE => Ok(Some(self.buf.read_u8()? as u64)),
            CBOR_AI_TWO_BYTES => Ok(Some(self.buf.read_u16_be()? as u64)),
            CBOR_AI_FOUR_BYTES => Ok(Some(self.buf.read_u32_be()? as u64)),
            CBOR_AI_EIGHT_BYTES => Ok(Some(self.buf.read_u64_be()?)),
            CBOR_AI_INDEFINITE => Ok(None),
            other => Err(Error::InvalidLengthEncoding {
                additional_information: other,
            }),
        }
    }

    /// Definite argument, rejecting the indefinite form.
    fn require_argument(&mut self, ai: u8) -> Result<u64> {
        self.read_argument(ai)?
            .ok_or(Error::InvalidLengthEncoding {
                additional_information: CBOR_AI_INDEFINITE,
            })
    }

    /// Container or string length: definite count or indefinite.
    fn require_length(&mut self, ai: u8) -> Result<Option<usize>> {
        Ok(self.read_argument(ai)?.map(|n| n as usize))
    }
}

/// Right-align a bignum payload and decode it through the wide buffer
/// reads.
fn bignum_magnitude(payload: &[u8]) -> Result<BigUint> {
    let len = payload.len();
    if len > 32 {
        return Err(Error::BignumOutOfRange { len });
    }
    let mut padded = [0u8; 32];
    padded[32 - len..].copy_from_slice(payload);
    let mut wide = ReadBuffer::new(Bytes::copy_from_slice(&padded));
    if len <= 16 {
        wide.skip(16)?;
        Ok(BigUint::from_u128(wide.read_u128_be()?))
    } else {
        Ok(BigUint::from_bytes(wide.read_u256_be()?))
    }
}
