//! Decoded wire values.

use bytes::Bytes;
use std::fmt;

/// A decimal number held as a scaled integer.
///
/// `value` is the number multiplied by `10^scale`. Wire floats decode into
/// this form without ever passing through a native float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedDecimal {
    /// Scaled integer value.
    pub value: i128,
    /// Number of decimal fraction digits folded into `value`.
    pub scale: u32,
}

impl FixedDecimal {
    /// Create a fixed decimal from a scaled integer.
    pub fn new(value: i128, scale: u32) -> Self {
        Self { value, scale }
    }

    /// Check if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Check if the value is negative.
    pub fn is_negative(&self) -> bool {
        self.value < 0
    }
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.value);
        }
        let divisor = 10i128.pow(self.scale);
        let magnitude = self.value.unsigned_abs();
        let int_part = magnitude / divisor as u128;
        let frac_part = magnitude % divisor as u128;
        let sign = if self.value < 0 { "-" } else { "" };
        write!(
            f,
            "{sign}{int_part}.{frac_part:0width$}",
            width = self.scale as usize
        )
    }
}

/// An unsigned integer of up to 256 bits, big-endian magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigUint(pub [u8; 32]);

impl BigUint {
    /// Create from a raw big-endian 32-byte magnitude.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a u128 value.
    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Get the raw big-endian magnitude.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to u128 if the value fits.
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[..16].iter().any(|&b| b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(low))
    }

    /// Magnitude with leading zero bytes stripped. Zero yields an empty
    /// slice.
    pub fn minimal_bytes(&self) -> &[u8] {
        let start = self.0.iter().position(|&b| b != 0).unwrap_or(32);
        &self.0[start..]
    }

    /// Check if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl From<u64> for BigUint {
    fn from(value: u64) -> Self {
        Self::from_u128(value as u128)
    }
}

impl fmt::Display for BigUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.minimal_bytes()))
    }
}

/// A signed integer of up to 256 bits of magnitude.
///
/// For negative values the wire magnitude `n` encodes `-1 - n`, so the
/// represented value is `-1 - magnitude` when `negative` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BigNum {
    pub negative: bool,
    pub magnitude: BigUint,
}

impl BigNum {
    /// Create a non-negative bignum.
    pub fn positive(magnitude: BigUint) -> Self {
        Self {
            negative: false,
            magnitude,
        }
    }

    /// Create a negative bignum from its wire magnitude `n`, representing
    /// `-1 - n`.
    pub fn negative(magnitude: BigUint) -> Self {
        Self {
            negative: true,
            magnitude,
        }
    }

    /// Convert to i128 if the represented value fits.
    pub fn to_i128(&self) -> Option<i128> {
        let n = self.magnitude.to_u128()?;
        if self.negative {
            if n > i128::MAX as u128 {
                return None;
            }
            Some(-1 - n as i128)
        } else {
            if n > i128::MAX as u128 {
                return None;
            }
            Some(n as i128)
        }
    }
}

/// A single decoded data item.
#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    /// Unsigned integer (major type 0).
    Unsigned(u64),
    /// Negative integer (major type 1), exact value in `[-2^64, -1]`.
    Negative(i128),
    /// Byte string, zero-copy view into the decoded buffer.
    Bytes(Bytes),
    /// Text string.
    Text(String),
    /// Array of items.
    Array(Vec<CborValue>),
    /// Map with text keys, in wire order.
    Map(Vec<(String, CborValue)>),
    /// Boolean.
    Bool(bool),
    /// Null.
    Null,
    /// Undefined.
    Undefined,
    /// Float decoded to a scaled decimal.
    Fixed(FixedDecimal),
    /// Tagged bignum wider than the native integer forms.
    Big(BigNum),
}

impl CborValue {
    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, CborValue::Null)
    }

    /// Try to get the value as a u64.
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            CborValue::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the value as a signed integer. Covers both integer major
    /// types.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            CborValue::Unsigned(v) => Some(*v as i128),
            CborValue::Negative(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the value as a text reference.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CborValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get the value as an array.
    pub fn as_array(&self) -> Option<&[CborValue]> {
        match self {
            CborValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get the value as a map.
    pub fn as_map(&self) -> Option<&[(String, CborValue)]> {
        match self {
            CborValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Try to get the value as a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CborValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a fixed decimal.
    pub fn as_fixed(&self) -> Option<FixedDecimal> {
        match self {
            CborValue::Fixed(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get the value as a bignum.
    pub fn as_big(&self) -> Option<&BigNum> {
        match self {
            CborValue::Big(b) => Some(b),
            _ => None,
        }
    }
}
