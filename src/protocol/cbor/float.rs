//! IEEE-754 binary16/32/64 decoding into scaled decimals.
//!
//! The bit patterns are unpacked with integer arithmetic only. Each width
//! maps to a fixed decimal scale, and fraction bits below that scale
//! truncate toward zero.

use crate::error::{Error, Result};
use crate::protocol::constants::{
    FLOAT16_DECIMAL_SCALE, FLOAT32_DECIMAL_SCALE, FLOAT64_DECIMAL_SCALE,
};
use crate::protocol::types::FixedDecimal;

/// Decode a binary16 bit pattern.
pub fn decode_f16(bits: u16) -> Result<FixedDecimal> {
    let sign = bits >> 15 != 0;
    let exponent = (bits >> 10) & 0x1f;
    let mantissa = (bits & 0x3ff) as u64;
    if exponent == 0x1f {
        return Err(Error::NonFiniteFloat);
    }
    let (significand, exp2) = if exponent == 0 {
        (mantissa, -24)
    } else {
        (1024 + mantissa, exponent as i32 - 25)
    };
    scaled(sign, significand, exp2, FLOAT16_DECIMAL_SCALE)
}

/// Decode a binary32 bit pattern.
pub fn decode_f32(bits: u32) -> Result<FixedDecimal> {
    let sign = bits >> 31 != 0;
    let exponent = (bits >> 23) & 0xff;
    let mantissa = (bits & 0x7f_ffff) as u64;
    if exponent == 0xff {
        return Err(Error::NonFiniteFloat);
    }
    let (significand, exp2) = if exponent == 0 {
        (mantissa, -149)
    } else {
        ((1u64 << 23) + mantissa, exponent as i32 - 150)
    };
    scaled(sign, significand, exp2, FLOAT32_DECIMAL_SCALE)
}

/// Decode a binary64 bit pattern.
pub fn decode_f64(bits: u64) -> Result<FixedDecimal> {
    let sign = bits >> 63 != 0;
    let exponent = ((bits >> 52) & 0x7ff) as u32;
    let mantissa = bits & 0xf_ffff_ffff_ffff;
    if exponent == 0x7ff {
        return Err(Error::NonFiniteFloat);
    }
    let (significand, exp2) = if exponent == 0 {
        (mantissa, -1074)
    } else {
        ((1u64 << 52) + mantissa, exponent as i32 - 1075)
    };
    scaled(sign, significand, exp2, FLOAT64_DECIMAL_SCALE)
}

/// Scale `significand * 2^exp2` to an integer carrying `scale` decimal
/// fraction digits.
fn scaled(sign: bool, significand: u64, exp2: i32, scale: u32) -> Result<FixedDecimal> {
    // largest base is 2^53 * 10^15, well inside u128
    let base = significand as u128 * 10u128.pow(scale);
    let magnitude = if exp2 >= 0 {
        let shift = exp2 as u32;
        if shift >= 128 || (base != 0 && shift > base.leading_zeros()) {
            if base != 0 {
                return Err(Error::FixedDecimalOverflow);
            }
            0
        } else {
            base << shift
        }
    } else {
        let shift = (-exp2) as u32;
        if shift >= 128 {
            0
        } else {
            base >> shift
        }
    };
    if magnitude > i128::MAX as u128 {
        return Err(Error::FixedDecimalOverflow);
    }
    let value = if sign {
        -(magnitude as i128)
    } else {
        magnitude as i128
    };
    Ok(FixedDecimal::new(value, scale))
}
