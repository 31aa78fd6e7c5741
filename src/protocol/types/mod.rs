//! Data types for query results.

mod record;
mod value;

pub use record::Record;
pub use value::{BigNum, BigUint, CborValue, FixedDecimal};
