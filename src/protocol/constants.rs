//! Wire-format constants for the oracle query protocol.

// CBOR major types (high 3 bits of the item header)
pub const CBOR_MAJOR_UNSIGNED: u8 = 0;
pub const CBOR_MAJOR_NEGATIVE: u8 = 1;
pub const CBOR_MAJOR_BYTES: u8 = 2;
pub const CBOR_MAJOR_TEXT: u8 = 3;
pub const CBOR_MAJOR_ARRAY: u8 = 4;
pub const CBOR_MAJOR_MAP: u8 = 5;
pub const CBOR_MAJOR_TAG: u8 = 6;
pub const CBOR_MAJOR_PRIMITIVE: u8 = 7;

// Additional-information values (low 5 bits of the item header)
pub const CBOR_AI_MAX_INLINE: u8 = 23;
pub const CBOR_AI_ONE_BYTE: u8 = 24;
pub const CBOR_AI_TWO_BYTES: u8 = 25;
pub const CBOR_AI_FOUR_BYTES: u8 = 26;
pub const CBOR_AI_EIGHT_BYTES: u8 = 27;
pub const CBOR_AI_RESERVED_MIN: u8 = 28;
pub const CBOR_AI_RESERVED_MAX: u8 = 30;
pub const CBOR_AI_INDEFINITE: u8 = 31;

// Simple values (major type 7)
pub const CBOR_SIMPLE_FALSE: u8 = 20;
pub const CBOR_SIMPLE_TRUE: u8 = 21;
pub const CBOR_SIMPLE_NULL: u8 = 22;
pub const CBOR_SIMPLE_UNDEFINED: u8 = 23;

// Float widths (major type 7 additional information)
pub const CBOR_AI_FLOAT16: u8 = 25;
pub const CBOR_AI_FLOAT32: u8 = 26;
pub const CBOR_AI_FLOAT64: u8 = 27;

// Stop code terminating indefinite-length items
pub const CBOR_BREAK: u8 = 0xff;

// Tags
pub const CBOR_TAG_POSITIVE_BIGNUM: u64 = 2;
pub const CBOR_TAG_NEGATIVE_BIGNUM: u64 = 3;

// Container nesting limit for the recursive decoder
pub const CBOR_MAX_NESTING_DEPTH: usize = 128;

// Decimal scale applied when converting each float width to a scaled integer
pub const FLOAT16_DECIMAL_SCALE: u32 = 4;
pub const FLOAT32_DECIMAL_SCALE: u32 = 9;
pub const FLOAT64_DECIMAL_SCALE: u32 = 15;

// Query protocol
pub const PROTOCOL_VERSION: u64 = 1;
pub const REQUEST_KEY_DATASET: &str = "ds";
pub const REQUEST_KEY_SQL: &str = "sql";

// Response envelope shapes: [version, ok, data] or
// [version, ok, data, state_epoch, block_hash]
pub const RESPONSE_LEN_BASE: usize = 3;
pub const RESPONSE_LEN_VERIFIED: usize = 5;

// Dataset identifiers: "did:odf:f" followed by a 68-char hex digest
// encoding a 34-byte binary id
pub const DID_PREFIX: &str = "did:odf:f";
pub const DID_HEX_LEN: usize = 68;
pub const DID_BINARY_LEN: usize = 34;
