//! Error types for the dataset oracle.

use std::panic::Location;
use thiserror::Error;

use crate::oracle::Address;

/// Result type alias for oracle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for oracle and wire-codec operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Buffer too small for the requested read.
    #[error("Buffer too small: need {needed} bytes, have {available}, read at {location}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
        location: &'static Location<'static>,
    },

    /// Seek target outside the buffer bounds.
    #[error("Seek target {target} out of range for buffer of {len} bytes")]
    SeekOutOfRange { target: i64, len: usize },

    /// Encoded item uses a major type the decoder does not accept here.
    #[error("Unsupported major type {major_type}")]
    UnsupportedMajorType { major_type: u8 },

    /// Reserved additional-information value in an item header.
    #[error("Invalid length encoding: additional information {additional_information}")]
    InvalidLengthEncoding { additional_information: u8 },

    /// Item header does not match the type the caller asked for.
    #[error("Unexpected major type: expected {expected}, got {actual}")]
    UnexpectedMajorType { expected: u8, actual: u8 },

    /// Simple value outside the recognized set.
    #[error("Unsupported primitive value {value}")]
    UnsupportedPrimitive { value: u64 },

    /// Map key with a non-text major type.
    #[error("Invalid map key: major type {major_type}, only text keys are accepted")]
    InvalidMapKey { major_type: u8 },

    /// Text item bytes are not valid UTF-8.
    #[error("Invalid UTF-8 in text item")]
    InvalidUtf8,

    /// Container nesting exceeds the decoder limit.
    #[error("Nesting depth exceeds limit of {limit}")]
    NestingTooDeep { limit: usize },

    /// Float item is NaN or infinite.
    #[error("Non-finite float has no fixed-decimal form")]
    NonFiniteFloat,

    /// Float magnitude does not fit the scaled fixed-decimal range.
    #[error("Float magnitude overflows the fixed-decimal range")]
    FixedDecimalOverflow,

    /// Bignum payload longer than the widest supported integer.
    #[error("Bignum of {len} bytes exceeds the supported range")]
    BignumOutOfRange { len: usize },

    /// Malformed item structure.
    #[error("Invalid CBOR: {message}")]
    InvalidCbor { message: String },

    /// Response envelope violates the wire contract.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Response carries a protocol version this client does not speak.
    #[error("Unsupported protocol version {version}")]
    UnsupportedVersion { version: u64 },

    /// Dataset identifier does not match the expected textual format.
    #[error("Invalid dataset identifier: {identifier}")]
    InvalidIdentifier { identifier: String },

    /// Dataset identifier contains a non-hexadecimal digest character.
    #[error("Invalid hex digit in dataset identifier: {identifier}")]
    InvalidHexDigit { identifier: String },

    /// Request builder received a second SQL entry.
    #[error("Request already contains a SQL entry")]
    DuplicateSql,

    /// Request builder finished without a SQL entry.
    #[error("Request is missing its SQL entry")]
    MissingSql,

    /// Contract has been disabled by its owner.
    #[error("Contract is disabled")]
    ContractDisabled,

    /// Caller is not in the provider allow-list.
    #[error("Provider {provider} is not authorized")]
    UnauthorizedProvider { provider: Address },

    /// Admin operation attempted by a non-owner.
    #[error("Caller {caller} is not the contract owner")]
    OwnerOnly { caller: Address },

    /// No pending request under the given id.
    #[error("No pending request with id {request_id}")]
    RequestNotFound { request_id: u64 },

    /// Result handler reported a failure.
    #[error("Handler error: {message}")]
    Handler { message: String },
}

impl Error {
    /// Create an invalid-CBOR error.
    pub fn invalid_cbor(message: impl Into<String>) -> Self {
        Self::InvalidCbor {
            message: message.into(),
        }
    }

    /// Create a malformed-response error.
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }
}
