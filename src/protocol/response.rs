//! Query response parsing.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::cbor::CborReader;
use crate::protocol::constants::{PROTOCOL_VERSION, RESPONSE_LEN_BASE, RESPONSE_LEN_VERIFIED};
use crate::protocol::types::{CborValue, Record};

/// A decoded query response.
///
/// The wire form is one array: `[version, ok, data]`, optionally extended
/// with two trailing verification fields in the success case. The error
/// form carries the message text in place of the data and is always three
/// elements long.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    request_id: u64,
    ok: bool,
    records: Vec<Record>,
    error_message: Option<String>,
    verification: Vec<CborValue>,
}

impl QueryResponse {
    /// Decode a response for the given request.
    pub fn from_bytes(request_id: u64, data: &Bytes) -> Result<Self> {
        let mut reader = CborReader::from_bytes(data.clone());
        let envelope = reader.read_value()?;
        let items = envelope
            .as_array()
            .ok_or_else(|| Error::malformed_response("top-level item is not an array"))?;
        if items.len() != RESPONSE_LEN_BASE && items.len() != RESPONSE_LEN_VERIFIED {
            return Err(Error::malformed_response(format!(
                "envelope has {} elements",
                items.len()
            )));
        }

        let version = items[0]
            .as_unsigned()
            .ok_or_else(|| Error::malformed_response("version is not an unsigned integer"))?;
        if version != PROTOCOL_VERSION {
            return Err(Error::UnsupportedVersion { version });
        }
        let ok = items[1]
            .as_bool()
            .ok_or_else(|| Error::malformed_response("success flag is not a boolean"))?;

        if ok {
            let rows = items[2]
                .as_array()
                .ok_or_else(|| Error::malformed_response("result data is not an array"))?;
            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                let values = row
                    .as_array()
                    .ok_or_else(|| Error::malformed_response("result row is not an array"))?;
                records.push(Record::new(values.to_vec()));
            }
            Ok(Self {
                request_id,
                ok: true,
                records,
                error_message: None,
                verification: items[RESPONSE_LEN_BASE..].to_vec(),
            })
        } else {
            if items.len() != RESPONSE_LEN_BASE {
                return Err(Error::malformed_response(
                    "error envelope must have exactly three elements",
                ));
            }
            let message = items[2]
                .as_text()
                .ok_or_else(|| Error::malformed_response("error message is not a text item"))?;
            Ok(Self {
                request_id,
                ok: false,
                records: Vec::new(),
                error_message: Some(message.to_string()),
                verification: Vec::new(),
            })
        }
    }

    /// Fixture constructor: an empty successful response. Not part of any
    /// decode path.
    pub fn empty(request_id: u64) -> Self {
        Self {
            request_id,
            ok: true,
            records: Vec::new(),
            error_message: None,
            verification: Vec::new(),
        }
    }

    /// Fixture constructor: a failed response with a message. Not part of
    /// any decode path.
    pub fn error(request_id: u64, message: impl Into<String>) -> Self {
        Self {
            request_id,
            ok: false,
            records: Vec::new(),
            error_message: Some(message.into()),
            verification: Vec::new(),
        }
    }

    /// Whether the query succeeded.
    pub fn ok(&self) -> bool {
        self.ok
    }

    /// The request this response answers.
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Number of result records.
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Get a result record by index.
    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// All result records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The error message of a failed response.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Trailing verification fields of the extended success form, verbatim.
    pub fn verification(&self) -> &[CborValue] {
        &self.verification
    }
}
