//! Query request encoding.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::cbor::CborWriter;
use crate::protocol::constants::{PROTOCOL_VERSION, REQUEST_KEY_DATASET, REQUEST_KEY_SQL};
use crate::protocol::did::DatasetId;

/// Builder for the query request wire form.
///
/// A request is one array: the protocol version, then a `"ds"` triplet per
/// dataset binding, then a single `"sql"` entry. Identical call sequences
/// produce byte-identical encodings.
pub struct QueryRequestBuilder {
    writer: CborWriter,
    has_sql: bool,
}

impl QueryRequestBuilder {
    /// Start a request at the current protocol version.
    pub fn new() -> Self {
        let mut writer = CborWriter::new();
        writer.start_array();
        writer.write_unsigned(PROTOCOL_VERSION);
        Self {
            writer,
            has_sql: false,
        }
    }

    /// Bind a dataset under a query alias.
    pub fn dataset(mut self, alias: &str, id: &DatasetId) -> Self {
        self.writer.write_text(REQUEST_KEY_DATASET);
        self.writer.write_text(alias);
        self.writer.write_byte_string(id.as_bytes());
        self
    }

    /// Bind a dataset given its textual `did:odf:f…` identifier.
    pub fn dataset_did(self, alias: &str, did: &str) -> Result<Self> {
        let id = DatasetId::parse_did(did)?;
        Ok(self.dataset(alias, &id))
    }

    /// Set the query text. A request carries exactly one SQL entry, so a
    /// second call fails with [`Error::DuplicateSql`].
    pub fn sql(mut self, text: &str) -> Result<Self> {
        if self.has_sql {
            return Err(Error::DuplicateSql);
        }
        self.writer.write_text(REQUEST_KEY_SQL);
        self.writer.write_text(text);
        self.has_sql = true;
        Ok(self)
    }

    /// Finish the request. Fails with [`Error::MissingSql`] if no query
    /// text was set.
    pub fn into_bytes(mut self) -> Result<Bytes> {
        if !self.has_sql {
            return Err(Error::MissingSql);
        }
        self.writer.end_sequence()?;
        self.writer.into_bytes()
    }
}

impl Default for QueryRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
