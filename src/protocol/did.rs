//! Dataset identifiers.

use std::fmt;

use crate::error::{Error, Result};
use crate::protocol::constants::{DID_BINARY_LEN, DID_HEX_LEN, DID_PREFIX};

/// A 34-byte dataset identifier.
///
/// The textual form is `did:odf:f` followed by the 68-digit hex digest.
/// Parsing accepts either hex case; [`fmt::Display`] renders the canonical
/// lowercase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetId([u8; DID_BINARY_LEN]);

impl DatasetId {
    /// Create an identifier from its raw bytes.
    pub fn from_bytes(bytes: [u8; DID_BINARY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the textual `did:odf:f…` form.
    pub fn parse_did(identifier: &str) -> Result<Self> {
        let digest = identifier
            .strip_prefix(DID_PREFIX)
            .ok_or_else(|| Error::InvalidIdentifier {
                identifier: identifier.to_string(),
            })?;
        if digest.len() != DID_HEX_LEN {
            return Err(Error::InvalidIdentifier {
                identifier: identifier.to_string(),
            });
        }
        let mut bytes = [0u8; DID_BINARY_LEN];
        hex::decode_to_slice(digest, &mut bytes).map_err(|_| Error::InvalidHexDigit {
            identifier: identifier.to_string(),
        })?;
        Ok(Self(bytes))
    }

    /// Get the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; DID_BINARY_LEN] {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DID_PREFIX}{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for DatasetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_did(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "did:odf:fed0100d72fc7a0d7ced1ff2d47edc37e4a14b3b3d5d7bd6fc67a1477ba343c3e9d62";

    #[test]
    fn test_parse_and_render_round_trip() {
        let id = DatasetId::parse_did(SAMPLE).unwrap();
        assert_eq!(id.to_string(), SAMPLE);
        assert_eq!(id.as_bytes()[0], 0xed);
        assert_eq!(id.as_bytes().len(), 34);
    }

    #[test]
    fn test_uppercase_hex_accepted_and_canonicalized() {
        let upper = format!("did:odf:f{}", SAMPLE[9..].to_uppercase());
        let id = DatasetId::parse_did(&upper).unwrap();
        assert_eq!(id.to_string(), SAMPLE);
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let err = DatasetId::parse_did("did:key:fed0100").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { .. }));
        let err = DatasetId::parse_did("").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let short = &SAMPLE[..SAMPLE.len() - 2];
        assert!(matches!(
            DatasetId::parse_did(short).unwrap_err(),
            Error::InvalidIdentifier { .. }
        ));
        let long = format!("{SAMPLE}00");
        assert!(matches!(
            DatasetId::parse_did(&long).unwrap_err(),
            Error::InvalidIdentifier { .. }
        ));
    }

    #[test]
    fn test_non_hex_digit_rejected() {
        let bad = format!("did:odf:f{}", "zz".repeat(34));
        assert!(matches!(
            DatasetId::parse_did(&bad).unwrap_err(),
            Error::InvalidHexDigit { .. }
        ));
    }

    #[test]
    fn test_from_bytes_round_trip() {
        let id = DatasetId::parse_did(SAMPLE).unwrap();
        let again = DatasetId::from_bytes(*id.as_bytes());
        assert_eq!(id, again);
    }
}
