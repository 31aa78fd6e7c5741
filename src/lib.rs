//! Client-side implementation of the dataset oracle protocol.
//!
//! The crate covers the full request/response cycle: queries are encoded
//! with [`QueryRequestBuilder`], dispatched through an [`Oracle`], and the
//! provider's CBOR payload is decoded into a [`QueryResponse`] before the
//! consumer's [`OracleResultHandler`] runs.
//!
//! ```no_run
//! use dataset_oracle_rs::{Address, Oracle, QueryRequestBuilder};
//!
//! # fn main() -> dataset_oracle_rs::Result<()> {
//! let owner = Address::from_bytes([0x01; 20]);
//! let consumer = Address::from_bytes([0x02; 20]);
//! let mut oracle = Oracle::new(owner);
//!
//! let request = QueryRequestBuilder::new()
//!     .dataset_did(
//!         "tickers",
//!         "did:odf:fed0100d72fc7a0d7ced1ff2d47edc37e4a14b3b3d5d7bd6fc67a1477ba343c3e9d62",
//!     )?
//!     .sql("select symbol, price from tickers")?
//!     .into_bytes()?;
//!
//! struct PrintHandler;
//! impl dataset_oracle_rs::OracleResultHandler for PrintHandler {
//!     fn handle_result(
//!         &mut self,
//!         _oracle: &mut Oracle,
//!         response: &dataset_oracle_rs::QueryResponse,
//!     ) -> dataset_oracle_rs::Result<()> {
//!         println!("records: {}", response.num_records());
//!         Ok(())
//!     }
//! }
//!
//! let request_id = oracle.send_request(consumer, request, Box::new(PrintHandler))?;
//! println!("submitted request {request_id}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod oracle;
pub mod protocol;

pub use error::{Error, Result};
pub use oracle::{Address, Oracle, OracleEvent, OracleResultHandler};
pub use protocol::{
    BigNum, BigUint, CborReader, CborValue, CborWriter, DatasetId, FixedDecimal,
    QueryRequestBuilder, QueryResponse, Record,
};
