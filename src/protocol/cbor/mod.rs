//! CBOR wire codec.

pub mod float;
pub mod reader;
pub mod writer;

pub use reader::CborReader;
pub use writer::CborWriter;
