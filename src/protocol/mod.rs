//! Protocol Layer: Tree Binary Encoding
//!
//! Prinsip desain:
//! - Fixed 5-byte headers: type, big-endian tag, big-endian length
//! - Exact sizing: the length pass sizes the output buffer before any write
//! - Bounded parsing: every nested length must fit inside its enclosing scope

mod encoder;
mod header;

pub use encoder::{compute_length, decode, encode, Decoder, Encoder};
pub use header::{Header, NodeType, CONSTRUCTED, HEADER_SIZE, MAX_ENCODED_SIZE, PRIMITIVE};
