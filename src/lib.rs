//! # tlvtree
//!
//! Tree-shaped Tag-Length-Value encoding with 16-bit tags and lengths.
//!
//! Arsitektur:
//! - `core`: the node tree (constructed containers, primitive leaves) and
//!   the builder operations that attach nodes
//! - `protocol`: length pass, encoder and decoder for the wire format
//! - `storage`: memory-mapped tree files
//! - `dump` / `sink`: text rendering and the injected diagnostic sink
//!
//! ## Wire format
//!
//! ```text
//! ┌──────────┬──────────┬────────────┬──────────────────────────────┐
//! │ type (1) │ tag (2)  │ length (2) │ value or encoded children    │
//! └──────────┴──────────┴────────────┴──────────────────────────────┘
//! ```
//!
//! `0xFA` marks a constructed node, `0xBA` a primitive one. Tag and length
//! are big-endian. A whole tree never exceeds 65535 bytes.
//!
//! ## Quick start
//!
//! ```
//! use tlvtree::{decode, encode, Node};
//!
//! let mut root = Node::constructed(1);
//! root.append_child(Node::primitive(2, vec![0xAB, 0xCD]).unwrap()).unwrap();
//!
//! let bytes = encode(&mut root).unwrap();
//! assert_eq!(bytes, [0xFA, 0, 1, 0, 7, 0xBA, 0, 2, 0, 2, 0xAB, 0xCD]);
//!
//! let back = decode(&bytes).unwrap();
//! assert_eq!(back, root);
//! ```

pub mod core;
pub mod dump;
pub mod error;
pub mod protocol;
pub mod sink;
pub mod storage;

pub use crate::core::{
    append_child, append_sibling, new_constructed, new_primitive, release_deep, release_shallow,
    set_child, set_next, Node, Rejected,
};
pub use dump::{dump, Dump};
pub use error::{Result, TlvError};
pub use protocol::{compute_length, decode, encode, Decoder, Encoder, NodeType};
pub use sink::{DebugSink, NoopSink, TracingSink};
pub use storage::{read_file, write_file, TlvFile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library version string, e.g. `"0.1.0"`.
pub fn version() -> &'static str {
    VERSION
}
