//! Storage Layer: encoded trees on disk
//!
//! Files are read through a read-only memory map and written through a
//! writable one sized to the encoded tree.

mod mmap_file;

pub use mmap_file::{read_file, write_file, write_file_with_sink, TlvFile};
