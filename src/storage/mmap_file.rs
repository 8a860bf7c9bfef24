//! Memory-Mapped Tree Files
//!
//! An encoded tree is stored as a plain file holding exactly the encoded
//! bytes. Reading maps the file and decodes straight from the page cache;
//! writing sizes the file, maps it writable and copies the encoding in.

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use crate::core::Node;
use crate::error::{Result, TlvError};
use crate::protocol::{compute_length, Decoder, Encoder, MAX_ENCODED_SIZE};
use crate::sink::{self, SharedSink};

/// Read-only mapping of an encoded tree file
pub struct TlvFile {
    mmap: Mmap,
    sink: SharedSink,
}

impl TlvFile {
    /// Opens and maps `path`.
    ///
    /// Empty files and files larger than 65535 bytes are rejected before
    /// mapping.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Err(TlvError::malformed(0, "empty file"));
        }
        if len > MAX_ENCODED_SIZE as u64 {
            return Err(TlvError::malformed(
                0,
                format!("file of {} bytes exceeds {}", len, MAX_ENCODED_SIZE),
            ));
        }

        // SAFETY: the mapping is read-only and lives no longer than `self`;
        // concurrent truncation by another process is outside our control,
        // as with any mmap reader.
        let mmap = unsafe { MmapOptions::new().len(len as usize).map(&file)? };

        Ok(Self {
            mmap,
            sink: sink::noop(),
        })
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Raw encoded bytes (zero-copy view of the mapping)
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Decodes the mapped bytes into an owned tree.
    pub fn decode(&self) -> Result<Node> {
        Decoder::new(&self.mmap)
            .with_sink(self.sink.clone())
            .decode()
    }
}

/// Encodes `root` into `path`, replacing any previous content.
///
/// Returns the number of bytes written.
pub fn write_file<P: AsRef<Path>>(path: P, root: &mut Node) -> Result<usize> {
    write_file_with_sink(path, root, sink::noop())
}

/// [`write_file`] reporting through `sink`.
pub fn write_file_with_sink<P: AsRef<Path>>(
    path: P,
    root: &mut Node,
    sink: SharedSink,
) -> Result<usize> {
    let total = compute_length(root)?;
    if total > MAX_ENCODED_SIZE {
        return Err(TlvError::TooLarge { len: total });
    }

    let mut encoder = Encoder::new(total)?.with_sink(sink);
    let bytes = encoder.encode(root)?;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.set_len(total as u64)?;

    // SAFETY: the file was just created/truncated by us with read/write
    // access and sized to `total` bytes.
    let mut mmap = unsafe { MmapOptions::new().len(total).map_mut(&file)? };
    mmap.copy_from_slice(bytes);
    mmap.flush()?;

    Ok(total)
}

/// Decodes a file without keeping the mapping around.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Node> {
    TlvFile::open(path)?.decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> Node {
        let mut root = Node::constructed(10);
        root.append_child(Node::primitive_str(12, "hello").unwrap())
            .unwrap();
        root
    }

    #[test]
    fn test_write_then_open() {
        let path = "test_tlv_write_then_open.dat";

        {
            let mut root = sample();
            let written = write_file(path, &mut root).unwrap();
            assert_eq!(written, 15);

            let file = TlvFile::open(path).unwrap();
            assert_eq!(file.len(), 15);
            assert_eq!(file.decode().unwrap(), root);
        }

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_overwrite_shrinks_file() {
        let path = "test_tlv_overwrite.dat";

        {
            let mut big = sample();
            big.append_sibling(Node::primitive(1, vec![7; 100]).unwrap());
            write_file(path, &mut big).unwrap();

            let mut small = Node::constructed(1);
            write_file(path, &mut small).unwrap();

            let decoded = read_file(path).unwrap();
            assert_eq!(decoded, small);
            assert_eq!(fs::metadata(path).unwrap().len(), 5);
        }

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_open_rejects_empty_file() {
        let path = "test_tlv_empty.dat";
        fs::write(path, b"").unwrap();

        let err = TlvFile::open(path).err().unwrap();
        assert!(err.is_malformed());

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_open_missing_file() {
        let err = TlvFile::open("test_tlv_does_not_exist.dat").err().unwrap();
        assert!(matches!(err, TlvError::Io(_)));
    }
}
