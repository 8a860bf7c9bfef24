//! Node Header Format
//!
//! Layout:
//! ┌──────────┬──────────────┬──────────────┬──────────────────────────┐
//! │ type (1) │ tag (2, BE)  │ length (2,BE)│ payload (length bytes)   │
//! └──────────┴──────────────┴──────────────┴──────────────────────────┘
//!
//! Primitive payload is the raw value. Constructed payload is the
//! concatenated encoding of its children. Siblings follow each other with
//! no delimiter.

use crate::error::{Result, TlvError};

/// Size of the fixed header in front of every node.
pub const HEADER_SIZE: usize = 5;
/// Largest encoded tree (and largest single length field).
pub const MAX_ENCODED_SIZE: usize = u16::MAX as usize;
/// Type byte for constructed (container) nodes.
pub const CONSTRUCTED: u8 = 0xFA;
/// Type byte for primitive (leaf) nodes.
pub const PRIMITIVE: u8 = 0xBA;

/// Node variant as carried on the wire
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Container holding child nodes
    Constructed = CONSTRUCTED,
    /// Leaf holding a value
    Primitive = PRIMITIVE,
}

impl NodeType {
    #[inline(always)]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            CONSTRUCTED => Some(Self::Constructed),
            PRIMITIVE => Some(Self::Primitive),
            _ => None,
        }
    }
}

/// Decoded 5-byte node header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub node_type: NodeType,
    pub tag: u16,
    pub length: u16,
}

impl Header {
    #[inline(always)]
    pub fn new(node_type: NodeType, tag: u16, length: u16) -> Self {
        Self {
            node_type,
            tag,
            length,
        }
    }

    /// Serialize to wire order (big-endian tag and length).
    #[inline(always)]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let [t0, t1] = self.tag.to_be_bytes();
        let [l0, l1] = self.length.to_be_bytes();
        [self.node_type as u8, t0, t1, l0, l1]
    }

    /// Parse a header from the start of `buf`.
    ///
    /// `offset` is only used to position error messages.
    pub fn parse(buf: &[u8], offset: usize) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(TlvError::malformed(
                offset,
                format!("truncated header: {} of {} bytes", buf.len(), HEADER_SIZE),
            ));
        }

        let node_type = NodeType::from_u8(buf[0]).ok_or_else(|| {
            TlvError::malformed(offset, format!("unrecognized type byte 0x{:02X}", buf[0]))
        })?;

        Ok(Self {
            node_type,
            tag: u16::from_be_bytes([buf[1], buf[2]]),
            length: u16::from_be_bytes([buf[3], buf[4]]),
        })
    }

    /// Total bytes occupied by this node (header + payload)
    #[inline(always)]
    pub fn total_size(&self) -> usize {
        HEADER_SIZE + self.length as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = Header::new(NodeType::Primitive, 0x0102, 0x0304);
        assert_eq!(header.to_bytes(), [0xBA, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(header.total_size(), 5 + 0x0304);
    }

    #[test]
    fn test_header_parse() {
        let parsed = Header::parse(&[0xFA, 0x00, 0x01, 0x00, 0x05, 0xEE], 0).unwrap();
        assert_eq!(parsed, Header::new(NodeType::Constructed, 1, 5));
    }

    #[test]
    fn test_header_rejects_bad_type() {
        let err = Header::parse(&[0x00, 0x00, 0x01, 0x00, 0x00], 12).unwrap_err();
        match err {
            TlvError::MalformedInput { offset, reason } => {
                assert_eq!(offset, 12);
                assert!(reason.contains("0x00"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_rejects_short_buffer() {
        assert!(Header::parse(&[0xBA, 0x00, 0x01, 0x00], 0)
            .unwrap_err()
            .is_malformed());
    }
}
