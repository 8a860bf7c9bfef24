//! Error type shared by the builder, codec and storage layers.

use std::io;

use thiserror::Error;

/// Errors produced while building, encoding, decoding or persisting a tree.
#[derive(Debug, Error)]
pub enum TlvError {
    /// A required node was absent.
    #[error("required node argument is missing")]
    NullArgument,

    /// A child operation was attempted on a primitive node.
    #[error("node with tag {tag} is primitive and cannot hold children")]
    NotConstructed { tag: u16 },

    /// Memory for a buffer could not be obtained.
    #[error("failed to allocate {bytes} bytes")]
    AllocationFailure { bytes: usize },

    /// The input is not a well-formed encoded tree.
    #[error("malformed input at offset {offset}: {reason}")]
    MalformedInput { offset: usize, reason: String },

    /// An encoded size or value does not fit the 16-bit length field.
    #[error("encoded length {len} exceeds the 65535 byte limit")]
    TooLarge { len: usize },

    /// A primitive was created with a length that differs from its value.
    #[error("declared length {declared} does not match value length {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// The encoder ran past the buffer sized for the tree.
    #[error("write of {needed} bytes at offset {offset} overflows buffer of {capacity} bytes")]
    BufferOverflow {
        offset: usize,
        needed: usize,
        capacity: usize,
    },

    /// Reading or writing a tree file failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl TlvError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            offset,
            reason: reason.into(),
        }
    }

    /// Whether this error came from rejecting encoded input.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedInput { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TlvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_numbers() {
        let err = TlvError::malformed(7, "truncated header");
        assert_eq!(err.to_string(), "malformed input at offset 7: truncated header");
        assert!(err.is_malformed());

        let err = TlvError::TooLarge { len: 70000 };
        assert!(err.to_string().contains("70000"));
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: TlvError = io_err.into();
        assert!(matches!(err, TlvError::Io(_)));
    }
}
