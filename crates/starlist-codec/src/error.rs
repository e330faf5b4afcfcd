//! Error types for the transfer buffer codec.

use std::fmt;
use std::io;

/// Errors that can occur while encoding or decoding transfer buffers.
#[derive(Debug)]
pub enum CodecError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// A buffer could not be decoded (corrupt field values).
    MalformedBuffer {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The destination array cannot hold every record.
    BufferTooSmall {
        /// Records to encode.
        needed: usize,
        /// Slots in the destination.
        available: usize,
    },
    /// A buffer index past the end of the array was requested.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the buffer array.
        len: usize,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MalformedBuffer { detail } => write!(f, "malformed star buffer: {detail}"),
            Self::BufferTooSmall { needed, available } => write!(
                f,
                "buffer array too small: {needed} records, {available} slots"
            ),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "buffer index {index} out of range (len {len})")
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
