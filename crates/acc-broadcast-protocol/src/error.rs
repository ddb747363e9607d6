//! Codec error types.

use thiserror::Error;

/// Errors raised while encoding or decoding broadcasting frames.
///
/// A decode that fails yields no value at all: callers drop the whole message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The frame ended before a field could be read.
    #[error("frame too short: need {needed} bytes at offset {offset}, frame is {len} bytes")]
    Truncated {
        needed: usize,
        offset: usize,
        len: usize,
    },

    /// A string header announced a negative length.
    #[error("negative string length {0}")]
    NegativeStringLength(i16),

    /// A string does not fit the signed 16-bit length prefix.
    #[error("string of {0} bytes exceeds the i16 length prefix")]
    StringTooLong(usize),

    /// A repeated structure has more elements than its count prefix can hold.
    #[error("{field} has {count} elements, at most {max} fit the count prefix")]
    TooManyElements {
        field: &'static str,
        count: usize,
        max: usize,
    },

    /// The frame is empty, so there is no type byte.
    #[error("empty frame")]
    Empty,

    /// The leading type byte is not a known message code for this direction.
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    /// A registration request announced an unsupported protocol version.
    #[error("unsupported protocol version {0}")]
    UnsupportedProtocolVersion(u8),
}

impl CodecError {
    /// True when the frame was cut short rather than malformed.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Truncated { .. } | Self::Empty)
    }
}
