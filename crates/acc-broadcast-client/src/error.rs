//! Client error taxonomy.

use std::fmt;

use acc_broadcast_protocol::CodecError;
use thiserror::Error;

use crate::config::ConfigError;

/// Broad class of a failure, used for log fields and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Address could not be resolved or the socket could not be opened.
    Resolution,
    /// Failed or partial write, read timeout, read error.
    Transport,
    /// Malformed or truncated message.
    Decode,
    /// Datagram larger than the receive buffer.
    Capacity,
    /// The simulator refused the registration.
    Protocol,
    Config,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolution => "resolution",
            Self::Transport => "transport",
            Self::Decode => "decode",
            Self::Capacity => "capacity",
            Self::Protocol => "protocol",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the connection state machine.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open UDP socket to {remote}: {source}")]
    Open {
        remote: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode request: {0}")]
    Encode(#[source] CodecError),

    #[error("short write: sent {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("write timed out after {timeout_ms} ms")]
    WriteTimeout { timeout_ms: u128 },

    #[error("no datagram within {timeout_ms} ms")]
    ReadTimeout { timeout_ms: u128 },

    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("datagram of {received} bytes does not fit the {capacity} byte receive buffer")]
    BufferOverflow { capacity: usize, received: usize },

    #[error("registration rejected: {reason}")]
    RegistrationRejected { reason: String },
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::Resolve { .. } | Self::Open { .. } => ErrorCategory::Resolution,
            Self::Encode(_) => ErrorCategory::Decode,
            Self::ShortWrite { .. }
            | Self::Write(_)
            | Self::WriteTimeout { .. }
            | Self::ReadTimeout { .. }
            | Self::Read(_) => ErrorCategory::Transport,
            Self::BufferOverflow { .. } => ErrorCategory::Capacity,
            Self::RegistrationRejected { .. } => ErrorCategory::Protocol,
        }
    }

    /// Fatal errors end [`crate::BroadcastClient::run`]; all others restart
    /// the handshake after the reconnect delay.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BufferOverflow { .. } | Self::Config(_))
    }
}
