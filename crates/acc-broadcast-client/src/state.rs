//! Observable connection lifecycle.

use std::fmt;

use serde::Serialize;

/// Where the client is in its connection lifecycle.
///
/// `Idle → Resolving → Connecting → AwaitingRegistration → Active → Closing →
/// Idle`. Any failure returns to `Idle` for the reconnect delay and starts
/// over at `Resolving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Idle,
    Resolving,
    Connecting,
    AwaitingRegistration,
    Active,
    Closing,
}

impl ConnectionState {
    /// Registered and receiving.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Somewhere between idle and active.
    pub fn is_handshaking(self) -> bool {
        matches!(
            self,
            Self::Resolving | Self::Connecting | Self::AwaitingRegistration
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Connecting => "connecting",
            Self::AwaitingRegistration => "awaiting_registration",
            Self::Active => "active",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
