//! Message type codes and protocol constants.
//!
//! Every datagram starts with a single type byte. Outbound (client → simulator)
//! and inbound (simulator → client) codes share the byte space but are
//! interpreted per direction, so `1` is both "register" and "registration
//! result".

/// Broadcasting protocol version announced in the registration request.
pub const PROTOCOL_VERSION: u8 = 4;

/// Default UDP port the simulator listens on for broadcasting clients.
pub const DEFAULT_BROADCAST_PORT: u16 = 9000;

/// Reserved value the simulator uses for a sector or lap without a valid time.
pub const INVALID_SECTOR_TIME: i32 = i32::MAX;

/// Outbound request codes.
pub mod outbound {
    /// Register a broadcasting application.
    pub const REGISTER_COMMAND_APPLICATION: u8 = 1;
    /// Unregister (disconnect) a broadcasting application.
    pub const UNREGISTER_COMMAND_APPLICATION: u8 = 9;
    /// Ask for the current entry list.
    pub const REQUEST_ENTRY_LIST: u8 = 10;
    /// Ask for the current track data.
    pub const REQUEST_TRACK_DATA: u8 = 11;
}

/// Inbound message codes.
pub mod inbound {
    /// Answer to a registration request.
    pub const REGISTRATION_RESULT: u8 = 1;
    /// Session-wide realtime update.
    pub const REALTIME_UPDATE: u8 = 2;
    /// Per-car realtime update.
    pub const REALTIME_CAR_UPDATE: u8 = 3;
    /// Entry list (car ids).
    pub const ENTRY_LIST: u8 = 4;
    /// Track data.
    pub const TRACK_DATA: u8 = 5;
    /// Metadata for one car of the entry list.
    pub const ENTRY_LIST_CAR: u8 = 6;
    /// Broadcasting event (green flag, accident, best lap, ...).
    pub const BROADCASTING_EVENT: u8 = 7;
}

/// Message kinds the simulator sends, keyed by their type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum InboundKind {
    RegistrationResult,
    RealtimeUpdate,
    RealtimeCarUpdate,
    EntryList,
    TrackData,
    EntryListCar,
    BroadcastingEvent,
}

impl InboundKind {
    /// Map a wire type byte to its message kind.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            inbound::REGISTRATION_RESULT => Some(Self::RegistrationResult),
            inbound::REALTIME_UPDATE => Some(Self::RealtimeUpdate),
            inbound::REALTIME_CAR_UPDATE => Some(Self::RealtimeCarUpdate),
            inbound::ENTRY_LIST => Some(Self::EntryList),
            inbound::TRACK_DATA => Some(Self::TrackData),
            inbound::ENTRY_LIST_CAR => Some(Self::EntryListCar),
            inbound::BROADCASTING_EVENT => Some(Self::BroadcastingEvent),
            _ => None,
        }
    }

    /// Wire type byte of this kind.
    pub fn code(self) -> u8 {
        match self {
            Self::RegistrationResult => inbound::REGISTRATION_RESULT,
            Self::RealtimeUpdate => inbound::REALTIME_UPDATE,
            Self::RealtimeCarUpdate => inbound::REALTIME_CAR_UPDATE,
            Self::EntryList => inbound::ENTRY_LIST,
            Self::TrackData => inbound::TRACK_DATA,
            Self::EntryListCar => inbound::ENTRY_LIST_CAR,
            Self::BroadcastingEvent => inbound::BROADCASTING_EVENT,
        }
    }

    /// Short lowercase name used in log fields.
    pub fn name(self) -> &'static str {
        match self {
            Self::RegistrationResult => "registration_result",
            Self::RealtimeUpdate => "realtime_update",
            Self::RealtimeCarUpdate => "realtime_car_update",
            Self::EntryList => "entry_list",
            Self::TrackData => "track_data",
            Self::EntryListCar => "entry_list_car",
            Self::BroadcastingEvent => "broadcasting_event",
        }
    }
}

impl std::fmt::Display for InboundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
