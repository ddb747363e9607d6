//! Wire codec for the ACC broadcasting UDP protocol.
//!
//! Pure encode/decode with no I/O. Every datagram is a single message whose
//! first byte is its type; all multi-byte fields are little-endian and strings
//! carry an `i16` byte-length prefix.
//!
//! ```
//! use acc_broadcast_protocol::{OutboundRequest, decode_inbound};
//!
//! let frame = OutboundRequest::RequestEntryList { connection_id: 3 }.encode()?;
//! assert_eq!(frame.first(), Some(&10));
//!
//! // Unknown type bytes are reported, never panicked on.
//! assert!(decode_inbound(&[200]).is_err());
//! # Ok::<(), acc_broadcast_protocol::CodecError>(())
//! ```

pub mod error;
pub mod ids;
pub mod inbound;
pub mod outbound;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::CodecError;
pub use ids::{DEFAULT_BROADCAST_PORT, INVALID_SECTOR_TIME, InboundKind, PROTOCOL_VERSION};
pub use inbound::{InboundMessage, decode_inbound};
pub use outbound::OutboundRequest;
pub use reader::PacketReader;
pub use types::{
    BroadcastingEvent, BroadcastingEventType, CameraSet, CarLocation, CupCategory, Driver,
    DriverCategory, EntryList, EntryListCar, Lap, RealtimeCarUpdate, RealtimeUpdate,
    RegistrationResult, ReplayInfo, SessionPhase, SessionType, TrackData,
};
pub use writer::PacketWriter;
