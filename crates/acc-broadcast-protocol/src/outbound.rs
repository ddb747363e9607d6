//! Client → simulator requests.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::ids::{PROTOCOL_VERSION, outbound as codes};
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

/// Requests a broadcasting client may send.
///
/// Only registration and the two read-only data requests are supported; the
/// simulator's control commands (camera, HUD, replay) are not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundRequest {
    Register {
        display_name: String,
        connection_password: String,
        /// Requested realtime update interval.
        update_interval_ms: i32,
        command_password: String,
    },
    Unregister {
        connection_id: i32,
    },
    RequestEntryList {
        connection_id: i32,
    },
    RequestTrackData {
        connection_id: i32,
    },
}

impl OutboundRequest {
    /// Wire type byte of this request.
    pub fn code(&self) -> u8 {
        match self {
            Self::Register { .. } => codes::REGISTER_COMMAND_APPLICATION,
            Self::Unregister { .. } => codes::UNREGISTER_COMMAND_APPLICATION,
            Self::RequestEntryList { .. } => codes::REQUEST_ENTRY_LIST,
            Self::RequestTrackData { .. } => codes::REQUEST_TRACK_DATA,
        }
    }

    /// Connection id carried by the request; registration has none yet.
    pub fn connection_id(&self) -> Option<i32> {
        match self {
            Self::Register { .. } => None,
            Self::Unregister { connection_id }
            | Self::RequestEntryList { connection_id }
            | Self::RequestTrackData { connection_id } => Some(*connection_id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Unregister { .. } => "unregister",
            Self::RequestEntryList { .. } => "request_entry_list",
            Self::RequestTrackData { .. } => "request_track_data",
        }
    }

    /// Encode into a complete frame.
    ///
    /// The frame is built in memory first, so a failure never leaves a
    /// partially written datagram behind.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::StringTooLong`] when a registration string does
    /// not fit its length prefix.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = PacketWriter::with_type(self.code());
        match self {
            Self::Register {
                display_name,
                connection_password,
                update_interval_ms,
                command_password,
            } => {
                writer.write_u8(PROTOCOL_VERSION);
                writer.write_string(display_name)?;
                writer.write_string(connection_password)?;
                writer.write_i32(*update_interval_ms);
                writer.write_string(command_password)?;
            }
            Self::Unregister { connection_id }
            | Self::RequestEntryList { connection_id }
            | Self::RequestTrackData { connection_id } => {
                writer.write_i32(*connection_id);
            }
        }
        Ok(writer.finish())
    }

    /// Decode a request frame, as a simulator stand-in would.
    ///
    /// # Errors
    ///
    /// Fails on an empty frame, an unknown type byte, a registration for
    /// another protocol version, or a truncated body.
    pub fn decode(frame: &[u8]) -> Result<Self, CodecError> {
        let mut reader = PacketReader::new(frame);
        let code = reader.read_u8().map_err(|_| CodecError::Empty)?;
        match code {
            codes::REGISTER_COMMAND_APPLICATION => {
                let version = reader.read_u8()?;
                if version != PROTOCOL_VERSION {
                    return Err(CodecError::UnsupportedProtocolVersion(version));
                }
                Ok(Self::Register {
                    display_name: reader.read_string()?,
                    connection_password: reader.read_string()?,
                    update_interval_ms: reader.read_i32()?,
                    command_password: reader.read_string()?,
                })
            }
            codes::UNREGISTER_COMMAND_APPLICATION => Ok(Self::Unregister {
                connection_id: reader.read_i32()?,
            }),
            codes::REQUEST_ENTRY_LIST => Ok(Self::RequestEntryList {
                connection_id: reader.read_i32()?,
            }),
            codes::REQUEST_TRACK_DATA => Ok(Self::RequestTrackData {
                connection_id: reader.read_i32()?,
            }),
            other => Err(CodecError::UnknownMessageType(other)),
        }
    }
}
