//! Simulator → client messages.
//!
//! Decoding is a strict sequential read in protocol order: the first field that
//! cannot be read aborts the whole message. Encoders produce the exact layout
//! the simulator sends, which is what test doubles of the simulator need.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::CodecError;
use crate::ids::{INVALID_SECTOR_TIME, InboundKind};
use crate::reader::PacketReader;
use crate::types::{
    BroadcastingEvent, CameraSet, Driver, EntryList, EntryListCar, Lap, RealtimeCarUpdate,
    RealtimeUpdate, RegistrationResult, ReplayInfo, TrackData,
};
use crate::writer::PacketWriter;

/// Wire gear is offset so that reverse is 1 and neutral is 2.
const GEAR_WIRE_OFFSET: u8 = 2;

/// A decoded inbound datagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundMessage {
    RegistrationResult(RegistrationResult),
    RealtimeUpdate(RealtimeUpdate),
    RealtimeCarUpdate(RealtimeCarUpdate),
    EntryList(EntryList),
    TrackData(TrackData),
    EntryListCar(EntryListCar),
    BroadcastingEvent(BroadcastingEvent),
}

impl InboundMessage {
    pub fn kind(&self) -> InboundKind {
        match self {
            Self::RegistrationResult(_) => InboundKind::RegistrationResult,
            Self::RealtimeUpdate(_) => InboundKind::RealtimeUpdate,
            Self::RealtimeCarUpdate(_) => InboundKind::RealtimeCarUpdate,
            Self::EntryList(_) => InboundKind::EntryList,
            Self::TrackData(_) => InboundKind::TrackData,
            Self::EntryListCar(_) => InboundKind::EntryListCar,
            Self::BroadcastingEvent(_) => InboundKind::BroadcastingEvent,
        }
    }

    /// Encode into a complete frame, type byte included.
    ///
    /// # Errors
    ///
    /// Fails when a string or repeated field does not fit its length prefix.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = PacketWriter::with_type(self.kind().code());
        match self {
            Self::RegistrationResult(result) => result.write_to(&mut writer)?,
            Self::RealtimeUpdate(update) => update.write_to(&mut writer)?,
            Self::RealtimeCarUpdate(update) => update.write_to(&mut writer)?,
            Self::EntryList(list) => list.write_to(&mut writer)?,
            Self::TrackData(track) => track.write_to(&mut writer)?,
            Self::EntryListCar(car) => car.write_to(&mut writer)?,
            Self::BroadcastingEvent(event) => event.write_to(&mut writer)?,
        }
        Ok(writer.finish())
    }
}

/// Decode a complete inbound frame by its leading type byte.
///
/// # Errors
///
/// [`CodecError::Empty`] for an empty frame, [`CodecError::UnknownMessageType`]
/// for an unassigned type byte, otherwise the first field-level failure.
pub fn decode_inbound(frame: &[u8]) -> Result<InboundMessage, CodecError> {
    let mut reader = PacketReader::new(frame);
    let code = reader.read_u8().map_err(|_| CodecError::Empty)?;
    let kind = InboundKind::from_code(code).ok_or(CodecError::UnknownMessageType(code))?;
    let message = decode_body(kind, &mut reader)?;

    if !reader.is_exhausted() {
        trace!(
            message_type = %kind,
            trailing = reader.remaining(),
            "ignoring trailing bytes after inbound message"
        );
    }

    Ok(message)
}

/// Decode the body of a message whose type byte has already been consumed.
///
/// # Errors
///
/// Returns the first field-level failure.
pub fn decode_body(
    kind: InboundKind,
    reader: &mut PacketReader<'_>,
) -> Result<InboundMessage, CodecError> {
    Ok(match kind {
        InboundKind::RegistrationResult => {
            InboundMessage::RegistrationResult(RegistrationResult::read_from(reader)?)
        }
        InboundKind::RealtimeUpdate => {
            InboundMessage::RealtimeUpdate(RealtimeUpdate::read_from(reader)?)
        }
        InboundKind::RealtimeCarUpdate => {
            InboundMessage::RealtimeCarUpdate(RealtimeCarUpdate::read_from(reader)?)
        }
        InboundKind::EntryList => InboundMessage::EntryList(EntryList::read_from(reader)?),
        InboundKind::TrackData => InboundMessage::TrackData(TrackData::read_from(reader)?),
        InboundKind::EntryListCar => {
            InboundMessage::EntryListCar(EntryListCar::read_from(reader)?)
        }
        InboundKind::BroadcastingEvent => {
            InboundMessage::BroadcastingEvent(BroadcastingEvent::read_from(reader)?)
        }
    })
}

impl RegistrationResult {
    pub fn read_from(reader: &mut PacketReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            connection_id: reader.read_i32()?,
            success: reader.read_bool()?,
            // 0 means read-only: the flag on the wire is "writable".
            readonly: !reader.read_bool()?,
            error_message: reader.read_string()?,
        })
    }

    pub fn write_to(&self, writer: &mut PacketWriter) -> Result<(), CodecError> {
        writer.write_i32(self.connection_id);
        writer.write_bool(self.success);
        writer.write_bool(!self.readonly);
        writer.write_string(&self.error_message)
    }
}

impl EntryList {
    pub fn read_from(reader: &mut PacketReader<'_>) -> Result<Self, CodecError> {
        let connection_id = reader.read_i32()?;
        let count = reader.read_u16()?;
        let car_ids = (0..count)
            .map(|_| reader.read_u16())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            connection_id,
            car_ids,
        })
    }

    pub fn write_to(&self, writer: &mut PacketWriter) -> Result<(), CodecError> {
        writer.write_i32(self.connection_id);
        writer.write_count_u16("car_ids", self.car_ids.len())?;
        for car_id in &self.car_ids {
            writer.write_u16(*car_id);
        }
        Ok(())
    }
}

impl Driver {
    fn read_from(reader: &mut PacketReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            first_name: reader.read_string()?,
            last_name: reader.read_string()?,
            short_name: reader.read_string()?,
            category: reader.read_u8()?.into(),
            nationality: reader.read_u16()?,
        })
    }

    fn write_to(&self, writer: &mut PacketWriter) -> Result<(), CodecError> {
        writer.write_string(&self.first_name)?;
        writer.write_string(&self.last_name)?;
        writer.write_string(&self.short_name)?;
        writer.write_u8(self.category.into());
        writer.write_u16(self.nationality);
        Ok(())
    }
}

impl EntryListCar {
    pub fn read_from(reader: &mut PacketReader<'_>) -> Result<Self, CodecError> {
        let car_id = reader.read_u16()?;
        let car_model = reader.read_u8()?;
        let team_name = reader.read_string()?;
        let race_number = reader.read_i32()?;
        let cup_category = reader.read_u8()?.into();
        let current_driver_index = reader.read_i8()?;
        let nationality = reader.read_u16()?;

        let driver_count = reader.read_u8()?;
        let drivers = (0..driver_count)
            .map(|_| Driver::read_from(reader))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            car_id,
            car_model,
            team_name,
            race_number,
            cup_category,
            current_driver_index,
            nationality,
            drivers,
        })
    }

    pub fn write_to(&self, writer: &mut PacketWriter) -> Result<(), CodecError> {
        writer.write_u16(self.car_id);
        writer.write_u8(self.car_model);
        writer.write_string(&self.team_name)?;
        writer.write_i32(self.race_number);
        writer.write_u8(self.cup_category.into());
        writer.write_i8(self.current_driver_index);
        writer.write_u16(self.nationality);
        writer.write_count_u8("drivers", self.drivers.len())?;
        for driver in &self.drivers {
            driver.write_to(writer)?;
        }
        Ok(())
    }
}

impl TrackData {
    pub fn read_from(reader: &mut PacketReader<'_>) -> Result<Self, CodecError> {
        let connection_id = reader.read_i32()?;
        let name = reader.read_string()?;
        let track_id = reader.read_i32()?;
        let meters = reader.read_i32()?;

        // Older simulator builds stop right after the track length.
        if reader.is_exhausted() {
            return Ok(Self {
                connection_id,
                name,
                track_id,
                meters,
                camera_sets: Vec::new(),
                hud_pages: Vec::new(),
            });
        }

        let camera_set_count = reader.read_u8()?;
        let mut camera_sets = Vec::with_capacity(usize::from(camera_set_count));
        for _ in 0..camera_set_count {
            let set_name = reader.read_string()?;
            let camera_count = reader.read_u8()?;
            let cameras = (0..camera_count)
                .map(|_| reader.read_string())
                .collect::<Result<Vec<_>, _>>()?;
            camera_sets.push(CameraSet {
                name: set_name,
                cameras,
            });
        }

        let hud_page_count = reader.read_u8()?;
        let hud_pages = (0..hud_page_count)
            .map(|_| reader.read_string())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            connection_id,
            name,
            track_id,
            meters,
            camera_sets,
            hud_pages,
        })
    }

    pub fn write_to(&self, writer: &mut PacketWriter) -> Result<(), CodecError> {
        writer.write_i32(self.connection_id);
        writer.write_string(&self.name)?;
        writer.write_i32(self.track_id);
        writer.write_i32(self.meters);
        writer.write_count_u8("camera_sets", self.camera_sets.len())?;
        for set in &self.camera_sets {
            writer.write_string(&set.name)?;
            writer.write_count_u8("cameras", set.cameras.len())?;
            for camera in &set.cameras {
                writer.write_string(camera)?;
            }
        }
        writer.write_count_u8("hud_pages", self.hud_pages.len())?;
        for page in &self.hud_pages {
            writer.write_string(page)?;
        }
        Ok(())
    }
}

impl Lap {
    pub fn read_from(reader: &mut PacketReader<'_>) -> Result<Self, CodecError> {
        let raw_lap_time = reader.read_i32()?;
        let car_id = reader.read_u16()?;
        let driver_id = reader.read_u16()?;

        let split_count = reader.read_u8()?;
        let splits = (0..split_count)
            .map(|_| reader.read_i32().map(normalize_split))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            lap_time_ms: (raw_lap_time != INVALID_SECTOR_TIME).then_some(raw_lap_time),
            car_id,
            driver_id,
            splits,
            is_invalid: reader.read_bool()?,
            is_valid_for_best: reader.read_bool()?,
            is_out_lap: reader.read_bool()?,
            is_in_lap: reader.read_bool()?,
        })
    }

    pub fn write_to(&self, writer: &mut PacketWriter) -> Result<(), CodecError> {
        writer.write_i32(self.lap_time_ms.unwrap_or(INVALID_SECTOR_TIME));
        writer.write_u16(self.car_id);
        writer.write_u16(self.driver_id);
        writer.write_count_u8("splits", self.splits.len())?;
        for split in &self.splits {
            writer.write_i32(*split);
        }
        writer.write_bool(self.is_invalid);
        writer.write_bool(self.is_valid_for_best);
        writer.write_bool(self.is_out_lap);
        writer.write_bool(self.is_in_lap);
        Ok(())
    }
}

fn normalize_split(split: i32) -> i32 {
    if split == INVALID_SECTOR_TIME { 0 } else { split }
}

impl RealtimeUpdate {
    pub fn read_from(reader: &mut PacketReader<'_>) -> Result<Self, CodecError> {
        let event_index = reader.read_u16()?;
        let session_index = reader.read_u16()?;
        let session_type = reader.read_u8()?.into();
        let phase = reader.read_u8()?.into();
        let session_time_ms = reader.read_f32()?;
        let session_end_time_ms = reader.read_f32()?;
        let focused_car_index = reader.read_i32()?;
        let active_camera_set = reader.read_string()?;
        let active_camera = reader.read_string()?;
        let current_hud_page = reader.read_string()?;

        let replay = if reader.read_bool()? {
            Some(ReplayInfo {
                session_time_ms: reader.read_f32()?,
                remaining_time_ms: reader.read_f32()?,
            })
        } else {
            None
        };

        Ok(Self {
            event_index,
            session_index,
            session_type,
            phase,
            session_time_ms,
            session_end_time_ms,
            focused_car_index,
            active_camera_set,
            active_camera,
            current_hud_page,
            replay,
            time_of_day_ms: reader.read_f32()?,
            ambient_temp: reader.read_i8()?,
            track_temp: reader.read_i8()?,
            clouds: reader.read_u8()?,
            rain_level: reader.read_u8()?,
            wetness: reader.read_u8()?,
            best_session_lap: Lap::read_from(reader)?,
        })
    }

    pub fn write_to(&self, writer: &mut PacketWriter) -> Result<(), CodecError> {
        writer.write_u16(self.event_index);
        writer.write_u16(self.session_index);
        writer.write_u8(self.session_type.into());
        writer.write_u8(self.phase.into());
        writer.write_f32(self.session_time_ms);
        writer.write_f32(self.session_end_time_ms);
        writer.write_i32(self.focused_car_index);
        writer.write_string(&self.active_camera_set)?;
        writer.write_string(&self.active_camera)?;
        writer.write_string(&self.current_hud_page)?;
        writer.write_bool(self.replay.is_some());
        if let Some(replay) = &self.replay {
            writer.write_f32(replay.session_time_ms);
            writer.write_f32(replay.remaining_time_ms);
        }
        writer.write_f32(self.time_of_day_ms);
        writer.write_i8(self.ambient_temp);
        writer.write_i8(self.track_temp);
        writer.write_u8(self.clouds);
        writer.write_u8(self.rain_level);
        writer.write_u8(self.wetness);
        self.best_session_lap.write_to(writer)
    }
}

impl RealtimeCarUpdate {
    pub fn read_from(reader: &mut PacketReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            car_id: reader.read_u16()?,
            driver_id: reader.read_u16()?,
            driver_count: reader.read_u8()?,
            gear: gear_from_wire(reader.read_u8()?),
            world_pos_x: reader.read_f32()?,
            world_pos_y: reader.read_f32()?,
            yaw: reader.read_f32()?,
            car_location: reader.read_u8()?.into(),
            kmh: reader.read_u16()?,
            position: reader.read_u16()?,
            cup_position: reader.read_u16()?,
            track_position: reader.read_u16()?,
            spline_position: reader.read_f32()?,
            laps: reader.read_u16()?,
            delta_ms: reader.read_i32()?,
            best_session_lap: Lap::read_from(reader)?,
            last_lap: Lap::read_from(reader)?,
            current_lap: Lap::read_from(reader)?,
        })
    }

    pub fn write_to(&self, writer: &mut PacketWriter) -> Result<(), CodecError> {
        writer.write_u16(self.car_id);
        writer.write_u16(self.driver_id);
        writer.write_u8(self.driver_count);
        writer.write_u8(gear_to_wire(self.gear));
        writer.write_f32(self.world_pos_x);
        writer.write_f32(self.world_pos_y);
        writer.write_f32(self.yaw);
        writer.write_u8(self.car_location.into());
        writer.write_u16(self.kmh);
        writer.write_u16(self.position);
        writer.write_u16(self.cup_position);
        writer.write_u16(self.track_position);
        writer.write_f32(self.spline_position);
        writer.write_u16(self.laps);
        writer.write_i32(self.delta_ms);
        self.best_session_lap.write_to(writer)?;
        self.last_lap.write_to(writer)?;
        self.current_lap.write_to(writer)
    }
}

fn gear_from_wire(raw: u8) -> i8 {
    i8::from_le_bytes([raw.wrapping_sub(GEAR_WIRE_OFFSET)])
}

fn gear_to_wire(gear: i8) -> u8 {
    u8::from_le_bytes(gear.to_le_bytes()).wrapping_add(GEAR_WIRE_OFFSET)
}

impl BroadcastingEvent {
    pub fn read_from(reader: &mut PacketReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            kind: reader.read_u8()?.into(),
            message: reader.read_string()?,
            time_ms: reader.read_i32()?,
            car_id: reader.read_i32()?,
        })
    }

    pub fn write_to(&self, writer: &mut PacketWriter) -> Result<(), CodecError> {
        writer.write_u8(self.kind.into());
        writer.write_string(&self.message)?;
        writer.write_i32(self.time_ms);
        writer.write_i32(self.car_id);
        Ok(())
    }
}
