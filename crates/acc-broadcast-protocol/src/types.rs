//! Broadcasting data model.
//!
//! Field names follow the simulator's broadcasting SDK. Enumerated codes keep an
//! `Unknown` fallback so that any wire value survives a decode/encode cycle.

use serde::{Deserialize, Serialize};

macro_rules! wire_code_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident = $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Code not known to this crate.
            Unknown(u8),
        }

        impl From<u8> for $name {
            fn from(code: u8) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                match value {
                    $($name::$variant => $code,)+
                    $name::Unknown(other) => other,
                }
            }
        }
    };
}

wire_code_enum! {
    /// Kind of session currently running.
    SessionType {
        Practice = 0,
        Qualifying = 4,
        Superpole = 9,
        Race = 10,
        Hotlap = 11,
        Hotstint = 12,
        HotlapSuperpole = 13,
        Replay = 14,
    }
}

wire_code_enum! {
    /// Phase within the current session.
    SessionPhase {
        None = 0,
        Starting = 1,
        PreFormation = 2,
        FormationLap = 3,
        PreSession = 4,
        /// From the green light on.
        Session = 5,
        SessionOver = 6,
        PostSession = 7,
        ResultUi = 8,
    }
}

wire_code_enum! {
    /// Where a car currently is.
    CarLocation {
        None = 0,
        Track = 1,
        Pitlane = 2,
        /// Only briefly reported before switching to `Pitlane`.
        PitEntry = 3,
        PitExit = 4,
    }
}

wire_code_enum! {
    /// Kind of broadcasting event.
    BroadcastingEventType {
        None = 0,
        GreenFlag = 1,
        SessionOver = 2,
        PenaltyCommMsg = 3,
        Accident = 4,
        LapCompleted = 5,
        BestSessionLap = 6,
        BestPersonalLap = 7,
    }
}

wire_code_enum! {
    /// Driver rating category.
    DriverCategory {
        Bronze = 0,
        Silver = 1,
        Gold = 2,
        Platinum = 3,
    }
}

wire_code_enum! {
    /// Cup category of a car.
    CupCategory {
        Overall = 0,
        ProAm = 1,
        Am = 2,
        Silver = 3,
        National = 4,
    }
}

impl CarLocation {
    /// True for pit lane, pit entry and pit exit.
    pub fn is_in_pits(self) -> bool {
        matches!(self, Self::Pitlane | Self::PitEntry | Self::PitExit)
    }
}

/// Answer to a registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    /// Identifier to send along with every later request.
    pub connection_id: i32,
    pub success: bool,
    /// The connection may not issue commands (wrong or empty command password).
    pub readonly: bool,
    pub error_message: String,
}

/// Server-assigned car ids relevant to the current session.
///
/// Ids are dense and zero-based within one list but are not stable across
/// lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryList {
    pub connection_id: i32,
    pub car_ids: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub first_name: String,
    pub last_name: String,
    pub short_name: String,
    pub category: DriverCategory,
    pub nationality: u16,
}

/// Metadata for one car of the entry list. Sent once per listed id after the
/// entry list itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryListCar {
    pub car_id: u16,
    pub car_model: u8,
    pub team_name: String,
    /// Number shown on the car body and in the leaderboard.
    pub race_number: i32,
    pub cup_category: CupCategory,
    /// Index into `drivers` of the driver currently in the car.
    pub current_driver_index: i8,
    pub nationality: u16,
    pub drivers: Vec<Driver>,
}

impl EntryListCar {
    /// Driver currently in the car, if the index is valid.
    pub fn current_driver(&self) -> Option<&Driver> {
        usize::try_from(self.current_driver_index)
            .ok()
            .and_then(|index| self.drivers.get(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSet {
    pub name: String,
    pub cameras: Vec<String>,
}

/// Track description. Requested once per connection; not re-sent on session
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackData {
    pub connection_id: i32,
    pub name: String,
    pub track_id: i32,
    pub meters: i32,
    pub camera_sets: Vec<CameraSet>,
    pub hud_pages: Vec<String>,
}

/// A lap or partial lap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lap {
    /// `None` when the simulator reports no valid time.
    pub lap_time_ms: Option<i32>,
    pub car_id: u16,
    pub driver_id: u16,
    /// Sector times; sectors without a valid time are `0`.
    pub splits: Vec<i32>,
    pub is_invalid: bool,
    pub is_valid_for_best: bool,
    pub is_out_lap: bool,
    pub is_in_lap: bool,
}

/// Replay clock, only present while a replay is playing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayInfo {
    pub session_time_ms: f32,
    pub remaining_time_ms: f32,
}

/// Session-wide update sent at the registered update interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeUpdate {
    pub event_index: u16,
    pub session_index: u16,
    pub session_type: SessionType,
    pub phase: SessionPhase,
    /// Milliseconds since the session started.
    pub session_time_ms: f32,
    /// Remaining session duration in milliseconds.
    pub session_end_time_ms: f32,
    pub focused_car_index: i32,
    pub active_camera_set: String,
    pub active_camera: String,
    pub current_hud_page: String,
    pub replay: Option<ReplayInfo>,
    pub time_of_day_ms: f32,
    pub ambient_temp: i8,
    pub track_temp: i8,
    /// Tenths, 0..=10.
    pub clouds: u8,
    /// Tenths, 0..=10.
    pub rain_level: u8,
    /// Tenths, 0..=10.
    pub wetness: u8,
    pub best_session_lap: Lap,
}

impl RealtimeUpdate {
    pub fn is_replay_playing(&self) -> bool {
        self.replay.is_some()
    }

    pub fn clouds_fraction(&self) -> f32 {
        f32::from(self.clouds) / 10.0
    }

    pub fn rain_fraction(&self) -> f32 {
        f32::from(self.rain_level) / 10.0
    }

    pub fn wetness_fraction(&self) -> f32 {
        f32::from(self.wetness) / 10.0
    }
}

/// Per-car update sent at the registered update interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeCarUpdate {
    pub car_id: u16,
    pub driver_id: u16,
    pub driver_count: u8,
    /// -1 reverse, 0 neutral, 1.. forward gears.
    pub gear: i8,
    /// Reserved, reported as zero.
    pub world_pos_x: f32,
    /// Reserved, reported as zero.
    pub world_pos_y: f32,
    pub yaw: f32,
    pub car_location: CarLocation,
    pub kmh: u16,
    pub position: u16,
    pub cup_position: u16,
    pub track_position: u16,
    /// Progress around the track centerline, 0..1.
    pub spline_position: f32,
    /// Completed laps.
    pub laps: u16,
    /// Delta to the personal best lap in milliseconds.
    pub delta_ms: i32,
    pub best_session_lap: Lap,
    pub last_lap: Lap,
    /// Lap in progress; its splits are never populated.
    pub current_lap: Lap,
}

impl RealtimeCarUpdate {
    pub fn speed_ms(&self) -> f32 {
        f32::from(self.kmh) / 3.6
    }
}

/// Infrequent race-control style event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastingEvent {
    pub kind: BroadcastingEventType,
    /// Free text, often a lap time.
    pub message: String,
    pub time_ms: i32,
    pub car_id: i32,
}
