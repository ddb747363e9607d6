//! Property-based tests for the broadcasting codec.
//!
//! The decoder must never panic on arbitrary input, every prefix of a valid
//! frame must fail rather than yield partial data, the sentinel handling
//! must hold for any split layout, and every message survives an
//! encode/decode cycle unchanged.

use acc_broadcast_protocol::{
    BroadcastingEvent, CameraSet, CodecError, Driver, EntryList, EntryListCar,
    INVALID_SECTOR_TIME, InboundMessage, Lap, OutboundRequest, PacketReader, PacketWriter,
    RealtimeCarUpdate, RealtimeUpdate, ReplayInfo, TrackData, decode_inbound,
};
use proptest::prelude::*;

const MAX_DATAGRAM: usize = 2048;

fn lap_strategy() -> impl Strategy<Value = Lap> {
    (
        proptest::option::of(0i32..INVALID_SECTOR_TIME),
        any::<u16>(),
        any::<u16>(),
        proptest::collection::vec(0i32..INVALID_SECTOR_TIME, 0..6),
        any::<[bool; 4]>(),
    )
        .prop_map(|(lap_time_ms, car_id, driver_id, splits, flags)| {
            let [is_invalid, is_valid_for_best, is_out_lap, is_in_lap] = flags;
            Lap {
                lap_time_ms,
                car_id,
                driver_id,
                splits,
                is_invalid,
                is_valid_for_best,
                is_out_lap,
                is_in_lap,
            }
        })
}

/// Finite values only; NaN would break equality and non-finite input reads
/// back as zero.
fn wire_f32() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6
}

fn short_string() -> impl Strategy<Value = String> {
    ".{0,24}"
}

fn replay_strategy() -> impl Strategy<Value = Option<ReplayInfo>> {
    proptest::option::of((wire_f32(), wire_f32()).prop_map(
        |(session_time_ms, remaining_time_ms)| ReplayInfo {
            session_time_ms,
            remaining_time_ms,
        },
    ))
}

fn realtime_update_strategy() -> impl Strategy<Value = RealtimeUpdate> {
    (
        (any::<u16>(), any::<u16>(), any::<u8>(), any::<u8>()),
        (wire_f32(), wire_f32(), any::<i32>()),
        (short_string(), short_string(), short_string()),
        replay_strategy(),
        (wire_f32(), any::<i8>(), any::<i8>()),
        (any::<u8>(), any::<u8>(), any::<u8>()),
        lap_strategy(),
    )
        .prop_map(
            |(
                (event_index, session_index, session_type, phase),
                (session_time_ms, session_end_time_ms, focused_car_index),
                (active_camera_set, active_camera, current_hud_page),
                replay,
                (time_of_day_ms, ambient_temp, track_temp),
                (clouds, rain_level, wetness),
                best_session_lap,
            )| RealtimeUpdate {
                event_index,
                session_index,
                session_type: session_type.into(),
                phase: phase.into(),
                session_time_ms,
                session_end_time_ms,
                focused_car_index,
                active_camera_set,
                active_camera,
                current_hud_page,
                replay,
                time_of_day_ms,
                ambient_temp,
                track_temp,
                clouds,
                rain_level,
                wetness,
                best_session_lap,
            },
        )
}

fn car_update_strategy() -> impl Strategy<Value = RealtimeCarUpdate> {
    (
        (any::<u16>(), any::<u16>(), any::<u8>(), any::<i8>()),
        (wire_f32(), wire_f32(), wire_f32(), any::<u8>()),
        (any::<u16>(), any::<u16>(), any::<u16>(), any::<u16>()),
        (wire_f32(), any::<u16>(), any::<i32>()),
        (lap_strategy(), lap_strategy(), lap_strategy()),
    )
        .prop_map(
            |(
                (car_id, driver_id, driver_count, gear),
                (world_pos_x, world_pos_y, yaw, car_location),
                (kmh, position, cup_position, track_position),
                (spline_position, laps, delta_ms),
                (best_session_lap, last_lap, current_lap),
            )| RealtimeCarUpdate {
                car_id,
                driver_id,
                driver_count,
                gear,
                world_pos_x,
                world_pos_y,
                yaw,
                car_location: car_location.into(),
                kmh,
                position,
                cup_position,
                track_position,
                spline_position,
                laps,
                delta_ms,
                best_session_lap,
                last_lap,
                current_lap,
            },
        )
}

fn driver_strategy() -> impl Strategy<Value = Driver> {
    (
        short_string(),
        short_string(),
        "[A-Z]{0,3}",
        any::<u8>(),
        any::<u16>(),
    )
        .prop_map(
            |(first_name, last_name, short_name, category, nationality)| Driver {
                first_name,
                last_name,
                short_name,
                category: category.into(),
                nationality,
            },
        )
}

fn entry_list_car_strategy() -> impl Strategy<Value = EntryListCar> {
    (
        (any::<u16>(), any::<u8>(), short_string(), any::<i32>()),
        (any::<u8>(), any::<i8>(), any::<u16>()),
        proptest::collection::vec(driver_strategy(), 0..5),
    )
        .prop_map(
            |(
                (car_id, car_model, team_name, race_number),
                (cup_category, current_driver_index, nationality),
                drivers,
            )| EntryListCar {
                car_id,
                car_model,
                team_name,
                race_number,
                cup_category: cup_category.into(),
                current_driver_index,
                nationality,
                drivers,
            },
        )
}

fn track_data_strategy() -> impl Strategy<Value = TrackData> {
    let camera_set = (
        short_string(),
        proptest::collection::vec(short_string(), 0..6),
    )
        .prop_map(|(name, cameras)| CameraSet { name, cameras });
    (
        (any::<i32>(), short_string(), any::<i32>(), any::<i32>()),
        proptest::collection::vec(camera_set, 0..4),
        proptest::collection::vec(short_string(), 0..6),
    )
        .prop_map(
            |((connection_id, name, track_id, meters), camera_sets, hud_pages)| TrackData {
                connection_id,
                name,
                track_id,
                meters,
                camera_sets,
                hud_pages,
            },
        )
}

fn broadcasting_event_strategy() -> impl Strategy<Value = BroadcastingEvent> {
    (any::<u8>(), short_string(), any::<i32>(), any::<i32>()).prop_map(
        |(kind, message, time_ms, car_id)| BroadcastingEvent {
            kind: kind.into(),
            message,
            time_ms,
            car_id,
        },
    )
}

fn assert_inbound_round_trip(message: InboundMessage) -> Result<(), TestCaseError> {
    let frame = message.encode().map_err(|e| TestCaseError::fail(e.to_string()))?;
    let decoded = decode_inbound(&frame).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(decoded, message);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Arbitrary bytes of any length must never cause a panic.
    #[test]
    fn prop_random_bytes_no_panic(
        data in proptest::collection::vec(any::<u8>(), 0..MAX_DATAGRAM)
    ) {
        let _ = decode_inbound(&data);
        let _ = OutboundRequest::decode(&data);
    }

    /// Known type byte with random body must never panic either.
    #[test]
    fn prop_known_type_random_body_no_panic(
        kind in 1u8..=7,
        body in proptest::collection::vec(any::<u8>(), 0..512)
    ) {
        let mut frame = vec![kind];
        frame.extend_from_slice(&body);
        let _ = decode_inbound(&frame);
    }

    /// Entry lists of any size, including empty, survive encode/decode.
    #[test]
    fn prop_entry_list_round_trip(
        connection_id in any::<i32>(),
        car_ids in proptest::collection::vec(any::<u16>(), 0..300)
    ) {
        let message = InboundMessage::EntryList(EntryList { connection_id, car_ids });
        let frame = message.encode().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let decoded = decode_inbound(&frame).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(decoded, message);
    }

    /// Every strict prefix of a valid frame fails to decode.
    #[test]
    fn prop_truncated_entry_list_fails(
        car_ids in proptest::collection::vec(any::<u16>(), 1..40),
        cut in any::<prop::sample::Index>()
    ) {
        let message = InboundMessage::EntryList(EntryList { connection_id: 1, car_ids });
        let frame = message.encode().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let len = cut.index(frame.len());
        let prefix = frame.get(..len).unwrap_or_default();
        prop_assert!(decode_inbound(prefix).is_err());
    }

    /// Sentinel splits read back as zero wherever they appear.
    #[test]
    fn prop_sentinel_splits_normalize_to_zero(
        mask in proptest::collection::vec(any::<bool>(), 0..8),
        lap in lap_strategy()
    ) {
        let splits: Vec<i32> = mask
            .iter()
            .zip(1..)
            .map(|(sentinel, time)| if *sentinel { INVALID_SECTOR_TIME } else { time * 1000 })
            .collect();
        let lap = Lap { splits: splits.clone(), ..lap };

        let mut writer = PacketWriter::default();
        lap.write_to(&mut writer).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let bytes = writer.finish();
        let decoded = Lap::read_from(&mut PacketReader::new(&bytes))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let expected: Vec<i32> = splits
            .iter()
            .map(|split| if *split == INVALID_SECTOR_TIME { 0 } else { *split })
            .collect();
        prop_assert_eq!(decoded.splits, expected);
        prop_assert_eq!(decoded.lap_time_ms, lap.lap_time_ms);
    }

    /// Registration strings of any valid UTF-8 content survive the trip.
    #[test]
    fn prop_registration_strings_round_trip(
        display_name in ".{0,64}",
        connection_password in ".{0,32}",
        command_password in ".{0,32}",
        update_interval_ms in 0i32..10_000
    ) {
        let request = OutboundRequest::Register {
            display_name,
            connection_password,
            update_interval_ms,
            command_password,
        };
        let frame = request.encode().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let decoded = OutboundRequest::decode(&frame).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(decoded, request);
    }

    /// Session updates survive the trip with and without replay info.
    #[test]
    fn prop_realtime_update_round_trip(update in realtime_update_strategy()) {
        assert_inbound_round_trip(InboundMessage::RealtimeUpdate(update))?;
    }

    /// Car updates survive the trip, including negative gears.
    #[test]
    fn prop_realtime_car_update_round_trip(update in car_update_strategy()) {
        assert_inbound_round_trip(InboundMessage::RealtimeCarUpdate(update))?;
    }

    /// Entry list cars with zero or more drivers survive the trip.
    #[test]
    fn prop_entry_list_car_round_trip(car in entry_list_car_strategy()) {
        assert_inbound_round_trip(InboundMessage::EntryListCar(car))?;
    }

    /// Track data survives the trip, empty camera sets and HUD pages included.
    #[test]
    fn prop_track_data_round_trip(track in track_data_strategy()) {
        assert_inbound_round_trip(InboundMessage::TrackData(track))?;
    }

    #[test]
    fn prop_broadcasting_event_round_trip(event in broadcasting_event_strategy()) {
        assert_inbound_round_trip(InboundMessage::BroadcastingEvent(event))?;
    }

    /// The connection-scoped requests carry any connection id.
    #[test]
    fn prop_connection_requests_round_trip(connection_id in any::<i32>(), which in 0u8..3) {
        let request = match which {
            0 => OutboundRequest::Unregister { connection_id },
            1 => OutboundRequest::RequestEntryList { connection_id },
            _ => OutboundRequest::RequestTrackData { connection_id },
        };
        let frame = request.encode().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let decoded = OutboundRequest::decode(&frame).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(decoded, request);
    }

    /// Unknown inbound type bytes are rejected by code, whatever follows.
    #[test]
    fn prop_unknown_type_reported(
        code in 8u8..=255,
        body in proptest::collection::vec(any::<u8>(), 0..64)
    ) {
        let mut frame = vec![code];
        frame.extend_from_slice(&body);
        prop_assert_eq!(decode_inbound(&frame), Err(CodecError::UnknownMessageType(code)));
    }
}

#[test]
fn type_byte_zero_is_unknown() {
    assert_eq!(decode_inbound(&[0]), Err(CodecError::UnknownMessageType(0)));
}
