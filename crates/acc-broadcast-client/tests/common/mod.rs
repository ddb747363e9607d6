//! Shared fixtures: simulator messages and event-channel helpers.

use std::time::Duration;

use acc_broadcast_client::ClientEvent;
use acc_broadcast_client::protocol::{
    CarLocation, CupCategory, EntryList, EntryListCar, InboundMessage, Lap, RealtimeCarUpdate,
    RegistrationResult, TrackData,
};
use tokio::sync::mpsc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(3);

pub fn registration(connection_id: i32, success: bool) -> InboundMessage {
    InboundMessage::RegistrationResult(RegistrationResult {
        connection_id,
        success,
        readonly: false,
        error_message: if success {
            String::new()
        } else {
            "invalid password".to_string()
        },
    })
}

pub fn entry_list(connection_id: i32, car_ids: &[u16]) -> InboundMessage {
    InboundMessage::EntryList(EntryList {
        connection_id,
        car_ids: car_ids.to_vec(),
    })
}

pub fn entry_list_car(car_id: u16) -> InboundMessage {
    InboundMessage::EntryListCar(EntryListCar {
        car_id,
        car_model: 25,
        team_name: format!("Team {car_id}"),
        race_number: i32::from(car_id) + 10,
        cup_category: CupCategory::Overall,
        current_driver_index: 0,
        nationality: 0,
        drivers: Vec::new(),
    })
}

pub fn track_data(connection_id: i32) -> InboundMessage {
    InboundMessage::TrackData(TrackData {
        connection_id,
        name: "Brands Hatch".to_string(),
        track_id: 1,
        meters: 3908,
        camera_sets: Vec::new(),
        hud_pages: Vec::new(),
    })
}

pub fn car_update(car_id: u16) -> InboundMessage {
    InboundMessage::RealtimeCarUpdate(RealtimeCarUpdate {
        car_id,
        driver_id: 0,
        driver_count: 1,
        gear: 3,
        world_pos_x: 0.0,
        world_pos_y: 0.0,
        yaw: 0.0,
        car_location: CarLocation::Track,
        kmh: 160,
        position: 1,
        cup_position: 1,
        track_position: 1,
        spline_position: 0.3,
        laps: 2,
        delta_ms: 0,
        best_session_lap: Lap::default(),
        last_lap: Lap::default(),
        current_lap: Lap::default(),
    })
}

/// Next event, failing after [`WAIT`].
pub async fn next_event(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
) -> Result<ClientEvent, Box<dyn std::error::Error>> {
    match tokio::time::timeout(WAIT, events.recv()).await {
        Ok(Some(event)) => Ok(event),
        Ok(None) => Err("event channel closed".into()),
        Err(_) => Err("timed out waiting for an event".into()),
    }
}

/// Skip events until one matches, failing after [`WAIT`].
pub async fn wait_for_event<F>(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    mut matches: F,
) -> Result<ClientEvent, Box<dyn std::error::Error>>
where
    F: FnMut(&ClientEvent) -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, events.recv()).await {
            Ok(Some(event)) if matches(&event) => return Ok(event),
            Ok(Some(_)) => {}
            Ok(None) => return Err("event channel closed".into()),
            Err(_) => return Err("timed out waiting for a matching event".into()),
        }
    }
}

/// Drain whatever is queued without waiting.
pub fn drain(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Vec<ClientEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

pub fn is_car_update_for(event: &ClientEvent, car_id: u16) -> bool {
    matches!(event, ClientEvent::RealtimeCarUpdate(update) if update.car_id == car_id)
}
