//! Output formatting for received events and errors

use acc_broadcast_client::ClientEvent;
use acc_broadcast_client::protocol::Lap;
use anyhow::Error;
use colored::*;
use serde_json::json;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "chain": error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        }
    });
    match serde_json::to_string(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}

/// One event as a single JSON line.
pub fn print_event_json(event: &ClientEvent) {
    match serde_json::to_string(event) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format event as JSON: {e}"),
    }
}

pub fn print_event_human(event: &ClientEvent) {
    println!("{}", describe_event(event));
}

/// Single-line summary of an event.
pub fn describe_event(event: &ClientEvent) -> String {
    match event {
        ClientEvent::Connected(result) => {
            let access = if result.readonly {
                "read-only"
            } else {
                "read-write"
            };
            format!(
                "{} connection {} ({access})",
                "Connected".green().bold(),
                result.connection_id
            )
        }
        ClientEvent::Disconnected => "Disconnected".red().bold().to_string(),
        ClientEvent::RealtimeUpdate(update) => format!(
            "{} {:?}/{:?} t={:.1}s focus=car {} camera={}/{}",
            "Session".cyan(),
            update.session_type,
            update.phase,
            update.session_time_ms / 1000.0,
            update.focused_car_index,
            update.active_camera_set,
            update.active_camera
        ),
        ClientEvent::RealtimeCarUpdate(car) => format!(
            "{} {:>3} P{:<2} lap {:<3} gear {:>2} {:>3} km/h {:?} last {}",
            "Car".dimmed(),
            car.car_id,
            car.position,
            car.laps,
            car.gear,
            car.kmh,
            car.car_location,
            format_lap(&car.last_lap)
        ),
        ClientEvent::EntryList(list) => format!(
            "{} {} cars",
            "Entry list".bold(),
            list.car_ids.len()
        ),
        ClientEvent::EntryListCar(car) => {
            let driver = car
                .current_driver()
                .map(|d| format!("{} {}", d.first_name, d.last_name))
                .unwrap_or_default();
            format!(
                "{} {:>3} #{} {} {driver}",
                "Entry".bold(),
                car.car_id,
                car.race_number,
                car.team_name
            )
        }
        ClientEvent::TrackData(track) => format!(
            "{} {} ({} m, {} camera sets)",
            "Track".bold(),
            track.name,
            track.meters,
            track.camera_sets.len()
        ),
        ClientEvent::BroadcastingEvent(event) => format!(
            "{} {:?} car {} {}",
            "Event".yellow().bold(),
            event.kind,
            event.car_id,
            event.message
        ),
    }
}

/// Lap time as `m:ss.mmm`, or `--` when the simulator reports none.
pub fn format_lap(lap: &Lap) -> String {
    match lap.lap_time_ms {
        Some(ms) if ms >= 0 => {
            let minutes = ms / 60_000;
            let seconds = (ms % 60_000) / 1000;
            let millis = ms % 1000;
            format!("{minutes}:{seconds:02}.{millis:03}")
        }
        _ => "--".to_string(),
    }
}
