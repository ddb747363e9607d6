//! Entry-list coherency cache.
//!
//! A car update is only surfaced once the car belongs to the current entry
//! list and its metadata has arrived. Updates for ids outside the list
//! invalidate it and ask for a refresh, at most once per refresh interval.
//! Updates for a listed car whose metadata is still missing ask for a refresh
//! too, once the list has stayed incomplete for a full interval.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use acc_broadcast_protocol::{EntryList, EntryListCar, TrackData};
use tracing::{debug, trace};

/// How a car id relates to the current entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarStatus {
    /// Listed and its metadata received.
    Known,
    /// Listed, metadata still in flight.
    Pending,
    /// Not listed, or no list at all.
    Unknown,
}

#[derive(Debug, Default)]
struct CurrentList {
    car_ids: Vec<u16>,
    cars: HashMap<u16, EntryListCar>,
    /// First update seen for a listed car without metadata.
    incomplete_since: Option<Instant>,
}

impl CurrentList {
    fn contains(&self, car_id: u16) -> bool {
        self.car_ids.contains(&car_id)
    }
}

/// Per-connection entry-list and track-data state.
#[derive(Debug)]
pub struct EntryListCache {
    current: Option<CurrentList>,
    last_refresh_request: Option<Instant>,
    refresh_interval: Duration,
    track_data: Option<TrackData>,
}

impl Default for EntryListCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl EntryListCache {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            current: None,
            last_refresh_request: None,
            refresh_interval,
            track_data: None,
        }
    }

    /// Replace the current list. Metadata of the previous list is dropped
    /// since ids are not stable across lists.
    pub fn on_entry_list_received(&mut self, list: &EntryList) {
        debug!(cars = list.car_ids.len(), "entry list received");
        self.current = Some(CurrentList {
            car_ids: list.car_ids.clone(),
            cars: HashMap::with_capacity(list.car_ids.len()),
            incomplete_since: None,
        });
        self.last_refresh_request = None;
    }

    /// Record metadata for a listed car. Cars outside the current list are
    /// ignored; they belong to a list that has since been replaced.
    pub fn on_entry_list_car_received(&mut self, car: &EntryListCar) {
        match self.current.as_mut() {
            Some(current) if current.contains(car.car_id) => {
                current.cars.insert(car.car_id, car.clone());
            }
            _ => trace!(car_id = car.car_id, "entry list car outside current list"),
        }
    }

    pub fn car_status(&self, car_id: u16) -> CarStatus {
        match &self.current {
            Some(current) if current.cars.contains_key(&car_id) => CarStatus::Known,
            Some(current) if current.contains(car_id) => CarStatus::Pending,
            _ => CarStatus::Unknown,
        }
    }

    /// True when updates for `car_id` may be delivered.
    pub fn is_known(&self, car_id: u16) -> bool {
        self.car_status(car_id) == CarStatus::Known
    }

    /// Register an update for a car outside the current list.
    ///
    /// Invalidates the list and returns whether a refresh should be requested
    /// now. Returns true at most once per refresh interval; the caller must
    /// send the request when it does.
    pub fn on_unknown_car(&mut self, car_id: u16, now: Instant) -> bool {
        if self
            .current
            .as_ref()
            .is_some_and(|current| current.contains(car_id))
        {
            return false;
        }

        if self.current.take().is_some() {
            debug!(car_id, "car outside entry list, invalidating");
        }

        let due = self
            .last_refresh_request
            .is_none_or(|last| now.saturating_duration_since(last) >= self.refresh_interval);
        if due {
            self.last_refresh_request = Some(now);
        }
        due
    }

    /// Register an update for a listed car whose metadata has not arrived.
    ///
    /// The list is kept. Returns true when a refresh should be requested now:
    /// the list has been incomplete for at least one refresh interval and no
    /// request went out within the last interval. The caller must send the
    /// request when it does.
    pub fn on_pending_car(&mut self, car_id: u16, now: Instant) -> bool {
        let interval = self.refresh_interval;
        let Some(current) = self.current.as_mut() else {
            return false;
        };
        if !current.contains(car_id) || current.cars.contains_key(&car_id) {
            return false;
        }

        let incomplete_since = *current.incomplete_since.get_or_insert(now);
        if now.saturating_duration_since(incomplete_since) < interval {
            return false;
        }

        let due = self
            .last_refresh_request
            .is_none_or(|last| now.saturating_duration_since(last) >= interval);
        if due {
            debug!(car_id, "car metadata still missing, refreshing entry list");
            self.last_refresh_request = Some(now);
        }
        due
    }

    /// Count a request sent outside [`Self::on_unknown_car`], such as the one
    /// issued right after registration.
    pub fn note_refresh_requested(&mut self, now: Instant) {
        self.last_refresh_request = Some(now);
    }

    pub fn car(&self, car_id: u16) -> Option<&EntryListCar> {
        self.current.as_ref()?.cars.get(&car_id)
    }

    /// Car ids of the current list, in list order.
    pub fn car_ids(&self) -> Option<&[u16]> {
        self.current.as_ref().map(|current| current.car_ids.as_slice())
    }

    /// True once every listed car's metadata has arrived.
    pub fn is_complete(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.car_ids.iter().all(|id| current.cars.contains_key(id)))
    }

    pub fn on_track_data(&mut self, track: &TrackData) {
        self.track_data = Some(track.clone());
    }

    pub fn track_data(&self) -> Option<&TrackData> {
        self.track_data.as_ref()
    }

    /// Forget everything; used when the connection is torn down.
    pub fn reset(&mut self) {
        self.current = None;
        self.last_refresh_request = None;
        self.track_data = None;
    }
}
