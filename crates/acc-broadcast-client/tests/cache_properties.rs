//! Property tests for the entry-list cache.

use std::time::{Duration, Instant};

use acc_broadcast_client::protocol::{CupCategory, EntryList, EntryListCar};
use acc_broadcast_client::{CarStatus, EntryListCache};
use proptest::prelude::*;

fn metadata(car_id: u16) -> EntryListCar {
    EntryListCar {
        car_id,
        car_model: 1,
        team_name: String::new(),
        race_number: i32::from(car_id),
        cup_category: CupCategory::Overall,
        current_driver_index: 0,
        nationality: 0,
        drivers: Vec::new(),
    }
}

proptest! {
    #[test]
    fn status_follows_list_and_metadata(
        listed in prop::collection::btree_set(0u16..64, 0..20),
        received in prop::collection::btree_set(0u16..64, 0..20),
        queried in 0u16..80,
    ) {
        let mut cache = EntryListCache::new(Duration::from_secs(1));
        cache.on_entry_list_received(&EntryList {
            connection_id: 1,
            car_ids: listed.iter().copied().collect(),
        });
        for car_id in &received {
            cache.on_entry_list_car_received(&metadata(*car_id));
        }

        let expected = if listed.contains(&queried) && received.contains(&queried) {
            CarStatus::Known
        } else if listed.contains(&queried) {
            CarStatus::Pending
        } else {
            CarStatus::Unknown
        };
        prop_assert_eq!(cache.car_status(queried), expected);
        prop_assert_eq!(cache.is_known(queried), expected == CarStatus::Known);

        let complete = listed.iter().all(|id| received.contains(id));
        prop_assert_eq!(cache.is_complete(), complete);
    }

    #[test]
    fn one_refresh_per_interval(
        unknown in prop::collection::vec(100u16..200, 1..50),
        step_ms in 0u64..50,
    ) {
        let interval = Duration::from_millis(500);
        let mut cache = EntryListCache::new(interval);
        let start = Instant::now();

        let mut request_times = Vec::new();
        for (i, car_id) in unknown.iter().enumerate() {
            let offset = Duration::from_millis(step_ms * u64::try_from(i).unwrap_or_default());
            let now = start + offset;
            if cache.on_unknown_car(*car_id, now) {
                request_times.push(now);
            }
        }

        prop_assert_eq!(request_times.first().copied(), Some(start));
        for pair in request_times.windows(2) {
            if let [earlier, later] = pair {
                prop_assert!(*later - *earlier >= interval);
            }
        }
        prop_assert_eq!(cache.car_ids(), None);
    }

    #[test]
    fn reset_forgets_everything(listed in prop::collection::btree_set(0u16..32, 1..10)) {
        let mut cache = EntryListCache::default();
        let ids: Vec<u16> = listed.iter().copied().collect();
        cache.on_entry_list_received(&EntryList { connection_id: 3, car_ids: ids.clone() });
        for car_id in &ids {
            cache.on_entry_list_car_received(&metadata(*car_id));
        }
        prop_assert!(cache.is_complete());

        cache.reset();
        for car_id in &ids {
            prop_assert_eq!(cache.car_status(*car_id), CarStatus::Unknown);
            prop_assert!(cache.car(*car_id).is_none());
        }
        prop_assert!(!cache.is_complete());
    }
}
