//! Property-Based Test Generators
//!
//! Proptest strategies for entities that the store must accept unchanged.

use archive_kernel::Recording;
use chrono::{DateTime, TimeZone, Utc};
use proptest::option;
use proptest::prelude::*;

/// Strategy for timestamps at whole-second precision within 2000..2100
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_102_444_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

/// Strategy for short printable text, including the empty string
pub fn text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.'/-]{0,40}"
}

/// Strategy for longitudes as decimal text
pub fn longitude_strategy() -> impl Strategy<Value = String> {
    (-180_000i32..=180_000i32).prop_map(|milli| format!("{:.3}", milli as f64 / 1000.0))
}

/// Strategy for latitudes as decimal text
pub fn latitude_strategy() -> impl Strategy<Value = String> {
    (-90_000i32..=90_000i32).prop_map(|milli| format!("{:.3}", milli as f64 / 1000.0))
}

/// Strategy for recordings pointing at `location_id`
pub fn recording_strategy(location_id: i32) -> impl Strategy<Value = Recording> {
    (
        ("[A-Z][a-z ]{2,20}", "[a-z]{1,8}/[a-z0-9-]{1,16}\\.(mp3|wav|flac)"),
        (option::of("[a-z0-9/-]{1,20}\\.jpg"), option::of(timestamp_strategy())),
        (timestamp_strategy(), 0i32..86_400),
        (prop_oneof![Just("mp3"), Just("wav"), Just("flac")], text_strategy(), text_strategy()),
        (0u32..1_000_000_000u32, prop_oneof![Just("1"), Just("2")], text_strategy()),
    )
        .prop_map(
            move |(
                (title, audio_location),
                (artwork_location, date_uploaded),
                (recording_date, duration),
                (format, description, equipment),
                (size, channels, license),
            )| Recording {
                id: 0,
                title,
                audio_location,
                artwork_location,
                date_uploaded,
                recording_date,
                location_id,
                duration,
                format: format.to_string(),
                description,
                equipment,
                size: size as f64,
                channels: channels.to_string(),
                license,
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn timestamps_have_no_subsecond_part(at in timestamp_strategy()) {
            prop_assert_eq!(at.timestamp_subsec_nanos(), 0);
        }

        #[test]
        fn coordinates_parse_within_range(lon in longitude_strategy(), lat in latitude_strategy()) {
            let lon: f64 = lon.parse().unwrap();
            let lat: f64 = lat.parse().unwrap();
            prop_assert!((-180.0..=180.0).contains(&lon));
            prop_assert!((-90.0..=90.0).contains(&lat));
        }

        #[test]
        fn recordings_keep_location(recording in recording_strategy(7)) {
            prop_assert_eq!(recording.location_id, 7);
            prop_assert!(recording.duration >= 0);
        }
    }
}
