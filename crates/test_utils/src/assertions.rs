//! Custom Test Assertions
//!
//! Assertion helpers for archive entities that give more useful failure
//! messages than comparing whole structs.

use archive_kernel::{GeoPoint, Location, Recording};

/// Asserts that a stored recording matches the one that was written
///
/// The id is ignored since the store assigns it.
///
/// # Panics
///
/// Panics naming the first differing field
pub fn assert_recording_matches(actual: &Recording, expected: &Recording) {
    assert_eq!(actual.title, expected.title, "title differs");
    assert_eq!(actual.audio_location, expected.audio_location, "audio_location differs");
    assert_eq!(actual.artwork_location, expected.artwork_location, "artwork_location differs");
    assert_eq!(actual.date_uploaded, expected.date_uploaded, "date_uploaded differs");
    assert_eq!(actual.recording_date, expected.recording_date, "recording_date differs");
    assert_eq!(actual.location_id, expected.location_id, "location_id differs");
    assert_eq!(actual.duration, expected.duration, "duration differs");
    assert_eq!(actual.format, expected.format, "format differs");
    assert_eq!(actual.description, expected.description, "description differs");
    assert_eq!(actual.equipment, expected.equipment, "equipment differs");
    assert_eq!(actual.size, expected.size, "size differs");
    assert_eq!(actual.channels, expected.channels, "channels differs");
    assert_eq!(actual.license, expected.license, "license differs");
}

/// Asserts that a location read back from the store sits at the given point
///
/// Also checks that the write-only coordinate fields came back empty.
pub fn assert_location_at(location: &Location, longitude: f64, latitude: f64) {
    assert!(location.longitude.is_none(), "longitude should not be read back");
    assert!(location.latitude.is_none(), "latitude should not be read back");

    let point = location
        .point()
        .unwrap_or_else(|| panic!("geom is not a GeoJSON point: {}", location.geom));
    assert_point_approx_eq(&point, longitude, latitude);
}

/// Asserts both coordinates agree to within 1e-9 degrees
pub fn assert_point_approx_eq(point: &GeoPoint, longitude: f64, latitude: f64) {
    assert!(
        (point.longitude - longitude).abs() < 1e-9 && (point.latitude - latitude).abs() < 1e-9,
        "Point differs: actual=({}, {}), expected=({}, {})",
        point.longitude,
        point.latitude,
        longitude,
        latitude
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{LocationFixtures, RecordingFixtures};

    #[test]
    fn test_recording_match_ignores_id() {
        let expected = RecordingFixtures::test_title();
        let actual = Recording { id: 12, ..expected.clone() };
        assert_recording_matches(&actual, &expected);
    }

    #[test]
    #[should_panic(expected = "artwork_location differs")]
    fn test_recording_match_reports_field() {
        let expected = RecordingFixtures::test_title();
        let actual = Recording {
            artwork_location: Some(String::new()),
            ..expected.clone()
        };
        assert_recording_matches(&actual, &expected);
    }

    #[test]
    fn test_location_at_reads_geojson() {
        let location = Location {
            id: 1,
            name: "Fen".to_string(),
            description: String::new(),
            geom: LocationFixtures::fen_geojson().to_string(),
            longitude: None,
            latitude: None,
        };
        assert_location_at(&location, 1.0, 2.0);
    }
}
