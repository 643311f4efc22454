//! Pre-built Test Fixtures
//!
//! Ready-to-use recordings and locations. Values are fixed so tests can
//! compare whole entities after a trip through the store.

use archive_kernel::{Location, Recording};
use chrono::{DateTime, TimeZone, Utc};

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Capture time of the reference recording (2025-01-06T20:02:57Z)
    pub fn recording_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 20, 2, 57).unwrap()
    }

    /// Upload time used when a fixture needs `date_uploaded` set
    pub fn uploaded_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 7, 9, 30, 0).unwrap()
    }
}

/// Fixture for recordings
pub struct RecordingFixtures;

impl RecordingFixtures {
    /// The reference recording: no artwork, never uploaded, location 1
    pub fn test_title() -> Recording {
        Recording {
            id: 0,
            title: "Test Title".to_string(),
            audio_location: "test/audio/location.mp3".to_string(),
            artwork_location: None,
            date_uploaded: None,
            recording_date: TemporalFixtures::recording_date(),
            location_id: 1,
            duration: 120,
            format: "mp3".to_string(),
            description: String::new(),
            equipment: String::new(),
            size: 2048.0,
            channels: "2".to_string(),
            license: "Creative Commons".to_string(),
        }
    }

    /// Recording with every optional column populated
    pub fn dawn_chorus() -> Recording {
        Recording {
            id: 0,
            title: "Dawn chorus".to_string(),
            audio_location: "field/2025/dawn-chorus.flac".to_string(),
            artwork_location: Some("field/2025/dawn-chorus.jpg".to_string()),
            date_uploaded: Some(TemporalFixtures::uploaded_at()),
            recording_date: Utc.with_ymd_and_hms(2025, 1, 5, 5, 45, 0).unwrap(),
            location_id: 1,
            duration: 1800,
            format: "flac".to_string(),
            description: "Blackbird and robin before sunrise".to_string(),
            equipment: "Zoom F3, pair of omnis".to_string(),
            size: 314_572_800.0,
            channels: "2".to_string(),
            license: "CC BY-SA 4.0".to_string(),
        }
    }
}

/// Fixture for locations
pub struct LocationFixtures;

impl LocationFixtures {
    /// Wetland site written at longitude 1.00, latitude 2.00
    pub fn fen() -> Location {
        Location::at("Fen", "Open water and reed beds", "1.00", "2.00")
    }

    /// Upland site in the southern and western hemispheres
    pub fn ridge() -> Location {
        Location::at("Ridge", "Chalk downland", "-3.5", "-12.25")
    }

    /// GeoJSON the store exports for [`LocationFixtures::fen`]
    pub fn fen_geojson() -> &'static str {
        r#"{"type":"Point","coordinates":[1,2]}"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_recording_leaves_optionals_unset() {
        let recording = RecordingFixtures::test_title();
        assert!(recording.artwork_location.is_none());
        assert!(recording.date_uploaded.is_none());
        assert_eq!(recording.recording_date.to_rfc3339(), "2025-01-06T20:02:57+00:00");
    }

    #[test]
    fn test_location_fixtures_carry_coordinates() {
        let fen = LocationFixtures::fen();
        assert_eq!(fen.longitude.as_deref(), Some("1.00"));
        assert!(fen.geom.is_empty());
    }
}
