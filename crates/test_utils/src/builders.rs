//! Test Data Builders
//!
//! Builder patterns for constructing recordings with sensible defaults.
//! Tests set only the fields they care about.

use archive_kernel::Recording;
use chrono::{DateTime, Utc};

use crate::fixtures::RecordingFixtures;

/// Builder for constructing test recordings
pub struct TestRecordingBuilder {
    recording: Recording,
}

impl Default for TestRecordingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRecordingBuilder {
    /// Creates a new builder starting from the reference recording
    pub fn new() -> Self {
        Self {
            recording: RecordingFixtures::test_title(),
        }
    }

    /// Sets the id; only meaningful for update and mapping tests
    pub fn with_id(mut self, id: i32) -> Self {
        self.recording.id = id;
        self
    }

    /// Sets the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.recording.title = title.into();
        self
    }

    /// Sets the location reference
    pub fn with_location_id(mut self, location_id: i32) -> Self {
        self.recording.location_id = location_id;
        self
    }

    /// Sets the artwork path
    pub fn with_artwork(mut self, path: impl Into<String>) -> Self {
        self.recording.artwork_location = Some(path.into());
        self
    }

    /// Marks the recording as uploaded at the given instant
    pub fn uploaded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recording.date_uploaded = Some(at);
        self
    }

    /// Sets the capture time
    pub fn with_recording_date(mut self, at: DateTime<Utc>) -> Self {
        self.recording.recording_date = at;
        self
    }

    /// Sets duration in seconds
    pub fn with_duration(mut self, seconds: i32) -> Self {
        self.recording.duration = seconds;
        self
    }

    /// Sets the file size in bytes
    pub fn with_size(mut self, bytes: f64) -> Self {
        self.recording.size = bytes;
        self
    }

    pub fn build(self) -> Recording {
        self.recording
    }

    /// Builds `count` recordings titled `"{prefix} 1"`, `"{prefix} 2"`, ...
    pub fn numbered(prefix: &str, count: usize) -> Vec<Recording> {
        (1..=count)
            .map(|n| Self::new().with_title(format!("{prefix} {n}")).build())
            .collect()
    }
}
