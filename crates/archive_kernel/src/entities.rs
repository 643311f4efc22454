//! Archive entities
//!
//! Plain data records for the two persisted aggregates. Nullable columns are
//! carried as `Option` so that "not yet set" never collapses into an empty
//! string or a zero timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A field audio recording
///
/// `id` is assigned by the store on insert and is ignored by insert paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub id: i32,
    pub title: String,
    pub audio_location: String,
    pub artwork_location: Option<String>,
    pub date_uploaded: Option<DateTime<Utc>>,
    pub recording_date: DateTime<Utc>,
    /// Foreign reference to a [`Location`]; the store enforces existence
    pub location_id: i32,
    /// Length in whole seconds
    pub duration: i32,
    pub format: String,
    pub description: String,
    pub equipment: String,
    /// File size in bytes, stored in the `file_size` column
    pub size: f64,
    pub channels: String,
    pub license: String,
}

/// A place where recordings were captured
///
/// `longitude` and `latitude` are write-only: the store turns them into a
/// point geometry and only ever hands back `geom`. Reads always leave them
/// as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub description: String,
    /// GeoJSON text exported by the store, read-only
    pub geom: String,
    #[serde(default, skip_serializing)]
    pub longitude: Option<String>,
    #[serde(default, skip_serializing)]
    pub latitude: Option<String>,
}

impl Location {
    /// Creates a location to be written with the given coordinates
    ///
    /// # Arguments
    ///
    /// * `name` - Display name of the location
    /// * `description` - Free-form description
    /// * `longitude` - Decimal degrees, as text
    /// * `latitude` - Decimal degrees, as text
    pub fn at(
        name: impl Into<String>,
        description: impl Into<String>,
        longitude: impl Into<String>,
        latitude: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            geom: String::new(),
            longitude: Some(longitude.into()),
            latitude: Some(latitude.into()),
        }
    }

    /// Recovers the position from the stored geometry
    ///
    /// Returns `None` when `geom` is empty or is not a GeoJSON point.
    pub fn point(&self) -> Option<GeoPoint> {
        GeoPoint::from_geojson(&self.geom)
    }
}

/// A WGS 84 (SRID 4326) position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Deserialize)]
struct GeoJsonGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<f64>,
}

impl GeoPoint {
    /// Parses a GeoJSON `Point` geometry such as
    /// `{"type":"Point","coordinates":[1,2]}`
    pub fn from_geojson(text: &str) -> Option<Self> {
        let geometry: GeoJsonGeometry = serde_json::from_str(text).ok()?;
        if geometry.kind != "Point" {
            return None;
        }
        match geometry.coordinates.as_slice() {
            [longitude, latitude, ..] => Some(Self {
                longitude: *longitude,
                latitude: *latitude,
            }),
            _ => None,
        }
    }
}
