//! Row mapping for archive entities
//!
//! Decoding is positional. Each entity's column table sits next to its
//! decoder and is the single source of truth for the projection order; the
//! repository queries select exactly these columns, which the repository
//! tests assert.

use archive_kernel::{Location, Recording};

use crate::value::{DbRow, DecodeError, FromDbRow};

/// Columns of `recordings`, in decode order
pub const RECORDING_COLUMNS: [&str; 14] = [
    "id",
    "title",
    "audio_location",
    "artwork_location",
    "date_uploaded",
    "recording_date",
    "location_id",
    "duration",
    "format",
    "description",
    "equipment",
    "file_size",
    "channels",
    "license",
];

/// Projection of `locations`, in decode order
///
/// `geom` is exported as GeoJSON text; longitude and latitude are never
/// selected.
pub const LOCATION_COLUMNS: [&str; 4] = ["id", "name", "description", "ST_AsGeoJSON(geom)"];

impl FromDbRow for Recording {
    fn from_db_row(row: &DbRow) -> Result<Self, DecodeError> {
        row.expect_width(RECORDING_COLUMNS.len())?;

        Ok(Recording {
            id: row.get(0)?,
            title: row.get(1)?,
            audio_location: row.get(2)?,
            artwork_location: row.get(3)?,
            date_uploaded: row.get(4)?,
            recording_date: row.get(5)?,
            location_id: row.get(6)?,
            duration: row.get(7)?,
            format: row.get(8)?,
            description: row.get(9)?,
            equipment: row.get(10)?,
            size: row.get(11)?,
            channels: row.get(12)?,
            license: row.get(13)?,
        })
    }
}

impl FromDbRow for Location {
    fn from_db_row(row: &DbRow) -> Result<Self, DecodeError> {
        row.expect_width(LOCATION_COLUMNS.len())?;

        Ok(Location {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            geom: row.get(3)?,
            longitude: None,
            latitude: None,
        })
    }
}

/// Builds the row the store would return for `recording`
///
/// The inverse of the decoder; lets test doubles serve realistic rows.
#[cfg(any(test, feature = "mock"))]
pub fn recording_row(recording: &Recording) -> DbRow {
    use crate::value::DbValue;

    DbRow::new(vec![
        DbValue::from(recording.id),
        DbValue::from(&recording.title),
        DbValue::from(&recording.audio_location),
        DbValue::from(&recording.artwork_location),
        DbValue::from(recording.date_uploaded),
        DbValue::from(recording.recording_date),
        DbValue::from(recording.location_id),
        DbValue::from(recording.duration),
        DbValue::from(&recording.format),
        DbValue::from(&recording.description),
        DbValue::from(&recording.equipment),
        DbValue::from(recording.size),
        DbValue::from(&recording.channels),
        DbValue::from(&recording.license),
    ])
}

/// Builds the row the store would return for a location with the given
/// exported geometry
#[cfg(any(test, feature = "mock"))]
pub fn location_row(id: i32, name: &str, description: &str, geom: &str) -> DbRow {
    use crate::value::DbValue;

    DbRow::new(vec![
        DbValue::from(id),
        DbValue::from(name),
        DbValue::from(description),
        DbValue::from(geom),
    ])
}
