//! Recording repository implementation
//!
//! This module provides database access for field recordings: insert with a
//! store-assigned id, lookup by id, full-record update, delete, bounded
//! listing and a row count.

use std::sync::Arc;

use archive_kernel::{Recording, RequestContext};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::capability::Database;
use crate::error::{DatabaseError, RepositoryError};
use crate::repositories::{collect_rows, fetch_error};
use crate::value::{DbValue, NamedArgs};

const ENTITY: &str = "recording";

pub const INSERT_RECORDING: &str = concat!(
    "INSERT INTO recordings ",
    "(title, audio_location, artwork_location, date_uploaded, recording_date, location_id, ",
    "duration, format, description, equipment, file_size, channels, license) ",
    "VALUES ",
    "(@title, @audio_location, @artwork_location, @date_uploaded, @recording_date, @location_id, ",
    "@duration, @format, @description, @equipment, @file_size, @channels, @license) ",
    "RETURNING id"
);

pub const SELECT_RECORDING_BY_ID: &str = concat!(
    "SELECT id, title, audio_location, artwork_location, date_uploaded, recording_date, ",
    "location_id, duration, format, description, equipment, file_size, channels, license ",
    "FROM recordings WHERE id = @id"
);

pub const UPDATE_RECORDING: &str = concat!(
    "UPDATE recordings ",
    "SET title = @title, audio_location = @audio_location, ",
    "artwork_location = @artwork_location, date_uploaded = @date_uploaded, ",
    "recording_date = @recording_date, location_id = @location_id, duration = @duration, ",
    "format = @format, description = @description, equipment = @equipment, ",
    "file_size = @file_size, channels = @channels, license = @license ",
    "WHERE id = @id"
);

pub const DELETE_RECORDING: &str = "DELETE FROM recordings WHERE id = @id";

pub const LIST_RECORDINGS: &str = concat!(
    "SELECT id, title, audio_location, artwork_location, date_uploaded, recording_date, ",
    "location_id, duration, format, description, equipment, file_size, channels, license ",
    "FROM recordings ORDER BY id LIMIT $1::int"
);

pub const COUNT_RECORDINGS: &str = "SELECT COUNT(*) FROM recordings";

/// Data access for recordings
///
/// Implementations hold no mutable state and are safe to share across tasks.
#[async_trait]
pub trait RecordingRepository: Send + Sync {
    /// Inserts a recording and returns the id the store assigned
    ///
    /// `recording.id` is ignored.
    async fn insert(&self, ctx: &RequestContext, recording: &Recording)
        -> Result<i32, RepositoryError>;

    /// Retrieves a recording by id
    ///
    /// # Errors
    ///
    /// `RepositoryError::NotFound` when no row has this id
    async fn get_row_by_id(&self, ctx: &RequestContext, id: i32)
        -> Result<Recording, RepositoryError>;

    /// Replaces every writable column of the row keyed by `recording.id`
    ///
    /// Succeeds whether or not a row matched.
    async fn update(&self, ctx: &RequestContext, recording: &Recording)
        -> Result<(), RepositoryError>;

    /// Deletes the row with this id; deleting a missing id succeeds
    async fn delete(&self, ctx: &RequestContext, id: i32) -> Result<(), RepositoryError>;

    /// Lists at most `limit` recordings in id order
    async fn list(&self, ctx: &RequestContext, limit: i32)
        -> Result<Vec<Recording>, RepositoryError>;

    /// Counts all recordings
    async fn count(&self, ctx: &RequestContext) -> Result<i64, RepositoryError>;
}

/// [`RecordingRepository`] over any [`Database`] capability
#[derive(Clone)]
pub struct SqlRecordingRepository {
    db: Arc<dyn Database>,
}

impl SqlRecordingRepository {
    /// Creates a new repository over the given database handle
    ///
    /// # Arguments
    ///
    /// * `db` - The shared database capability, usually a `PgDatabase`
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

/// Binds every writable column of `recording` by name
fn writable_args(recording: &Recording) -> NamedArgs {
    NamedArgs::new()
        .with("title", &recording.title)
        .with("audio_location", &recording.audio_location)
        .with("artwork_location", &recording.artwork_location)
        .with("date_uploaded", recording.date_uploaded)
        .with("recording_date", recording.recording_date)
        .with("location_id", recording.location_id)
        .with("duration", recording.duration)
        .with("format", &recording.format)
        .with("description", &recording.description)
        .with("equipment", &recording.equipment)
        .with("file_size", recording.size)
        .with("channels", &recording.channels)
        .with("license", &recording.license)
}

#[async_trait]
impl RecordingRepository for SqlRecordingRepository {
    #[instrument(skip(self, ctx, recording), fields(location_id = recording.location_id))]
    async fn insert(
        &self,
        ctx: &RequestContext,
        recording: &Recording,
    ) -> Result<i32, RepositoryError> {
        debug!("Inserting recording");

        let row = self
            .db
            .fetch_one(ctx, INSERT_RECORDING, &writable_args(recording))
            .await
            .map_err(|source| {
                warn!(error = %source, "Recording insert failed");
                RepositoryError::InsertFailed { entity: ENTITY, source }
            })?;

        // A bad RETURNING row still means the insert cannot be confirmed
        let id = row.decode_scalar::<i32>().map_err(|e| RepositoryError::InsertFailed {
            entity: ENTITY,
            source: DatabaseError::QueryFailed(format!("unreadable generated id: {e}")),
        })?;

        debug!(id, "Recording inserted");
        Ok(id)
    }

    #[instrument(skip(self, ctx), fields(recording_id = id))]
    async fn get_row_by_id(
        &self,
        ctx: &RequestContext,
        id: i32,
    ) -> Result<Recording, RepositoryError> {
        debug!("Fetching recording by ID");

        let args = NamedArgs::new().with("id", id);
        let row = self
            .db
            .fetch_one(ctx, SELECT_RECORDING_BY_ID, &args)
            .await
            .map_err(|e| fetch_error(ENTITY, id, e))?;

        row.decode()
            .map_err(|source| RepositoryError::DecodeMismatch { entity: ENTITY, source })
    }

    #[instrument(skip(self, ctx, recording), fields(recording_id = recording.id))]
    async fn update(
        &self,
        ctx: &RequestContext,
        recording: &Recording,
    ) -> Result<(), RepositoryError> {
        let args = writable_args(recording).with("id", recording.id);
        let outcome = self
            .db
            .execute(ctx, UPDATE_RECORDING, &args)
            .await
            .map_err(|source| {
                warn!(error = %source, "Recording update failed");
                RepositoryError::UpdateFailed { entity: ENTITY, source }
            })?;

        debug!(rows_affected = outcome.rows_affected, "Recording updated");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(recording_id = id))]
    async fn delete(&self, ctx: &RequestContext, id: i32) -> Result<(), RepositoryError> {
        let args = NamedArgs::new().with("id", id);
        let outcome = self
            .db
            .execute(ctx, DELETE_RECORDING, &args)
            .await
            .map_err(|source| {
                warn!(error = %source, "Recording delete failed");
                RepositoryError::DeleteFailed { entity: ENTITY, source }
            })?;

        debug!(rows_affected = outcome.rows_affected, "Recording deleted");
        Ok(())
    }

    #[instrument(skip(self, ctx))]
    async fn list(
        &self,
        ctx: &RequestContext,
        limit: i32,
    ) -> Result<Vec<Recording>, RepositoryError> {
        let rows = self
            .db
            .fetch_many(ctx, LIST_RECORDINGS, vec![DbValue::from(limit)]);
        let recordings = collect_rows(rows, ENTITY).await?;

        debug!(count = recordings.len(), "Listed recordings");
        Ok(recordings)
    }

    #[instrument(skip(self, ctx))]
    async fn count(&self, ctx: &RequestContext) -> Result<i64, RepositoryError> {
        let row = self
            .db
            .fetch_one(ctx, COUNT_RECORDINGS, &NamedArgs::new())
            .await
            .map_err(|source| RepositoryError::FetchFailed { entity: ENTITY, source })?;

        row.decode_scalar()
            .map_err(|source| RepositoryError::DecodeMismatch { entity: ENTITY, source })
    }
}
