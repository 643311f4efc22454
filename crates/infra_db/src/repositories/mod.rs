//! Repository implementations for archive entities
//!
//! Each repository is a stateless façade over an `Arc<dyn Database>`: it
//! owns the SQL text and the named-argument binding for its entity, runs
//! them through the capability, and decodes the rows with the mappers in
//! [`crate::mapping`].
//!
//! # Architecture
//!
//! Each repository follows these principles:
//! - Named parameters on every write path, never interpolated values
//! - Projections that match the entity's column table exactly
//! - No existence checks on update or delete; zero matched rows is success
//! - No input validation and no retries; errors are wrapped and returned

pub mod recording;
pub mod location;

pub use recording::{RecordingRepository, SqlRecordingRepository};
pub use location::{LocationRepository, SqlLocationRepository};

use futures_util::TryStreamExt;

use crate::capability::RowStream;
use crate::error::{DatabaseError, RepositoryError};
use crate::value::FromDbRow;

/// Drains a row stream into entities, in the order the store returned them
///
/// Takes the stream by value so it is dropped, and its cursor released, on
/// every return path.
pub(crate) async fn collect_rows<T: FromDbRow>(
    mut rows: RowStream<'_>,
    entity: &'static str,
) -> Result<Vec<T>, RepositoryError> {
    let mut items = Vec::new();

    while let Some(row) = rows
        .try_next()
        .await
        .map_err(|source| RepositoryError::FetchFailed { entity, source })?
    {
        let item = row
            .decode()
            .map_err(|source| RepositoryError::DecodeMismatch { entity, source })?;
        items.push(item);
    }

    Ok(items)
}

/// Splits a single-row fetch failure into `NotFound` and `FetchFailed`
pub(crate) fn fetch_error(entity: &'static str, id: i32, error: DatabaseError) -> RepositoryError {
    if error.is_not_found() {
        RepositoryError::NotFound { entity, id }
    } else {
        RepositoryError::FetchFailed {
            entity,
            source: error,
        }
    }
}
