//! Location repository implementation
//!
//! Locations carry a PostGIS point. Writes send longitude and latitude as
//! text and the store builds the SRID 4326 point itself; reads export the
//! point as GeoJSON and never return the coordinates as separate fields.

use std::sync::Arc;

use archive_kernel::{Location, RequestContext};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::capability::Database;
use crate::error::{DatabaseError, RepositoryError};
use crate::repositories::{collect_rows, fetch_error};
use crate::value::{DbValue, NamedArgs};

const ENTITY: &str = "location";

pub const INSERT_LOCATION: &str = concat!(
    "INSERT INTO locations (name, description, geom) ",
    "VALUES (@name, @description, ",
    "ST_SetSRID(ST_MakePoint(@longitude::text::double precision, @latitude::text::double precision), 4326)) ",
    "RETURNING id"
);

pub const SELECT_LOCATION_BY_ID: &str = concat!(
    "SELECT id, name, description, ST_AsGeoJSON(geom) ",
    "FROM locations WHERE id = @id"
);

pub const UPDATE_LOCATION: &str = concat!(
    "UPDATE locations SET name = @name, description = @description, ",
    "geom = ST_SetSRID(ST_MakePoint(@longitude::text::double precision, @latitude::text::double precision), 4326) ",
    "WHERE id = @id"
);

pub const DELETE_LOCATION: &str = "DELETE FROM locations WHERE id = @id";

pub const LIST_LOCATIONS: &str = concat!(
    "SELECT id, name, description, ST_AsGeoJSON(geom) ",
    "FROM locations ORDER BY id LIMIT $1::int"
);

/// Data access for locations
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Inserts a location, building its point from the supplied coordinates
    async fn insert(&self, ctx: &RequestContext, location: &Location)
        -> Result<i32, RepositoryError>;

    /// Retrieves a location by id, with its geometry as GeoJSON
    ///
    /// # Errors
    ///
    /// `RepositoryError::NotFound` when no row has this id
    async fn get_row_by_id(&self, ctx: &RequestContext, id: i32)
        -> Result<Location, RepositoryError>;

    /// Replaces name and description and recomputes the point
    async fn update(&self, ctx: &RequestContext, location: &Location)
        -> Result<(), RepositoryError>;

    async fn delete(&self, ctx: &RequestContext, id: i32) -> Result<(), RepositoryError>;

    /// Lists at most `limit` locations in id order
    async fn list(&self, ctx: &RequestContext, limit: i32)
        -> Result<Vec<Location>, RepositoryError>;
}

/// [`LocationRepository`] over any [`Database`] capability
#[derive(Clone)]
pub struct SqlLocationRepository {
    db: Arc<dyn Database>,
}

impl SqlLocationRepository {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

fn writable_args(location: &Location) -> NamedArgs {
    NamedArgs::new()
        .with("name", &location.name)
        .with("description", &location.description)
        .with("longitude", &location.longitude)
        .with("latitude", &location.latitude)
}

#[async_trait]
impl LocationRepository for SqlLocationRepository {
    #[instrument(skip(self, ctx, location), fields(name = %location.name))]
    async fn insert(
        &self,
        ctx: &RequestContext,
        location: &Location,
    ) -> Result<i32, RepositoryError> {
        let row = self
            .db
            .fetch_one(ctx, INSERT_LOCATION, &writable_args(location))
            .await
            .map_err(|source| {
                warn!(error = %source, "Location insert failed");
                RepositoryError::InsertFailed { entity: ENTITY, source }
            })?;

        let id = row.decode_scalar::<i32>().map_err(|e| RepositoryError::InsertFailed {
            entity: ENTITY,
            source: DatabaseError::QueryFailed(format!("unreadable generated id: {e}")),
        })?;

        debug!(id, "Location inserted");
        Ok(id)
    }

    #[instrument(skip(self, ctx), fields(location_id = id))]
    async fn get_row_by_id(
        &self,
        ctx: &RequestContext,
        id: i32,
    ) -> Result<Location, RepositoryError> {
        debug!("Fetching location by ID");

        let args = NamedArgs::new().with("id", id);
        let row = self
            .db
            .fetch_one(ctx, SELECT_LOCATION_BY_ID, &args)
            .await
            .map_err(|e| fetch_error(ENTITY, id, e))?;

        row.decode()
            .map_err(|source| RepositoryError::DecodeMismatch { entity: ENTITY, source })
    }

    #[instrument(skip(self, ctx, location), fields(location_id = location.id))]
    async fn update(
        &self,
        ctx: &RequestContext,
        location: &Location,
    ) -> Result<(), RepositoryError> {
        let args = writable_args(location).with("id", location.id);
        let outcome = self
            .db
            .execute(ctx, UPDATE_LOCATION, &args)
            .await
            .map_err(|source| {
                warn!(error = %source, "Location update failed");
                RepositoryError::UpdateFailed { entity: ENTITY, source }
            })?;

        debug!(rows_affected = outcome.rows_affected, "Location updated");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(location_id = id))]
    async fn delete(&self, ctx: &RequestContext, id: i32) -> Result<(), RepositoryError> {
        let args = NamedArgs::new().with("id", id);
        let outcome = self
            .db
            .execute(ctx, DELETE_LOCATION, &args)
            .await
            .map_err(|source| {
                warn!(error = %source, "Location delete failed");
                RepositoryError::DeleteFailed { entity: ENTITY, source }
            })?;

        debug!(rows_affected = outcome.rows_affected, "Location deleted");
        Ok(())
    }

    #[instrument(skip(self, ctx))]
    async fn list(
        &self,
        ctx: &RequestContext,
        limit: i32,
    ) -> Result<Vec<Location>, RepositoryError> {
        let rows = self
            .db
            .fetch_many(ctx, LIST_LOCATIONS, vec![DbValue::from(limit)]);
        let locations = collect_rows(rows, ENTITY).await?;

        debug!(count = locations.len(), "Listed locations");
        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{location_row, LOCATION_COLUMNS};
    use crate::mock::{MockDatabase, MockResponse};
    use crate::value::DbRow;
    use proptest::prelude::*;
    use test_utils::{latitude_strategy, longitude_strategy};

    const POINT: &str = r#"{"type":"Point","coordinates":[1,2]}"#;

    fn repo(db: MockDatabase) -> (Arc<MockDatabase>, SqlLocationRepository) {
        let db = Arc::new(db);
        (db.clone(), SqlLocationRepository::new(db))
    }

    #[test]
    fn test_projections_match_column_table() {
        let projection = format!("SELECT {} FROM locations", LOCATION_COLUMNS.join(", "));
        assert!(SELECT_LOCATION_BY_ID.starts_with(&projection));
        assert!(LIST_LOCATIONS.starts_with(&projection));
    }

    #[test]
    fn test_coordinates_are_bound_not_stored() {
        let args = writable_args(&Location::at("Fen", "Open water", "1.00", "2.00"));

        assert!(args.compile(INSERT_LOCATION).is_ok());
        assert!(!INSERT_LOCATION.contains("longitude,"));
        assert!(!UPDATE_LOCATION.contains("longitude ="));
    }

    #[tokio::test]
    async fn test_insert_then_get_exports_geometry() {
        let (db, repo) = repo(
            MockDatabase::new()
                .with_row(INSERT_LOCATION, DbRow::new(vec![DbValue::from(5)]))
                .with_row(SELECT_LOCATION_BY_ID, location_row(5, "Fen", "Open water", POINT)),
        );
        let ctx = RequestContext::new();

        let id = repo
            .insert(&ctx, &Location::at("Fen", "Open water", "1.00", "2.00"))
            .await
            .unwrap();
        let insert = db.last_call().unwrap();
        assert_eq!(insert.named("longitude"), Some(&DbValue::from("1.00")));
        assert_eq!(insert.named("latitude"), Some(&DbValue::from("2.00")));

        let location = repo.get_row_by_id(&ctx, id).await.unwrap();
        assert_eq!(location.id, 5);
        assert!(!location.geom.is_empty());
        assert!(location.longitude.is_none());
        assert!(location.latitude.is_none());

        let point = location.point().unwrap();
        assert_eq!((point.longitude, point.latitude), (1.0, 2.0));
    }

    #[tokio::test]
    async fn test_get_missing_location_is_not_found() {
        let (_, repo) = repo(MockDatabase::new().with_rows(SELECT_LOCATION_BY_ID, vec![]));

        let err = repo.get_row_by_id(&RequestContext::new(), 8).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_store_failure_is_fetch_failed() {
        let (_, repo) = repo(MockDatabase::new().with_error(
            SELECT_LOCATION_BY_ID,
            DatabaseError::QueryFailed("function st_asgeojson does not exist".into()),
        ));

        let err = repo.get_row_by_id(&RequestContext::new(), 1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete_ignore_missing_rows() {
        let (db, repo) = repo(
            MockDatabase::new()
                .with_affected(UPDATE_LOCATION, 0)
                .with_affected(DELETE_LOCATION, 0),
        );
        let ctx = RequestContext::new();
        let location = Location {
            id: 99,
            ..Location::at("Fen", "Open water", "3.5", "-1.25")
        };

        repo.update(&ctx, &location).await.unwrap();
        repo.delete(&ctx, 99).await.unwrap();

        let calls = db.calls();
        assert_eq!(calls[0].named("id"), Some(&DbValue::Int(Some(99))));
        assert_eq!(calls[0].named("latitude"), Some(&DbValue::from("-1.25")));
        assert_eq!(calls[1].query, DELETE_LOCATION);
    }

    #[tokio::test]
    async fn test_update_failure_is_update_failed() {
        let (_, repo) = repo(MockDatabase::new().with_error(
            UPDATE_LOCATION,
            DatabaseError::QueryFailed("invalid input syntax for type double precision".into()),
        ));

        let location = Location::at("Fen", "Open water", "east", "north");
        let err = repo.update(&RequestContext::new(), &location).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UpdateFailed { .. }));
    }

    #[tokio::test]
    async fn test_list_respects_store_order_and_releases_stream() {
        let rows = vec![
            location_row(1, "Fen", "Open water", POINT),
            location_row(2, "Ridge", "Chalk downland", POINT),
        ];
        let (db, repo) = repo(MockDatabase::new().with_rows(LIST_LOCATIONS, rows));

        let locations = repo.list(&RequestContext::new(), 2).await.unwrap();

        let names: Vec<_> = locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Fen", "Ridge"]);
        assert_eq!(db.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_list_of_empty_table_is_empty() {
        let (_, repo) = repo(MockDatabase::new().with_rows(LIST_LOCATIONS, vec![]));

        assert!(repo.list(&RequestContext::new(), 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_is_insert_failed() {
        let violation = DatabaseError::ConstraintViolation("locations_geom_check".into());
        let (_, repo) = repo(MockDatabase::new().with_error(INSERT_LOCATION, violation.clone()));

        let err = repo
            .insert(&RequestContext::new(), &Location::at("Fen", "Open water", "1.00", "2.00"))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::InsertFailed { .. }));
        assert_eq!(err.database_error(), Some(&violation));
    }

    #[tokio::test]
    async fn test_delete_failure_is_delete_failed() {
        let (_, repo) = repo(
            MockDatabase::new().with_error(DELETE_LOCATION, DatabaseError::ForeignKeyViolation(
                "recordings_location_id_fkey".into(),
            )),
        );

        let err = repo.delete(&RequestContext::new(), 1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DeleteFailed { .. }));
    }

    #[tokio::test]
    async fn test_list_releases_stream_on_store_error() {
        let items = vec![
            Ok(location_row(1, "Fen", "Open water", POINT)),
            Err(DatabaseError::QueryFailed("cursor lost".into())),
        ];
        let (db, repo) =
            repo(MockDatabase::new().respond(LIST_LOCATIONS, MockResponse::Stream(items)));

        let err = repo.list(&RequestContext::new(), 5).await.unwrap_err();

        assert!(matches!(err, RepositoryError::FetchFailed { .. }));
        assert_eq!(db.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_list_releases_stream_on_decode_failure() {
        let rows = vec![
            location_row(1, "Fen", "Open water", POINT),
            DbRow::new(vec![DbValue::from(2)]),
        ];
        let (db, repo) = repo(MockDatabase::new().with_rows(LIST_LOCATIONS, rows));

        let err = repo.list(&RequestContext::new(), 5).await.unwrap_err();

        assert!(matches!(err, RepositoryError::DecodeMismatch { .. }));
        assert_eq!(db.open_streams(), 0);
    }

    proptest! {
        #[test]
        fn prop_coordinates_bind_as_given(lon in longitude_strategy(), lat in latitude_strategy()) {
            let args = writable_args(&Location::at("Site", "", lon.clone(), lat.clone()));
            let (_, values) = args.compile(INSERT_LOCATION).unwrap();

            prop_assert_eq!(values.len(), 4);
            prop_assert_eq!(&values[2], &DbValue::from(lon));
            prop_assert_eq!(&values[3], &DbValue::from(lat));
        }
    }
}
