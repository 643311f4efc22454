//! Recording service tests
//!
//! The service runs over the real SQL repository with a mock database
//! underneath, so validation and error wrapping are checked end to end.

use std::sync::Arc;

use archive_kernel::{Recording, RequestContext};
use domain_archive::{RecordingService, RecordingServiceImpl, ServiceError};
use infra_db::mapping::recording_row;
use infra_db::mock::MockDatabase;
use infra_db::repositories::recording::{COUNT_RECORDINGS, LIST_RECORDINGS, SELECT_RECORDING_BY_ID};
use infra_db::{DatabaseError, DbRow, DbValue, RepositoryError, SqlRecordingRepository};
use test_utils::{assert_recording_matches, RecordingFixtures, TestRecordingBuilder};

fn service(db: MockDatabase) -> (Arc<MockDatabase>, RecordingServiceImpl) {
    let db = Arc::new(db);
    let repository = Arc::new(SqlRecordingRepository::new(db.clone()));
    (db, RecordingServiceImpl::new(repository))
}

fn stored(id: i32, recording: Recording) -> Recording {
    Recording { id, ..recording }
}

#[tokio::test]
async fn test_get_by_id_returns_recording() {
    let expected = stored(1, RecordingFixtures::test_title());
    let (db, service) =
        service(MockDatabase::new().with_row(SELECT_RECORDING_BY_ID, recording_row(&expected)));

    let recording = service.get_by_id(&RequestContext::new(), 1).await.unwrap();

    assert_eq!(recording.id, 1);
    assert_recording_matches(&recording, &expected);
    assert_eq!(db.last_call().unwrap().named("id"), Some(&DbValue::Int(Some(1))));
}

#[tokio::test]
async fn test_get_by_id_rejects_ids_below_one() {
    let (db, service) = service(MockDatabase::new());
    let ctx = RequestContext::new();

    for id in [0, -1, i32::MIN] {
        let err = service.get_by_id(&ctx, id).await.unwrap_err();
        match err {
            ServiceError::Validation(message) => assert_eq!(message, "id must be no less than 1"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_get_by_id_keeps_not_found_distinguishable() {
    let (_, service) = service(MockDatabase::new().with_rows(SELECT_RECORDING_BY_ID, vec![]));

    let err = service.get_by_id(&RequestContext::new(), 404).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::NotFound { id: 404, .. })
    ));
}

#[tokio::test]
async fn test_store_failure_is_not_reported_as_not_found() {
    let (_, service) = service(MockDatabase::new().with_error(
        SELECT_RECORDING_BY_ID,
        DatabaseError::ConnectionFailed("connection reset by peer".into()),
    ));

    let err = service.get_by_id(&RequestContext::new(), 3).await.unwrap_err();

    assert!(!err.is_not_found());
    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::FetchFailed { .. })
    ));
}

#[tokio::test]
async fn test_list_items_passes_limit_through() {
    let rows: Vec<DbRow> = TestRecordingBuilder::numbered("Take", 2)
        .into_iter()
        .enumerate()
        .map(|(i, r)| recording_row(&stored(i as i32 + 1, r)))
        .collect();
    let (db, service) = service(MockDatabase::new().with_rows(LIST_RECORDINGS, rows));

    let recordings = service.list_items(&RequestContext::new(), 2).await.unwrap();

    let titles: Vec<_> = recordings.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Take 1", "Take 2"]);
    assert_eq!(db.last_call().unwrap().positional(), &[DbValue::Int(Some(2))]);
    assert_eq!(db.open_streams(), 0);
}

#[tokio::test]
async fn test_list_items_rejects_limit_below_one() {
    let (db, service) = service(MockDatabase::new());

    let err = service.list_items(&RequestContext::new(), 0).await.unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_get_count() {
    let (_, service) = service(
        MockDatabase::new().with_row(COUNT_RECORDINGS, DbRow::new(vec![DbValue::from(42i64)])),
    );

    assert_eq!(service.get_count(&RequestContext::new()).await.unwrap(), 42);
}

#[tokio::test]
async fn test_cancelled_request_surfaces_as_repository_error() {
    let (_, service) = service(
        MockDatabase::new().with_row(COUNT_RECORDINGS, DbRow::new(vec![DbValue::from(1i64)])),
    );
    let ctx = RequestContext::new();
    ctx.cancel();

    let err = service.get_count(&ctx).await.unwrap_err();

    match err {
        ServiceError::Repository(e) => assert!(e.is_interrupted()),
        other => panic!("expected repository error, got {other:?}"),
    }
}
