//! Recording service
//!
//! Thin layer over [`RecordingRepository`] that rejects out-of-range input
//! before it reaches the store.

use std::sync::Arc;

use archive_kernel::{Recording, RequestContext};
use async_trait::async_trait;
use infra_db::RecordingRepository;
use tracing::{debug, instrument};

use crate::error::ServiceError;

/// Read operations on recordings exposed to the request handlers
#[async_trait]
pub trait RecordingService: Send + Sync {
    /// Retrieves a recording; `id` must be at least 1
    async fn get_by_id(&self, ctx: &RequestContext, id: i32) -> Result<Recording, ServiceError>;

    /// Lists up to `limit` recordings; `limit` must be at least 1
    async fn list_items(&self, ctx: &RequestContext, limit: i32)
        -> Result<Vec<Recording>, ServiceError>;

    /// Counts all recordings
    async fn get_count(&self, ctx: &RequestContext) -> Result<i64, ServiceError>;
}

/// [`RecordingService`] backed by a recording repository
#[derive(Clone)]
pub struct RecordingServiceImpl {
    repository: Arc<dyn RecordingRepository>,
}

impl RecordingServiceImpl {
    pub fn new(repository: Arc<dyn RecordingRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RecordingService for RecordingServiceImpl {
    #[instrument(skip(self, ctx))]
    async fn get_by_id(&self, ctx: &RequestContext, id: i32) -> Result<Recording, ServiceError> {
        if id < 1 {
            return Err(ServiceError::validation("id must be no less than 1"));
        }
        let recording = self.repository.get_row_by_id(ctx, id).await?;
        debug!(title = %recording.title, "Recording retrieved");
        Ok(recording)
    }

    #[instrument(skip(self, ctx))]
    async fn list_items(
        &self,
        ctx: &RequestContext,
        limit: i32,
    ) -> Result<Vec<Recording>, ServiceError> {
        if limit < 1 {
            return Err(ServiceError::validation("limit can't be less than 1"));
        }
        Ok(self.repository.list(ctx, limit).await?)
    }

    #[instrument(skip(self, ctx))]
    async fn get_count(&self, ctx: &RequestContext) -> Result<i64, ServiceError> {
        Ok(self.repository.count(ctx).await?)
    }
}
