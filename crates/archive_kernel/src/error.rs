//! Core error types used across the archive

use thiserror::Error;

/// Raised when a [`RequestContext`](crate::RequestContext) stops an operation
/// before it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}
