//! Archive Domain
//!
//! Services consumed by the request-handling layer. They own the range
//! validation the repositories deliberately skip and wrap repository errors
//! so the boundary can still tell "not found" apart from everything else.

pub mod error;
pub mod recording;

pub use error::ServiceError;
pub use recording::{RecordingService, RecordingServiceImpl};
