//! Infrastructure Database Layer
//!
//! This crate provides the persistence layer for the field archive, between
//! the service layer and a PostgreSQL/PostGIS store.
//!
//! # Architecture
//!
//! The crate follows the repository pattern over a narrow capability:
//!
//! - [`Database`] is the only thing repositories talk to: execute a
//!   statement, fetch one row, or stream many rows
//! - [`PgDatabase`] realizes it over a sqlx pool; `mock::MockDatabase`
//!   (feature `mock`) realizes it with programmed responses
//! - [`mapping`] holds the column tables and positional decoders
//! - [`repositories`] compose the above into CRUD, list and count operations
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, PgDatabase, SqlRecordingRepository, RecordingRepository};
//! use archive_kernel::RequestContext;
//! use std::sync::Arc;
//!
//! let db = Arc::new(PgDatabase::connect(DatabaseConfig::new("postgres://localhost/field_archive")).await?);
//! let recordings = SqlRecordingRepository::new(db);
//! let latest = recordings.list(&RequestContext::new(), 20).await?;
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod mapping;
pub mod pool;
pub mod repositories;
pub mod value;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use capability::{Database, ExecOutcome, RowStream};
pub use self::config::ArchiveConfig;
pub use error::{DatabaseError, RepositoryError};
pub use pool::{create_pool, DatabaseConfig, DatabasePool, PgDatabase};
pub use repositories::{
    LocationRepository, RecordingRepository, SqlLocationRepository, SqlRecordingRepository,
};
pub use value::{DbRow, DbValue, DecodeError, FromDbRow, FromDbValue, NamedArgs};
