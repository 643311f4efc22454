//! Database error types
//!
//! This module defines the error types that can occur during database operations,
//! at two levels: [`DatabaseError`] for the capability layer (what the store or
//! the driver reported) and [`RepositoryError`] for the repositories, which wrap
//! the store error with the operation that failed.

use archive_kernel::Interrupted;
use thiserror::Error;

use crate::value::DecodeError;

/// Errors that can occur during database operations
///
/// This enum captures the failures a [`Database`](crate::Database)
/// implementation reports: connection issues, query failures, constraint
/// violations and interruption by the request context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A single-row fetch found no rows
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check or not-null constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// The query text references a named parameter with no argument
    #[error("No argument bound for parameter @{0}")]
    UnboundParameter(String),

    /// A result column has a type the value layer cannot carry
    #[error("Unsupported column type {type_name} for column '{column}'")]
    UnsupportedColumnType { column: String, type_name: String },

    /// The request context was cancelled or ran out of time
    #[error("Interrupted: {0}")]
    Interrupted(#[from] Interrupted),
}

impl DatabaseError {
    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }

    /// Checks if the request context stopped the operation
    pub fn is_interrupted(&self) -> bool {
        matches!(self, DatabaseError::Interrupted(_))
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// This function analyzes the SQLx error and maps it to the appropriate
/// DatabaseError variant based on the PostgreSQL error code.
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("no rows in result set".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                // PostgreSQL error codes
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                        "23503" => {
                            DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                        }
                        "23502" | "23514" => {
                            DatabaseError::ConstraintViolation(db_err.message().to_string())
                        }
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

/// Errors returned by the repositories
///
/// `NotFound` is the only variant a caller is expected to branch on (to map
/// it to a 404-equivalent); the rest wrap the store error with the failed
/// operation and are opaque infrastructure failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("unable to insert {entity}")]
    InsertFailed {
        entity: &'static str,
        #[source]
        source: DatabaseError,
    },

    #[error("unable to update {entity}")]
    UpdateFailed {
        entity: &'static str,
        #[source]
        source: DatabaseError,
    },

    #[error("unable to delete {entity}")]
    DeleteFailed {
        entity: &'static str,
        #[source]
        source: DatabaseError,
    },

    #[error("unable to fetch {entity}")]
    FetchFailed {
        entity: &'static str,
        #[source]
        source: DatabaseError,
    },

    /// The row shape disagrees with the decoder: schema drift or a query bug
    #[error("row for {entity} does not match its decoder")]
    DecodeMismatch {
        entity: &'static str,
        #[source]
        source: DecodeError,
    },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// The underlying store error, if this wraps one
    pub fn database_error(&self) -> Option<&DatabaseError> {
        match self {
            RepositoryError::InsertFailed { source, .. }
            | RepositoryError::UpdateFailed { source, .. }
            | RepositoryError::DeleteFailed { source, .. }
            | RepositoryError::FetchFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Checks if the request context stopped the operation
    pub fn is_interrupted(&self) -> bool {
        self.database_error().is_some_and(DatabaseError::is_interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
    }

    #[test]
    fn test_pool_timeout_is_connection_error() {
        let error = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(error, DatabaseError::PoolExhausted);
        assert!(error.is_connection_error());
    }

    #[test]
    fn test_interrupted_conversion() {
        let error: DatabaseError = Interrupted::Cancelled.into();
        assert!(error.is_interrupted());
        assert!(error.to_string().contains("cancelled"));
    }

    #[test]
    fn test_repository_error_keeps_cause() {
        let error = RepositoryError::InsertFailed {
            entity: "recording",
            source: DatabaseError::ForeignKeyViolation("location_id".to_string()),
        };

        assert!(!error.is_not_found());
        assert!(error.database_error().unwrap().is_constraint_violation());
        assert!(error.source().unwrap().to_string().contains("location_id"));
    }

    #[test]
    fn test_not_found_display() {
        let error = RepositoryError::NotFound {
            entity: "recording",
            id: 42,
        };
        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "recording with id 42 not found");
    }
}
