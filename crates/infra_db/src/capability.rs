//! Database capability
//!
//! The narrow set of operations the repositories need from a relational
//! backend. [`PgDatabase`](crate::PgDatabase) realizes it over a sqlx pool;
//! [`MockDatabase`](crate::mock::MockDatabase) realizes it with preprogrammed
//! responses for unit tests. Repositories only ever hold an
//! `Arc<dyn Database>`.

use archive_kernel::RequestContext;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::DatabaseError;
use crate::value::{DbRow, DbValue, NamedArgs};

/// A stream of fetched rows
///
/// The stream owns its cursor and connection; dropping it releases both, so
/// any early return from a consuming function releases the stream too. An
/// `Err` item is terminal.
pub type RowStream<'a> = BoxStream<'a, Result<DbRow, DatabaseError>>;

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
}

/// Operations a relational backend must provide
///
/// Every operation runs under the caller's [`RequestContext`] and must stop
/// with [`DatabaseError::Interrupted`] once the context is cancelled or past
/// its deadline.
#[async_trait]
pub trait Database: Send + Sync {
    /// Executes a statement with no result rows (insert, update, delete)
    async fn execute(
        &self,
        ctx: &RequestContext,
        query: &str,
        args: &NamedArgs,
    ) -> Result<ExecOutcome, DatabaseError>;

    /// Fetches exactly one row
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` when the query yields no rows, so
    /// callers can tell "absent" apart from every other failure
    async fn fetch_one(
        &self,
        ctx: &RequestContext,
        query: &str,
        args: &NamedArgs,
    ) -> Result<DbRow, DatabaseError>;

    /// Streams the rows of a query bound with positional (`$n`) arguments
    fn fetch_many<'a>(
        &'a self,
        ctx: &'a RequestContext,
        query: &'a str,
        args: Vec<DbValue>,
    ) -> RowStream<'a>;
}
