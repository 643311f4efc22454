//! Mock implementation of the database capability for testing
//!
//! [`MockDatabase`] answers queries from responses programmed ahead of time,
//! keyed by exact query text, so repository logic can be verified without a
//! network or a server process. It records every call it receives and counts
//! the row streams it has handed out that are still alive.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use archive_kernel::RequestContext;
use async_trait::async_trait;
use futures_util::stream;

use crate::capability::{Database, ExecOutcome, RowStream};
use crate::error::DatabaseError;
use crate::value::{DbRow, DbValue, NamedArgs};

/// A programmed answer for one query text
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Rows for `fetch_one`/`fetch_many`; an empty list is "no rows"
    Rows(Vec<DbRow>),
    /// Affected-row count for `execute`
    Affected(u64),
    /// Rows and errors streamed in order; the first error ends the stream
    Stream(Vec<Result<DbRow, DatabaseError>>),
    /// Fails every operation with this error
    Fail(DatabaseError),
    /// Never completes; only the request context can end the operation
    Hang,
}

/// Which capability operation was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Execute,
    FetchOne,
    FetchMany,
}

/// Arguments as received by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedArgs {
    Named(NamedArgs),
    Positional(Vec<DbValue>),
}

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub query: String,
    pub args: RecordedArgs,
}

impl RecordedCall {
    /// The named argument `name`, if this call was made with named arguments
    pub fn named(&self, name: &str) -> Option<&DbValue> {
        match &self.args {
            RecordedArgs::Named(args) => args.get(name),
            RecordedArgs::Positional(_) => None,
        }
    }

    pub fn positional(&self) -> &[DbValue] {
        match &self.args {
            RecordedArgs::Positional(values) => values,
            RecordedArgs::Named(_) => &[],
        }
    }
}

/// In-memory test double for [`Database`]
#[derive(Debug, Default)]
pub struct MockDatabase {
    responses: Mutex<HashMap<String, MockResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
    open_streams: Arc<AtomicUsize>,
}

impl MockDatabase {
    /// Creates a mock with no programmed responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Programs the response for an exact query text, replacing any earlier one
    pub fn respond(self, query: impl Into<String>, response: MockResponse) -> Self {
        lock(&self.responses).insert(query.into(), response);
        self
    }

    /// Answers `query` with a single row
    pub fn with_row(self, query: impl Into<String>, row: DbRow) -> Self {
        self.respond(query, MockResponse::Rows(vec![row]))
    }

    /// Answers `query` with these rows, in order
    pub fn with_rows(self, query: impl Into<String>, rows: Vec<DbRow>) -> Self {
        self.respond(query, MockResponse::Rows(rows))
    }

    /// Answers `query` with an affected-row count
    pub fn with_affected(self, query: impl Into<String>, rows_affected: u64) -> Self {
        self.respond(query, MockResponse::Affected(rows_affected))
    }

    /// Fails `query` with `error`
    pub fn with_error(self, query: impl Into<String>, error: DatabaseError) -> Self {
        self.respond(query, MockResponse::Fail(error))
    }

    /// All calls received so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        lock(&self.calls).last().cloned()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Row streams handed out by `fetch_many` and not yet dropped
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    fn record(&self, kind: CallKind, query: &str, args: RecordedArgs) -> Option<MockResponse> {
        lock(&self.calls).push(RecordedCall {
            kind,
            query: query.to_string(),
            args,
        });
        lock(&self.responses).get(query).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unexpected(query: &str) -> DatabaseError {
    DatabaseError::QueryFailed(format!("unexpected query: {query}"))
}

#[async_trait]
impl Database for MockDatabase {
    async fn execute(
        &self,
        ctx: &RequestContext,
        query: &str,
        args: &NamedArgs,
    ) -> Result<ExecOutcome, DatabaseError> {
        let response = self.record(CallKind::Execute, query, RecordedArgs::Named(args.clone()));
        ctx.check()?;

        match response {
            Some(MockResponse::Affected(rows_affected)) => Ok(ExecOutcome { rows_affected }),
            Some(MockResponse::Rows(rows)) => Ok(ExecOutcome {
                rows_affected: rows.len() as u64,
            }),
            Some(MockResponse::Fail(error)) => Err(error),
            Some(MockResponse::Hang) => ctx.guard(std::future::pending()).await,
            Some(MockResponse::Stream(_)) | None => Err(unexpected(query)),
        }
    }

    async fn fetch_one(
        &self,
        ctx: &RequestContext,
        query: &str,
        args: &NamedArgs,
    ) -> Result<DbRow, DatabaseError> {
        let response = self.record(CallKind::FetchOne, query, RecordedArgs::Named(args.clone()));
        ctx.check()?;

        match response {
            Some(MockResponse::Rows(rows)) => rows
                .into_iter()
                .next()
                .ok_or_else(|| DatabaseError::NotFound("no rows in result set".to_string())),
            Some(MockResponse::Fail(error)) => Err(error),
            Some(MockResponse::Hang) => ctx.guard(std::future::pending()).await,
            Some(MockResponse::Affected(_)) | Some(MockResponse::Stream(_)) | None => {
                Err(unexpected(query))
            }
        }
    }

    fn fetch_many<'a>(
        &'a self,
        ctx: &'a RequestContext,
        query: &'a str,
        args: Vec<DbValue>,
    ) -> RowStream<'a> {
        let response = self.record(CallKind::FetchMany, query, RecordedArgs::Positional(args));

        let (items, hang): (VecDeque<_>, bool) = match response {
            Some(MockResponse::Rows(rows)) => (rows.into_iter().map(Ok).collect(), false),
            Some(MockResponse::Stream(items)) => (items.into_iter().collect(), false),
            Some(MockResponse::Fail(error)) => (VecDeque::from([Err(error)]), false),
            Some(MockResponse::Hang) => (VecDeque::new(), true),
            Some(MockResponse::Affected(_)) | None => {
                (VecDeque::from([Err(unexpected(query))]), false)
            }
        };

        let cursor = MockCursor {
            items,
            hang,
            done: false,
            _lease: StreamLease::acquire(Arc::clone(&self.open_streams)),
        };

        Box::pin(stream::unfold(cursor, move |mut cursor| async move {
            if cursor.done {
                return None;
            }
            if let Err(interrupted) = ctx.check() {
                cursor.done = true;
                return Some((Err(interrupted.into()), cursor));
            }
            if cursor.hang {
                cursor.done = true;
                let result: Result<DbRow, DatabaseError> =
                    ctx.guard(std::future::pending()).await;
                return Some((result, cursor));
            }
            match cursor.items.pop_front()? {
                Ok(row) => Some((Ok(row), cursor)),
                Err(error) => {
                    cursor.done = true;
                    Some((Err(error), cursor))
                }
            }
        }))
    }
}

struct MockCursor {
    items: VecDeque<Result<DbRow, DatabaseError>>,
    hang: bool,
    done: bool,
    _lease: StreamLease,
}

/// Counts a stream as open until dropped
struct StreamLease(Arc<AtomicUsize>);

impl StreamLease {
    fn acquire(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
