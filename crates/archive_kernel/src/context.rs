//! Request-scoped context
//!
//! Every repository operation receives a [`RequestContext`] from its caller,
//! typically derived from an inbound request. The context carries a
//! cancellation token and an optional deadline; whatever runs under
//! [`RequestContext::guard`] is abandoned as soon as either fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Interrupted;

/// Cancellable, deadline-bearing context for a single unit of work
///
/// Cloning shares the same token, so cancelling any clone cancels them all.
/// Use [`RequestContext::child`] for a context that can be cancelled on its
/// own while still observing its parent.
///
/// # Example
///
/// ```rust
/// use archive_kernel::RequestContext;
/// use std::time::Duration;
///
/// let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
/// assert!(ctx.deadline().is_some());
/// assert!(!ctx.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Creates a context with no deadline that is never cancelled unless
    /// [`cancel`](Self::cancel) is called
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline to `timeout` from now
    ///
    /// An earlier deadline already on the context is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline, keeping an earlier one if present
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Derives a context cancelled with this one, but cancellable on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context and every child derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Checks the context without waiting
    ///
    /// # Errors
    ///
    /// Returns the interruption if the context is already cancelled or past
    /// its deadline
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Runs `operation` until it completes or the context stops it
    ///
    /// The operation future is dropped on interruption, which aborts any
    /// in-flight query it owns.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or `E::from(Interrupted)` when the
    /// context is cancelled or its deadline passes first
    pub async fn guard<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<Interrupted>,
    {
        self.check()?;

        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Interrupted::Cancelled.into()),
            _ = expiry => Err(Interrupted::DeadlineExceeded.into()),
            result = operation => result,
        }
    }
}
