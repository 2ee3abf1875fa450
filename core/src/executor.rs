//! The store seam and request cancellation.

use crate::{
    Row, Statement,
    dialect::Dialect,
    error::{QueryError, Result},
};
use parking_lot::Mutex;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

/// Runs rendered statements against a backing store.
///
/// Implementations pick the [`Dialect`] the statements are rendered for and
/// must honor the [`CancelToken`]: a token that is already cancelled fails
/// with [`QueryError::Cancelled`] before anything runs.
pub trait Executor: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    /// Runs a statement that returns rows.
    fn query(&self, stmt: &Statement, cancel: &CancelToken) -> Result<Vec<Row>>;

    /// Runs a statement and returns the number of affected rows.
    fn execute(&self, stmt: &Statement, cancel: &CancelToken) -> Result<usize>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn dialect(&self) -> &dyn Dialect {
        (**self).dialect()
    }

    fn query(&self, stmt: &Statement, cancel: &CancelToken) -> Result<Vec<Row>> {
        (**self).query(stmt, cancel)
    }

    fn execute(&self, stmt: &Statement, cancel: &CancelToken) -> Result<usize> {
        (**self).execute(stmt, cancel)
    }
}

/// Something that can stop a statement running on another thread.
pub trait Interrupt: Send + Sync {
    fn interrupt(&self);
}

/// Cancellation signal shared between the host (which cancels on client
/// disconnect or deadline) and the store (which stops work).
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    deadline: Mutex<Option<Instant>>,
    next_id: AtomicU64,
    hooks: Mutex<Vec<(u64, Arc<dyn Interrupt>)>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that counts as cancelled once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        let token = Self::new();
        token.set_deadline(Instant::now() + timeout);
        token
    }

    /// Tightens the deadline. A later deadline than the current one is
    /// ignored.
    pub fn set_deadline(&self, deadline: Instant) {
        let mut current = self.inner.deadline.lock();
        if current.is_none_or(|d| deadline < d) {
            *current = Some(deadline);
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        *self.inner.deadline.lock()
    }

    /// Cancels the token and interrupts any statement registered with it.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let hooks: Vec<_> = self
            .inner
            .hooks
            .lock()
            .iter()
            .map(|(_, hook)| Arc::clone(hook))
            .collect();
        for hook in hooks {
            hook.interrupt();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
            || self.deadline().is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with [`QueryError::Cancelled`] if the token is cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(QueryError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Registers `hook` for the lifetime of the returned guard. If the token
    /// is already cancelled the hook fires immediately.
    pub fn register(&self, hook: Arc<dyn Interrupt>) -> InterruptGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.hooks.lock().push((id, Arc::clone(&hook)));
        if self.inner.cancelled.load(Ordering::SeqCst) {
            hook.interrupt();
        }
        InterruptGuard {
            token: self.clone(),
            id,
        }
    }
}

impl core::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.inner.cancelled.load(Ordering::Relaxed))
            .field("deadline", &self.deadline())
            .finish()
    }
}

/// Unregisters an interrupt hook on drop.
#[must_use = "the hook is unregistered when the guard is dropped"]
pub struct InterruptGuard {
    token: CancelToken,
    id: u64,
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.token
            .inner
            .hooks
            .lock()
            .retain(|(id, _)| *id != self.id);
    }
}
