//! Per-call deadline and cancellation.
//!
//! # Design
//! A `Context` is passed to every helper. It carries an optional deadline and
//! an optional cancellation flag shared with one or more [`CancelHandle`]s.
//! Contexts are cheap to clone; deriving a context with a new timeout keeps
//! the earlier of the two deadlines and the same cancellation flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::TransportError;

/// Deadline and cancellation state for a single call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<CancelHandle>,
}

impl Context {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Attach a cancellation flag and return the handle that trips it.
    ///
    /// If the context is already cancellable the existing flag is reused, so
    /// cancelling a parent still cancels its children.
    ///
    /// With [`HttpClient`](crate::HttpClient), a cancelled call returns at
    /// once but its worker thread keeps the connection until the request
    /// times out. Without a deadline or configured timeout that is
    /// [`CANCELLABLE_FALLBACK_TIMEOUT`](crate::transport::CANCELLABLE_FALLBACK_TIMEOUT).
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let handle = self.cancel.get_or_insert_with(CancelHandle::default).clone();
        (self, handle)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `Duration::ZERO` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancellable(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelHandle::is_cancelled)
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<TransportError> {
        if self.is_cancelled() {
            Some(TransportError::Cancelled)
        } else if self.deadline_exceeded() {
            Some(TransportError::DeadlineExceeded)
        } else {
            None
        }
    }
}

/// Trips the cancellation flag of every context derived from it.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
