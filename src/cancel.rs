//! Cooperative cancellation for in-flight range reads.
//!
//! A [`CancelToken`] is shared by the coordinator and every reader it spawns. Readers
//! call [`CancelToken::check`] before each chunk, so a cancelled or expired read stops
//! within one buffer of work.
//!
//! Besides the external cancel flag, a token scoped to one read records the lowest
//! partition index that has failed. Readers with a higher index stop early; readers
//! with a lower index keep going, because they may still produce the failure that
//! gets reported.

use crate::error::ReadError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const NO_FAILURE: usize = usize::MAX;

/// Cancellation and deadline signal for one aggregate read.
#[derive(Clone, Debug)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    first_failure: Arc<AtomicUsize>,
    deadline: Option<Instant>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            first_failure: Arc::new(AtomicUsize::new(NO_FAILURE)),
            deadline: None,
        }
    }

    /// A token for a single read: shares this token's cancel flag, starts with no
    /// recorded failure, and expires `timeout` from now if given.
    #[must_use]
    pub fn scoped(&self, timeout: Option<Duration>) -> Self {
        Self {
            cancelled: Arc::clone(&self.cancelled),
            first_failure: Arc::new(AtomicUsize::new(NO_FAILURE)),
            deadline: timeout.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    /// Abort every read observing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Record that partition `index` failed.
    pub fn record_failure(&self, index: usize) {
        self.first_failure.fetch_min(index, Ordering::SeqCst);
    }

    /// Lowest failed partition index so far.
    #[must_use]
    pub fn first_failure(&self) -> Option<usize> {
        match self.first_failure.load(Ordering::SeqCst) {
            NO_FAILURE => None,
            i => Some(i),
        }
    }

    /// The interruption in effect regardless of partition, if any.
    #[must_use]
    pub fn interruption(&self) -> Option<ReadError> {
        if self.is_cancelled() {
            Some(ReadError::Cancelled)
        } else if self.is_expired() {
            Some(ReadError::TimedOut)
        } else {
            None
        }
    }

    /// Gate for the reader of partition `index`.
    ///
    /// # Errors
    /// [`ReadError::Cancelled`] if the token was cancelled or a lower-index partition
    /// already failed; [`ReadError::TimedOut`] if the deadline has passed.
    pub fn check(&self, index: usize) -> Result<(), ReadError> {
        if let Some(e) = self.interruption() {
            return Err(e);
        }
        if self.first_failure().is_some_and(|f| f < index) {
            return Err(ReadError::Cancelled);
        }
        Ok(())
    }
}
