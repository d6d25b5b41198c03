//! Fetch coordination for the message window.
//!
//! At most one history fetch is logically active per window. A new
//! fetch-triggering operation pre-empts the previous one by flipping its
//! token; the superseded continuation observes the flip after its await
//! point and discards its result instead of mutating the window.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Direction of the in-flight fetch, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FetchDirection {
    Initial,
    Upwards,
    Downwards,
    JumpToLive,
    JumpToMessage,
}

/// Cooperative cancellation token for one fetch.
///
/// The underlying network call is never aborted; a pre-empted continuation
/// simply checks the token after resuming and drops its result.
#[derive(Debug, Clone)]
pub struct PreemptToken(Arc<AtomicBool>);

impl PreemptToken {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    fn flip(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once the fetch carrying this token has been superseded.
    #[must_use]
    pub fn is_preempted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Serializes fetches for one window and tracks the failure flag.
#[derive(Debug, Default)]
pub struct FetchGuard {
    direction: Option<FetchDirection>,
    failed: bool,
    token: Option<PreemptToken>,
}

impl FetchGuard {
    /// Creates an idle guard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            direction: None,
            failed: false,
            token: None,
        }
    }

    /// True iff no fetch is in flight, or the last one failed (retry).
    #[must_use]
    pub const fn can_fetch(&self) -> bool {
        self.direction.is_none() || self.failed
    }

    /// Direction of the in-flight fetch, if any.
    #[must_use]
    pub const fn direction(&self) -> Option<FetchDirection> {
        self.direction
    }

    /// True iff the most recent fetch attempt errored.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.failed
    }

    /// Cancels the logical effect of the current fetch and clears failure.
    pub fn preempt(&mut self) {
        if let Some(token) = self.token.take() {
            token.flip();
        }
        self.direction = None;
        self.failed = false;
    }

    /// Marks a fetch as started and hands out its token.
    pub fn begin(&mut self, direction: FetchDirection) -> PreemptToken {
        let token = PreemptToken::new();
        self.direction = Some(direction);
        self.failed = false;
        self.token = Some(token.clone());
        token
    }

    /// Marks the in-flight fetch as completed.
    pub fn finish(&mut self) {
        self.direction = None;
        self.token = None;
    }

    /// Records a fetch failure; the direction clears so a retry can pass
    /// the `can_fetch` gate.
    pub fn fail(&mut self) {
        self.direction = None;
        self.token = None;
        self.failed = true;
    }
}
