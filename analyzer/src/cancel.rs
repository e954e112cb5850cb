// cancel.rs — Cooperative cancellation for analysis passes
//
// The host may request early termination of a whole analysis pass. The only
// loops worth interrupting are member lookups during shape matching, which
// check this flag between candidates.
//
// Preconditions: none.
// Postconditions: once cancelled, the flag stays cancelled.
// Failure modes: none.
// Side effects: none beyond the flag itself.

use std::sync::atomic::{AtomicBool, Ordering};

/// A shared, thread-safe cancellation flag.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
