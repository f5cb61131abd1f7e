//! Pending count and stop flags in a single atomic word.
//!
//! - AtomicU64 for lock-free accounting
//! - The two high bits record graceful and forced stop requests
//! - Increments go through a CAS loop so that checking the stop flags and
//!   bumping the count happen as one step

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::StopReason;

/// Set once a graceful stop (or a forced stop) has been requested.
const DRAINING: u64 = 1 << 63;
/// Set once a forced stop has been requested.
const FORCED: u64 = 1 << 62;
/// Bits holding the number of undelivered increments.
const COUNT_MASK: u64 = FORCED - 1;

/// Number of increments accepted but not yet delivered, plus the stop flags.
///
/// Producers only ever increment, and only while no stop flag is set. The
/// coordinator is the only caller of [`PendingState::decrement`] and
/// [`PendingState::discard`], so a count it has observed as non-zero stays
/// non-zero until it decrements it. Everyone else must treat a read as
/// possibly stale.
#[derive(Debug)]
pub struct PendingState {
    word: AtomicU64,
}

impl Default for PendingState {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingState {
    /// Create an empty state: count zero, no stop requested.
    pub fn new() -> Self {
        Self {
            word: AtomicU64::new(0),
        }
    }

    /// Accept one increment.
    ///
    /// Returns the new count, or the reason the increment was rejected. A
    /// rejected increment leaves the count untouched.
    ///
    /// # Panics
    ///
    /// Panics if the count would spill into the flag bits.
    pub fn try_increment(&self) -> Result<u64, StopReason> {
        loop {
            let current = self.word.load(Ordering::SeqCst);
            if let Some(reason) = reason_of(current) {
                return Err(reason);
            }
            // A carry out of the count would set a stop flag
            assert!(current & COUNT_MASK < COUNT_MASK, "pending count overflow");
            if self
                .word
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Ok((current & COUNT_MASK) + 1);
            }
            // CAS failed, retry
        }
    }

    #[cfg(test)]
    fn with_count(count: u64) -> Self {
        Self {
            word: AtomicU64::new(count & COUNT_MASK),
        }
    }

    /// Remove one delivered increment.
    ///
    /// Returns the remaining count. Must only be called after observing a
    /// non-zero count.
    pub(crate) fn decrement(&self) -> u64 {
        let previous = self.word.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous & COUNT_MASK > 0, "pending count underflow");
        (previous & COUNT_MASK) - 1
    }

    /// Drop every undelivered increment, keeping the stop flags.
    ///
    /// Returns how many were discarded.
    pub(crate) fn discard(&self) -> u64 {
        self.word.fetch_and(!COUNT_MASK, Ordering::SeqCst) & COUNT_MASK
    }

    /// Get the current pending count.
    pub fn count(&self) -> u64 {
        self.word.load(Ordering::SeqCst) & COUNT_MASK
    }

    /// Raise the graceful stop flag.
    ///
    /// Returns true only for the call that raised it.
    pub fn request_drain(&self) -> bool {
        self.word.fetch_or(DRAINING, Ordering::SeqCst) & DRAINING == 0
    }

    /// Raise the forced stop flag together with the graceful one.
    ///
    /// Returns true only for the call that raised the forced flag.
    pub fn request_force(&self) -> bool {
        self.word.fetch_or(DRAINING | FORCED, Ordering::SeqCst) & FORCED == 0
    }

    /// Whether any stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.word.load(Ordering::SeqCst) & DRAINING != 0
    }

    /// Whether a forced stop has been requested.
    pub fn is_forced(&self) -> bool {
        self.word.load(Ordering::SeqCst) & FORCED != 0
    }

    /// The stop mode in effect, if any.
    pub fn stop_reason(&self) -> Option<StopReason> {
        reason_of(self.word.load(Ordering::SeqCst))
    }
}

fn reason_of(word: u64) -> Option<StopReason> {
    if word & FORCED != 0 {
        Some(StopReason::Forced)
    } else if word & DRAINING != 0 {
        Some(StopReason::Graceful)
    } else {
        None
    }
}
