//! Errors returned by the notifier.

use std::fmt;
use thiserror::Error;

/// Which shutdown mode caused an increment to be rejected.
///
/// Only useful for diagnostics. Callers should treat both the same way: the
/// increment was not accepted and nothing was counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// [`Notifier::stop`](crate::Notifier::stop) was requested
    Graceful,
    /// [`Notifier::force_stop`](crate::Notifier::force_stop) was requested
    Forced,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graceful => f.write_str("stopped gracefully"),
            Self::Forced => f.write_str("force-stopped"),
        }
    }
}

/// Returned by [`Notifier::add`](crate::Notifier::add) once either shutdown
/// mode has been requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("notifier has been stopped already ({reason})")]
pub struct StoppedError {
    reason: StopReason,
}

impl StoppedError {
    pub(crate) fn new(reason: StopReason) -> Self {
        Self { reason }
    }

    /// The shutdown mode that was in effect when the increment was rejected.
    pub fn reason(&self) -> StopReason {
        self.reason
    }
}

/// Returned by [`Ready::try_recv`](crate::Ready::try_recv) when no signal
/// can be taken right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// Nothing is being delivered at the moment
    #[error("no signal is ready")]
    Empty,

    /// The notifier has shut down; no signal will ever arrive
    #[error("notifier is closed")]
    Closed,
}
