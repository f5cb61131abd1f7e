//! The public notifier handle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::NotifierConfig;
use crate::coordinator::Coordinator;
use crate::error::StoppedError;
use crate::flow::doorbell::Doorbell;
use crate::flow::pending::PendingState;
use crate::flow::signal::{self, Ready};
use crate::observability::metrics;

/// State shared between the handles and the coordinator task.
pub(crate) struct Shared {
    pub(crate) name: String,
    pub(crate) pending: PendingState,
    pub(crate) doorbell: Doorbell,
    /// Graceful stop request; also cancelled by a forced stop.
    pub(crate) drain: CancellationToken,
    /// Forced stop request.
    pub(crate) force: CancellationToken,
    /// Cancelled by the coordinator on exit.
    pub(crate) closed: CancellationToken,
    /// Signals a reader acknowledged.
    pub(crate) delivered: AtomicU64,
    /// Accepted increments dropped when the coordinator closed.
    pub(crate) discarded: AtomicU64,
}

impl Shared {
    fn request_stop(&self) {
        if self.pending.request_drain() {
            tracing::info!(
                notifier = %self.name,
                pending = self.pending.count(),
                "Graceful stop requested"
            );
        }
        self.drain.cancel();
    }

    fn request_force_stop(&self) {
        // Flags first so increments are rejected before the coordinator wakes
        if self.pending.request_force() {
            tracing::info!(
                notifier = %self.name,
                pending = self.pending.count(),
                "Force stop requested"
            );
        }
        self.force.cancel();
        self.drain.cancel();
    }
}

/// Requests a graceful stop once the last [`Notifier`] clone is dropped.
struct Handle {
    shared: Arc<Shared>,
    ready: Ready,
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.shared.request_stop();
    }
}

/// Turns increments from any number of producers into a serialized stream of
/// wake-up signals.
///
/// Every increment accepted by [`add`](Self::add) yields exactly one
/// [`Signal`](crate::Signal) on [`ready`](Self::ready), unless a
/// [`force_stop`](Self::force_stop) discards it first. Signals are delivered
/// one at a time; a slow reader holds the coordinator back without making
/// producers wait.
///
/// Clones share the same coordinator. When the last clone is dropped a
/// graceful stop is requested, so pending signals are still delivered to any
/// reader that is left.
#[derive(Clone)]
pub struct Notifier {
    handle: Arc<Handle>,
}

impl Notifier {
    /// Create a notifier and start its coordinator.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_config(NotifierConfig::default())
    }

    /// Create a notifier with the given configuration and start its
    /// coordinator.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_config(config: NotifierConfig) -> Self {
        let force = CancellationToken::new();
        let closed = CancellationToken::new();
        let (outbox, ready) = signal::channel(force.clone(), closed.clone());

        let shared = Arc::new(Shared {
            name: config.name,
            pending: PendingState::new(),
            doorbell: Doorbell::new(),
            drain: CancellationToken::new(),
            force,
            closed,
            delivered: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        });

        Coordinator::spawn(Arc::clone(&shared), outbox);

        Self {
            handle: Arc::new(Handle { shared, ready }),
        }
    }

    /// Announce one unit of pending work.
    ///
    /// Never blocks. Fails once [`stop`](Self::stop) or
    /// [`force_stop`](Self::force_stop) has been requested, in which case
    /// nothing is counted.
    ///
    /// # Panics
    ///
    /// Panics if 2^62 - 1 increments are already pending.
    pub fn add(&self) -> Result<(), StoppedError> {
        let shared = &self.handle.shared;
        match shared.pending.try_increment() {
            Ok(pending) => {
                shared.doorbell.ring();
                metrics::record_add(&shared.name, pending);
                Ok(())
            }
            Err(reason) => {
                metrics::record_rejected(&shared.name);
                Err(StoppedError::new(reason))
            }
        }
    }

    /// Get a reader for the signal stream.
    ///
    /// The stream closes once a graceful stop has drained every pending
    /// signal, or immediately on a forced stop.
    pub fn ready(&self) -> Ready {
        self.handle.ready.clone()
    }

    /// Request a graceful stop.
    ///
    /// Further increments are rejected. Signals already accepted are still
    /// delivered, then the stream closes. Calling this more than once has no
    /// further effect.
    pub fn stop(&self) {
        self.handle.shared.request_stop();
    }

    /// Request an immediate stop.
    ///
    /// Further increments are rejected and the stream closes without
    /// delivering what is still pending, even a signal a reader has not yet
    /// taken. Calling this more than once has no further effect.
    pub fn force_stop(&self) {
        self.handle.shared.request_force_stop();
    }

    /// Number of accepted increments not yet delivered.
    ///
    /// May already be stale when it returns.
    pub fn pending(&self) -> u64 {
        self.handle.shared.pending.count()
    }

    /// Number of signals a reader has taken so far.
    pub fn delivered(&self) -> u64 {
        self.handle.shared.delivered.load(Ordering::SeqCst)
    }

    /// Number of accepted increments dropped without delivery.
    ///
    /// Only non-zero after a forced stop (or once every reader is gone), and
    /// final once [`closed`](Self::closed) has resolved. At that point
    /// `delivered() + discarded()` equals the number of accepted increments.
    pub fn discarded(&self) -> u64 {
        self.handle.shared.discarded.load(Ordering::SeqCst)
    }

    /// Whether either stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.handle.shared.pending.is_stopped()
    }

    /// Whether a forced stop has been requested.
    pub fn is_force_stopped(&self) -> bool {
        self.handle.shared.pending.is_forced()
    }

    /// Whether the coordinator has exited and the stream is closed.
    ///
    /// Once any reader has observed the end of the stream this is true.
    pub fn is_closed(&self) -> bool {
        self.handle.shared.closed.is_cancelled()
    }

    /// Wait until the coordinator has exited and the stream is closed.
    pub async fn closed(&self) {
        self.handle.shared.closed.cancelled().await;
    }

    /// The name this notifier was configured with.
    pub fn name(&self) -> &str {
        &self.handle.shared.name
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = &self.handle.shared;
        f.debug_struct("Notifier")
            .field("name", &shared.name)
            .field("pending", &shared.pending.count())
            .field("delivered", &shared.delivered.load(Ordering::SeqCst))
            .field("discarded", &shared.discarded.load(Ordering::SeqCst))
            .field("stop_reason", &shared.pending.stop_reason())
            .field("closed", &shared.closed.is_cancelled())
            .finish()
    }
}
