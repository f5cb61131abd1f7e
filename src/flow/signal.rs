//! Consumer-facing signal channel.
//!
//! Delivery is a rendezvous. The coordinator places a [`Handoff`] in a
//! single-slot channel and then waits until a reader acknowledges it. A
//! signal therefore counts as delivered only once a reader has taken it, and
//! the coordinator can withdraw a handoff nobody has taken yet when a forced
//! stop arrives.

use futures::Stream;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::TryRecvError;

/// A wake-up token: one unit of pending work is ready.
///
/// Carries no payload. Signals are interchangeable; only their count matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal;

/// One in-flight delivery, acknowledged by whichever reader takes it.
#[derive(Debug)]
pub(crate) struct Handoff {
    taken: oneshot::Sender<()>,
}

impl Handoff {
    /// Create a handoff and the receiver the coordinator waits on.
    pub(crate) fn new() -> (Self, oneshot::Receiver<()>) {
        let (taken, rx) = oneshot::channel();
        (Self { taken }, rx)
    }

    /// Acknowledge the handoff.
    ///
    /// Returns false if the coordinator already withdrew it.
    fn take(self) -> bool {
        self.taken.send(()).is_ok()
    }
}

/// Create the signal channel.
///
/// The returned sender belongs to the coordinator. `force` is the forced-stop
/// token; once cancelled, readers stop taking handoffs. `closed` is cancelled
/// by the coordinator on exit; readers only report the end of the stream
/// after it.
pub(crate) fn channel(
    force: CancellationToken,
    closed: CancellationToken,
) -> (mpsc::Sender<Handoff>, Ready) {
    let (tx, rx) = mpsc::channel(1);
    let ready = Ready {
        rx: Arc::new(Mutex::new(rx)),
        force,
        closed,
    };
    (tx, ready)
}

/// Read-only endpoint of a notifier's signal stream.
///
/// Cloning gives another reader of the same stream. Readers are served one at
/// a time, and each signal is taken by exactly one of them.
#[derive(Debug, Clone)]
pub struct Ready {
    rx: Arc<Mutex<mpsc::Receiver<Handoff>>>,
    force: CancellationToken,
    closed: CancellationToken,
}

impl Ready {
    /// Wait for the next signal.
    ///
    /// Returns `None` once the notifier has fully shut down: after a graceful
    /// stop has drained every pending signal, or right after a forced stop
    /// once the coordinator has exited. By then
    /// [`Notifier::is_closed`](crate::Notifier::is_closed) is true, and every
    /// later call returns `None` immediately.
    pub async fn recv(&self) -> Option<Signal> {
        let mut rx = self.rx.lock().await;

        let received = tokio::select! {
            biased;
            () = self.force.cancelled() => None,
            handoff = rx.recv() => Some(handoff),
        };

        match received {
            Some(Some(handoff)) => {
                if handoff.take() {
                    return Some(Signal);
                }
            }
            Some(None) => {}
            None => rx.close(),
        }

        // Withdrawn, forced or disconnected: the coordinator is on its way out
        self.closed.cancelled().await;
        None
    }

    /// Take a signal if one is being delivered right now, without waiting.
    ///
    /// Reports [`TryRecvError::Closed`] only once the coordinator has exited;
    /// between a forced stop and that point it reports `Empty`.
    pub fn try_recv(&self) -> Result<Signal, TryRecvError> {
        if self.force.is_cancelled() {
            return Err(self.end_of_stream());
        }

        // Another reader is waiting; it has first claim on the next signal
        let Ok(mut rx) = self.rx.try_lock() else {
            return Err(TryRecvError::Empty);
        };

        match rx.try_recv() {
            Ok(handoff) => {
                if handoff.take() {
                    Ok(Signal)
                } else {
                    Err(self.end_of_stream())
                }
            }
            Err(mpsc::error::TryRecvError::Empty) => Err(TryRecvError::Empty),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(self.end_of_stream()),
        }
    }

    fn end_of_stream(&self) -> TryRecvError {
        if self.closed.is_cancelled() {
            TryRecvError::Closed
        } else {
            TryRecvError::Empty
        }
    }

    /// Turn this reader into a stream that ends when the notifier closes.
    pub fn into_stream(self) -> impl Stream<Item = Signal> + Send + 'static {
        futures::stream::unfold(self, |ready| async move {
            let signal = ready.recv().await?;
            Some((signal, ready))
        })
    }
}
