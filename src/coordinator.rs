//! Background task that delivers signals.
//!
//! The coordinator is the only writer of the signal channel. It runs an
//! explicit state machine:
//!
//! - `Active`: wait for the doorbell or a stop request; deliver one signal per
//!   ring and re-arm the doorbell while more are pending
//! - `Draining`: a graceful stop was requested; keep delivering until the
//!   count reaches zero
//! - `Closed`: drop the sender so readers observe closure, then exit
//!
//! A forced stop moves either live state straight to `Closed`, withdrawing a
//! delivery no reader has taken yet.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::flow::signal::Handoff;
use crate::notifier::Shared;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Draining,
    Closed,
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// A reader acknowledged the signal
    Taken,
    /// Abandoned before any reader took it
    Withdrawn,
}

pub(crate) struct Coordinator {
    shared: Arc<Shared>,
    outbox: mpsc::Sender<Handoff>,
    state: State,
}

impl Coordinator {
    /// Start the coordinator task for a notifier.
    pub(crate) fn spawn(shared: Arc<Shared>, outbox: mpsc::Sender<Handoff>) {
        let span = tracing::info_span!("notifier", name = %shared.name);
        let coordinator = Self {
            shared,
            outbox,
            state: State::Active,
        };
        tokio::spawn(coordinator.run().instrument(span));
    }

    async fn run(mut self) {
        tracing::debug!("Coordinator started");
        // Readers waiting for the end of the stream must wake even on a panic
        let _closed = self.shared.closed.clone().drop_guard();

        loop {
            let next = match self.state {
                State::Active => self.active().await,
                State::Draining => self.draining().await,
                State::Closed => break,
            };
            if next != self.state {
                tracing::debug!(from = ?self.state, to = ?next, "State transition");
            }
            self.state = next;
        }

        self.close();
    }

    async fn active(&self) -> State {
        tokio::select! {
            biased;
            () = self.shared.force.cancelled() => State::Closed,
            () = self.shared.drain.cancelled() => {
                // Nothing left to deliver, so close like a forced stop would
                if self.shared.pending.count() == 0 {
                    State::Closed
                } else {
                    State::Draining
                }
            }
            () = self.shared.doorbell.wait() => self.ring_answered().await,
        }
    }

    async fn ring_answered(&self) -> State {
        // A ring can outlive the increment that armed it
        if self.shared.pending.count() == 0 {
            return State::Active;
        }

        match self.deliver().await {
            Delivery::Taken => {
                if self.delivered() > 0 {
                    self.shared.doorbell.ring();
                }
                State::Active
            }
            Delivery::Withdrawn => State::Closed,
        }
    }

    async fn draining(&self) -> State {
        if self.shared.force.is_cancelled() || self.shared.pending.count() == 0 {
            return State::Closed;
        }

        match self.deliver().await {
            Delivery::Taken => {
                self.delivered();
                State::Draining
            }
            Delivery::Withdrawn => State::Closed,
        }
    }

    /// Hand one signal to a reader and wait for it to be taken.
    ///
    /// A forced stop abandons the attempt. If a reader acknowledged before the
    /// coordinator noticed the stop, the signal still counts as taken.
    async fn deliver(&self) -> Delivery {
        let force = &self.shared.force;

        let permit = tokio::select! {
            biased;
            () = force.cancelled() => return Delivery::Withdrawn,
            permit = self.outbox.reserve() => match permit {
                Ok(permit) => permit,
                // Every reader is gone
                Err(_) => return Delivery::Withdrawn,
            },
        };

        let (handoff, mut taken) = Handoff::new();
        permit.send(handoff);

        tokio::select! {
            biased;
            () = force.cancelled() => {
                taken.close();
                if taken.try_recv().is_ok() {
                    Delivery::Taken
                } else {
                    Delivery::Withdrawn
                }
            }
            result = &mut taken => {
                if result.is_ok() {
                    Delivery::Taken
                } else {
                    Delivery::Withdrawn
                }
            }
        }
    }

    /// Account for one taken signal, returning how many remain.
    fn delivered(&self) -> u64 {
        let remaining = self.shared.pending.decrement();
        self.shared.delivered.fetch_add(1, Ordering::SeqCst);
        metrics::record_delivered(&self.shared.name, remaining);
        tracing::trace!(remaining, "Signal delivered");
        remaining
    }

    fn close(self) {
        let Self { shared, outbox, .. } = self;
        drop(outbox);

        let discarded = shared.pending.discard();
        shared.discarded.fetch_add(discarded, Ordering::SeqCst);
        if discarded > 0 {
            metrics::record_discarded(&shared.name, discarded);
            tracing::debug!(discarded, "Discarded undelivered signals");
        }

        shared.closed.cancel();
        tracing::debug!("Coordinator closed");
    }
}

#[cfg(test)]
mod tests {
    use crate::Notifier;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_stop_with_nothing_pending_closes_immediately() {
        let notifier = Notifier::new();
        let ready = notifier.ready();

        notifier.stop();
        timeout(WAIT, notifier.closed()).await.unwrap();
        assert_eq!(ready.recv().await, None);
    }

    #[tokio::test]
    async fn test_force_stop_discards_pending() {
        let notifier = Notifier::new();
        for _ in 0..4 {
            notifier.add().unwrap();
        }

        notifier.force_stop();
        timeout(WAIT, notifier.closed()).await.unwrap();
        assert_eq!(notifier.pending(), 0);
        assert_eq!(notifier.delivered(), 0);
        assert_eq!(notifier.discarded(), 4);
    }

    #[tokio::test]
    async fn test_force_stop_preempts_blocked_delivery() {
        let notifier = Notifier::new();
        notifier.add().unwrap();

        // Let the coordinator block on a delivery nobody reads
        tokio::time::sleep(Duration::from_millis(20)).await;

        notifier.force_stop();
        timeout(WAIT, notifier.closed()).await.unwrap();
        assert_eq!(notifier.ready().recv().await, None);
    }

    #[tokio::test]
    async fn test_graceful_stop_waits_for_reader() {
        let notifier = Notifier::new();
        let ready = notifier.ready();
        notifier.add().unwrap();
        notifier.stop();

        // Still one signal owed, so the coordinator stays up
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!notifier.is_closed());

        assert!(timeout(WAIT, ready.recv()).await.unwrap().is_some());
        timeout(WAIT, notifier.closed()).await.unwrap();
    }

    #[tokio::test]
    async fn test_burst_is_fully_delivered() {
        let notifier = Notifier::new();
        let ready = notifier.ready();

        for _ in 0..100 {
            notifier.add().unwrap();
        }
        for _ in 0..100 {
            assert!(timeout(WAIT, ready.recv()).await.unwrap().is_some());
        }

        notifier.stop();
        assert_eq!(timeout(WAIT, ready.recv()).await.unwrap(), None);
    }
}
