//! Coalescing wake-up for the coordinator.
//!
//! Backed by `tokio::sync::Notify`, which stores at most one permit when
//! nobody is waiting. Any number of rings while the coordinator is busy
//! collapse into a single pending wake-up.

use tokio::sync::Notify;

/// A capacity-one, non-blocking trigger.
#[derive(Debug, Default)]
pub struct Doorbell {
    notify: Notify,
}

impl Doorbell {
    /// Create a doorbell with no pending ring.
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
        }
    }

    /// Arm the doorbell. Never blocks; a no-op if already armed.
    pub fn ring(&self) {
        self.notify.notify_one();
    }

    /// Wait until the doorbell has been rung, consuming the ring.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_unrung_doorbell_is_pending() {
        let doorbell = Doorbell::new();
        let mut wait = task::spawn(doorbell.wait());
        assert_pending!(wait.poll());
    }

    #[test]
    fn test_ring_before_wait_is_stored() {
        let doorbell = Doorbell::new();
        doorbell.ring();

        let mut wait = task::spawn(doorbell.wait());
        assert_ready!(wait.poll());
    }

    #[test]
    fn test_many_rings_coalesce_into_one() {
        let doorbell = Doorbell::new();
        for _ in 0..10 {
            doorbell.ring();
        }

        let mut first = task::spawn(doorbell.wait());
        assert_ready!(first.poll());

        let mut second = task::spawn(doorbell.wait());
        assert_pending!(second.poll());
    }

    #[test]
    fn test_ring_wakes_waiter() {
        let doorbell = Doorbell::new();
        let mut wait = task::spawn(doorbell.wait());
        assert_pending!(wait.poll());

        doorbell.ring();
        assert!(wait.is_woken());
        assert_ready!(wait.poll());
    }
}
