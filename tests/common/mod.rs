//! Test utilities shared by the notifier integration tests.
//!
//! Provides:
//! - Timeout-bounded receive helpers
//! - Polling wait for eventually-true conditions

#![allow(dead_code)]

use doorbell::{Ready, Signal};
use std::time::Duration;

/// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Receive one item from the stream, failing the test on timeout.
pub async fn recv(ready: &Ready) -> Option<Signal> {
    tokio::time::timeout(WAIT, ready.recv())
        .await
        .expect("timed out waiting on ready stream")
}

/// Read signals until the stream closes and return how many arrived.
pub async fn count_until_closed(ready: &Ready) -> usize {
    let mut count = 0;
    while recv(ready).await.is_some() {
        count += 1;
    }
    count
}

/// Wait for a condition to become true with timeout.
///
/// # Arguments
///
/// * `timeout` - Maximum time to wait
/// * `condition` - Closure that returns true when condition is met
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
