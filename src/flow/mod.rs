//! Counting and wake-up infrastructure behind the notifier.
//!
//! Provides:
//! - Pending state: lock-free count of undelivered increments plus stop flags
//! - Doorbell: coalescing wake-up for the coordinator
//! - Signal channel: rendezvous handoff to the consumer

pub mod doorbell;
pub mod pending;
pub mod signal;
