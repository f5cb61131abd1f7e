//! Doorbell: a coalescing wake-up notifier with graceful and forced shutdown.
//!
//! Any number of producers call [`Notifier::add`] to announce that one unit of
//! work is available. A single background coordinator turns those increments
//! into a serialized stream of payload-free [`Signal`]s that a consumer reads
//! from [`Notifier::ready`]. The notifier only counts and wakes; it never holds
//! the work itself.
//!
//! # Architecture
//!
//! - **Pending state**: one atomic word holding the pending count and the stop
//!   flags, so acceptance and shutdown never race
//! - **Doorbell**: a capacity-one trigger; bursts of `add` calls coalesce into
//!   at most one queued wake-up
//! - **Coordinator**: a Tokio task running an `Active -> Draining -> Closed`
//!   state machine, the only writer of signals
//! - **Rendezvous delivery**: a signal counts as delivered only once a reader
//!   has taken it, and a forced stop withdraws the one in flight
//!
//! # Modules
//!
//! - [`config`]: Notifier configuration
//! - [`error`]: The error returned by a rejected increment
//! - [`flow`]: Pending state, doorbell and signal channel
//! - [`notifier`]: The public `Notifier` handle
//! - [`observability`]: Metrics and tracing setup
//!
//! # Example
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let notifier = doorbell::Notifier::new();
//! let ready = notifier.ready();
//!
//! notifier.add().unwrap();
//! notifier.add().unwrap();
//! notifier.stop();
//!
//! assert!(ready.recv().await.is_some());
//! assert!(ready.recv().await.is_some());
//! assert!(ready.recv().await.is_none());
//! # }
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // config::NotifierConfig is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
mod coordinator;
pub mod error;
pub mod flow;
pub mod notifier;
pub mod observability;

pub use config::NotifierConfig;
pub use error::{StopReason, StoppedError, TryRecvError};
pub use flow::signal::{Ready, Signal};
pub use notifier::Notifier;
