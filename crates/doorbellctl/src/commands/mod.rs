//! Subcommand implementations.

pub mod drain;
pub mod force;

use anyhow::Result;
use doorbell::Ready;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::OutputFormat;

/// Outcome of one run against a notifier.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub notifier: String,
    pub mode: &'static str,
    pub accepted: usize,
    pub rejected: usize,
    /// Signals the consumer task received
    pub received: usize,
    /// Signals the notifier counted as taken
    pub delivered: u64,
    /// Accepted increments the notifier dropped at close
    pub discarded: u64,
    pub elapsed_ms: u128,
}

impl RunReport {
    pub fn print(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Text => {
                println!("Notifier:   {}", self.notifier);
                println!("Mode:       {}", self.mode);
                println!("Accepted:   {}", self.accepted);
                println!("Rejected:   {}", self.rejected);
                println!("Received:   {}", self.received);
                println!("Delivered:  {}", self.delivered);
                println!("Discarded:  {}", self.discarded);
                println!("Elapsed:    {} ms", self.elapsed_ms);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(self)?);
            }
        }
        Ok(())
    }
}

/// Read signals until the stream closes, pausing `delay` on each one.
///
/// Resolves to the number of signals received.
pub fn spawn_consumer(ready: Ready, delay: Duration) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut received = 0;
        while ready.recv().await.is_some() {
            received += 1;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        tracing::debug!(received, "Consumer saw stream close");
        received
    })
}
