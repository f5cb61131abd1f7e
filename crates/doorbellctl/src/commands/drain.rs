//! Drain command implementation.

use anyhow::{Context, Result};
use doorbell::{Notifier, NotifierConfig};
use std::time::{Duration, Instant};

use super::{spawn_consumer, RunReport};
use crate::OutputFormat;

pub async fn run(
    config: NotifierConfig,
    producers: usize,
    adds: usize,
    consumer_delay_ms: u64,
    format: OutputFormat,
) -> Result<()> {
    let start = Instant::now();
    let notifier = Notifier::with_config(config);
    let consumer = spawn_consumer(notifier.ready(), Duration::from_millis(consumer_delay_ms));

    let handles: Vec<_> = (0..producers)
        .map(|_| {
            let notifier = notifier.clone();
            tokio::spawn(async move {
                let mut accepted = 0;
                for _ in 0..adds {
                    if notifier.add().is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        accepted += handle.await.context("producer task failed")?;
    }

    notifier.stop();
    let received = consumer.await.context("consumer task failed")?;
    notifier.closed().await;

    let report = RunReport {
        notifier: notifier.name().to_string(),
        mode: "drain",
        accepted,
        rejected: producers * adds - accepted,
        received,
        delivered: notifier.delivered(),
        discarded: notifier.discarded(),
        elapsed_ms: start.elapsed().as_millis(),
    };

    if report.delivered != report.accepted as u64 {
        tracing::warn!(
            accepted = report.accepted,
            delivered = report.delivered,
            "Graceful stop did not deliver every accepted increment"
        );
    }

    report.print(format)
}
