//! Force command implementation.

use anyhow::{Context, Result};
use doorbell::{Notifier, NotifierConfig};
use std::time::{Duration, Instant};

use super::{spawn_consumer, RunReport};
use crate::OutputFormat;

pub async fn run(
    config: NotifierConfig,
    adds: usize,
    consumer_delay_ms: u64,
    force_after_ms: u64,
    format: OutputFormat,
) -> Result<()> {
    let start = Instant::now();
    let notifier = Notifier::with_config(config);

    let mut accepted = 0;
    for _ in 0..adds {
        notifier.add().context("add rejected before any stop")?;
        accepted += 1;
    }

    let consumer = spawn_consumer(notifier.ready(), Duration::from_millis(consumer_delay_ms));

    tokio::time::sleep(Duration::from_millis(force_after_ms)).await;
    notifier.force_stop();

    let received = consumer.await.context("consumer task failed")?;
    notifier.closed().await;

    let report = RunReport {
        notifier: notifier.name().to_string(),
        mode: "force",
        accepted,
        rejected: 0,
        received,
        delivered: notifier.delivered(),
        discarded: notifier.discarded(),
        elapsed_ms: start.elapsed().as_millis(),
    };

    report.print(format)
}
