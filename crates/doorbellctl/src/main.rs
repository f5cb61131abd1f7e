//! doorbellctl: Command-line driver for a doorbell notifier.
//!
//! Runs producers and a consumer against one in-process notifier and reports
//! how many increments were accepted, delivered and discarded under each
//! shutdown mode.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use doorbell::observability::tracing::{init_json_tracing, init_tracing};
use doorbell::NotifierConfig;

/// Command-line driver for a doorbell notifier.
#[derive(Parser)]
#[command(name = "doorbellctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Name of the notifier (labels logs and metrics)
    #[arg(short, long, env = "DOORBELL_NAME", default_value = "doorbellctl")]
    name: String,

    /// OpenTelemetry collector endpoint for metrics export (optional)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otel_endpoint: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run producers to completion, stop gracefully and drain every signal
    Drain {
        /// Number of concurrent producers
        #[arg(short, long, env = "DOORBELL_PRODUCERS", default_value_t = 4)]
        producers: usize,
        /// Increments issued by each producer
        #[arg(short, long, env = "DOORBELL_ADDS", default_value_t = 1000)]
        adds: usize,
        /// Delay the consumer spends on each signal, in milliseconds
        #[arg(long, default_value_t = 0)]
        consumer_delay_ms: u64,
    },
    /// Queue increments, then force-stop while the consumer is still reading
    Force {
        /// Number of increments to queue
        #[arg(short, long, env = "DOORBELL_ADDS", default_value_t = 100)]
        adds: usize,
        /// Delay the consumer spends on each signal, in milliseconds
        #[arg(long, default_value_t = 1)]
        consumer_delay_ms: u64,
        /// Time to let the consumer run before forcing the stop, in milliseconds
        #[arg(long, default_value_t = 20)]
        force_after_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the report on stdout stays machine-readable
    match cli.output {
        OutputFormat::Text => init_tracing("doorbellctl"),
        OutputFormat::Json => init_json_tracing("doorbellctl"),
    }

    doorbell::observability::metrics::init_metrics_with_endpoint(cli.otel_endpoint.as_deref());

    let config = NotifierConfig::with_name(cli.name);

    match cli.command {
        Commands::Drain {
            producers,
            adds,
            consumer_delay_ms,
        } => {
            commands::drain::run(config, producers, adds, consumer_delay_ms, cli.output).await?;
        }
        Commands::Force {
            adds,
            consumer_delay_ms,
            force_after_ms,
        } => {
            commands::force::run(config, adds, consumer_delay_ms, force_after_ms, cli.output)
                .await?;
        }
    }

    Ok(())
}
