//! OpenTelemetry metrics for notifiers.
//!
//! Key metrics:
//! - doorbell_add_total: Counter for accepted increments
//! - doorbell_rejected_total: Counter for increments rejected after a stop
//! - doorbell_delivered_total: Counter for signals taken by a reader
//! - doorbell_discarded_total: Counter for signals dropped by a forced stop
//! - doorbell_pending: Gauge for increments not yet delivered
//!
//! Every instrument carries a `notifier` attribute with the instance name.
//! Recording before [`init_metrics`] is a no-op.

use opentelemetry::metrics::{Counter, Gauge, Meter};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use std::sync::OnceLock;

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Notifier metrics registry.
#[derive(Debug)]
pub struct Metrics {
    /// Total number of accepted increments.
    pub add_total: Counter<u64>,
    /// Total number of increments rejected because the notifier was stopped.
    pub rejected_total: Counter<u64>,
    /// Total number of signals taken by a reader.
    pub delivered_total: Counter<u64>,
    /// Total number of accepted increments discarded by a forced stop.
    pub discarded_total: Counter<u64>,
    /// Increments accepted but not yet delivered.
    pub pending: Gauge<u64>,
}

impl Metrics {
    /// Create a new metrics registry from a meter.
    fn new(meter: &Meter) -> Self {
        Self {
            add_total: meter
                .u64_counter("doorbell_add_total")
                .with_description("Total number of accepted increments")
                .with_unit("1")
                .init(),
            rejected_total: meter
                .u64_counter("doorbell_rejected_total")
                .with_description("Increments rejected after a stop request")
                .with_unit("1")
                .init(),
            delivered_total: meter
                .u64_counter("doorbell_delivered_total")
                .with_description("Signals taken by a reader")
                .with_unit("1")
                .init(),
            discarded_total: meter
                .u64_counter("doorbell_discarded_total")
                .with_description("Accepted increments dropped by a forced stop")
                .with_unit("1")
                .init(),
            pending: meter
                .u64_gauge("doorbell_pending")
                .with_description("Increments accepted but not yet delivered")
                .with_unit("1")
                .init(),
        }
    }
}

/// Initialize the metrics system.
///
/// This should be called once at startup. Subsequent calls are ignored.
///
/// # Arguments
///
/// * `otel_endpoint` - Optional OTLP endpoint for metrics export
pub fn init_metrics_with_endpoint(otel_endpoint: Option<&str>) {
    METRICS.get_or_init(|| {
        if let Some(endpoint) = otel_endpoint {
            use opentelemetry_otlp::{Protocol, WithExportConfig};

            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_protocol(Protocol::Grpc);

            match opentelemetry_otlp::new_pipeline()
                .metrics(opentelemetry_sdk::runtime::Tokio)
                .with_exporter(exporter)
                .with_period(std::time::Duration::from_secs(10))
                .build()
            {
                Ok(provider) => {
                    global::set_meter_provider(provider);
                    tracing::info!(endpoint, "OTLP metrics exporter configured");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create OTLP exporter, using no-op metrics");
                    install_manual_reader();
                }
            }
        } else {
            // Metrics are recorded but not exported
            install_manual_reader();
        }

        let meter = global::meter("doorbell");
        Metrics::new(&meter)
    });
}

fn install_manual_reader() {
    let reader = ManualReader::builder().build();
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    global::set_meter_provider(provider);
}

/// Initialize the metrics system without OTLP export.
///
/// This should be called once at startup. Subsequent calls are ignored.
pub fn init_metrics() {
    init_metrics_with_endpoint(None);
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

fn attrs(notifier: &str) -> [KeyValue; 1] {
    [KeyValue::new("notifier", notifier.to_string())]
}

/// Record an accepted increment and the resulting pending count.
pub fn record_add(notifier: &str, pending: u64) {
    if let Some(m) = METRICS.get() {
        let attrs = attrs(notifier);
        m.add_total.add(1, &attrs);
        m.pending.record(pending, &attrs);
    }
}

/// Record an increment rejected after a stop.
pub fn record_rejected(notifier: &str) {
    if let Some(m) = METRICS.get() {
        m.rejected_total.add(1, &attrs(notifier));
    }
}

/// Record a delivered signal and the remaining pending count.
pub fn record_delivered(notifier: &str, pending: u64) {
    if let Some(m) = METRICS.get() {
        let attrs = attrs(notifier);
        m.delivered_total.add(1, &attrs);
        m.pending.record(pending, &attrs);
    }
}

/// Record increments discarded when the notifier closed.
pub fn record_discarded(notifier: &str, discarded: u64) {
    if let Some(m) = METRICS.get() {
        let attrs = attrs(notifier);
        m.discarded_total.add(discarded, &attrs);
        m.pending.record(0, &attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics();
        init_metrics();
        assert!(metrics().is_some());
    }

    #[test]
    fn test_record_functions() {
        init_metrics();
        // Should not panic
        record_add("test-notifier", 1);
        record_delivered("test-notifier", 0);
        record_rejected("test-notifier");
        record_discarded("test-notifier", 3);
    }
}
