//! Prometheus metrics for creation-service.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    provider_latency_seconds: HistogramVec,
    provider_errors_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn build() -> Metrics {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new(
            "creation_requests_total",
            "Capability requests by terminal outcome",
        ),
        &["capability", "outcome"],
    )
    .expect("Failed to create creation_requests_total metric");

    let provider_latency_seconds = HistogramVec::new(
        HistogramOpts::new(
            "creation_provider_latency_seconds",
            "Latency of external provider calls in seconds",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["capability"],
    )
    .expect("Failed to create creation_provider_latency_seconds metric");

    let provider_errors_total = IntCounterVec::new(
        Opts::new(
            "creation_provider_errors_total",
            "Failed provider calls by error kind",
        ),
        &["capability", "kind"],
    )
    .expect("Failed to create creation_provider_errors_total metric");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("Failed to register creation_requests_total");
    registry
        .register(Box::new(provider_latency_seconds.clone()))
        .expect("Failed to register creation_provider_latency_seconds");
    registry
        .register(Box::new(provider_errors_total.clone()))
        .expect("Failed to register creation_provider_errors_total");

    Metrics {
        registry,
        requests_total,
        provider_latency_seconds,
        provider_errors_total,
    }
}

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    METRICS.get_or_init(build);
}

pub fn record_request(capability: &str, outcome: &str) {
    if let Some(m) = METRICS.get() {
        m.requests_total
            .with_label_values(&[capability, outcome])
            .inc();
    }
}

pub fn observe_provider_latency(capability: &str, seconds: f64) {
    if let Some(m) = METRICS.get() {
        m.provider_latency_seconds
            .with_label_values(&[capability])
            .observe(seconds);
    }
}

pub fn record_provider_error(capability: &str, kind: &str) {
    if let Some(m) = METRICS.get() {
        m.provider_errors_total
            .with_label_values(&[capability, kind])
            .inc();
    }
}

/// Render all metrics in the Prometheus text format.
pub fn gather() -> String {
    let Some(m) = METRICS.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&m.registry.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
