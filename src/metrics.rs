//! Prometheus metrics collection for roomlinkd.
//!
//! Tracks provisioning operations, their error kinds, and the live
//! connection count. Exposed on the operational HTTP endpoint via
//! [`gather_metrics`].

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Provisioning operations received, by operation name.
pub static PROVISIONING_REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Provisioning operations that failed, by operation and error kind.
pub static PROVISIONING_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Provisioning operation latency by operation name.
pub static OPERATION_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Currently live connections across all rooms.
pub static ACTIVE_CONNECTIONS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at daemon startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        PROVISIONING_REQUESTS,
        IntCounterVec::new(
            Opts::new(
                "provisioning_requests_total",
                "Provisioning operations received"
            ),
            &["operation"]
        )
    );
    register!(
        PROVISIONING_ERRORS,
        IntCounterVec::new(
            Opts::new(
                "provisioning_errors_total",
                "Provisioning operations failed, by error kind"
            ),
            &["operation", "error"]
        )
    );
    register!(
        OPERATION_LATENCY,
        HistogramVec::new(
            HistogramOpts::new(
                "provisioning_operation_duration_seconds",
                "Provisioning operation latency"
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"]
        )
    );
    register!(
        ACTIVE_CONNECTIONS,
        IntGauge::new("provisioning_active_connections", "Live connections")
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record an inbound provisioning operation with its latency.
#[inline]
pub fn record_operation(operation: &str, duration_secs: f64) {
    if let Some(c) = PROVISIONING_REQUESTS.get() {
        c.with_label_values(&[operation]).inc();
    }
    if let Some(h) = OPERATION_LATENCY.get() {
        h.with_label_values(&[operation]).observe(duration_secs);
    }
}

/// Record a failed provisioning operation.
#[inline]
pub fn record_operation_error(operation: &str, error: &str) {
    if let Some(c) = PROVISIONING_ERRORS.get() {
        c.with_label_values(&[operation, error]).inc();
    }
}

/// Bump the live-connection gauge after a create.
#[inline]
pub fn connection_created() {
    if let Some(g) = ACTIVE_CONNECTIONS.get() {
        g.inc();
    }
}

/// Drop the live-connection gauge after a removal.
#[inline]
pub fn connection_removed() {
    if let Some(g) = ACTIVE_CONNECTIONS.get() {
        g.dec();
    }
}
