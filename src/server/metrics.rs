//! Prometheus metrics for the mock API
//!
//! Exposes request outcomes and kubectl activity:
//! - Responses by handler and status code
//! - kubectl invocations by operation and result
//! - kubectl invocation durations

use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// API metrics registry
///
/// Thread-safe container for all Prometheus metrics.
/// Clone is cheap (Arc internally).
#[derive(Clone)]
pub struct ApiMetrics {
    registry: Registry,
    /// Responses by handler (token, create_cluster, delete_cluster) and status code
    pub requests_total: IntCounterVec,
    /// kubectl invocations by operation and result (success, error)
    pub tool_invocations_total: IntCounterVec,
    /// kubectl invocation duration in seconds
    pub tool_invocation_duration_seconds: HistogramVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("pks_mock_requests_total", "Total number of API responses"),
            &["handler", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let tool_invocations_total = IntCounterVec::new(
            Opts::new(
                "pks_mock_tool_invocations_total",
                "Total number of kubectl invocations",
            ),
            &["operation", "result"],
        )?;
        registry.register(Box::new(tool_invocations_total.clone()))?;

        // kubectl round trips are slow; buckets go up to a minute
        let tool_invocation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "pks_mock_tool_invocation_duration_seconds",
                "Duration of kubectl invocations in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["operation"],
        )?;
        registry.register(Box::new(tool_invocation_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            tool_invocations_total,
            tool_invocation_duration_seconds,
        })
    }

    pub fn record_response(&self, handler: &str, status: u16) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[handler, status.as_str()])
            .inc();
    }

    pub fn record_tool_success(&self, operation: &str, duration_secs: f64) {
        self.tool_invocations_total
            .with_label_values(&[operation, "success"])
            .inc();
        self.tool_invocation_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_tool_error(&self, operation: &str, duration_secs: f64) {
        self.tool_invocations_total
            .with_label_values(&[operation, "error"])
            .inc();
        self.tool_invocation_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Encode all metrics to Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e))
        })
    }
}

pub type SharedMetrics = Arc<ApiMetrics>;

pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(ApiMetrics::new()?))
}
