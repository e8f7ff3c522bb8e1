//! Prometheus metrics for request counting and monitoring.
//!
//! This module provides:
//! - HTTP request counter labeled by route, method and status
//! - HTTP request latency
//! - Inspection creation and status transition counters
//! - Standard process metrics (CPU, memory, file descriptors, start time)

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;
use tracing::debug;

use crate::inspection::InspectionStatus;

// === Metric Name Constants ===

/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_DURATION: &str = "http_request_duration_ms";
/// Inspections created counter metric name.
pub const METRIC_INSPECTIONS_CREATED: &str = "inspections_created_total";
/// Status transitions counter metric name.
pub const METRIC_STATUS_TRANSITIONS: &str = "inspection_status_transitions_total";

/// Route label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

/// Initialize all metric descriptions.
/// Call this once at startup, after the recorder is installed.
pub fn init_metrics() {
    describe_counter!(METRIC_HTTP_REQUESTS, "Total HTTP requests");
    describe_histogram!(
        METRIC_HTTP_REQUEST_DURATION,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(
        METRIC_INSPECTIONS_CREATED,
        "Total number of inspections created"
    );
    describe_counter!(
        METRIC_STATUS_TRANSITIONS,
        "Total number of inspection status changes, by target status"
    );
    debug!("Metrics initialized");
}

/// Handle used by the `/metrics` endpoint to render the exposition.
#[derive(Clone)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
    process: Collector,
}

impl std::fmt::Debug for MetricsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsHandle")
            .field("process", &self.process)
            .finish_non_exhaustive()
    }
}

impl MetricsHandle {
    /// Install the process-wide Prometheus recorder and describe all metrics,
    /// including the process collector's.
    pub fn install() -> Result<Self, BuildError> {
        let prometheus = PrometheusBuilder::new().install_recorder()?;
        init_metrics();

        let handle = Self::from_prometheus(prometheus);
        handle.process.describe();
        Ok(handle)
    }

    /// Handle backed by a recorder that is not installed globally.
    ///
    /// Renders an empty exposition; used when a router is built in tests.
    pub fn detached() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        Self::from_prometheus(recorder.handle())
    }

    /// Wrap an existing Prometheus handle.
    pub fn from_prometheus(prometheus: PrometheusHandle) -> Self {
        Self {
            prometheus,
            process: Collector::default(),
        }
    }

    /// Sample process metrics and render the text exposition.
    pub fn render(&self) -> String {
        self.process.collect();
        self.prometheus.render()
    }
}

/// Record a completed HTTP request.
pub fn record_http_request(route: &str, method: &str, status: u16, start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    counter!(
        METRIC_HTTP_REQUESTS,
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        METRIC_HTTP_REQUEST_DURATION,
        "route" => route.to_string(),
        "method" => method.to_string()
    )
    .record(latency_ms);
}

/// Increment inspections created counter.
pub fn inc_inspections_created() {
    counter!(METRIC_INSPECTIONS_CREATED).increment(1);
}

/// Increment status transitions counter.
pub fn inc_status_transitions(status: InspectionStatus) {
    counter!(METRIC_STATUS_TRANSITIONS, "status" => status.as_str()).increment(1);
}
