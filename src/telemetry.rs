//! Telemetry and observability support
//!
//! Metrics go through a [`MetricsSink`] that is constructed explicitly and
//! handed to the client; there is no process-wide registry. With the
//! `metrics` feature, [`OtelMetrics`] records into OpenTelemetry instruments.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "metrics")]
use opentelemetry::{
    metrics::{Counter, Histogram},
    KeyValue,
};

/// Receives request and retry outcomes
///
/// Implementations must tolerate concurrent calls from many in-flight
/// requests without external locking.
pub trait MetricsSink: Send + Sync + fmt::Debug {
    /// Record one HTTP request or logical call
    ///
    /// `status` is 0 when no response was received.
    fn record_request(&self, name: &str, status: u16, duration: Duration);

    /// Record the outcome of a call that needed more than one attempt
    fn record_retry(&self, url: &str, attempts: u32, success: bool);
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_request(&self, _name: &str, _status: u16, _duration: Duration) {}

    fn record_retry(&self, _url: &str, _attempts: u32, _success: bool) {}
}

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Whether telemetry is enabled
    pub enabled: bool,
    /// Service name for metrics
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "grayskull-sdk".to_string(),
        }
    }
}

/// OpenTelemetry-backed metrics sink
#[cfg(feature = "metrics")]
#[derive(Clone)]
pub struct OtelMetrics {
    requests_total: Counter<u64>,
    request_duration: Histogram<f64>,
    retries_total: Counter<u64>,
    errors_total: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl OtelMetrics {
    /// Create instruments on the global meter provider
    pub fn new(config: &TelemetryConfig) -> Self {
        use opentelemetry::global;

        let meter = global::meter(config.service_name.clone());

        let requests_total = meter
            .u64_counter("grayskull_client.requests_total")
            .with_description("Total number of HTTP requests")
            .init();

        let request_duration = meter
            .f64_histogram("grayskull_client.request_duration_milliseconds")
            .with_description("Duration of HTTP requests in milliseconds")
            .init();

        let retries_total = meter
            .u64_counter("grayskull_client.retries_total")
            .with_description("Total number of retried calls")
            .init();

        let errors_total = meter
            .u64_counter("grayskull_client.errors_total")
            .with_description("Total number of HTTP errors")
            .init();

        Self {
            requests_total,
            request_duration,
            retries_total,
            errors_total,
        }
    }
}

#[cfg(feature = "metrics")]
impl MetricsSink for OtelMetrics {
    fn record_request(&self, name: &str, status: u16, duration: Duration) {
        let labels = &[
            KeyValue::new("path", normalize_name(name)),
            KeyValue::new("status", status.to_string()),
        ];

        self.requests_total.add(1, labels);
        self.request_duration
            .record(duration.as_secs_f64() * 1000.0, labels);

        if status >= 400 {
            self.errors_total.add(
                1,
                &[
                    KeyValue::new("path", normalize_name(name)),
                    KeyValue::new("status", status.to_string()),
                    KeyValue::new(
                        "error_type",
                        if status >= 500 {
                            "server_error"
                        } else {
                            "client_error"
                        },
                    ),
                ],
            );
        }
    }

    fn record_retry(&self, url: &str, attempts: u32, success: bool) {
        let path = normalize_name(url);
        self.retries_total.add(
            1,
            &[
                KeyValue::new("path", path.clone()),
                KeyValue::new("attempt", attempts.to_string()),
                KeyValue::new("success", success.to_string()),
            ],
        );

        if !success {
            self.errors_total.add(
                1,
                &[
                    KeyValue::new("path", path),
                    KeyValue::new("status", "retry_failed"),
                    KeyValue::new("error_type", "retry_error"),
                ],
            );
        }
    }
}

#[cfg(feature = "metrics")]
impl fmt::Debug for OtelMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtelMetrics").finish_non_exhaustive()
    }
}

/// Normalize a metric name for use as a low-cardinality label
///
/// Plain names pass through. URLs are reduced to their lowercased path with
/// UUID segments replaced by `{uuid}` and numeric segments by `{id}`.
pub fn normalize_name(name: &str) -> String {
    let path = match reqwest::Url::parse(name) {
        Ok(url) => url.path().to_string(),
        Err(_) if name.starts_with('/') => name.to_string(),
        Err(_) => return name.to_string(),
    };

    path.split('/')
        .map(|segment| {
            if uuid::Uuid::parse_str(segment).is_ok() {
                "{uuid}".to_string()
            } else if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}".to_string()
            } else {
                segment.to_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
