//! Collectors: per-request metric recording
//!
//! A collector is invoked once per completed request with an [`Info`]
//! snapshot and updates whatever metrics it owns. [`DefaultCollector`]
//! covers the usual request/latency/size metrics; applications with more
//! specific needs register their own collector functions instead of (or
//! next to) the default one.

use super::registry::{MetricRegistry, RegistryError};
use super::types::{
    Histogram, LabeledCounter, Summary, LATENCY_HIGHRES_BUCKETS, LATENCY_LOWRES_BUCKETS,
};
use std::sync::Arc;

/// Immutable snapshot of one completed request.
///
/// Built by the middleware after the response status and headers are
/// available, passed to every registered collector, then discarded.
#[derive(Debug, Clone)]
pub struct Info {
    /// Request method, unmodified (e.g. `GET`)
    pub method: String,
    /// Normalized handler label: the matched route template, or the
    /// unmatched sentinel
    pub handler: String,
    /// Normalized status label: the canonical integer code as a string
    pub status: String,
    /// Request duration in seconds, rounded to 4 decimal places
    pub duration: f64,
    /// Request content-length in bytes; 0 when absent or unparseable
    pub request_size: u64,
    /// Response content-length in bytes; 0 when absent
    pub response_size: u64,
}

/// A per-request metric recorder.
///
/// Invoked synchronously during request completion, in registration
/// order. A collector must not panic; a panicking collector is a fatal
/// instrumentation fault and is not caught.
pub trait Collector: Send + Sync {
    /// Record one completed request.
    fn record(&self, info: &Info);
}

impl<F> Collector for F
where
    F: Fn(&Info) + Send + Sync,
{
    fn record(&self, info: &Info) {
        self(info)
    }
}

/// Options for [`DefaultCollector`] registration.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Prefix applied to every metric name (e.g. `http`)
    pub namespace: String,
    /// Second prefix applied after the namespace
    pub subsystem: String,
    /// Buckets for the unlabeled high-resolution latency histogram
    pub latency_highres_buckets: Vec<f64>,
    /// Buckets for the per-handler latency histogram; keep these few
    pub latency_lowres_buckets: Vec<f64>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            subsystem: String::new(),
            latency_highres_buckets: LATENCY_HIGHRES_BUCKETS.to_vec(),
            latency_lowres_buckets: LATENCY_LOWRES_BUCKETS.to_vec(),
        }
    }
}

impl CollectorOptions {
    /// Set the metric-name namespace prefix.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the metric-name subsystem prefix.
    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    /// Replace the high-resolution latency buckets.
    pub fn latency_highres_buckets(mut self, buckets: &[f64]) -> Self {
        self.latency_highres_buckets = buckets.to_vec();
        self
    }

    /// Replace the per-handler latency buckets.
    pub fn latency_lowres_buckets(mut self, buckets: &[f64]) -> Self {
        self.latency_lowres_buckets = buckets.to_vec();
        self
    }

    fn full_name(&self, name: &str) -> String {
        [self.namespace.as_str(), self.subsystem.as_str(), name]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// The ready-made collector covering the standard request metrics.
///
/// Registers, idempotently:
///
/// | Metric | Kind | Labels |
/// |--------|------|--------|
/// | `requests_total` | counter | method, status, handler |
/// | `request_size_bytes` | summary | handler |
/// | `response_size_bytes` | summary | handler |
/// | `request_duration_highres_seconds` | histogram | - |
/// | `request_duration_seconds` | histogram | method, handler |
///
/// The high-resolution histogram is only fed by 2xx responses, giving an
/// accurate latency distribution for successful requests; the coarse
/// per-handler histogram observes every request.
#[derive(Debug)]
pub struct DefaultCollector {
    total: Arc<LabeledCounter>,
    request_size: Arc<Summary>,
    response_size: Arc<Summary>,
    latency_highres: Arc<Histogram>,
    latency_lowres: Arc<Histogram>,
}

impl DefaultCollector {
    /// Register the default metrics with default options.
    pub fn register(registry: &MetricRegistry) -> Result<Self, RegistryError> {
        Self::with_options(registry, CollectorOptions::default())
    }

    /// Register the default metrics with the given options.
    pub fn with_options(
        registry: &MetricRegistry,
        options: CollectorOptions,
    ) -> Result<Self, RegistryError> {
        let total = registry.counter(
            &options.full_name("requests_total"),
            &["method", "status", "handler"],
            "Total number of requests by method, status and handler.",
        )?;
        let request_size = registry.summary(
            &options.full_name("request_size_bytes"),
            &["handler"],
            "Content length of incoming requests by handler. Only the header value is respected.",
        )?;
        let response_size = registry.summary(
            &options.full_name("response_size_bytes"),
            &["handler"],
            "Content length of outgoing responses by handler. Only the header value is respected.",
        )?;
        let latency_highres = registry.histogram(
            &options.full_name("request_duration_highres_seconds"),
            &[],
            &options.latency_highres_buckets,
            "Latency with many buckets but no labels, for accurate percentile calculations.",
        )?;
        let latency_lowres = registry.histogram(
            &options.full_name("request_duration_seconds"),
            &["method", "handler"],
            &options.latency_lowres_buckets,
            "Latency with only few buckets by handler, for aggregation by handler.",
        )?;

        Ok(Self {
            total,
            request_size,
            response_size,
            latency_highres,
            latency_lowres,
        })
    }
}

impl Collector for DefaultCollector {
    fn record(&self, info: &Info) {
        let handler_labels = format!("handler=\"{}\"", info.handler);

        self.total.inc(&format!(
            "method=\"{}\",status=\"{}\",handler=\"{}\"",
            info.method, info.status, info.handler
        ));

        self.request_size
            .observe(&handler_labels, info.request_size as f64);
        self.response_size
            .observe(&handler_labels, info.response_size as f64);

        if info.status.starts_with('2') {
            self.latency_highres.observe("", info.duration);
        }

        self.latency_lowres.observe(
            &format!("method=\"{}\",handler=\"{}\"", info.method, info.handler),
            info.duration,
        );
    }
}
