//! MetricRegistry - metric registration and ownership
//!
//! A single registry instance owns every metric the middleware and the
//! exposition endpoint see. It is passed around explicitly (usually as an
//! `Arc`) instead of living in process-global state.

use super::types::{Gauge, Histogram, LabeledCounter, Summary};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Metric definition with metadata.
#[derive(Debug, Clone)]
pub struct MetricDef {
    /// Metric name (e.g., `requests_total`)
    pub name: String,
    /// Help text describing the metric
    pub help: String,
    /// Label names for this metric
    pub labels: Vec<String>,
}

impl MetricDef {
    fn new(name: &str, labels: &[&str], help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The kind of a registered metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Summary,
    Histogram,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => write!(f, "counter"),
            Self::Gauge => write!(f, "gauge"),
            Self::Summary => write!(f, "summary"),
            Self::Histogram => write!(f, "histogram"),
        }
    }
}

/// Registration errors.
///
/// Registering a name that already exists with the same kind is not an
/// error; the existing metric is returned unchanged.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name is taken by a metric of a different kind.
    #[error("metric `{name}` is already registered as a {existing}, not a {requested}")]
    KindMismatch {
        name: String,
        existing: MetricKind,
        requested: MetricKind,
    },
}

#[derive(Debug, Default)]
struct Inner {
    counters: HashMap<String, (MetricDef, Arc<LabeledCounter>)>,
    gauges: HashMap<String, (MetricDef, Arc<Gauge>)>,
    summaries: HashMap<String, (MetricDef, Arc<Summary>)>,
    histograms: HashMap<String, (MetricDef, Arc<Histogram>)>,
}

impl Inner {
    fn kind_of(&self, name: &str) -> Option<MetricKind> {
        if self.counters.contains_key(name) {
            Some(MetricKind::Counter)
        } else if self.gauges.contains_key(name) {
            Some(MetricKind::Gauge)
        } else if self.summaries.contains_key(name) {
            Some(MetricKind::Summary)
        } else if self.histograms.contains_key(name) {
            Some(MetricKind::Histogram)
        } else {
            None
        }
    }

    fn check_free(&self, name: &str, requested: MetricKind) -> Result<(), RegistryError> {
        match self.kind_of(name) {
            Some(existing) if existing != requested => Err(RegistryError::KindMismatch {
                name: name.to_string(),
                existing,
                requested,
            }),
            _ => Ok(()),
        }
    }
}

/// Central registry for application metrics.
///
/// Registration is idempotent per name: registering an existing name with
/// the same kind returns the already-registered metric and leaves its
/// definition untouched. Registering a name under a different kind is an
/// error.
///
/// # Example
///
/// ```ignore
/// use parapet::instrument::MetricRegistry;
///
/// let registry = MetricRegistry::new();
/// let total = registry.counter("requests_total", &["method"], "Total requests")?;
/// total.inc("method=\"GET\"");
/// ```
#[derive(Debug, Default)]
pub struct MetricRegistry {
    inner: RwLock<Inner>,
}

impl MetricRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a counter, or return the existing one with this name.
    pub fn counter(
        &self,
        name: &str,
        labels: &[&str],
        help: &str,
    ) -> Result<Arc<LabeledCounter>, RegistryError> {
        let mut inner = self.inner.write();
        inner.check_free(name, MetricKind::Counter)?;
        if let Some((_, existing)) = inner.counters.get(name) {
            return Ok(existing.clone());
        }
        let counter = Arc::new(LabeledCounter::new());
        inner.counters.insert(
            name.to_string(),
            (MetricDef::new(name, labels, help), counter.clone()),
        );
        Ok(counter)
    }

    /// Register a gauge, or return the existing one with this name.
    pub fn gauge(
        &self,
        name: &str,
        labels: &[&str],
        help: &str,
    ) -> Result<Arc<Gauge>, RegistryError> {
        let mut inner = self.inner.write();
        inner.check_free(name, MetricKind::Gauge)?;
        if let Some((_, existing)) = inner.gauges.get(name) {
            return Ok(existing.clone());
        }
        let gauge = Arc::new(Gauge::new());
        inner.gauges.insert(
            name.to_string(),
            (MetricDef::new(name, labels, help), gauge.clone()),
        );
        Ok(gauge)
    }

    /// Register a summary, or return the existing one with this name.
    pub fn summary(
        &self,
        name: &str,
        labels: &[&str],
        help: &str,
    ) -> Result<Arc<Summary>, RegistryError> {
        let mut inner = self.inner.write();
        inner.check_free(name, MetricKind::Summary)?;
        if let Some((_, existing)) = inner.summaries.get(name) {
            return Ok(existing.clone());
        }
        let summary = Arc::new(Summary::new());
        inner.summaries.insert(
            name.to_string(),
            (MetricDef::new(name, labels, help), summary.clone()),
        );
        Ok(summary)
    }

    /// Register a histogram, or return the existing one with this name.
    ///
    /// Bucket boundaries only apply on first registration; a duplicate
    /// registration keeps the existing buckets.
    pub fn histogram(
        &self,
        name: &str,
        labels: &[&str],
        buckets: &[f64],
        help: &str,
    ) -> Result<Arc<Histogram>, RegistryError> {
        let mut inner = self.inner.write();
        inner.check_free(name, MetricKind::Histogram)?;
        if let Some((_, existing)) = inner.histograms.get(name) {
            return Ok(existing.clone());
        }
        let histogram = Arc::new(Histogram::new(buckets));
        inner.histograms.insert(
            name.to_string(),
            (MetricDef::new(name, labels, help), histogram.clone()),
        );
        Ok(histogram)
    }

    /// Look up a counter by name.
    pub fn get_counter(&self, name: &str) -> Option<Arc<LabeledCounter>> {
        self.inner.read().counters.get(name).map(|(_, c)| c.clone())
    }

    /// Look up a gauge by name.
    pub fn get_gauge(&self, name: &str) -> Option<Arc<Gauge>> {
        self.inner.read().gauges.get(name).map(|(_, g)| g.clone())
    }

    /// Look up a summary by name.
    pub fn get_summary(&self, name: &str) -> Option<Arc<Summary>> {
        self.inner.read().summaries.get(name).map(|(_, s)| s.clone())
    }

    /// Look up a histogram by name.
    pub fn get_histogram(&self, name: &str) -> Option<Arc<Histogram>> {
        self.inner
            .read()
            .histograms
            .get(name)
            .map(|(_, h)| h.clone())
    }

    /// Snapshot all counters, sorted by metric name.
    pub fn counters(&self) -> Vec<(MetricDef, Arc<LabeledCounter>)> {
        let inner = self.inner.read();
        let mut all: Vec<_> = inner
            .counters
            .values()
            .map(|(def, c)| (def.clone(), c.clone()))
            .collect();
        all.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        all
    }

    /// Snapshot all gauges, sorted by metric name.
    pub fn gauges(&self) -> Vec<(MetricDef, Arc<Gauge>)> {
        let inner = self.inner.read();
        let mut all: Vec<_> = inner
            .gauges
            .values()
            .map(|(def, g)| (def.clone(), g.clone()))
            .collect();
        all.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        all
    }

    /// Snapshot all summaries, sorted by metric name.
    pub fn summaries(&self) -> Vec<(MetricDef, Arc<Summary>)> {
        let inner = self.inner.read();
        let mut all: Vec<_> = inner
            .summaries
            .values()
            .map(|(def, s)| (def.clone(), s.clone()))
            .collect();
        all.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        all
    }

    /// Snapshot all histograms, sorted by metric name.
    pub fn histograms(&self) -> Vec<(MetricDef, Arc<Histogram>)> {
        let inner = self.inner.read();
        let mut all: Vec<_> = inner
            .histograms
            .values()
            .map(|(def, h)| (def.clone(), h.clone()))
            .collect();
        all.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = MetricRegistry::new();
        registry
            .counter("requests_total", &["method"], "Total requests")
            .unwrap();
        registry
            .histogram("duration_seconds", &["method"], &[0.1, 0.5, 1.0], "Duration")
            .unwrap();
        registry.gauge("inprogress", &[], "Active count").unwrap();
        registry
            .summary("request_size_bytes", &["handler"], "Request size")
            .unwrap();

        assert!(registry.get_counter("requests_total").is_some());
        assert!(registry.get_histogram("duration_seconds").is_some());
        assert!(registry.get_gauge("inprogress").is_some());
        assert!(registry.get_summary("request_size_bytes").is_some());
        assert!(registry.get_counter("missing").is_none());
    }

    #[test]
    fn test_duplicate_registration_returns_existing() {
        let registry = MetricRegistry::new();
        let first = registry
            .counter("requests_total", &["method"], "Total requests")
            .unwrap();
        first.inc("method=\"GET\"");

        // Same name, same kind: the original metric comes back, counts intact.
        let second = registry
            .counter("requests_total", &["other"], "Different help")
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.get("method=\"GET\""), 1);
    }

    #[test]
    fn test_duplicate_histogram_keeps_buckets() {
        let registry = MetricRegistry::new();
        let first = registry
            .histogram("duration_seconds", &[], &[0.1, 0.5], "Duration")
            .unwrap();
        let second = registry
            .histogram("duration_seconds", &[], &[1.0, 2.0, 3.0], "Duration")
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.buckets(), &[0.1, 0.5, f64::INFINITY]);
    }

    #[test]
    fn test_kind_mismatch_is_an_error() {
        let registry = MetricRegistry::new();
        registry
            .counter("requests_total", &["method"], "Total requests")
            .unwrap();

        let err = registry
            .gauge("requests_total", &[], "Not a counter")
            .unwrap_err();
        match err {
            RegistryError::KindMismatch {
                existing,
                requested,
                ..
            } => {
                assert_eq!(existing, MetricKind::Counter);
                assert_eq!(requested, MetricKind::Gauge);
            }
        }
    }

    #[test]
    fn test_snapshots_sorted_by_name() {
        let registry = MetricRegistry::new();
        registry.counter("zzz_total", &[], "Z").unwrap();
        registry.counter("aaa_total", &[], "A").unwrap();

        let names: Vec<String> = registry
            .counters()
            .into_iter()
            .map(|(def, _)| def.name)
            .collect();
        assert_eq!(names, vec!["aaa_total", "zzz_total"]);
    }
}
