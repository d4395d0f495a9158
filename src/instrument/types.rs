//! Core metric types: Counter, Gauge, Summary, Histogram
//!
//! Thread-safe metric primitives with label support. Values are keyed by a
//! preformatted label string (`method="GET",handler="/"`), which keeps the
//! hot path to a map lookup plus an atomic update.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Thread-safe labeled counter using interior mutability.
///
/// Counters are monotonically increasing values (e.g., total requests).
#[derive(Debug, Default)]
pub struct LabeledCounter {
    values: RwLock<HashMap<String, AtomicU64>>,
}

impl LabeledCounter {
    /// Create a new labeled counter.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Increment the counter by 1 for the given label combination.
    ///
    /// Labels are formatted as `key1="value1",key2="value2"`.
    pub fn inc(&self, labels: &str) {
        self.add(labels, 1);
    }

    /// Add a value to the counter for the given label combination.
    pub fn add(&self, labels: &str, value: u64) {
        // Fast path: the series already exists
        {
            let values = self.values.read();
            if let Some(counter) = values.get(labels) {
                counter.fetch_add(value, Ordering::Relaxed);
                return;
            }
        }

        // Slow path: create the series
        let mut values = self.values.write();
        values
            .entry(labels.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Get the current value for the given label combination.
    pub fn get(&self, labels: &str) -> u64 {
        let values = self.values.read();
        values
            .get(labels)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Snapshot all series, sorted by label string.
    pub fn get_all(&self) -> Vec<(String, u64)> {
        let values = self.values.read();
        let mut all: Vec<_> = values
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}

/// Thread-safe gauge (can increase or decrease).
///
/// Gauges represent current values (e.g., requests in progress).
#[derive(Debug, Default)]
pub struct Gauge {
    values: RwLock<HashMap<String, AtomicI64>>,
}

impl Gauge {
    /// Create a new gauge.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Set the gauge to a specific value.
    pub fn set(&self, labels: &str, value: i64) {
        {
            let values = self.values.read();
            if let Some(gauge) = values.get(labels) {
                gauge.store(value, Ordering::Relaxed);
                return;
            }
        }

        let mut values = self.values.write();
        values
            .entry(labels.to_string())
            .or_insert_with(|| AtomicI64::new(0))
            .store(value, Ordering::Relaxed);
    }

    /// Increment the gauge by 1.
    pub fn inc(&self, labels: &str) {
        self.add(labels, 1);
    }

    /// Decrement the gauge by 1.
    pub fn dec(&self, labels: &str) {
        self.add(labels, -1);
    }

    /// Add a value to the gauge (can be negative).
    pub fn add(&self, labels: &str, value: i64) {
        {
            let values = self.values.read();
            if let Some(gauge) = values.get(labels) {
                gauge.fetch_add(value, Ordering::Relaxed);
                return;
            }
        }

        let mut values = self.values.write();
        values
            .entry(labels.to_string())
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Get the current value for the given label combination.
    pub fn get(&self, labels: &str) -> i64 {
        let values = self.values.read();
        values
            .get(labels)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Snapshot all series, sorted by label string.
    pub fn get_all(&self) -> Vec<(String, i64)> {
        let values = self.values.read();
        let mut all: Vec<_> = values
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}

/// Thread-safe summary: running sum and count of observations.
///
/// No quantiles are calculated; this matches a quantile-less Prometheus
/// summary and is what byte-size metrics use.
#[derive(Debug, Default)]
pub struct Summary {
    series: RwLock<HashMap<String, SummarySeries>>,
}

#[derive(Debug, Default)]
struct SummarySeries {
    sum: f64,
    count: u64,
}

impl Summary {
    /// Create a new summary.
    pub fn new() -> Self {
        Self {
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Observe a value for the given label combination.
    pub fn observe(&self, labels: &str, value: f64) {
        let mut series = self.series.write();
        let entry = series.entry(labels.to_string()).or_default();
        entry.sum += value;
        entry.count += 1;
    }

    /// Get (sum, count) for the given label combination.
    pub fn get(&self, labels: &str) -> (f64, u64) {
        let series = self.series.read();
        series
            .get(labels)
            .map(|s| (s.sum, s.count))
            .unwrap_or((0.0, 0))
    }

    /// Snapshot all series as (labels, sum, count), sorted by label string.
    pub fn get_all(&self) -> Vec<(String, f64, u64)> {
        let series = self.series.read();
        let mut all: Vec<_> = series
            .iter()
            .map(|(k, s)| (k.clone(), s.sum, s.count))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}

/// Thread-safe histogram with configurable buckets.
///
/// Histograms track the distribution of values (e.g., request durations).
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<f64>,
    counts: RwLock<HashMap<String, Vec<AtomicU64>>>,
    sums: RwLock<HashMap<String, f64>>,
    totals: RwLock<HashMap<String, u64>>,
}

impl Histogram {
    /// Create a new histogram with the given bucket boundaries.
    ///
    /// Boundaries must be sorted in ascending order. A `+Inf` bucket is
    /// appended when the last boundary is finite, so every observation
    /// lands in at least one bucket.
    pub fn new(buckets: &[f64]) -> Self {
        let mut buckets = buckets.to_vec();
        match buckets.last() {
            Some(last) if last.is_infinite() => {}
            _ => buckets.push(f64::INFINITY),
        }
        Self {
            buckets,
            counts: RwLock::new(HashMap::new()),
            sums: RwLock::new(HashMap::new()),
            totals: RwLock::new(HashMap::new()),
        }
    }

    /// Get the bucket boundaries, including the trailing `+Inf`.
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    /// Observe a value for the given label combination.
    pub fn observe(&self, labels: &str, value: f64) {
        // Initialize bucket counts if needed
        {
            let counts = self.counts.read();
            if !counts.contains_key(labels) {
                drop(counts);
                let mut counts = self.counts.write();
                if !counts.contains_key(labels) {
                    let bucket_counts: Vec<AtomicU64> =
                        (0..self.buckets.len()).map(|_| AtomicU64::new(0)).collect();
                    counts.insert(labels.to_string(), bucket_counts);
                }
            }
        }

        // Update bucket counts (cumulative)
        let counts = self.counts.read();
        if let Some(bucket_counts) = counts.get(labels) {
            for (i, &bound) in self.buckets.iter().enumerate() {
                if value <= bound {
                    bucket_counts[i].fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        // Update sum and total
        {
            let mut sums = self.sums.write();
            *sums.entry(labels.to_string()).or_insert(0.0) += value;
        }
        {
            let mut totals = self.totals.write();
            *totals.entry(labels.to_string()).or_insert(0) += 1;
        }
    }

    /// Total number of observations for the given label combination.
    pub fn count(&self, labels: &str) -> u64 {
        let totals = self.totals.read();
        totals.get(labels).copied().unwrap_or(0)
    }

    /// Snapshot all series for export, sorted by label string.
    pub fn get_all(&self) -> Vec<HistogramData> {
        let counts = self.counts.read();
        let sums = self.sums.read();
        let totals = self.totals.read();

        let mut all: Vec<HistogramData> = counts
            .iter()
            .map(|(labels, bucket_counts)| {
                let bucket_values: Vec<u64> = bucket_counts
                    .iter()
                    .map(|c| c.load(Ordering::Relaxed))
                    .collect();
                HistogramData {
                    labels: labels.clone(),
                    buckets: self.buckets.clone(),
                    counts: bucket_values,
                    sum: *sums.get(labels).unwrap_or(&0.0),
                    count: *totals.get(labels).unwrap_or(&0),
                }
            })
            .collect();
        all.sort_by(|a, b| a.labels.cmp(&b.labels));
        all
    }
}

/// Histogram data for a single label combination.
#[derive(Debug, Clone)]
pub struct HistogramData {
    /// Label string (e.g., `method="GET",handler="/"`)
    pub labels: String,
    /// Bucket boundaries, ending with `+Inf`
    pub buckets: Vec<f64>,
    /// Cumulative counts for each bucket
    pub counts: Vec<u64>,
    /// Sum of all observed values
    pub sum: f64,
    /// Total number of observations
    pub count: u64,
}

/// Default buckets for the high-resolution latency histogram (seconds).
///
/// Many buckets for accurate percentile calculation; usable because the
/// metric carries no labels.
pub const LATENCY_HIGHRES_BUCKETS: &[f64] = &[
    0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0,
    7.5, 10.0, 30.0, 60.0,
];

/// Default buckets for the per-handler latency histogram (seconds).
///
/// Kept very small because every (method, handler) pair multiplies them.
pub const LATENCY_LOWRES_BUCKETS: &[f64] = &[0.1, 0.5, 1.0];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_basic() {
        let counter = LabeledCounter::new();
        counter.inc("method=\"GET\"");
        counter.inc("method=\"GET\"");
        counter.inc("method=\"POST\"");

        assert_eq!(counter.get("method=\"GET\""), 2);
        assert_eq!(counter.get("method=\"POST\""), 1);
        assert_eq!(counter.get("method=\"PUT\""), 0);
    }

    #[test]
    fn test_counter_add() {
        let counter = LabeledCounter::new();
        counter.add("status=\"200\"", 10);
        counter.add("status=\"200\"", 5);

        assert_eq!(counter.get("status=\"200\""), 15);
    }

    #[test]
    fn test_counter_snapshot_sorted() {
        let counter = LabeledCounter::new();
        counter.inc("method=\"POST\"");
        counter.inc("method=\"GET\"");
        counter.inc("method=\"DELETE\"");

        let labels: Vec<String> = counter.get_all().into_iter().map(|(l, _)| l).collect();
        assert_eq!(
            labels,
            vec!["method=\"DELETE\"", "method=\"GET\"", "method=\"POST\""]
        );
    }

    #[test]
    fn test_gauge_basic() {
        let gauge = Gauge::new();
        gauge.set("", 10);
        assert_eq!(gauge.get(""), 10);

        gauge.inc("");
        assert_eq!(gauge.get(""), 11);

        gauge.dec("");
        assert_eq!(gauge.get(""), 10);
    }

    #[test]
    fn test_gauge_returns_to_zero() {
        let gauge = Gauge::new();
        let labels = "method=\"GET\",handler=\"/\"";
        gauge.inc(labels);
        gauge.inc(labels);
        gauge.dec(labels);
        gauge.dec(labels);
        assert_eq!(gauge.get(labels), 0);
    }

    #[test]
    fn test_summary_observe() {
        let summary = Summary::new();
        summary.observe("handler=\"/\"", 128.0);
        summary.observe("handler=\"/\"", 256.0);

        let (sum, count) = summary.get("handler=\"/\"");
        assert_eq!(sum, 384.0);
        assert_eq!(count, 2);
        assert_eq!(summary.get("handler=\"/other\""), (0.0, 0));
    }

    #[test]
    fn test_histogram_appends_inf_bucket() {
        let hist = Histogram::new(&[0.1, 0.5, 1.0]);
        assert_eq!(hist.buckets(), &[0.1, 0.5, 1.0, f64::INFINITY]);

        let already_inf = Histogram::new(&[0.1, f64::INFINITY]);
        assert_eq!(already_inf.buckets(), &[0.1, f64::INFINITY]);
    }

    #[test]
    fn test_histogram_cumulative_counts() {
        let hist = Histogram::new(&[0.1, 0.5, 1.0]);
        hist.observe("", 0.05);
        hist.observe("", 0.3);
        hist.observe("", 0.8);
        hist.observe("", 5.0);

        let data = hist.get_all();
        assert_eq!(data.len(), 1);

        let d = &data[0];
        assert_eq!(d.count, 4);
        assert!((d.sum - 6.15).abs() < 1e-9);
        // Cumulative: <=0.1 -> 1, <=0.5 -> 2, <=1.0 -> 3, <=+Inf -> 4
        assert_eq!(d.counts, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_histogram_labels() {
        let hist = Histogram::new(&[1.0, 5.0]);
        hist.observe("method=\"GET\"", 0.5);
        hist.observe("method=\"POST\"", 2.0);

        let data = hist.get_all();
        assert_eq!(data.len(), 2);
        assert_eq!(hist.count("method=\"GET\""), 1);
        assert_eq!(hist.count("method=\"PUT\""), 0);
    }
}
