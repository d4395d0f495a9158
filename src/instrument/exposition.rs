//! Prometheus text exposition
//!
//! Serializes a [`MetricRegistry`] snapshot in the Prometheus text format.
//! Rendering is read-only; scraping twice without traffic in between
//! produces byte-identical output.

use super::registry::MetricRegistry;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use std::fmt::Write;
use std::sync::Arc;

/// Content type of the exposition format, including the format version.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render a registry in Prometheus text format.
///
/// Metrics with no recorded series are omitted entirely.
///
/// # Example Output
///
/// ```text
/// # HELP requests_total Total number of requests by method, status and handler.
/// # TYPE requests_total counter
/// requests_total{method="GET",status="200",handler="/"} 2
///
/// # HELP request_duration_seconds Latency with only few buckets by handler.
/// # TYPE request_duration_seconds histogram
/// request_duration_seconds_bucket{method="GET",handler="/",le="0.1"} 2
/// request_duration_seconds_bucket{method="GET",handler="/",le="+Inf"} 2
/// request_duration_seconds_sum{method="GET",handler="/"} 0.0042
/// request_duration_seconds_count{method="GET",handler="/"} 2
/// ```
pub fn render(registry: &MetricRegistry) -> String {
    let mut output = String::with_capacity(4096);

    for (def, counter) in registry.counters() {
        write_counter(&mut output, &def.name, &def.help, counter.get_all());
    }

    for (def, gauge) in registry.gauges() {
        write_gauge(&mut output, &def.name, &def.help, gauge.get_all());
    }

    for (def, summary) in registry.summaries() {
        write_summary(&mut output, &def.name, &def.help, summary.get_all());
    }

    for (def, histogram) in registry.histograms() {
        write_histogram(&mut output, &def.name, &def.help, histogram.get_all());
    }

    output
}

fn write_counter(output: &mut String, name: &str, help: &str, values: Vec<(String, u64)>) {
    if values.is_empty() {
        return;
    }

    writeln!(output, "# HELP {name} {help}").unwrap();
    writeln!(output, "# TYPE {name} counter").unwrap();

    for (labels, value) in values {
        if labels.is_empty() {
            writeln!(output, "{name} {value}").unwrap();
        } else {
            writeln!(output, "{name}{{{labels}}} {value}").unwrap();
        }
    }
    writeln!(output).unwrap();
}

fn write_gauge(output: &mut String, name: &str, help: &str, values: Vec<(String, i64)>) {
    if values.is_empty() {
        return;
    }

    writeln!(output, "# HELP {name} {help}").unwrap();
    writeln!(output, "# TYPE {name} gauge").unwrap();

    for (labels, value) in values {
        if labels.is_empty() {
            writeln!(output, "{name} {value}").unwrap();
        } else {
            writeln!(output, "{name}{{{labels}}} {value}").unwrap();
        }
    }
    writeln!(output).unwrap();
}

fn write_summary(output: &mut String, name: &str, help: &str, values: Vec<(String, f64, u64)>) {
    if values.is_empty() {
        return;
    }

    writeln!(output, "# HELP {name} {help}").unwrap();
    writeln!(output, "# TYPE {name} summary").unwrap();

    for (labels, sum, count) in values {
        if labels.is_empty() {
            writeln!(output, "{name}_sum {sum}").unwrap();
            writeln!(output, "{name}_count {count}").unwrap();
        } else {
            writeln!(output, "{name}_sum{{{labels}}} {sum}").unwrap();
            writeln!(output, "{name}_count{{{labels}}} {count}").unwrap();
        }
    }
    writeln!(output).unwrap();
}

fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    data: Vec<super::types::HistogramData>,
) {
    if data.is_empty() {
        return;
    }

    writeln!(output, "# HELP {name} {help}").unwrap();
    writeln!(output, "# TYPE {name} histogram").unwrap();

    for hist_data in data {
        let labels = &hist_data.labels;

        for (i, &bucket) in hist_data.buckets.iter().enumerate() {
            let count = hist_data.counts[i];
            let le = format_le(bucket);

            if labels.is_empty() {
                writeln!(output, "{name}_bucket{{le=\"{le}\"}} {count}").unwrap();
            } else {
                writeln!(output, "{name}_bucket{{{labels},le=\"{le}\"}} {count}").unwrap();
            }
        }

        if labels.is_empty() {
            writeln!(output, "{name}_sum {}", hist_data.sum).unwrap();
            writeln!(output, "{name}_count {}", hist_data.count).unwrap();
        } else {
            writeln!(output, "{name}_sum{{{labels}}} {}", hist_data.sum).unwrap();
            writeln!(output, "{name}_count{{{labels}}} {}", hist_data.count).unwrap();
        }
    }
    writeln!(output).unwrap();
}

/// Format a bucket boundary for the `le` label.
fn format_le(value: f64) -> String {
    if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == value.floor() && value.abs() < 1e10 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Extension trait adding text exposition to [`MetricRegistry`].
pub trait PrometheusRender {
    /// Render all metrics in Prometheus text format.
    fn render(&self) -> String;
}

impl PrometheusRender for MetricRegistry {
    fn render(&self) -> String {
        render(self)
    }
}

/// Handler serving the exposition format for a scrape request.
pub async fn metrics_handler(registry: Arc<MetricRegistry>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        render(&registry),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::registry::MetricRegistry;

    #[test]
    fn test_render_counter() {
        let registry = MetricRegistry::new();
        let total = registry
            .counter("requests_total", &["method"], "Total requests")
            .unwrap();

        total.inc("method=\"GET\"");
        total.inc("method=\"GET\"");
        total.inc("method=\"POST\"");

        let output = render(&registry);

        assert!(output.contains("# HELP requests_total Total requests"));
        assert!(output.contains("# TYPE requests_total counter"));
        assert!(output.contains("requests_total{method=\"GET\"} 2"));
        assert!(output.contains("requests_total{method=\"POST\"} 1"));
    }

    #[test]
    fn test_render_gauge() {
        let registry = MetricRegistry::new();
        let gauge = registry
            .gauge("requests_inprogress", &[], "Requests in progress")
            .unwrap();

        gauge.set("", 42);

        let output = render(&registry);

        assert!(output.contains("# TYPE requests_inprogress gauge"));
        assert!(output.contains("requests_inprogress 42"));
    }

    #[test]
    fn test_render_summary() {
        let registry = MetricRegistry::new();
        let size = registry
            .summary("request_size_bytes", &["handler"], "Request sizes")
            .unwrap();

        size.observe("handler=\"/\"", 100.0);
        size.observe("handler=\"/\"", 50.0);

        let output = render(&registry);

        assert!(output.contains("# TYPE request_size_bytes summary"));
        assert!(output.contains("request_size_bytes_sum{handler=\"/\"} 150"));
        assert!(output.contains("request_size_bytes_count{handler=\"/\"} 2"));
    }

    #[test]
    fn test_render_histogram() {
        let registry = MetricRegistry::new();
        let duration = registry
            .histogram(
                "request_duration_seconds",
                &["method"],
                &[0.1, 0.5, 1.0],
                "Request duration",
            )
            .unwrap();

        duration.observe("method=\"GET\"", 0.05);
        duration.observe("method=\"GET\"", 0.3);

        let output = render(&registry);

        assert!(output.contains("# TYPE request_duration_seconds histogram"));
        assert!(output.contains("request_duration_seconds_bucket{method=\"GET\",le=\"0.1\"} 1"));
        assert!(output.contains("request_duration_seconds_bucket{method=\"GET\",le=\"0.5\"} 2"));
        assert!(output.contains("request_duration_seconds_bucket{method=\"GET\",le=\"1\"} 2"));
        assert!(output.contains("request_duration_seconds_bucket{method=\"GET\",le=\"+Inf\"} 2"));
        assert!(output.contains("request_duration_seconds_count{method=\"GET\"} 2"));
    }

    #[test]
    fn test_empty_metrics_are_omitted() {
        let registry = MetricRegistry::new();
        registry
            .counter("requests_total", &["method"], "Total requests")
            .unwrap();

        assert_eq!(render(&registry), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let registry = MetricRegistry::new();
        let total = registry
            .counter("requests_total", &["method"], "Total requests")
            .unwrap();
        let duration = registry
            .histogram("request_duration_seconds", &[], &[0.1, 1.0], "Duration")
            .unwrap();

        total.inc("method=\"POST\"");
        total.inc("method=\"GET\"");
        duration.observe("", 0.2);

        assert_eq!(render(&registry), render(&registry));
    }

    #[test]
    fn test_format_le() {
        assert_eq!(format_le(0.1), "0.1");
        assert_eq!(format_le(1.0), "1");
        assert_eq!(format_le(10.0), "10");
        assert_eq!(format_le(0.005), "0.005");
        assert_eq!(format_le(f64::INFINITY), "+Inf");
    }

    #[test]
    fn test_render_trait() {
        let registry = MetricRegistry::new();
        let counter = registry.counter("events_total", &[], "Events").unwrap();
        counter.inc("");

        assert!(registry.render().contains("events_total 1"));
    }
}
