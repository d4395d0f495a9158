//! Request instrumentation middleware
//!
//! Wraps the request pipeline: resolves the handler label, tracks
//! in-flight requests, times the request, and feeds every registered
//! collector once the response status and headers are available.
//!
//! The in-flight decrement is tied to an RAII guard, so it happens on
//! every exit path: normal completion, an error response, a panicking
//! handler, or a request future dropped because the client went away.
//! A request aborted before a response exists decrements the gauge but
//! records no counter or histogram observation, since there is no
//! completion to measure.

use super::collector::{Collector, Info};
use super::routing::{RouteTable, UNMATCHED_HANDLER};
use super::types::Gauge;
use axum::extract::Request;
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use std::time::Instant;

/// Shared middleware state: one per instrumented router.
pub(crate) struct InstrumentState {
    pub(crate) routes: RouteTable,
    pub(crate) collectors: Vec<Arc<dyn Collector>>,
    pub(crate) inflight: Arc<Gauge>,
}

/// Decrements the in-flight gauge when dropped.
struct InflightGuard {
    gauge: Arc<Gauge>,
    labels: String,
}

impl InflightGuard {
    fn acquire(gauge: Arc<Gauge>, labels: String) -> Self {
        gauge.inc(&labels);
        Self { gauge, labels }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.gauge.dec(&self.labels);
    }
}

/// The middleware function wiring everything together.
pub(crate) async fn instrument_request(
    state: Arc<InstrumentState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().as_str().to_string();
    let handler = state
        .routes
        .resolve(request.uri().path())
        .unwrap_or_else(|| UNMATCHED_HANDLER.to_string());
    let request_size = content_length(request.headers());

    let guard = InflightGuard::acquire(
        state.inflight.clone(),
        format!("method=\"{method}\",handler=\"{handler}\""),
    );
    let start = Instant::now();

    let response = next.run(request).await;

    // Status and headers are final here; the body may still be streaming.
    let duration = round_duration(start.elapsed().as_secs_f64());
    let info = Info {
        method,
        handler,
        status: status_label(response.status()),
        duration,
        request_size,
        response_size: content_length(response.headers()),
    };

    drop(guard);
    for collector in &state.collectors {
        collector.record(&info);
    }

    response
}

/// Normalize a status code to its canonical integer label.
///
/// The single boundary where any status representation becomes the
/// metric label; everything downstream compares strings like `"200"`.
pub fn status_label(status: StatusCode) -> String {
    status.as_u16().to_string()
}

/// Read a content-length header as a byte count.
///
/// Absent or unparseable values count as 0; never an error.
fn content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

/// Round a duration in seconds to 4 decimal places.
fn round_duration(seconds: f64) -> f64 {
    (seconds * 10_000.0).round() / 10_000.0
}
