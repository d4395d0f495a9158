//! Prometheus Request Instrumentation
//!
//! Per-request HTTP metrics for Axum applications:
//! - Automatic instrumentation of every request/response cycle
//! - Handler labels resolved from route templates, never raw paths
//! - In-flight tracking that survives errors, panics, and client aborts
//! - Prometheus text format exposition on a scrape endpoint
//!
//! # Quick Start
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use parapet::instrument::{Instrumentator, InstrumentedRouter, MetricRegistry, RouteTable};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(MetricRegistry::new());
//! let instrumentator = Instrumentator::new(registry.clone())
//!     .routes(RouteTable::new().route("/").route("/items/{item_id}"));
//!
//! let app = Router::new()
//!     .route("/", get(|| async { "Hello" }))
//!     .route("/items/:item_id", get(|| async { "item" }))
//!     .with_instrumentation(&instrumentator)?;
//!
//! // Every request now updates the default metrics, and GET /metrics
//! // serves the Prometheus exposition format.
//! ```
//!
//! # Default Metrics
//!
//! | Metric | Kind | Labels |
//! |--------|------|--------|
//! | `requests_total` | counter | method, status, handler |
//! | `requests_inprogress` | gauge | method, handler |
//! | `request_size_bytes` | summary | handler |
//! | `response_size_bytes` | summary | handler |
//! | `request_duration_highres_seconds` | histogram | - |
//! | `request_duration_seconds` | histogram | method, handler |
//!
//! # Cardinality
//!
//! The handler label is the matched route template (`/items/{item_id}`),
//! resolved against the [`RouteTable`]. Unmatched paths collapse into the
//! single `none` sentinel, so user-controlled paths can never grow the
//! label set.
//!
//! # Custom Collectors
//!
//! ```ignore
//! use parapet::instrument::Info;
//!
//! let instrumentator = instrumentator.add(move |info: &Info| {
//!     if info.status.starts_with('5') {
//!         server_errors.inc(&format!("handler=\"{}\"", info.handler));
//!     }
//! });
//! ```

mod collector;
mod exposition;
mod instrumentator;
mod middleware;
mod registry;
mod routing;
mod types;

// Core types
pub use registry::{MetricDef, MetricKind, MetricRegistry, RegistryError};
pub use types::{Gauge, Histogram, HistogramData, LabeledCounter, Summary};

// Bucket constants
pub use types::{LATENCY_HIGHRES_BUCKETS, LATENCY_LOWRES_BUCKETS};

// Exposition
pub use exposition::{metrics_handler, render, PrometheusRender, CONTENT_TYPE};

// Route resolution
pub use routing::{RoutePattern, RouteTable, UNMATCHED_HANDLER};

// Collectors
pub use collector::{Collector, CollectorOptions, DefaultCollector, Info};

// Middleware and entry points
pub use instrumentator::{InstrumentedRouter, Instrumentator};
pub use middleware::status_label;
