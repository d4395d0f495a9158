//! # Parapet
//!
//! Prometheus instrumentation and request helpers for Axum applications.
//!
//! This crate provides the glue an Axum service needs around its
//! handlers, without reimplementing anything the framework or the
//! ecosystem already does:
//!
//! - **Request Instrumentation**: middleware that measures every
//!   request/response cycle and exposes Prometheus metrics, with handler
//!   labels resolved from route templates so label cardinality stays
//!   bounded
//! - **Error Mapping**: one `AppError` type rendering as JSON responses
//!   with the right status codes
//! - **Token Decoding**: extractors turning the `Authorization` header
//!   into a typed context via `jsonwebtoken`
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use parapet::{AppError, AuthConfig, AuthorizationContext};
//! use parapet::instrument::{Instrumentator, InstrumentedRouter, MetricRegistry, RouteTable};
//! use std::sync::Arc;
//!
//! async fn read_item(context: AuthorizationContext) -> Result<String, AppError> {
//!     Ok(format!("hello, {}", context.user_id))
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Arc::new(MetricRegistry::new());
//!     let instrumentator = Instrumentator::new(registry)
//!         .routes(RouteTable::new().route("/items/{item_id}"));
//!
//!     let app = Router::new()
//!         .route("/items/:item_id", get(read_item))
//!         .with_state(AuthConfig::from_env()?)
//!         .with_instrumentation(&instrumentator)?;
//!
//!     // serve `app`; GET /metrics exposes the scrape endpoint
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod instrument;

// Re-exports
pub use auth::{
    decode_authorization_token, AuthConfig, AuthorizationContext, Role, TracingHeaders,
};
pub use error::{AppError, ErrorKind, ErrorResponse, Result};
pub use instrument::{
    Collector, CollectorOptions, DefaultCollector, Info, InstrumentedRouter, Instrumentator,
    MetricRegistry, PrometheusRender, RegistryError, RouteTable,
};
