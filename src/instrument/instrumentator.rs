//! Instrumentator: registration entry points
//!
//! Ties the pieces together for an Axum application: `instrument` attaches
//! the middleware, `expose` mounts the scrape endpoint, `add` registers
//! custom collectors.

use super::collector::{Collector, CollectorOptions, DefaultCollector};
use super::exposition::metrics_handler;
use super::middleware::{instrument_request, InstrumentState};
use super::registry::{MetricRegistry, RegistryError};
use super::routing::RouteTable;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Name of the in-flight requests gauge.
const INPROGRESS_GAUGE: &str = "requests_inprogress";

/// Builder attaching request instrumentation to an Axum router.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get};
/// use parapet::instrument::{Instrumentator, MetricRegistry, RouteTable};
/// use std::sync::Arc;
///
/// let registry = Arc::new(MetricRegistry::new());
/// let instrumentator = Instrumentator::new(registry)
///     .routes(RouteTable::new().route("/").route("/items/{item_id}"));
///
/// let app = Router::new()
///     .route("/", get(|| async { "Hello" }));
/// let app = instrumentator.expose(instrumentator.instrument(app)?, "/metrics");
/// ```
pub struct Instrumentator {
    registry: Arc<MetricRegistry>,
    routes: RouteTable,
    collectors: Vec<Arc<dyn Collector>>,
    options: CollectorOptions,
}

impl Instrumentator {
    /// Create an instrumentator recording into the given registry.
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self {
            registry,
            routes: RouteTable::new(),
            collectors: Vec::new(),
            options: CollectorOptions::default(),
        }
    }

    /// Set the route table used to resolve handler labels.
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Append a collector.
    ///
    /// Collectors run in registration order on every completed request.
    /// When none is added, [`DefaultCollector`] is installed by
    /// `instrument`.
    pub fn add(mut self, collector: impl Collector + 'static) -> Self {
        self.collectors.push(Arc::new(collector));
        self
    }

    /// Set the options used when the default collector is installed.
    pub fn collector_options(mut self, options: CollectorOptions) -> Self {
        self.options = options;
        self
    }

    /// The registry this instrumentator records into.
    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    /// Attach the instrumentation middleware to a router.
    ///
    /// Registers the in-progress gauge and, when no collector was added,
    /// the default collector. Fails only when a metric name is already
    /// taken by a different metric kind.
    pub fn instrument<S>(&self, router: Router<S>) -> Result<Router<S>, RegistryError>
    where
        S: Clone + Send + Sync + 'static,
    {
        let collectors = if self.collectors.is_empty() {
            vec![Arc::new(DefaultCollector::with_options(
                &self.registry,
                self.options.clone(),
            )?) as Arc<dyn Collector>]
        } else {
            self.collectors.clone()
        };

        let inflight = self.registry.gauge(
            INPROGRESS_GAUGE,
            &["method", "handler"],
            "Number of requests in progress by method and handler.",
        )?;

        let state = Arc::new(InstrumentState {
            routes: self.routes.clone(),
            collectors,
            inflight,
        });

        Ok(router.layer(middleware::from_fn(move |request, next| {
            instrument_request(state.clone(), request, next)
        })))
    }

    /// Mount the scrape endpoint on a router.
    ///
    /// Call after `instrument` to keep scrapes out of the request
    /// metrics; routes added after the middleware layer are not wrapped
    /// by it.
    pub fn expose<S>(&self, router: Router<S>, endpoint: &str) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let registry = self.registry.clone();
        router.route(endpoint, get(move || metrics_handler(registry.clone())))
    }
}

/// Extension trait for the common instrument-plus-expose case.
pub trait InstrumentedRouter: Sized {
    /// Attach the middleware and mount the scrape endpoint at `/metrics`.
    fn with_instrumentation(self, instrumentator: &Instrumentator) -> Result<Self, RegistryError>;

    /// Same, with a custom scrape endpoint.
    fn with_instrumentation_at(
        self,
        instrumentator: &Instrumentator,
        endpoint: &str,
    ) -> Result<Self, RegistryError>;
}

impl<S> InstrumentedRouter for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_instrumentation(self, instrumentator: &Instrumentator) -> Result<Self, RegistryError> {
        self.with_instrumentation_at(instrumentator, "/metrics")
    }

    fn with_instrumentation_at(
        self,
        instrumentator: &Instrumentator,
        endpoint: &str,
    ) -> Result<Self, RegistryError> {
        Ok(instrumentator.expose(instrumentator.instrument(self)?, endpoint))
    }
}
