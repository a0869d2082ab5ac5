//! Prometheus request counter/histogram (SPEC_FULL.md §4.12), grounded in
//! the `agentgateway` pack example's `Metrics::new(&mut registry)` shape
//! (a struct of `Family`/`Histogram` fields registered once at
//! construction, read back out through `prometheus_client::encoding`).

use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

/// Labels distinguishing one route+status combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct RequestLabels {
    /// Route path template, e.g. `/auth-with-password`.
    pub route: String,
    /// HTTP status code as text, e.g. `"200"`.
    pub status: String,
}

/// Process-wide request counter and duration histogram.
pub struct Metrics {
    requests_total: Family<RequestLabels, Counter>,
    request_duration_seconds: Histogram,
    registry: Registry,
}

impl Metrics {
    /// Registers both metrics against a fresh [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "auth_backend_requests_total",
            "Total HTTP requests by route and status",
            requests_total.clone(),
        );
        let request_duration_seconds = Histogram::new(
            [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0].into_iter(),
        );
        registry.register(
            "auth_backend_request_duration_seconds",
            "HTTP request duration in seconds",
            request_duration_seconds.clone(),
        );
        Self {
            requests_total,
            request_duration_seconds,
            registry,
        }
    }

    /// Records one completed request.
    pub fn observe(&self, route: &str, status: u16, duration_secs: f64) {
        self.requests_total
            .get_or_create(&RequestLabels {
                route: route.to_string(),
                status: status.to_string(),
            })
            .inc();
        self.request_duration_seconds.observe(duration_secs);
    }

    /// Renders the current registry as Prometheus text exposition.
    ///
    /// # Errors
    /// Returns an error only if the underlying encoder fails to write
    /// (never expected for an in-memory buffer).
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
