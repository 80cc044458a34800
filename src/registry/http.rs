use std::sync::Arc;
use std::time::Duration;

use metrics::Gauge;
use metrics_exporter_prometheus::PrometheusRecorder;

use super::MetricsRegistry;
use super::vec::{CounterVec, GaugeVec, HistogramVec};

pub const SERVER_REQUESTS_TOTAL: &str = "server_http_requests_total";
pub const SERVER_REQUEST_DURATION: &str = "server_http_request_duration_seconds";
pub const SERVER_REQUESTS_IN_FLIGHT: &str = "server_http_requests_in_flight";
pub const CLIENT_REQUESTS_TOTAL: &str = "client_http_requests_total";
pub const CLIENT_REQUEST_DURATION: &str = "client_http_request_duration_seconds";
pub const CLIENT_REQUESTS_IN_FLIGHT: &str = "client_http_requests_in_flight";

const HISTOGRAM_SUFFIXES: [&str; 3] = ["_bucket", "_sum", "_count"];

/// Whether `name` would render into one of the fixed instrument families.
pub(super) fn is_reserved(name: &str) -> bool {
    let plain = [
        SERVER_REQUESTS_TOTAL,
        SERVER_REQUESTS_IN_FLIGHT,
        CLIENT_REQUESTS_TOTAL,
        CLIENT_REQUESTS_IN_FLIGHT,
    ];
    if plain.contains(&name) {
        return true;
    }
    [SERVER_REQUEST_DURATION, CLIENT_REQUEST_DURATION]
        .iter()
        .any(|histogram| {
            name.strip_prefix(histogram)
                .is_some_and(|rest| rest.is_empty() || HISTOGRAM_SUFFIXES.contains(&rest))
        })
}

/// The six instruments declared for every registry.
pub(super) struct HttpInstruments {
    server_requests: CounterVec<1>,
    server_duration: HistogramVec<2>,
    server_in_flight: GaugeVec<1>,
    client_requests: CounterVec<1>,
    client_duration: HistogramVec<2>,
    client_in_flight: GaugeVec<1>,
}

impl HttpInstruments {
    pub(super) fn new(recorder: &Arc<PrometheusRecorder>, app_name: &str) -> Self {
        Self {
            server_requests: CounterVec::new(
                Arc::clone(recorder),
                SERVER_REQUESTS_TOTAL,
                "Total HTTP requests handled by the server.",
                ["path"],
            )
            .with_const_label("app_name", app_name),
            server_duration: HistogramVec::new(
                Arc::clone(recorder),
                SERVER_REQUEST_DURATION,
                "Duration of HTTP requests handled by the server.",
                ["path", "status"],
            ),
            server_in_flight: GaugeVec::new(
                Arc::clone(recorder),
                SERVER_REQUESTS_IN_FLIGHT,
                "HTTP requests currently being handled by the server.",
                ["path"],
            ),
            client_requests: CounterVec::new(
                Arc::clone(recorder),
                CLIENT_REQUESTS_TOTAL,
                "Total HTTP requests issued by the client.",
                ["url"],
            ),
            client_duration: HistogramVec::new(
                Arc::clone(recorder),
                CLIENT_REQUEST_DURATION,
                "Duration of HTTP requests issued by the client.",
                ["url", "status"],
            ),
            client_in_flight: GaugeVec::new(
                Arc::clone(recorder),
                CLIENT_REQUESTS_IN_FLIGHT,
                "HTTP requests issued by the client and still awaiting a response.",
                ["url"],
            ),
        }
    }
}

/// Keeps an in-flight gauge incremented until dropped.
#[must_use = "the in-flight gauge is decremented as soon as the guard is dropped"]
pub struct InFlightGuard {
    gauge: Gauge,
}

impl InFlightGuard {
    fn new(gauge: Gauge) -> Self {
        gauge.increment(1.0);
        Self { gauge }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.decrement(1.0);
    }
}

impl MetricsRegistry {
    fn http(&self) -> &HttpInstruments {
        &self.inner.http
    }

    pub fn http_server_counter(&self, path: &str) {
        self.http()
            .server_requests
            .with_label_values([path])
            .increment(1);
    }

    /// Observe a server request duration, stored in seconds.
    pub fn http_server_duration(&self, path: &str, status: &str, cost: Duration) {
        self.http()
            .server_duration
            .with_label_values([path, status])
            .record(cost.as_secs_f64());
    }

    pub fn http_server_in_flight_increment(&self, path: &str) {
        self.http()
            .server_in_flight
            .with_label_values([path])
            .increment(1.0);
    }

    pub fn http_server_in_flight_decrement(&self, path: &str) {
        self.http()
            .server_in_flight
            .with_label_values([path])
            .decrement(1.0);
    }

    /// Count `path` as in flight until the returned guard is dropped.
    pub fn track_server_in_flight(&self, path: &str) -> InFlightGuard {
        InFlightGuard::new(self.http().server_in_flight.with_label_values([path]))
    }

    pub fn http_client_counter(&self, url: &str) {
        self.http()
            .client_requests
            .with_label_values([url])
            .increment(1);
    }

    /// Observe a client request duration, stored in seconds.
    pub fn http_client_duration(&self, url: &str, status: &str, cost: Duration) {
        self.http()
            .client_duration
            .with_label_values([url, status])
            .record(cost.as_secs_f64());
    }

    pub fn http_client_in_flight_increment(&self, url: &str) {
        self.http()
            .client_in_flight
            .with_label_values([url])
            .increment(1.0);
    }

    pub fn http_client_in_flight_decrement(&self, url: &str) {
        self.http()
            .client_in_flight
            .with_label_values([url])
            .decrement(1.0);
    }

    pub fn track_client_in_flight(&self, url: &str) -> InFlightGuard {
        InFlightGuard::new(self.http().client_in_flight.with_label_values([url]))
    }
}
