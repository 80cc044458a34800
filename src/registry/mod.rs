use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use dashmap::DashMap;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use crate::error::MetricsError;
use crate::exposition::{self, Exposition};

mod dynamic;
mod http;
pub mod vec;

pub use http::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUESTS_IN_FLIGHT, CLIENT_REQUESTS_TOTAL, InFlightGuard,
    SERVER_REQUEST_DURATION, SERVER_REQUESTS_IN_FLIGHT, SERVER_REQUESTS_TOTAL,
};

use http::HttpInstruments;

/// Histogram buckets in seconds, matching the Prometheus client defaults.
pub const DURATION_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Handle to a set of HTTP request instruments and on-demand counters.
///
/// Cloning is cheap; every clone records into the same recorder.
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    app_name: String,
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
    http: HttpInstruments,
    /// Metric name -> label keys, sorted ascending, fixed at first use.
    dynamic: DashMap<String, Arc<[String]>>,
}

impl MetricsRegistry {
    /// Build a registry with its own recorder and declare the fixed instruments.
    pub fn new(app_name: impl Into<String>) -> Result<Self, MetricsError> {
        let app_name = app_name.into();
        let recorder = Arc::new(
            PrometheusBuilder::new()
                .set_buckets(&DURATION_BUCKETS)?
                .build_recorder(),
        );
        let handle = recorder.handle();
        let http = HttpInstruments::new(&recorder, &app_name);

        tracing::debug!(app_name = %app_name, "metrics registry created");

        Ok(Self {
            inner: Arc::new(Inner {
                app_name,
                recorder,
                handle,
                http,
                dynamic: DashMap::new(),
            }),
        })
    }

    /// Build a registry and serve it on `0.0.0.0:port`.
    pub async fn start(
        app_name: impl Into<String>,
        port: u16,
    ) -> Result<(Self, Exposition), MetricsError> {
        let registry = Self::new(app_name)?;
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let exposition = registry.listen_and_serve(addr).await?;
        Ok((registry, exposition))
    }

    /// Bind `addr` and serve the exposition endpoint from a background task.
    ///
    /// Bind failures are returned. Failures after the listener is up are
    /// only logged.
    pub async fn listen_and_serve(&self, addr: SocketAddr) -> Result<Exposition, MetricsError> {
        exposition::spawn(addr, self.handle()).await
    }

    /// Current snapshot in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.inner.handle.render()
    }

    pub fn handle(&self) -> PrometheusHandle {
        self.inner.handle.clone()
    }

    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("app_name", &self.inner.app_name)
            .field("dynamic_counters", &self.inner.dynamic.len())
            .finish()
    }
}
