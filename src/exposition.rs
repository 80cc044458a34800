//! HTTP endpoint serving the registry snapshot for Prometheus scrapes.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::MetricsError;

pub const EXPOSITION_PATH: &str = "/monitor/prometheus";

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// A running exposition endpoint.
#[derive(Debug)]
pub struct Exposition {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl Exposition {
    /// Address actually bound, useful when the requested port was 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Router answering `GET /monitor/prometheus` from `handle`.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route(EXPOSITION_PATH, get(scrape))
        .with_state(handle)
}

async fn scrape(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], handle.render())
}

pub(crate) async fn spawn(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<Exposition, MetricsError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| MetricsError::Bind { addr, source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| MetricsError::Bind { addr, source })?;

    tracing::info!(addr = %local_addr, path = EXPOSITION_PATH, "metrics endpoint listening");

    let app = router(handle.clone());
    let task = tokio::spawn(async move {
        tokio::select! {
            result = axum::serve(listener, app).into_future() => {
                if let Err(err) = result {
                    tracing::error!(error = %err, addr = %local_addr, "metrics endpoint stopped");
                }
            }
            _ = run_upkeep(handle) => {}
        }
    });

    Ok(Exposition { local_addr, task })
}

async fn run_upkeep(handle: PrometheusHandle) {
    let mut interval = tokio::time::interval(UPKEEP_INTERVAL);
    loop {
        interval.tick().await;
        handle.run_upkeep();
    }
}
