//! Prometheus instrumentation for HTTP clients and servers.
//!
//! A [`MetricsRegistry`] owns a private Prometheus recorder holding the six
//! request instruments plus any counters created on demand through
//! [`MetricsRegistry::inc_counter`]. [`MetricsRegistry::start`] additionally
//! serves the snapshot on `/monitor/prometheus`.

pub mod error;
pub mod exposition;
pub mod registry;

pub use error::MetricsError;
pub use exposition::{CONTENT_TYPE, EXPOSITION_PATH, Exposition};
pub use registry::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUESTS_IN_FLIGHT, CLIENT_REQUESTS_TOTAL, InFlightGuard,
    MetricsRegistry, SERVER_REQUEST_DURATION, SERVER_REQUESTS_IN_FLIGHT, SERVER_REQUESTS_TOTAL,
};
