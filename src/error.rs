use std::io;
use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The label keys differ from the set fixed when the counter was created.
    #[error("labels for counter `{name}` must be exactly {expected:?}")]
    LabelMismatch { name: String, expected: Vec<String> },

    /// The name belongs to one of the fixed HTTP instruments.
    #[error("counter name `{0}` is reserved by a built-in instrument")]
    ReservedName(String),

    #[error("failed to bind metrics listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to build prometheus recorder: {0}")]
    Build(#[from] BuildError),
}
