use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Initialize structured logging with a reasonable default filter.
pub fn init_tracing() -> Result<(), SetGlobalDefaultError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tokio=info,http_monitor=debug"));

    let subscriber = Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true));

    tracing::subscriber::set_global_default(subscriber)
}
