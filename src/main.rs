mod config;
mod observability;

use std::process::ExitCode;

use http_monitor::{EXPOSITION_PATH, MetricsRegistry};

#[tokio::main]
async fn main() -> ExitCode {
    let config = config::Config::from_args();

    if let Err(err) = observability::init_tracing() {
        eprintln!("failed to install tracing subscriber: {err}");
        return ExitCode::FAILURE;
    }

    let (_registry, exposition) = match MetricsRegistry::start(config.app_name, config.port).await
    {
        Ok(started) => started,
        Err(err) => {
            tracing::error!(error = %err, "failed to start metrics registry");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        addr = %exposition.local_addr(),
        path = EXPOSITION_PATH,
        "monitor running, press Ctrl-C to stop"
    );

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return ExitCode::FAILURE;
    }

    exposition.abort();
    tracing::info!("monitor stopped");
    ExitCode::SUCCESS
}
