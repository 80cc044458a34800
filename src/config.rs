use clap::Parser;

/// CLI configuration for the standalone monitor process.
#[derive(Debug, Clone, Parser)]
pub struct Config {
    /// Value of the constant `app_name` label on the server request counter
    #[arg(long, env = "MONITOR_APP_NAME", default_value = "http-monitor")]
    pub app_name: String,

    /// Port serving /monitor/prometheus on all interfaces
    #[arg(long, env = "MONITOR_PORT", default_value_t = 9100)]
    pub port: u16,
}

impl Config {
    pub fn from_args() -> Self {
        Self::parse()
    }
}
