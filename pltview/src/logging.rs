use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PLTVIEW_LOG";

/// Stderr logging, silent below `warn` unless `PLTVIEW_LOG` asks for more.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
