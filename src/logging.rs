use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter directive.
pub const ENV_LOG: &str = "PERFTRACK_LOG";

/// Initialize tracing with the PERFTRACK_LOG environment variable.
///
/// Defaults to "info" level if PERFTRACK_LOG is not set. Log lines go to
/// stderr so command output on stdout stays clean.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(ENV_LOG)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
