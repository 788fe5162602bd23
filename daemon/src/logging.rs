/// Logging configuration using tracing
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// Logs go to stderr. The level is controlled by the `ABYSSA_LOG` environment
/// variable.
///
/// # Examples
/// ```bash
/// ABYSSA_LOG=debug abyssa daemon
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_env("ABYSSA_LOG").unwrap_or_else(|_| EnvFilter::new("abyssa=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();
}
