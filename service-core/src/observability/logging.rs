use crate::config::LogFormat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` wins over `log_level` when set.
///
/// Returns an error instead of panicking when a subscriber is already
/// installed, so test binaries can call it more than once.
pub fn init_tracing(
    service_name: &str,
    log_level: &str,
    format: LogFormat,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .flatten_event(true),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?,
    }

    tracing::info!(service = service_name, "Tracing initialized");
    Ok(())
}
