//! Global subscriber: an `EnvFilter` and at most one formatting layer.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogFormat;
use crate::{TelemetryConfig, TelemetryError};

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn output_layer(format: LogFormat) -> Option<BoxedLayer> {
    match format {
        LogFormat::Silent => None,
        LogFormat::Pretty => Some(fmt::layer().with_target(true).compact().boxed()),
        LogFormat::Json => Some(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        ),
    }
}

/// Installs the subscriber described by `config` as the process default.
///
/// # Errors
///
/// `TelemetryError::Config` for a bad filter directive,
/// `TelemetryError::TracerInit` when a subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|e| TelemetryError::Config(format!("{}: {e}", config.log_filter)))?;

    tracing_subscriber::registry()
        .with(output_layer(config.format))
        .with(filter)
        .try_init()
        .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        network = %config.network,
        format = ?config.format,
        "logging ready"
    );
    Ok(())
}
