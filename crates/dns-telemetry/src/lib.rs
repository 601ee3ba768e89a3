//! # dns-telemetry
//!
//! Logging and Prometheus counters shared by the registry crates.
//!
//! ```rust,ignore
//! let _telemetry = dns_telemetry::init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `DNS_SERVICE_NAME` | `ton-dns` | Name on the startup event |
//! | `DNS_LOG_LEVEL`, then `RUST_LOG` | `info` | `EnvFilter` directive |
//! | `DNS_LOG_FORMAT` | `pretty` (`json` in a pod) | `pretty`, `json` or `silent` |
//! | `DNS_NETWORK` | `sandbox` | Network the registry serves |

#![warn(clippy::all)]

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::{LogFormat, TelemetryConfig};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ACCOUNTS, AUCTIONS_SETTLED, BIDS,
    REGISTRATIONS, REJECTIONS, RELEASES, RESOLUTIONS, TRANSACTIONS,
};
pub use tracing_setup::init_tracing;

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("tracing subscriber: {0}")]
    TracerInit(String),

    #[error("prometheus: {0}")]
    MetricsInit(String),

    #[error("bad telemetry setting: {0}")]
    Config(String),
}

/// Keeps metrics registered; logs the shutdown when dropped.
pub struct TelemetryGuard {
    service_name: String,
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    /// Number of collectors registered at startup.
    #[must_use]
    pub fn collectors(&self) -> usize {
        self.metrics.collectors()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "telemetry stopped");
    }
}

/// Registers the registry metrics and installs the log subscriber.
///
/// # Errors
///
/// Fails when called twice in one process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
        metrics,
    })
}
