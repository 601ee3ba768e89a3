//! Telemetry settings, read from `DNS_*` environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// How log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, coloured lines.
    Pretty,
    /// One JSON object per event, with file and line.
    Json,
    /// Filter installed, nothing written.
    Silent,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "silent" | "off" | "none" => Some(Self::Silent),
            _ => None,
        }
    }
}

/// Settings for the log subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Attached to the startup event and the shutdown event.
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info` or `dns_02_registry=debug`.
    pub log_filter: String,

    pub format: LogFormat,

    /// Which network the registry is serving (mainnet, testnet, sandbox).
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "ton-dns".into(),
            log_filter: "info".into(),
            format: LogFormat::Pretty,
            network: "sandbox".into(),
        }
    }
}

impl TelemetryConfig {
    /// Reads `DNS_SERVICE_NAME`, `DNS_LOG_LEVEL` (falling back to
    /// `RUST_LOG`), `DNS_LOG_FORMAT` and `DNS_NETWORK`.
    ///
    /// An unrecognised `DNS_LOG_FORMAT` keeps the default, which is JSON
    /// inside a Kubernetes pod and pretty elsewhere.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let in_cluster = env::var_os("KUBERNETES_SERVICE_HOST").is_some();
        let fallback_format = if in_cluster {
            LogFormat::Json
        } else {
            defaults.format
        };

        Self {
            service_name: env::var("DNS_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_filter: env::var("DNS_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_filter),
            format: env::var("DNS_LOG_FORMAT")
                .ok()
                .and_then(|raw| LogFormat::parse(&raw))
                .unwrap_or(fallback_format),
            network: env::var("DNS_NETWORK").unwrap_or(defaults.network),
        }
    }

    /// Same settings with the service name suffixed by `component`.
    #[must_use]
    pub fn named(mut self, component: &str) -> Self {
        self.service_name = format!("{}-{component}", self.service_name);
        self
    }
}
