//! Registry counters, named `dns_<component>_<what>`.

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

fn counter(name: &str, help: &str) -> Counter {
    Counter::new(name, help).expect("valid counter name")
}

fn labelled(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    CounterVec::new(Opts::new(name, help), labels).expect("valid counter name")
}

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // registrar

    pub static ref REGISTRATIONS: Counter = counter(
        "dns_registrar_registrations_total",
        "Registrations forwarded to a domain record",
    );
    /// Labels: `contract` (registrar, record, wallet), `exit_code`.
    pub static ref REJECTIONS: CounterVec = labelled(
        "dns_contract_rejections_total",
        "Messages a contract refused",
        &["contract", "exit_code"],
    );

    // record

    pub static ref BIDS: Counter = counter("dns_record_bids_total", "Accepted auction bids");
    pub static ref AUCTIONS_SETTLED: Counter = counter(
        "dns_record_auctions_settled_total",
        "Auctions turned into ownership",
    );
    pub static ref RELEASES: Counter = counter(
        "dns_record_releases_total",
        "Stale domains put back up for auction",
    );

    // resolution

    /// Label `outcome`: found, missing or error.
    pub static ref RESOLUTIONS: CounterVec = labelled(
        "dns_resolutions_total",
        "Name lookups",
        &["outcome"],
    );

    // sandbox host

    pub static ref TRANSACTIONS: Counter = counter(
        "dns_host_transactions_total",
        "Transactions executed by the sandbox",
    );
    pub static ref ACCOUNTS: Gauge =
        Gauge::new("dns_host_accounts", "Accounts alive in the sandbox").expect("valid gauge name");
}

/// Proof that the collectors went into [`REGISTRY`].
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    collectors: usize,
}

impl MetricsHandle {
    #[must_use]
    pub fn collectors(&self) -> usize {
        self.collectors
    }
}

fn collectors() -> [Box<dyn Collector>; 8] {
    [
        Box::new(REGISTRATIONS.clone()),
        Box::new(REJECTIONS.clone()),
        Box::new(BIDS.clone()),
        Box::new(AUCTIONS_SETTLED.clone()),
        Box::new(RELEASES.clone()),
        Box::new(RESOLUTIONS.clone()),
        Box::new(TRANSACTIONS.clone()),
        Box::new(ACCOUNTS.clone()),
    ]
}

/// Adds every registry metric to [`REGISTRY`].
///
/// # Errors
///
/// `TelemetryError::MetricsInit` if they were registered before.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let all = collectors();
    let count = all.len();
    for collector in all {
        REGISTRY
            .register(collector)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(MetricsHandle { collectors: count })
}

/// Renders [`REGISTRY`] in the Prometheus text exposition format.
///
/// # Errors
///
/// `TelemetryError::MetricsInit` if encoding fails.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let mut out = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut out)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(out).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
