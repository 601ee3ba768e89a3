//! # Registry Configuration
//!
//! Protocol parameters shared by the registrar, every domain record and the
//! host. Defaults are the mainnet values.

use serde::{Deserialize, Serialize};
use shared_types::{Coins, UnixTime};
use std::env;

/// Protocol parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Workchain every contract is deployed in.
    pub workchain: i8,
    /// Registrations are refused until strictly after this time.
    pub auction_epoch: UnixTime,
    /// Length of a fresh auction in seconds.
    pub auction_duration: u64,
    /// A bid this close to the end pushes the end out to `now` plus this.
    pub auction_prolongation: u64,
    /// Inactivity after which an owned domain may be released.
    pub renewal_window: u64,
    /// Balance a record always keeps back.
    pub storage_reserve: Coins,
    /// Funds each named sandbox treasury starts with.
    pub treasury_funding: Coins,
}

/// Mainnet auction epoch (2022-07-30 09:00 UTC).
pub const DEFAULT_AUCTION_EPOCH: UnixTime = 1_659_171_600;

/// One pricing month: 30 days.
pub const PRICE_MONTH: u64 = 2_592_000;

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            workchain: 0,
            auction_epoch: DEFAULT_AUCTION_EPOCH,
            auction_duration: 604_800,
            auction_prolongation: 3_600,
            renewal_window: 31_622_400,
            storage_reserve: Coins::from_coins(1),
            treasury_funding: Coins::from_coins(1_000_000),
        }
    }
}

impl RegistryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DNS_WORKCHAIN`: Workchain id (default: 0)
    /// - `DNS_AUCTION_EPOCH`: Auction epoch, unix seconds (default: 1659171600)
    /// - `DNS_AUCTION_DURATION`: Auction length, seconds (default: 604800)
    /// - `DNS_AUCTION_PROLONGATION`: Late-bid extension, seconds (default: 3600)
    /// - `DNS_RENEWAL_WINDOW`: Inactivity before release, seconds (default: 31622400)
    /// - `DNS_STORAGE_RESERVE`: Reserve kept by records, coins (default: 1)
    /// - `DNS_TREASURY_FUNDING`: Sandbox treasury funding, coins (default: 1000000)
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            workchain: parse_var("DNS_WORKCHAIN").unwrap_or(defaults.workchain),
            auction_epoch: parse_var("DNS_AUCTION_EPOCH").unwrap_or(defaults.auction_epoch),
            auction_duration: parse_var("DNS_AUCTION_DURATION")
                .unwrap_or(defaults.auction_duration),
            auction_prolongation: parse_var("DNS_AUCTION_PROLONGATION")
                .unwrap_or(defaults.auction_prolongation),
            renewal_window: parse_var("DNS_RENEWAL_WINDOW").unwrap_or(defaults.renewal_window),
            storage_reserve: coins_var("DNS_STORAGE_RESERVE").unwrap_or(defaults.storage_reserve),
            treasury_funding: coins_var("DNS_TREASURY_FUNDING")
                .unwrap_or(defaults.treasury_funding),
        }
    }

    /// Override the auction epoch.
    #[must_use]
    pub fn with_auction_epoch(mut self, epoch: UnixTime) -> Self {
        self.auction_epoch = epoch;
        self
    }

    /// Override the renewal window.
    #[must_use]
    pub fn with_renewal_window(mut self, seconds: u64) -> Self {
        self.renewal_window = seconds;
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn coins_var(name: &str) -> Option<Coins> {
    env::var(name)
        .ok()
        .and_then(|v| Coins::parse_coins(v.trim()).ok())
}
