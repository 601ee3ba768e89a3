//! # Pricing Engine
//!
//! Minimum payment for a name: a base price by length, decayed by 10% for
//! every elapsed 30-day month since the auction epoch (at most 24 months),
//! never below the length's floor. All arithmetic is integer nanocoins.

use crate::config::{RegistryConfig, PRICE_MONTH};
use shared_types::{Coins, UnixTime};

/// Months after which the price stops decaying.
pub const MAX_DECAY_MONTHS: u64 = 24;

/// Price before any decay.
#[must_use]
pub fn base_price(len: usize) -> Coins {
    let coins = match len {
        0..=4 => 1000,
        5 => 500,
        6 => 400,
        7 => 300,
        8 => 200,
        9 => 100,
        10 => 50,
        _ => 10,
    };
    Coins::from_coins(coins)
}

/// Lowest price the decay can reach.
#[must_use]
pub fn floor_price(len: usize) -> Coins {
    if len >= 11 {
        // 1.1 coins, not a tenth of the base
        Coins::from_nanos(1_100_000_000)
    } else {
        Coins::from_nanos(base_price(len).nanos() / 10)
    }
}

/// Whole pricing months elapsed since the epoch, capped.
#[must_use]
pub fn elapsed_months(now: UnixTime, config: &RegistryConfig) -> u64 {
    (now.saturating_sub(config.auction_epoch) / PRICE_MONTH).min(MAX_DECAY_MONTHS)
}

/// Minimum payment for a name of `len` bytes at time `now`.
#[must_use]
pub fn min_price(len: usize, now: UnixTime, config: &RegistryConfig) -> Coins {
    let mut price = base_price(len).nanos();
    for _ in 0..elapsed_months(now, config) {
        price = price * 90 / 100;
    }
    Coins::from_nanos(price).max(floor_price(len))
}
