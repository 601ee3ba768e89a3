//! # Core Domain Entities
//!
//! Value types shared by every crate in the workspace.
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `Hash`
//! - **Money**: `Coins`
//! - **Time**: `UnixTime`, `LogicalTime`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::errors::{AddressError, AmountError};

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Seconds since the Unix epoch.
pub type UnixTime = u64;

/// Monotonic per-host logical time.
pub type LogicalTime = u64;

/// Number of nanocoins in one whole coin.
pub const NANOS_PER_COIN: u128 = 1_000_000_000;

// =============================================================================
// ADDRESS
// =============================================================================

/// A standard internal account address: a workchain id plus a 256-bit
/// account hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address {
    /// Workchain identifier (0 for the basechain, -1 for the masterchain).
    pub workchain: i8,
    /// Account id, the hash of the account's initial state.
    pub hash: Hash,
}

impl Address {
    /// The all-zero basechain address.
    pub const ZERO: Self = Self {
        workchain: 0,
        hash: [0u8; 32],
    };

    /// Creates an address from its parts.
    #[must_use]
    pub const fn new(workchain: i8, hash: Hash) -> Self {
        Self { workchain, hash }
    }

    /// Creates an address from a hash slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(workchain: i8, slice: &[u8]) -> Option<Self> {
        let hash: Hash = slice.try_into().ok()?;
        Some(Self { workchain, hash })
    }

    /// Account id as a 256-bit integer.
    #[must_use]
    pub fn hash_u256(&self) -> U256 {
        U256::from_big_endian(&self.hash)
    }

    /// Raw `workchain:hex` representation.
    #[must_use]
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wc, hash) = s
            .split_once(':')
            .ok_or_else(|| AddressError::InvalidFormat(s.to_string()))?;
        let workchain = wc
            .parse::<i8>()
            .map_err(|_| AddressError::InvalidWorkchain(wc.to_string()))?;
        let bytes = hex::decode(hash).map_err(|e| AddressError::InvalidHash(e.to_string()))?;
        Self::from_slice(workchain, &bytes)
            .ok_or_else(|| AddressError::InvalidHash(format!("expected 32 bytes, got {}", bytes.len())))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(&self.hash[..4]))?;
        write!(f, "..")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw())
    }
}

// =============================================================================
// COINS
// =============================================================================

/// An amount of the native currency, in nanocoins.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Coins(pub u128);

impl Coins {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Largest amount representable on the wire (120 bits).
    pub const MAX: Self = Self((1u128 << 120) - 1);

    /// Amount from raw nanocoins.
    #[must_use]
    pub const fn from_nanos(nanos: u128) -> Self {
        Self(nanos)
    }

    /// Amount from whole coins.
    #[must_use]
    pub const fn from_coins(coins: u64) -> Self {
        Self(coins as u128 * NANOS_PER_COIN)
    }

    /// Raw nanocoins.
    #[must_use]
    pub const fn nanos(self) -> u128 {
        self.0
    }

    /// Returns true for a zero amount.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Subtraction clamped at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Parses a decimal coin amount such as `"1.1"` or `"1000"`.
    ///
    /// # Errors
    ///
    /// Returns `AmountError` for malformed input, more than nine decimals,
    /// or an amount that does not fit on the wire.
    pub fn parse_coins(s: &str) -> Result<Self, AmountError> {
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if frac.len() > 9 {
            return Err(AmountError::TooPrecise(s.to_string()));
        }
        let parse = |digits: &str| -> Result<u128, AmountError> {
            if digits.is_empty() {
                return Ok(0);
            }
            if !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AmountError::Malformed(s.to_string()));
            }
            digits
                .parse::<u128>()
                .map_err(|_| AmountError::Overflow(s.to_string()))
        };
        let whole = parse(whole)?;
        let frac = parse(frac)? * 10u128.pow(9 - u32::try_from(frac.len()).unwrap_or(9));
        let nanos = whole
            .checked_mul(NANOS_PER_COIN)
            .and_then(|n| n.checked_add(frac))
            .filter(|n| *n <= Self::MAX.0)
            .ok_or_else(|| AmountError::Overflow(s.to_string()))?;
        Ok(Self(nanos))
    }
}

impl Add for Coins {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Coins {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Coins {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Debug for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coins({self})")
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / NANOS_PER_COIN;
        let frac = self.0 % NANOS_PER_COIN;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{frac:09}");
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
