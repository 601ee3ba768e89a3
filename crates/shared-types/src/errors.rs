//! # Error Types
//!
//! Parsing errors for the shared value types.

use thiserror::Error;

/// Errors raised while parsing a raw address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Input is not of the form `workchain:hash`.
    #[error("Invalid address format: {0}")]
    InvalidFormat(String),

    /// Workchain part is not an 8-bit signed integer.
    #[error("Invalid workchain: {0}")]
    InvalidWorkchain(String),

    /// Hash part is not 32 bytes of hex.
    #[error("Invalid account hash: {0}")]
    InvalidHash(String),
}

/// Errors raised while parsing a coin amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Not a decimal number.
    #[error("Malformed amount: {0}")]
    Malformed(String),

    /// More than nine fractional digits.
    #[error("Amount has more than 9 decimals: {0}")]
    TooPrecise(String),

    /// Does not fit in 120 bits of nanocoins.
    #[error("Amount out of range: {0}")]
    Overflow(String),
}
