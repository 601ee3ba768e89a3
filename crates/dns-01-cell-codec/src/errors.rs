//! # Error Types
//!
//! All error types for cell construction and parsing.

use thiserror::Error;

/// Exit code raised by the host when a builder overflows.
pub const EXIT_CELL_OVERFLOW: u32 = 8;

/// Exit code raised by the host when a slice is read past its end.
pub const EXIT_CELL_UNDERFLOW: u32 = 9;

/// Exit code raised for an integer that does not fit its field.
pub const EXIT_RANGE_CHECK: u32 = 5;

// =============================================================================
// CELL ERRORS
// =============================================================================

/// Errors that can occur while building, reading or serializing cells.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellError {
    /// Writing would exceed the 1023-bit payload limit.
    #[error("cell overflow: {requested} bits requested, {available} available")]
    BitOverflow { requested: usize, available: usize },

    /// Writing would exceed the 4-reference limit.
    #[error("cell overflow: reference limit of 4 reached")]
    RefOverflow,

    /// Reading past the end of the payload.
    #[error("cell underflow: {requested} bits requested, {available} available")]
    BitUnderflow { requested: usize, available: usize },

    /// Reading a reference that does not exist.
    #[error("cell underflow: no reference left")]
    RefUnderflow,

    /// Integer does not fit in the requested width.
    #[error("integer out of range for {bits}-bit field")]
    IntegerOutOfRange { bits: usize },

    /// Address prefix is neither `addr_none` nor `addr_std`.
    #[error("unsupported address tag: {0:#04b}")]
    UnsupportedAddress(u8),

    /// Dictionary key wider than the dictionary allows.
    #[error("dictionary key does not fit in {key_bits} bits")]
    KeyOutOfRange { key_bits: usize },

    /// Malformed dictionary structure.
    #[error("invalid dictionary: {0}")]
    InvalidDictionary(String),

    /// Malformed bag of cells.
    #[error("invalid bag of cells: {0}")]
    InvalidBoc(String),

    /// Malformed state init.
    #[error("invalid state init: {0}")]
    InvalidStateInit(String),
}

impl CellError {
    /// Host exit code this error surfaces as.
    #[must_use]
    pub fn exit_code(&self) -> u32 {
        match self {
            Self::BitOverflow { .. } | Self::RefOverflow => EXIT_CELL_OVERFLOW,
            Self::IntegerOutOfRange { .. } | Self::KeyOutOfRange { .. } => EXIT_RANGE_CHECK,
            _ => EXIT_CELL_UNDERFLOW,
        }
    }

    /// Returns true if this error came from writing too much data.
    #[must_use]
    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::BitOverflow { .. } | Self::RefOverflow)
    }
}
