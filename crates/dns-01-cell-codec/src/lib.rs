//! # DNS-01 Cell Codec - Binary Cell Model
//!
//! **Subsystem ID:** 1
//!
//! ## Purpose
//!
//! Implements the bit-level cell model every other subsystem stores and
//! exchanges data in: bounded bit strings with up to four child references,
//! content-addressed by a 256-bit representation hash.
//!
//! ## Cell Limits
//!
//! | Limit | Value | Violation |
//! |-------|-------|-----------|
//! | Data bits per cell | 1023 | `CellError::BitOverflow` (exit 8) |
//! | References per cell | 4 | `CellError::RefOverflow` (exit 8) |
//! | Read past end | - | `CellError::BitUnderflow` / `RefUnderflow` (exit 9) |
//! | Integer wider than field | - | `CellError::IntegerOutOfRange` (exit 5) |
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Cell | `domain/cell.rs` | Immutable node with cached hash and depth |
//! | Builder | `domain/builder.rs` | Append-only writer (ints, coins, addresses, string tails) |
//! | Slice | `domain/slice.rs` | Read cursor with underflow checks |
//! | Dictionary | `domain/dictionary.rs` | Fixed-width-key Patricia tree (`HashmapE`) |
//! | State init | `domain/state_init.rs` | Code + data, contract address derivation |
//! | Bag of cells | `domain/boc.rs` | Flat byte serialization |
//!
//! ## Usage Example
//!
//! ```ignore
//! use dns_01_cell_codec::prelude::*;
//!
//! let mut b = CellBuilder::new();
//! b.store_uint(0, 8)?.store_bytes(b"alice")?;
//! let cell = b.build()?;
//! let index = cell.hash_u256();
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod domain;
pub mod errors;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::{
        contract_address, deserialize_boc, serialize_boc, Cell, CellBuilder, CellSlice,
        Dictionary, StateInit, MAX_BITS, MAX_REFS,
    };
    pub use crate::errors::{
        CellError, EXIT_CELL_OVERFLOW, EXIT_CELL_UNDERFLOW, EXIT_RANGE_CHECK,
    };
}

pub use domain::{Cell, CellBuilder, CellSlice, Dictionary, StateInit};
pub use errors::CellError;

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 1;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Cell Codec";

// =============================================================================
// TESTS
// =============================================================================
