//! # Domain Layer
//!
//! Pure cell data structures and their serializations.
//! No I/O and no async.

pub mod boc;
pub mod builder;
pub mod cell;
pub mod dictionary;
pub mod slice;
pub mod state_init;

pub use boc::{deserialize_boc, serialize_boc, BOC_MAGIC};
pub use builder::CellBuilder;
pub use cell::{Cell, MAX_BITS, MAX_REFS};
pub use dictionary::{Dictionary, MAX_DICT_NODES};
pub use slice::CellSlice;
pub use state_init::{contract_address, StateInit};
