//! Adapters: the in-memory network host and the override table.

pub mod override_table;
pub mod sandbox;

pub use override_table::*;
pub use sandbox::*;
