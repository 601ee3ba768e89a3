//! # Shared Types Crate
//!
//! This crate contains the primitives every other crate in the workspace
//! speaks: account addresses, coin amounts and 256-bit hashes.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Cross-crate value types are defined here.
//! - **Raw Addresses Only**: Addresses render as `workchain:hex`; user-friendly
//!   base64 forms are a presentation concern outside this workspace.
//! - **Integer Money**: Amounts are counted in nanocoins, never floats.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
