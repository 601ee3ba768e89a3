//! Cross-contract flows over the sandbox network.

pub mod auction;
pub mod batch;
pub mod codec;
pub mod conservation;
pub mod overrides;
pub mod ownership;
pub mod registration_flow;
pub mod resolution;

#[cfg(test)]
pub(crate) mod harness;
