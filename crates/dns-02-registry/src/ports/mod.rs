//! Ports: the contract handler and service API the registry offers, and
//! the override table it depends on.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
