//! # Outbound Ports
//!
//! What the contracts need from the network they run on.

use dns_01_cell_codec::Cell;
use shared_types::U256;

/// Network-wide table of forced decisions, keyed by record index.
///
/// Values start with an 8-bit decision tag (see `OverrideDecision`).
/// Implementations must be readable from many transactions at once.
pub trait OverrideTable: Send + Sync {
    /// Decision for the record with `index`, if any.
    fn lookup(&self, index: &U256) -> Option<Cell>;

    /// Returns true if the table claims `index`.
    fn contains(&self, index: &U256) -> bool {
        self.lookup(index).is_some()
    }
}
