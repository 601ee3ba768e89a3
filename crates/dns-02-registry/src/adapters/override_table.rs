//! In-memory network override table.

use crate::events::OverrideDecision;
use crate::ports::outbound::OverrideTable;
use dns_01_cell_codec::{Cell, CellError, Dictionary};
use parking_lot::RwLock;
use shared_types::U256;
use std::collections::HashMap;

/// Key width of the table, matching record indices.
pub const OVERRIDE_KEY_BITS: usize = 256;

/// Override table held in memory; cheap to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryOverrideTable {
    entries: RwLock<HashMap<U256, Cell>>,
}

impl InMemoryOverrideTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a table from its `HashmapE 256` root.
    ///
    /// # Errors
    ///
    /// Returns a cell error for a malformed dictionary.
    pub fn from_root(root: Option<&Cell>) -> Result<Self, CellError> {
        let dict = Dictionary::from_root(root, OVERRIDE_KEY_BITS)?;
        let entries = dict.iter().map(|(k, v)| (*k, v.clone())).collect();
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    /// Serializes the table as a `HashmapE 256` root.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_root(&self) -> Result<Option<Cell>, CellError> {
        let mut dict = Dictionary::new(OVERRIDE_KEY_BITS);
        for (key, value) in self.entries.read().iter() {
            dict.set(*key, value.clone())?;
        }
        dict.to_root()
    }

    /// Records a decision for `index`, returning the raw value it replaced.
    ///
    /// # Errors
    ///
    /// Propagates serialization errors.
    pub fn insert(
        &self,
        index: U256,
        decision: &OverrideDecision,
    ) -> Result<Option<Cell>, CellError> {
        let value = decision.to_cell()?;
        Ok(self.entries.write().insert(index, value))
    }

    /// Stores a raw value; used for tags this crate does not interpret.
    pub fn insert_raw(&self, index: U256, value: Cell) -> Option<Cell> {
        self.entries.write().insert(index, value)
    }

    /// Drops the entry for `index`.
    pub fn remove(&self, index: &U256) -> Option<Cell> {
        self.entries.write().remove(index)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl OverrideTable for InMemoryOverrideTable {
    fn lookup(&self, index: &U256) -> Option<Cell> {
        self.entries.read().get(index).cloned()
    }
}
