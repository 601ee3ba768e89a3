//! # Domain Content
//!
//! On-chain content of a domain: an 8-bit layout prefix followed by a
//! `HashmapE 256 ^Cell` from category hash to record value. A content cell
//! of just the prefix is an empty record set.

use crate::domain::value_objects::{Category, DnsRecord};
use crate::errors::ContractError;
use dns_01_cell_codec::{Cell, CellBuilder, Dictionary};
use shared_types::U256;

/// Key width of the record dictionary.
pub const CATEGORY_BITS: usize = 256;

/// Prefix of on-chain content.
pub const ONCHAIN_PREFIX: u64 = 0;

/// Record set of one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainContent {
    prefix: u8,
    records: Dictionary,
}

impl Default for DomainContent {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainContent {
    /// Empty on-chain content.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: 0,
            records: Dictionary::new(CATEGORY_BITS),
        }
    }

    /// Parses a content cell.
    ///
    /// # Errors
    ///
    /// Returns a cell error for a truncated prefix or malformed dictionary.
    pub fn from_cell(cell: &Cell) -> Result<Self, ContractError> {
        let mut s = cell.parse();
        let prefix = u8::try_from(s.load_uint(8)?).unwrap_or(u8::MAX);
        let records = if s.remaining_bits() > 0 {
            Dictionary::load(&mut s, CATEGORY_BITS)?
        } else {
            Dictionary::new(CATEGORY_BITS)
        };
        Ok(Self { prefix, records })
    }

    /// Serializes to a content cell.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, ContractError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(self.prefix), 8)?;
        self.records.store(&mut b)?;
        Ok(b.build()?)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no record is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value stored under a category hash.
    #[must_use]
    pub fn get(&self, category: &U256) -> Option<Cell> {
        self.records.get_ref(category)
    }

    /// Sets a record.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn set(&mut self, category: U256, value: Cell) -> Result<(), ContractError> {
        self.records.set_ref(category, value)?;
        Ok(())
    }

    /// Deletes a record. Returns true if it existed.
    pub fn remove(&mut self, category: &U256) -> bool {
        self.records.remove(category).is_some()
    }

    /// Root of the record dictionary, what category 0 resolves to.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn records_root(&self) -> Result<Option<Cell>, ContractError> {
        Ok(self.records.to_root()?)
    }

    /// Sets a text metadata record (`0x00` + snake string).
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn set_text(&mut self, category: Category, text: &str) -> Result<(), ContractError> {
        let mut b = CellBuilder::new();
        b.store_uint(0, 8)?.store_string_tail(text.as_bytes())?;
        self.set(category.key(), b.build()?)
    }

    /// Reads a text metadata record.
    #[must_use]
    pub fn text(&self, category: Category) -> Option<String> {
        let mut s = self.get(&category.key())?.parse();
        if s.load_uint(8).ok()? != 0 {
            return None;
        }
        String::from_utf8(s.load_string_tail().ok()?).ok()
    }

    /// Sets a typed DNS record under its natural category.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn set_record(&mut self, record: &DnsRecord) -> Result<(), ContractError> {
        let category = match record {
            DnsRecord::NextResolver(_) => Category::NextResolver,
            DnsRecord::Wallet(_) => Category::Wallet,
        };
        self.set(category.key(), record.to_cell()?)
    }

    /// Reads a typed DNS record.
    #[must_use]
    pub fn record(&self, category: Category) -> Option<DnsRecord> {
        DnsRecord::from_cell(&self.get(&category.key())?)
    }
}
