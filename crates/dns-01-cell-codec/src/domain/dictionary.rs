//! # Dictionary
//!
//! Ordered map from fixed-width unsigned keys to value slices, serialized as
//! a binary Patricia trie (`HashmapE n X`).
//!
//! Each value is kept as a `Cell` holding exactly the value's bits and
//! references. Values of type `^Cell` are therefore a cell with a single
//! reference; `get_ref`/`set_ref` handle that wrapping.
//!
//! ## Edge Labels
//!
//! | Form | Prefix | Encoding |
//! |------|--------|----------|
//! | short | `0` | unary length, then the bits |
//! | long | `10` | length in `ceil(log2(m+1))` bits, then the bits |
//! | same | `11` | the repeated bit, then the length |
//!
//! The writer picks the shortest form, preferring short, then long, then same.

use crate::domain::builder::CellBuilder;
use crate::domain::cell::Cell;
use crate::domain::slice::CellSlice;
use crate::errors::CellError;
use shared_types::U256;
use std::collections::BTreeMap;

/// Trie nodes a single parse may visit, counting a shared child cell once
/// per fork that reaches it.
pub const MAX_DICT_NODES: usize = 1 << 17;

/// Ordered dictionary with `key_bits`-wide keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    key_bits: usize,
    entries: BTreeMap<U256, Cell>,
}

impl Dictionary {
    /// Creates an empty dictionary. `key_bits` must be in `1..=256`.
    #[must_use]
    pub fn new(key_bits: usize) -> Self {
        Self {
            key_bits: key_bits.clamp(1, 256),
            entries: BTreeMap::new(),
        }
    }

    /// Key width in bits.
    #[must_use]
    pub fn key_bits(&self) -> usize {
        self.key_bits
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dictionary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw value slice stored under `key`.
    #[must_use]
    pub fn get(&self, key: &U256) -> Option<&Cell> {
        self.entries.get(key)
    }

    /// Returns true if `key` has an entry.
    #[must_use]
    pub fn contains_key(&self, key: &U256) -> bool {
        self.entries.contains_key(key)
    }

    /// Value of a `^Cell` entry.
    #[must_use]
    pub fn get_ref(&self, key: &U256) -> Option<Cell> {
        self.entries
            .get(key)
            .and_then(|value| value.references().first().cloned())
    }

    /// Inserts or replaces a raw value, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns `CellError::KeyOutOfRange` if `key` is wider than the dictionary.
    pub fn set(&mut self, key: U256, value: Cell) -> Result<Option<Cell>, CellError> {
        if key.bits() > self.key_bits {
            return Err(CellError::KeyOutOfRange {
                key_bits: self.key_bits,
            });
        }
        Ok(self.entries.insert(key, value))
    }

    /// Inserts or replaces a `^Cell` entry.
    ///
    /// # Errors
    ///
    /// Returns `CellError::KeyOutOfRange` if `key` is wider than the dictionary.
    pub fn set_ref(&mut self, key: U256, value: Cell) -> Result<Option<Cell>, CellError> {
        let mut wrapper = CellBuilder::new();
        wrapper.store_ref(value)?;
        self.set(key, wrapper.build()?)
    }

    /// Removes an entry, returning its raw value.
    pub fn remove(&mut self, key: &U256) -> Option<Cell> {
        self.entries.remove(key)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&U256, &Cell)> {
        self.entries.iter()
    }

    // =========================================================================
    // SERIALIZATION
    // =========================================================================

    /// Serializes the trie, or `None` for an empty dictionary.
    ///
    /// # Errors
    ///
    /// Returns an overflow error if a value does not fit next to its label.
    pub fn to_root(&self) -> Result<Option<Cell>, CellError> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        let entries: Vec<(&U256, &Cell)> = self.entries.iter().collect();
        build_node(&entries, 0, self.key_bits).map(Some)
    }

    /// Writes `HashmapE`: a presence bit plus the root reference.
    ///
    /// # Errors
    ///
    /// Returns an overflow error if the builder is full.
    pub fn store(&self, builder: &mut CellBuilder) -> Result<(), CellError> {
        builder.store_maybe_ref(self.to_root()?)?;
        Ok(())
    }

    /// Rebuilds a dictionary from a trie root.
    ///
    /// # Errors
    ///
    /// Returns `CellError::InvalidDictionary` for malformed tries or ones
    /// with more than [`MAX_DICT_NODES`] nodes.
    pub fn from_root(root: Option<&Cell>, key_bits: usize) -> Result<Self, CellError> {
        let mut dict = Self::new(key_bits);
        if let Some(root) = root {
            let mut prefix = Vec::with_capacity(dict.key_bits);
            let mut budget = MAX_DICT_NODES;
            parse_node(root, &mut prefix, dict.key_bits, &mut dict.entries, &mut budget)?;
        }
        Ok(dict)
    }

    /// Reads `HashmapE` from a slice.
    ///
    /// # Errors
    ///
    /// Returns an underflow or `InvalidDictionary` error on malformed input.
    pub fn load(slice: &mut CellSlice, key_bits: usize) -> Result<Self, CellError> {
        let root = slice.load_maybe_ref()?;
        Self::from_root(root.as_ref(), key_bits)
    }
}

fn key_bit(key: &U256, key_bits: usize, index: usize) -> bool {
    key.bit(key_bits - 1 - index)
}

fn length_width(max_len: usize) -> usize {
    (usize::BITS - max_len.leading_zeros()) as usize
}

fn build_node(entries: &[(&U256, &Cell)], offset: usize, key_bits: usize) -> Result<Cell, CellError> {
    let remaining = key_bits - offset;
    let (first, _) = entries[0];
    let (last, _) = entries[entries.len() - 1];

    let mut label_len = 0;
    while label_len < remaining
        && key_bit(first, key_bits, offset + label_len) == key_bit(last, key_bits, offset + label_len)
    {
        label_len += 1;
    }
    let label: Vec<bool> = (0..label_len)
        .map(|i| key_bit(first, key_bits, offset + i))
        .collect();

    let mut builder = CellBuilder::new();
    write_label(&mut builder, &label, remaining)?;

    if entries.len() == 1 {
        builder.store_cell_contents(entries[0].1)?;
        return builder.build();
    }

    let fork = offset + label_len;
    let split = entries
        .iter()
        .position(|(key, _)| key_bit(key, key_bits, fork))
        .ok_or_else(|| CellError::InvalidDictionary("fork without right branch".into()))?;
    let left = build_node(&entries[..split], fork + 1, key_bits)?;
    let right = build_node(&entries[split..], fork + 1, key_bits)?;
    builder.store_ref(left)?.store_ref(right)?;
    builder.build()
}

fn write_label(builder: &mut CellBuilder, label: &[bool], max_len: usize) -> Result<(), CellError> {
    let len = label.len();
    let width = length_width(max_len);
    let short_cost = 2 * len + 2;
    let long_cost = 2 + width + len;
    let same_cost = 3 + width;
    let is_same = label.windows(2).all(|w| w[0] == w[1]);

    let mut best = short_cost;
    let mut form = 0u8;
    if long_cost < best {
        best = long_cost;
        form = 1;
    }
    if is_same && same_cost < best {
        form = 2;
    }

    match form {
        0 => {
            builder.store_bit(false)?;
            for _ in 0..len {
                builder.store_bit(true)?;
            }
            builder.store_bit(false)?;
            for bit in label {
                builder.store_bit(*bit)?;
            }
        }
        1 => {
            builder.store_uint(0b10, 2)?.store_uint(len as u64, width)?;
            for bit in label {
                builder.store_bit(*bit)?;
            }
        }
        _ => {
            builder
                .store_uint(0b11, 2)?
                .store_bit(label[0])?
                .store_uint(len as u64, width)?;
        }
    }
    Ok(())
}

fn read_label(slice: &mut CellSlice, max_len: usize) -> Result<Vec<bool>, CellError> {
    let width = length_width(max_len);
    let label = if !slice.load_bit()? {
        let mut len = 0;
        while slice.load_bit()? {
            len += 1;
            if len > max_len {
                return Err(CellError::InvalidDictionary("short label too long".into()));
            }
        }
        (0..len).map(|_| slice.load_bit()).collect::<Result<Vec<_>, _>>()?
    } else if !slice.load_bit()? {
        let len = usize::try_from(slice.load_uint(width)?).unwrap_or(usize::MAX);
        if len > max_len {
            return Err(CellError::InvalidDictionary("long label too long".into()));
        }
        (0..len).map(|_| slice.load_bit()).collect::<Result<Vec<_>, _>>()?
    } else {
        let bit = slice.load_bit()?;
        let len = usize::try_from(slice.load_uint(width)?).unwrap_or(usize::MAX);
        if len > max_len {
            return Err(CellError::InvalidDictionary("same label too long".into()));
        }
        vec![bit; len]
    };
    Ok(label)
}

fn parse_node(
    cell: &Cell,
    prefix: &mut Vec<bool>,
    remaining: usize,
    entries: &mut BTreeMap<U256, Cell>,
    budget: &mut usize,
) -> Result<(), CellError> {
    *budget = budget
        .checked_sub(1)
        .ok_or_else(|| CellError::InvalidDictionary("too many nodes".into()))?;
    let mut slice = cell.parse();
    let label = read_label(&mut slice, remaining)?;
    let rest = remaining - label.len();
    let base = prefix.len();
    prefix.extend_from_slice(&label);

    if rest == 0 {
        let key = prefix
            .iter()
            .fold(U256::zero(), |acc, bit| (acc << 1) | U256::from(u8::from(*bit)));
        entries.insert(key, slice.to_cell()?);
    } else {
        let left = slice.load_ref()?;
        let right = slice.load_ref()?;
        prefix.push(false);
        parse_node(&left, prefix, rest - 1, entries, budget)?;
        prefix.pop();
        prefix.push(true);
        parse_node(&right, prefix, rest - 1, entries, budget)?;
        prefix.pop();
    }
    prefix.truncate(base);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
