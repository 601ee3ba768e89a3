//! # Cell
//!
//! Immutable node of up to 1023 data bits and up to four child references.
//! Cells are content-addressed: the representation hash covers the payload
//! and, recursively, the hashes and depths of every child.

use crate::domain::slice::CellSlice;
use crate::errors::CellError;
use sha2::{Digest, Sha256};
use shared_types::{Hash, U256};
use std::fmt;
use std::sync::Arc;

/// Maximum payload size of a single cell, in bits.
pub const MAX_BITS: usize = 1023;

/// Maximum number of child references of a single cell.
pub const MAX_REFS: usize = 4;

/// Immutable, cheaply clonable cell.
#[derive(Clone)]
pub struct Cell {
    inner: Arc<CellInner>,
}

struct CellInner {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
    hash: Hash,
    depth: u16,
}

impl Cell {
    /// Creates a cell from a bit buffer and child references.
    ///
    /// Bits beyond `bit_len` are cleared so that equal payloads always hash
    /// equally.
    ///
    /// # Errors
    ///
    /// Returns `CellError` if the payload or reference limits are exceeded,
    /// or if `data` is shorter than `bit_len`.
    pub fn new(mut data: Vec<u8>, bit_len: usize, refs: Vec<Cell>) -> Result<Self, CellError> {
        if bit_len > MAX_BITS {
            return Err(CellError::BitOverflow {
                requested: bit_len,
                available: MAX_BITS,
            });
        }
        if refs.len() > MAX_REFS {
            return Err(CellError::RefOverflow);
        }
        let byte_len = bit_len.div_ceil(8);
        if data.len() < byte_len {
            return Err(CellError::BitUnderflow {
                requested: bit_len,
                available: data.len() * 8,
            });
        }
        data.truncate(byte_len);
        if bit_len % 8 != 0 {
            data[byte_len - 1] &= 0xFF << (8 - bit_len % 8);
        }
        Ok(Self::assemble(data, bit_len, refs))
    }

    /// Cell with no data and no references.
    #[must_use]
    pub fn empty() -> Self {
        Self::assemble(Vec::new(), 0, Vec::new())
    }

    /// Cell holding exactly the given bytes.
    ///
    /// # Errors
    ///
    /// Returns `CellError::BitOverflow` for more than 127 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CellError> {
        Self::new(bytes.to_vec(), bytes.len() * 8, Vec::new())
    }

    fn assemble(data: Vec<u8>, bit_len: usize, refs: Vec<Cell>) -> Self {
        let depth = refs.iter().map(Cell::depth).max().map_or(0, |d| d + 1);
        let mut inner = CellInner {
            data,
            bit_len,
            refs,
            hash: [0u8; 32],
            depth,
        };
        inner.hash = representation_hash(&inner);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Payload length in bits.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.inner.bit_len
    }

    /// Payload bytes; the last byte is zero-padded.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.inner.data
    }

    /// Child references in order.
    #[must_use]
    pub fn references(&self) -> &[Cell] {
        &self.inner.refs
    }

    /// Child reference at `index`.
    ///
    /// # Errors
    ///
    /// Returns `CellError::RefUnderflow` if there is no such reference.
    pub fn reference(&self, index: usize) -> Result<&Cell, CellError> {
        self.inner.refs.get(index).ok_or(CellError::RefUnderflow)
    }

    /// Representation hash.
    #[must_use]
    pub fn hash(&self) -> Hash {
        self.inner.hash
    }

    /// Representation hash as a 256-bit integer.
    #[must_use]
    pub fn hash_u256(&self) -> U256 {
        U256::from_big_endian(&self.inner.hash)
    }

    /// Longest path to a leaf (0 for a cell without references).
    #[must_use]
    pub fn depth(&self) -> u16 {
        self.inner.depth
    }

    /// Returns true if the cell has neither bits nor references.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.bit_len == 0 && self.inner.refs.is_empty()
    }

    /// Bit at `index`, most significant first.
    #[must_use]
    pub fn bit(&self, index: usize) -> bool {
        index < self.inner.bit_len && (self.inner.data[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    /// Opens the cell for reading.
    #[must_use]
    pub fn parse(&self) -> CellSlice {
        CellSlice::new(self.clone())
    }

    /// The two descriptor bytes of an ordinary level-0 cell.
    #[must_use]
    pub fn descriptors(&self) -> [u8; 2] {
        descriptor_bytes(self.inner.bit_len, self.inner.refs.len())
    }

    /// Payload with the completion tag appended when it is not byte-aligned.
    #[must_use]
    pub fn padded_data(&self) -> Vec<u8> {
        with_completion_tag(&self.inner.data, self.inner.bit_len)
    }
}

fn descriptor_bytes(bit_len: usize, refs: usize) -> [u8; 2] {
    let d1 = u8::try_from(refs).unwrap_or(u8::MAX);
    let d2 = u8::try_from(bit_len / 8 + bit_len.div_ceil(8)).unwrap_or(u8::MAX);
    [d1, d2]
}

fn with_completion_tag(data: &[u8], bit_len: usize) -> Vec<u8> {
    let mut padded = data.to_vec();
    let rem = bit_len % 8;
    if rem != 0 {
        if let Some(last) = padded.last_mut() {
            *last |= 1 << (7 - rem);
        }
    }
    padded
}

fn representation_hash(inner: &CellInner) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(descriptor_bytes(inner.bit_len, inner.refs.len()));
    hasher.update(with_completion_tag(&inner.data, inner.bit_len));
    for child in &inner.refs {
        hasher.update(child.depth().to_be_bytes());
    }
    for child in &inner.refs {
        hasher.update(child.hash());
    }
    hasher.finalize().into()
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.inner.hash == other.inner.hash
    }
}

impl Eq for Cell {}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.hash.hash(state);
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{{{}", hex::encode_upper(&self.inner.data))?;
        if self.inner.bit_len % 8 != 0 {
            write!(f, "/{}", self.inner.bit_len)?;
        }
        write!(f, "}}")?;
        if !self.inner.refs.is_empty() {
            f.debug_list().entries(self.inner.refs.iter()).finish()?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
