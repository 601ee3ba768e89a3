//! # Bag of Cells
//!
//! Flat byte serialization of a single-root cell DAG (`b5ee9c72` format).
//! Cells are written in topological order, parents before children, with
//! identical subtrees stored once. Index tables and CRC32C trailers are not
//! produced; the reader skips an index table and rejects CRC trailers.

use crate::domain::cell::Cell;
use crate::errors::CellError;
use shared_types::Hash;
use std::collections::{HashMap, HashSet};

/// Magic prefix of the generic bag-of-cells format.
pub const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

const FLAG_HAS_INDEX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;

fn bytes_needed(value: usize) -> usize {
    let bits = usize::BITS - value.leading_zeros();
    (bits as usize).div_ceil(8).max(1)
}

fn write_uint(out: &mut Vec<u8>, value: usize, width: usize) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[bytes.len() - width..]);
}

fn collect(cell: &Cell, seen: &mut HashSet<Hash>, order: &mut Vec<Cell>) {
    if !seen.insert(cell.hash()) {
        return;
    }
    for child in cell.references() {
        collect(child, seen, order);
    }
    order.push(cell.clone());
}

/// Serializes `root` and everything reachable from it.
///
/// # Errors
///
/// Returns `CellError::InvalidBoc` if the DAG is too large to index.
pub fn serialize_boc(root: &Cell) -> Result<Vec<u8>, CellError> {
    let mut order = Vec::new();
    collect(root, &mut HashSet::new(), &mut order);
    order.reverse();

    let index: HashMap<Hash, usize> = order
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell.hash(), i))
        .collect();
    let size_bytes = bytes_needed(order.len());
    if size_bytes > 4 {
        return Err(CellError::InvalidBoc("too many cells".into()));
    }

    let mut cells = Vec::new();
    for cell in &order {
        cells.extend_from_slice(&cell.descriptors());
        cells.extend_from_slice(&cell.padded_data());
        for child in cell.references() {
            let idx = index
                .get(&child.hash())
                .copied()
                .ok_or_else(|| CellError::InvalidBoc("dangling reference".into()))?;
            write_uint(&mut cells, idx, size_bytes);
        }
    }
    let off_bytes = bytes_needed(cells.len());

    let mut out = Vec::with_capacity(cells.len() + 32);
    out.extend_from_slice(&BOC_MAGIC);
    out.push(u8::try_from(size_bytes).unwrap_or(4));
    out.push(u8::try_from(off_bytes).unwrap_or(8));
    write_uint(&mut out, order.len(), size_bytes);
    write_uint(&mut out, 1, size_bytes);
    write_uint(&mut out, 0, size_bytes);
    write_uint(&mut out, cells.len(), off_bytes);
    write_uint(&mut out, 0, size_bytes);
    out.extend_from_slice(&cells);
    Ok(out)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], CellError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| CellError::InvalidBoc("unexpected end of input".into()))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn uint(&mut self, width: usize) -> Result<usize, CellError> {
        Ok(self
            .take(width)?
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | usize::from(*b)))
    }
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

/// Deserializes a single-root bag of cells.
///
/// # Errors
///
/// Returns `CellError::InvalidBoc` for malformed input, multiple roots,
/// exotic cells, or references that do not point forward.
pub fn deserialize_boc(bytes: &[u8]) -> Result<Cell, CellError> {
    let mut r = Reader { bytes, pos: 0 };
    if r.take(4)? != BOC_MAGIC {
        return Err(CellError::InvalidBoc("bad magic".into()));
    }
    let flags = r.take(1)?[0];
    if flags & FLAG_HAS_CRC32C != 0 {
        return Err(CellError::InvalidBoc("crc32c trailer not supported".into()));
    }
    let size_bytes = usize::from(flags & 0x07);
    let off_bytes = usize::from(r.take(1)?[0]);
    if size_bytes == 0 || size_bytes > 4 || off_bytes == 0 || off_bytes > 8 {
        return Err(CellError::InvalidBoc("bad field widths".into()));
    }
    let cell_count = r.uint(size_bytes)?;
    let root_count = r.uint(size_bytes)?;
    let absent = r.uint(size_bytes)?;
    let _total_size = r.uint(off_bytes)?;
    if root_count != 1 {
        return Err(CellError::InvalidBoc(format!("expected 1 root, got {root_count}")));
    }
    if absent != 0 {
        return Err(CellError::InvalidBoc("absent cells not supported".into()));
    }
    let root_index = r.uint(size_bytes)?;
    if flags & FLAG_HAS_INDEX != 0 {
        let index_len = cell_count
            .checked_mul(off_bytes)
            .ok_or_else(|| CellError::InvalidBoc("index size overflows".into()))?;
        r.take(index_len)?;
    }
    // every cell needs at least its two descriptor bytes
    if cell_count > (bytes.len() - r.pos) / 2 {
        return Err(CellError::InvalidBoc(format!(
            "{cell_count} cells cannot fit in {} bytes",
            bytes.len() - r.pos
        )));
    }

    let mut raw = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        let d = r.take(2)?;
        let (d1, d2) = (d[0], d[1]);
        if d1 & 0xF8 != 0 {
            return Err(CellError::InvalidBoc("exotic cells not supported".into()));
        }
        let ref_count = usize::from(d1 & 0x07);
        let data_len = usize::from(d2).div_ceil(2);
        let data = r.take(data_len)?.to_vec();
        let bit_len = if d2 % 2 == 1 {
            let last = data.last().copied().unwrap_or(0);
            if last == 0 {
                return Err(CellError::InvalidBoc("missing completion tag".into()));
            }
            data_len * 8 - (last.trailing_zeros() as usize + 1)
        } else {
            data_len * 8
        };
        let refs = (0..ref_count)
            .map(|_| r.uint(size_bytes))
            .collect::<Result<Vec<_>, _>>()?;
        raw.push(RawCell {
            data,
            bit_len,
            refs,
        });
    }

    let mut built: Vec<Option<Cell>> = vec![None; cell_count];
    for i in (0..cell_count).rev() {
        let RawCell {
            data,
            bit_len,
            refs,
        } = &raw[i];
        let mut children = Vec::with_capacity(refs.len());
        for idx in refs {
            if *idx <= i || *idx >= cell_count {
                return Err(CellError::InvalidBoc(format!("cell {i} references {idx}")));
            }
            children.push(
                built[*idx]
                    .clone()
                    .ok_or_else(|| CellError::InvalidBoc("unresolved reference".into()))?,
            );
        }
        built[i] = Some(Cell::new(data.clone(), *bit_len, children)?);
    }

    built
        .get(root_index)
        .cloned()
        .flatten()
        .ok_or_else(|| CellError::InvalidBoc("root index out of range".into()))
}

impl Cell {
    /// Serializes this cell as a bag of cells.
    ///
    /// # Errors
    ///
    /// See [`serialize_boc`].
    pub fn to_boc(&self) -> Result<Vec<u8>, CellError> {
        serialize_boc(self)
    }

    /// Parses a bag of cells.
    ///
    /// # Errors
    ///
    /// See [`deserialize_boc`].
    pub fn from_boc(bytes: &[u8]) -> Result<Self, CellError> {
        deserialize_boc(bytes)
    }
}
