//! # Cell Slice
//!
//! Read cursor over a `Cell`. Reads consume bits from the front and
//! references in order; reading past the end is a `CellError` underflow.

use crate::domain::builder::CellBuilder;
use crate::domain::cell::Cell;
use crate::errors::CellError;
use shared_types::{Address, Coins, U256};

/// Read cursor over a cell's bits and references.
#[derive(Debug, Clone)]
pub struct CellSlice {
    cell: Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl CellSlice {
    /// Opens `cell` for reading from the start.
    #[must_use]
    pub fn new(cell: Cell) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// Underlying cell.
    #[must_use]
    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    /// Unread bits.
    #[must_use]
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    /// Unread references.
    #[must_use]
    pub fn remaining_refs(&self) -> usize {
        self.cell.references().len() - self.ref_pos
    }

    /// Returns true if neither bits nor references remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), CellError> {
        if bits > self.remaining_bits() {
            return Err(CellError::BitUnderflow {
                requested: bits,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    /// Reads one bit.
    ///
    /// # Errors
    ///
    /// Returns `CellError::BitUnderflow` at the end of the data.
    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        self.ensure_bits(1)?;
        let bit = self.cell.bit(self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Reads an unsigned integer of up to 64 bits without consuming it.
    ///
    /// # Errors
    ///
    /// Returns an underflow error if fewer than `bits` bits remain.
    pub fn preload_uint(&self, bits: usize) -> Result<u64, CellError> {
        if bits > 64 {
            return Err(CellError::IntegerOutOfRange { bits });
        }
        self.ensure_bits(bits)?;
        let mut value = 0u64;
        for i in 0..bits {
            value = (value << 1) | u64::from(self.cell.bit(self.bit_pos + i));
        }
        Ok(value)
    }

    /// Reads an unsigned integer of up to 64 bits.
    ///
    /// # Errors
    ///
    /// Returns an underflow error if fewer than `bits` bits remain.
    pub fn load_uint(&mut self, bits: usize) -> Result<u64, CellError> {
        let value = self.preload_uint(bits)?;
        self.bit_pos += bits;
        Ok(value)
    }

    /// Reads a two's-complement integer of up to 64 bits.
    ///
    /// # Errors
    ///
    /// Returns an underflow error if fewer than `bits` bits remain.
    pub fn load_int(&mut self, bits: usize) -> Result<i64, CellError> {
        if bits == 0 {
            return Ok(0);
        }
        let raw = self.load_uint(bits)?;
        #[allow(clippy::cast_possible_wrap)]
        let value = if bits < 64 && (raw >> (bits - 1)) & 1 == 1 {
            (raw | (u64::MAX << bits)) as i64
        } else {
            raw as i64
        };
        Ok(value)
    }

    /// Reads an unsigned integer of up to 256 bits.
    ///
    /// # Errors
    ///
    /// Returns an underflow error if fewer than `bits` bits remain.
    pub fn load_u256(&mut self, bits: usize) -> Result<U256, CellError> {
        if bits > 256 {
            return Err(CellError::IntegerOutOfRange { bits });
        }
        self.ensure_bits(bits)?;
        let mut value = U256::zero();
        for _ in 0..bits {
            value = (value << 1) | U256::from(u8::from(self.cell.bit(self.bit_pos)));
            self.bit_pos += 1;
        }
        Ok(value)
    }

    /// Reads `len` whole bytes.
    ///
    /// # Errors
    ///
    /// Returns an underflow error if fewer than `len * 8` bits remain.
    pub fn load_bytes(&mut self, len: usize) -> Result<Vec<u8>, CellError> {
        self.ensure_bits(len * 8)?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            let byte = self.load_uint(8)?;
            out.push(u8::try_from(byte).unwrap_or(u8::MAX));
        }
        Ok(out)
    }

    /// Skips `bits` bits.
    ///
    /// # Errors
    ///
    /// Returns an underflow error if fewer than `bits` bits remain.
    pub fn skip_bits(&mut self, bits: usize) -> Result<&mut Self, CellError> {
        self.ensure_bits(bits)?;
        self.bit_pos += bits;
        Ok(self)
    }

    /// Reads the next reference.
    ///
    /// # Errors
    ///
    /// Returns `CellError::RefUnderflow` when no reference is left.
    pub fn load_ref(&mut self) -> Result<Cell, CellError> {
        let cell = self.preload_ref()?;
        self.ref_pos += 1;
        Ok(cell)
    }

    /// Peeks at the next reference.
    ///
    /// # Errors
    ///
    /// Returns `CellError::RefUnderflow` when no reference is left.
    pub fn preload_ref(&self) -> Result<Cell, CellError> {
        self.cell.reference(self.ref_pos).cloned()
    }

    /// Reads `Maybe ^Cell`.
    ///
    /// # Errors
    ///
    /// Returns an underflow error on truncated input.
    pub fn load_maybe_ref(&mut self) -> Result<Option<Cell>, CellError> {
        if self.load_bit()? {
            self.load_ref().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a `VarUInteger 16` amount.
    ///
    /// # Errors
    ///
    /// Returns an underflow error on truncated input.
    pub fn load_coins(&mut self) -> Result<Coins, CellError> {
        let len = usize::try_from(self.load_uint(4)?).unwrap_or(0);
        let bytes = self.load_bytes(len)?;
        let nanos = bytes.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b));
        Ok(Coins::from_nanos(nanos))
    }

    /// Reads `addr_none` (as `None`) or `addr_std` without anycast.
    ///
    /// # Errors
    ///
    /// Returns `CellError::UnsupportedAddress` for external or anycast forms.
    pub fn load_address(&mut self) -> Result<Option<Address>, CellError> {
        let tag = u8::try_from(self.preload_uint(2)?).unwrap_or(0);
        match tag {
            0b00 => {
                self.bit_pos += 2;
                Ok(None)
            }
            0b10 => {
                self.ensure_bits(267)?;
                self.bit_pos += 2;
                if self.load_bit()? {
                    return Err(CellError::UnsupportedAddress(0b101));
                }
                let workchain = i8::try_from(self.load_int(8)?).unwrap_or(0);
                let bytes = self.load_bytes(32)?;
                Address::from_slice(workchain, &bytes)
                    .map(Some)
                    .ok_or(CellError::UnsupportedAddress(tag))
            }
            other => Err(CellError::UnsupportedAddress(other)),
        }
    }

    /// Reads an address that must be present.
    ///
    /// # Errors
    ///
    /// Returns `CellError::UnsupportedAddress` for `addr_none`.
    pub fn load_std_address(&mut self) -> Result<Address, CellError> {
        self.load_address()?.ok_or(CellError::UnsupportedAddress(0b00))
    }

    /// Reads a snake-format byte string: the whole bytes left here, then the
    /// chain through each cell's first reference.
    ///
    /// # Errors
    ///
    /// Returns an underflow error if a chunk is not byte-aligned.
    pub fn load_string_tail(&mut self) -> Result<Vec<u8>, CellError> {
        if self.remaining_bits() % 8 != 0 {
            return Err(CellError::BitUnderflow {
                requested: self.remaining_bits().next_multiple_of(8),
                available: self.remaining_bits(),
            });
        }
        let mut out = self.load_bytes(self.remaining_bits() / 8)?;
        if self.remaining_refs() > 0 {
            let mut next = self.load_ref()?.parse();
            out.extend(next.load_string_tail()?);
        }
        Ok(out)
    }

    /// Copies the unread bits and references into a fresh cell.
    ///
    /// # Errors
    ///
    /// Propagates builder errors (unreachable for a well-formed slice).
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut builder = CellBuilder::new();
        builder.store_slice(self)?;
        builder.build()
    }
}

// =============================================================================
// TESTS
// =============================================================================
