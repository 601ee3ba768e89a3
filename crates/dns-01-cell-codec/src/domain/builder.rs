//! # Cell Builder
//!
//! Append-only writer producing a `Cell`. Every `store_*` call checks the
//! 1023-bit / 4-reference capacity before touching the buffer, so a failed
//! call leaves the builder unchanged.

use crate::domain::cell::{Cell, MAX_BITS, MAX_REFS};
use crate::domain::slice::CellSlice;
use crate::errors::CellError;
use shared_types::{Address, Coins, U256};

/// Mutable cell writer.
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
}

impl CellBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits written so far.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Free payload capacity in bits.
    #[must_use]
    pub fn remaining_bits(&self) -> usize {
        MAX_BITS - self.bit_len
    }

    /// Free reference slots.
    #[must_use]
    pub fn remaining_refs(&self) -> usize {
        MAX_REFS - self.refs.len()
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), CellError> {
        if bits > self.remaining_bits() {
            return Err(CellError::BitOverflow {
                requested: bits,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            self.data[self.bit_len / 8] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Appends a single bit.
    ///
    /// # Errors
    ///
    /// Returns `CellError::BitOverflow` when the cell is full.
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Appends `value` as a big-endian unsigned integer of `bits` width.
    ///
    /// # Errors
    ///
    /// Returns `CellError::IntegerOutOfRange` if `value` needs more than
    /// `bits` bits, or `CellError::BitOverflow` when the cell is full.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, CellError> {
        if bits < 64 && value >> bits != 0 {
            return Err(CellError::IntegerOutOfRange { bits });
        }
        self.ensure_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit(i < 64 && (value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Appends `value` as a two's-complement integer of `bits` width.
    ///
    /// # Errors
    ///
    /// Returns `CellError::IntegerOutOfRange` if `value` does not fit.
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self, CellError> {
        if bits == 0 || bits > 64 {
            return Err(CellError::IntegerOutOfRange { bits });
        }
        if bits < 64 {
            let bound = 1i64 << (bits - 1);
            if value < -bound || value >= bound {
                return Err(CellError::IntegerOutOfRange { bits });
            }
        }
        #[allow(clippy::cast_sign_loss)]
        let raw = if bits == 64 {
            value as u64
        } else {
            (value as u64) & ((1u64 << bits) - 1)
        };
        self.store_uint(raw, bits)
    }

    /// Appends a wide unsigned integer of up to 256 bits.
    ///
    /// # Errors
    ///
    /// Returns `CellError::IntegerOutOfRange` if `value` does not fit.
    pub fn store_u256(&mut self, value: &U256, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 256 || value.bits() > bits {
            return Err(CellError::IntegerOutOfRange { bits });
        }
        self.ensure_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit(value.bit(i));
        }
        Ok(self)
    }

    /// Appends raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `CellError::BitOverflow` when the bytes do not fit.
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        self.ensure_bits(bytes.len() * 8)?;
        if self.bit_len % 8 == 0 {
            self.data.extend_from_slice(bytes);
            self.bit_len += bytes.len() * 8;
        } else {
            for byte in bytes {
                for i in (0..8).rev() {
                    self.push_bit((byte >> i) & 1 == 1);
                }
            }
        }
        Ok(self)
    }

    /// Appends the unread bits and references of `slice`.
    ///
    /// # Errors
    ///
    /// Returns an overflow error if either the bits or the references do not fit.
    pub fn store_slice(&mut self, slice: &CellSlice) -> Result<&mut Self, CellError> {
        let mut source = slice.clone();
        let bits = source.remaining_bits();
        let refs = source.remaining_refs();
        self.ensure_bits(bits)?;
        if refs > self.remaining_refs() {
            return Err(CellError::RefOverflow);
        }
        for _ in 0..bits {
            let bit = source.load_bit()?;
            self.push_bit(bit);
        }
        for _ in 0..refs {
            let child = source.load_ref()?;
            self.refs.push(child);
        }
        Ok(self)
    }

    /// Appends all bits and references of `cell` inline.
    ///
    /// # Errors
    ///
    /// Returns an overflow error if the contents do not fit.
    pub fn store_cell_contents(&mut self, cell: &Cell) -> Result<&mut Self, CellError> {
        self.store_slice(&cell.parse())
    }

    /// Appends a child reference.
    ///
    /// # Errors
    ///
    /// Returns `CellError::RefOverflow` when all four slots are used.
    pub fn store_ref(&mut self, cell: Cell) -> Result<&mut Self, CellError> {
        if self.refs.len() >= MAX_REFS {
            return Err(CellError::RefOverflow);
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// Appends `Maybe ^Cell`: a presence bit followed by the reference.
    ///
    /// # Errors
    ///
    /// Returns an overflow error when the bit or the reference does not fit.
    pub fn store_maybe_ref(&mut self, cell: Option<Cell>) -> Result<&mut Self, CellError> {
        match cell {
            Some(cell) => {
                if self.refs.len() >= MAX_REFS {
                    return Err(CellError::RefOverflow);
                }
                self.store_bit(true)?;
                self.store_ref(cell)
            }
            None => self.store_bit(false),
        }
    }

    /// Appends an amount as `VarUInteger 16`: a 4-bit byte length followed by
    /// the big-endian value.
    ///
    /// # Errors
    ///
    /// Returns `CellError::IntegerOutOfRange` above 2^120 - 1.
    pub fn store_coins(&mut self, coins: Coins) -> Result<&mut Self, CellError> {
        if coins > Coins::MAX {
            return Err(CellError::IntegerOutOfRange { bits: 120 });
        }
        let value = coins.nanos();
        let len = (128 - value.leading_zeros() as usize).div_ceil(8);
        self.ensure_bits(4 + len * 8)?;
        self.store_uint(len as u64, 4)?;
        let bytes = value.to_be_bytes();
        self.store_bytes(&bytes[16 - len..])
    }

    /// Appends `addr_std$10 anycast:0 workchain:int8 hash:bits256`.
    ///
    /// # Errors
    ///
    /// Returns `CellError::BitOverflow` when the 267 bits do not fit.
    pub fn store_address(&mut self, address: &Address) -> Result<&mut Self, CellError> {
        self.ensure_bits(267)?;
        self.store_uint(0b100, 3)?;
        self.store_int(i64::from(address.workchain), 8)?;
        self.store_bytes(&address.hash)
    }

    /// Appends an address, or `addr_none$00` for `None`.
    ///
    /// # Errors
    ///
    /// Returns `CellError::BitOverflow` when the address does not fit.
    pub fn store_maybe_address(&mut self, address: Option<&Address>) -> Result<&mut Self, CellError> {
        match address {
            Some(address) => self.store_address(address),
            None => self.store_uint(0, 2),
        }
    }

    /// Appends bytes in snake format: as many whole bytes as fit here, the
    /// rest in a chain of child cells.
    ///
    /// # Errors
    ///
    /// Returns an overflow error if not even the chain reference fits.
    pub fn store_string_tail(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        let capacity = self.remaining_bits() / 8;
        if bytes.len() <= capacity {
            return self.store_bytes(bytes);
        }
        let (head, tail) = bytes.split_at(capacity);
        let mut next = CellBuilder::new();
        next.store_string_tail(tail)?;
        let next = next.build()?;
        if self.refs.len() >= MAX_REFS {
            return Err(CellError::RefOverflow);
        }
        self.store_bytes(head)?;
        self.store_ref(next)
    }

    /// Finishes the cell.
    ///
    /// # Errors
    ///
    /// Propagates `Cell::new` validation errors.
    pub fn build(&self) -> Result<Cell, CellError> {
        Cell::new(self.data.clone(), self.bit_len, self.refs.clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================
