//! # State Init
//!
//! Initial code and data of a contract. An account's address is the hash of
//! its `StateInit` cell, which is what makes contract addresses computable by
//! anyone who knows the code and the initial data.

use crate::domain::builder::CellBuilder;
use crate::domain::cell::Cell;
use crate::errors::CellError;
use shared_types::Address;

/// Code and data a contract is deployed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInit {
    /// Contract code.
    pub code: Cell,
    /// Initial persistent data.
    pub data: Cell,
}

impl StateInit {
    /// Creates a state init.
    #[must_use]
    pub fn new(code: Cell, data: Cell) -> Self {
        Self { code, data }
    }

    /// Serializes as `split_depth:0 special:0 code:1 data:1 library:0`.
    ///
    /// # Errors
    ///
    /// Never fails for well-formed cells; the signature mirrors the builder.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut builder = CellBuilder::new();
        builder
            .store_uint(0b00110, 5)?
            .store_ref(self.code.clone())?
            .store_ref(self.data.clone())?;
        builder.build()
    }

    /// Parses a state init that carries both code and data.
    ///
    /// # Errors
    ///
    /// Returns `CellError::InvalidStateInit` for split-depth, special,
    /// library or missing code/data forms.
    pub fn from_cell(cell: &Cell) -> Result<Self, CellError> {
        let mut slice = cell.parse();
        if slice.load_bit()? {
            return Err(CellError::InvalidStateInit("split depth not supported".into()));
        }
        if slice.load_bit()? {
            return Err(CellError::InvalidStateInit("special flag not supported".into()));
        }
        let code = slice
            .load_maybe_ref()?
            .ok_or_else(|| CellError::InvalidStateInit("missing code".into()))?;
        let data = slice
            .load_maybe_ref()?
            .ok_or_else(|| CellError::InvalidStateInit("missing data".into()))?;
        if slice.load_bit()? {
            return Err(CellError::InvalidStateInit("libraries not supported".into()));
        }
        Ok(Self { code, data })
    }

    /// Address of the contract deployed with this state init.
    ///
    /// # Errors
    ///
    /// Propagates serialization errors.
    pub fn address(&self, workchain: i8) -> Result<Address, CellError> {
        Ok(Address::new(workchain, self.to_cell()?.hash()))
    }
}

/// Computes a contract address from its code and initial data.
///
/// # Errors
///
/// Propagates serialization errors.
pub fn contract_address(workchain: i8, code: &Cell, data: &Cell) -> Result<Address, CellError> {
    StateInit::new(code.clone(), data.clone()).address(workchain)
}
