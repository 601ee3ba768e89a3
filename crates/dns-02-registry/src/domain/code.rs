//! # Contract Code
//!
//! The host does not interpret bytecode. Each contract kind is identified
//! by a fixed marker code cell; because addresses hash code and data
//! together, the marker still separates the address spaces of different
//! contract kinds.

use dns_01_cell_codec::Cell;
use lazy_static::lazy_static;

lazy_static! {
    static ref REGISTRAR_CODE: Cell =
        Cell::from_bytes(b"ton-dns/registrar/v1").expect("static code cell");
    static ref RECORD_CODE: Cell =
        Cell::from_bytes(b"ton-dns/record/v1").expect("static code cell");
    static ref WALLET_CODE: Cell =
        Cell::from_bytes(b"ton-dns/wallet/v1").expect("static code cell");
}

/// Contract kinds the host can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// Root registrar.
    Registrar,
    /// Per-domain record.
    Record,
    /// Plain wallet: accepts everything, runs nothing.
    Wallet,
}

impl ContractKind {
    /// Marker code cell.
    #[must_use]
    pub fn code(self) -> Cell {
        match self {
            Self::Registrar => REGISTRAR_CODE.clone(),
            Self::Record => RECORD_CODE.clone(),
            Self::Wallet => WALLET_CODE.clone(),
        }
    }

    /// Identifies a code cell.
    #[must_use]
    pub fn from_code(code: &Cell) -> Option<Self> {
        [Self::Registrar, Self::Record, Self::Wallet]
            .into_iter()
            .find(|kind| kind.code() == *code)
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Registrar => "registrar",
            Self::Record => "record",
            Self::Wallet => "wallet",
        }
    }
}
