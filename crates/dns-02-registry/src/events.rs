//! # Message Schema
//!
//! Typed bodies of every message the registrar and records exchange.
//! Each payload writes its own opcode in `to_cell` and is read back with
//! `load` from a slice positioned just after the opcode.
//!
//! | Payload | Opcode | Direction |
//! |---------|--------|-----------|
//! | `DeployItem` | `0x00000000` | Registrar → Record |
//! | `BatchDeploy` | `0x00000002` | Owner → Registrar |
//! | `TransferRequest` | `0x5fcc3d14` | Owner → Record |
//! | `OwnershipAssigned` | `0x05138d91` | Record → new owner |
//! | `Excesses` | `0xd53276db` | Record → response destination |
//! | `StaticDataReport` | `0x8b771735` | Record → querier |
//! | `RoyaltyReport` | `0xa8cb00ad` | Registrar → querier |
//! | `EditRecord` | `0x4eb1f0f9` | Owner → Record |
//! | `EditContent` | `0x1a0b9d51` | Owner → Record |

use crate::domain::entities::RoyaltyParams;
use crate::domain::value_objects::opcodes;
use crate::errors::ContractError;
use dns_01_cell_codec::{Cell, CellBuilder, CellError, CellSlice, Dictionary};
use shared_types::{Address, Coins, U256};

/// Bits in the registration body's root cell available for the name.
const NAME_BYTES_IN_ROOT: usize = (dns_01_cell_codec::domain::MAX_BITS - 32) / 8;

/// Reads a 32-bit opcode.
///
/// # Errors
///
/// Returns an underflow error if fewer than 32 bits remain.
pub fn load_op(s: &mut CellSlice) -> Result<u32, CellError> {
    let raw = s.load_uint(32)?;
    u32::try_from(raw).map_err(|_| CellError::IntegerOutOfRange { bits: 32 })
}

/// Body of just `op:32 query_id:64`.
///
/// # Errors
///
/// Never fails in practice; mirrors the builder signature.
pub fn simple_body(op: u32, query_id: u64) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(op), 32)?.store_uint(query_id, 64)?;
    b.build()
}

/// Registration body: opcode 0 followed by the name, spilling into a
/// second chunk when it does not fit the root cell.
///
/// # Errors
///
/// Returns an overflow error for names that do not fit two chunks.
pub fn registration_body(name: &[u8]) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(opcodes::DEPLOY), 32)?;
    if name.len() <= NAME_BYTES_IN_ROOT {
        b.store_bytes(name)?;
    } else {
        let (head, tail) = name.split_at(NAME_BYTES_IN_ROOT);
        b.store_bytes(head)?;
        b.store_ref(Cell::from_bytes(tail)?)?;
    }
    b.build()
}

/// Splits off the opcode and checks it.
fn expect_op(body: &Cell, op: u32) -> Option<CellSlice> {
    let mut s = body.parse();
    (load_op(&mut s).ok()? == op).then_some(s)
}

// =============================================================================
// FORWARD PAYLOAD
// =============================================================================

/// `Either Cell ^Cell` payload forwarded to a new owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardPayload {
    /// Stored in place.
    Inline(Cell),
    /// Stored behind a reference.
    Ref(Cell),
}

impl Default for ForwardPayload {
    fn default() -> Self {
        Self::Inline(Cell::empty())
    }
}

impl ForwardPayload {
    fn store(&self, b: &mut CellBuilder) -> Result<(), CellError> {
        match self {
            Self::Inline(cell) => {
                b.store_bit(false)?.store_cell_contents(cell)?;
            }
            Self::Ref(cell) => {
                b.store_bit(true)?.store_ref(cell.clone())?;
            }
        }
        Ok(())
    }

    fn load(s: &mut CellSlice) -> Result<Self, CellError> {
        if s.remaining_bits() == 0 {
            return Ok(Self::default());
        }
        if s.load_bit()? {
            Ok(Self::Ref(s.load_ref()?))
        } else {
            Ok(Self::Inline(s.to_cell()?))
        }
    }
}

// =============================================================================
// DEPLOYMENT
// =============================================================================

/// How a freshly deployed record starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployKind {
    /// Open an auction with the registrant as first bidder.
    Auction {
        /// Registrant.
        registrant: Address,
        /// Name bytes.
        domain: Vec<u8>,
    },
    /// Assign an owner and content directly.
    Direct {
        /// Owner.
        owner: Address,
        /// Initial content.
        content: Cell,
    },
}

/// Registrar → record deployment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployItem {
    /// Query id (the registrar's logical time).
    pub query_id: u64,
    /// Deployment kind.
    pub kind: DeployKind,
}

impl DeployItem {
    /// Serializes with opcode 0.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(opcodes::DEPLOY), 32)?
            .store_uint(self.query_id, 64)?;
        match &self.kind {
            DeployKind::Auction { registrant, domain } => {
                let mut name = CellBuilder::new();
                name.store_string_tail(domain)?;
                b.store_bit(false)?
                    .store_address(registrant)?
                    .store_ref(name.build()?)?;
            }
            DeployKind::Direct { owner, content } => {
                b.store_bit(true)?
                    .store_address(owner)?
                    .store_ref(content.clone())?;
            }
        }
        b.build()
    }

    /// Reads the fields after the opcode.
    ///
    /// # Errors
    ///
    /// Returns a cell error on truncated input.
    pub fn load(s: &mut CellSlice) -> Result<Self, CellError> {
        let query_id = s.load_uint(64)?;
        let kind = if s.load_bit()? {
            DeployKind::Direct {
                owner: s.load_std_address()?,
                content: s.load_ref()?,
            }
        } else {
            DeployKind::Auction {
                registrant: s.load_std_address()?,
                domain: s.load_ref()?.parse().load_string_tail()?,
            }
        };
        Ok(Self { query_id, kind })
    }

    /// Account the deployment is on behalf of.
    #[must_use]
    pub fn beneficiary(&self) -> Address {
        match &self.kind {
            DeployKind::Auction { registrant, .. } => *registrant,
            DeployKind::Direct { owner, .. } => *owner,
        }
    }
}

/// One entry of a batch deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Record index.
    pub index: u64,
    /// Value forwarded to the record.
    pub value: Coins,
    /// Owner of the new record.
    pub owner: Address,
    /// Initial content.
    pub content: Cell,
}

/// Owner → registrar batch deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDeploy {
    /// Query id.
    pub query_id: u64,
    /// Items, deployed in ascending index order.
    pub items: Vec<BatchItem>,
}

impl BatchDeploy {
    /// Serializes as `op query_id HashmapE 64 (coins ^(owner ^content))`.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut dict = Dictionary::new(64);
        for item in &self.items {
            let mut inner = CellBuilder::new();
            inner
                .store_address(&item.owner)?
                .store_ref(item.content.clone())?;
            let mut value = CellBuilder::new();
            value.store_coins(item.value)?.store_ref(inner.build()?)?;
            dict.set(U256::from(item.index), value.build()?)?;
        }
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(opcodes::BATCH_DEPLOY), 32)?
            .store_uint(self.query_id, 64)?;
        dict.store(&mut b)?;
        b.build()
    }

    /// Reads the fields after the opcode.
    ///
    /// # Errors
    ///
    /// Returns a cell error on malformed input.
    pub fn load(s: &mut CellSlice) -> Result<Self, CellError> {
        let query_id = s.load_uint(64)?;
        let dict = Dictionary::load(s, 64)?;
        let mut items = Vec::with_capacity(dict.len());
        for (key, value) in dict.iter() {
            let mut v = value.parse();
            let coins = v.load_coins()?;
            let mut inner = v.load_ref()?.parse();
            items.push(BatchItem {
                index: key.low_u64(),
                value: coins,
                owner: inner.load_std_address()?,
                content: inner.load_ref()?,
            });
        }
        Ok(Self { query_id, items })
    }
}

// =============================================================================
// OWNERSHIP
// =============================================================================

/// Terms of an ownership change, shared by owner transfers and forced
/// override transfers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTerms {
    /// New owner.
    pub new_owner: Address,
    /// Where unspent value goes.
    pub response_destination: Option<Address>,
    /// Unused by records; carried for wire compatibility.
    pub custom_payload: Option<Cell>,
    /// Value attached to the ownership notification.
    pub forward_amount: Coins,
    /// Payload of the ownership notification.
    pub forward_payload: ForwardPayload,
}

impl TransferTerms {
    /// Plain transfer to `new_owner` with no notification.
    #[must_use]
    pub fn to(new_owner: Address) -> Self {
        Self {
            new_owner,
            response_destination: None,
            custom_payload: None,
            forward_amount: Coins::ZERO,
            forward_payload: ForwardPayload::default(),
        }
    }

    fn store(&self, b: &mut CellBuilder) -> Result<(), CellError> {
        b.store_address(&self.new_owner)?
            .store_maybe_address(self.response_destination.as_ref())?
            .store_maybe_ref(self.custom_payload.clone())?
            .store_coins(self.forward_amount)?;
        self.forward_payload.store(b)
    }

    fn load(s: &mut CellSlice) -> Result<Self, CellError> {
        Ok(Self {
            new_owner: s.load_std_address()?,
            response_destination: s.load_address()?,
            custom_payload: s.load_maybe_ref()?,
            forward_amount: s.load_coins()?,
            forward_payload: ForwardPayload::load(s)?,
        })
    }
}

/// Owner → record transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Query id.
    pub query_id: u64,
    /// Transfer terms.
    pub terms: TransferTerms,
}

impl TransferRequest {
    /// Serializes with the transfer opcode.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(opcodes::TRANSFER), 32)?
            .store_uint(self.query_id, 64)?;
        self.terms.store(&mut b)?;
        b.build()
    }

    /// Reads the fields after the opcode.
    ///
    /// # Errors
    ///
    /// Returns a cell error on truncated input.
    pub fn load(s: &mut CellSlice) -> Result<Self, CellError> {
        Ok(Self {
            query_id: s.load_uint(64)?,
            terms: TransferTerms::load(s)?,
        })
    }
}

/// Record → new owner notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipAssigned {
    /// Query id of the transfer.
    pub query_id: u64,
    /// Owner before the transfer; `None` if there was none.
    pub prev_owner: Option<Address>,
    /// Forwarded payload.
    pub forward_payload: ForwardPayload,
}

impl OwnershipAssigned {
    /// Serializes with the notification opcode.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(opcodes::OWNERSHIP_ASSIGNED), 32)?
            .store_uint(self.query_id, 64)?
            .store_maybe_address(self.prev_owner.as_ref())?;
        self.forward_payload.store(&mut b)?;
        b.build()
    }

    /// Parses a full body, `None` if it is not this message.
    #[must_use]
    pub fn from_body(body: &Cell) -> Option<Self> {
        let mut s = expect_op(body, opcodes::OWNERSHIP_ASSIGNED)?;
        Some(Self {
            query_id: s.load_uint(64).ok()?,
            prev_owner: s.load_address().ok()?,
            forward_payload: ForwardPayload::load(&mut s).ok()?,
        })
    }
}

/// Record → response destination refund of unspent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Excesses {
    /// Query id of the request.
    pub query_id: u64,
}

impl Excesses {
    /// Serializes with the excesses opcode.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        simple_body(opcodes::EXCESSES, self.query_id)
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// Record → querier static data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticDataReport {
    /// Query id.
    pub query_id: u64,
    /// Record index.
    pub index: U256,
    /// Registrar address.
    pub collection: Address,
}

impl StaticDataReport {
    /// Serializes with the report opcode.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(opcodes::REPORT_STATIC_DATA), 32)?
            .store_uint(self.query_id, 64)?
            .store_u256(&self.index, 256)?
            .store_address(&self.collection)?;
        b.build()
    }

    /// Parses a full body, `None` if it is not this message.
    #[must_use]
    pub fn from_body(body: &Cell) -> Option<Self> {
        let mut s = expect_op(body, opcodes::REPORT_STATIC_DATA)?;
        Some(Self {
            query_id: s.load_uint(64).ok()?,
            index: s.load_u256(256).ok()?,
            collection: s.load_std_address().ok()?,
        })
    }
}

/// Registrar → querier royalty parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoyaltyReport {
    /// Query id.
    pub query_id: u64,
    /// Parameters.
    pub params: RoyaltyParams,
}

impl RoyaltyReport {
    /// Serializes with the report opcode.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, ContractError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(opcodes::REPORT_ROYALTY_PARAMS), 32)?
            .store_uint(self.query_id, 64)?;
        self.params.store(&mut b)?;
        Ok(b.build()?)
    }

    /// Parses a full body, `None` if it is not this message.
    #[must_use]
    pub fn from_body(body: &Cell) -> Option<Self> {
        let mut s = expect_op(body, opcodes::REPORT_ROYALTY_PARAMS)?;
        Some(Self {
            query_id: s.load_uint(64).ok()?,
            params: RoyaltyParams::load(&mut s).ok()?,
        })
    }
}

// =============================================================================
// EDITS
// =============================================================================

/// Owner → record: set (value present) or delete (absent) one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    /// Query id.
    pub query_id: u64,
    /// Category hash.
    pub category: U256,
    /// New value; `None` deletes.
    pub value: Option<Cell>,
}

impl EditRecord {
    /// Serializes with the edit opcode. The value, if any, is the body's
    /// only reference.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(opcodes::EDIT_RECORD), 32)?
            .store_uint(self.query_id, 64)?
            .store_u256(&self.category, 256)?;
        if let Some(value) = &self.value {
            b.store_ref(value.clone())?;
        }
        b.build()
    }

    /// Reads the fields after the opcode.
    ///
    /// # Errors
    ///
    /// Returns a cell error on truncated input.
    pub fn load(s: &mut CellSlice) -> Result<Self, CellError> {
        let query_id = s.load_uint(64)?;
        let category = s.load_u256(256)?;
        let value = if s.remaining_refs() > 0 {
            Some(s.load_ref()?)
        } else {
            None
        };
        Ok(Self {
            query_id,
            category,
            value,
        })
    }
}

/// Owner → record: replace the whole content cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditContent {
    /// Query id.
    pub query_id: u64,
    /// New content.
    pub content: Cell,
}

impl EditContent {
    /// Serializes with the edit-content opcode.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(opcodes::EDIT_CONTENT), 32)?
            .store_uint(self.query_id, 64)?
            .store_ref(self.content.clone())?;
        b.build()
    }

    /// Reads the fields after the opcode.
    ///
    /// # Errors
    ///
    /// Returns a cell error on truncated input.
    pub fn load(s: &mut CellSlice) -> Result<Self, CellError> {
        Ok(Self {
            query_id: s.load_uint(64)?,
            content: s.load_ref()?,
        })
    }
}

// =============================================================================
// OVERRIDES
// =============================================================================

/// Decision tag for a forced transfer.
pub const OVERRIDE_TRANSFER: u64 = 0;

/// Decision tag for a forced release.
pub const OVERRIDE_RELEASE: u64 = 1;

/// Value of a network override table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideDecision {
    /// Hand the domain to a new owner.
    Transfer(TransferTerms),
    /// Return the balance to the registrar and destroy the record.
    Release,
}

impl OverrideDecision {
    /// Serializes as `tag:8` followed by the transfer terms, if any.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        match self {
            Self::Transfer(terms) => {
                b.store_uint(OVERRIDE_TRANSFER, 8)?;
                terms.store(&mut b)?;
            }
            Self::Release => {
                b.store_uint(OVERRIDE_RELEASE, 8)?;
            }
        }
        b.build()
    }

    /// Parses a table value. Unknown tags yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a cell error if a transfer decision is truncated.
    pub fn from_cell(cell: &Cell) -> Result<Option<Self>, CellError> {
        let mut s = cell.parse();
        match s.load_uint(8)? {
            OVERRIDE_TRANSFER => Ok(Some(Self::Transfer(TransferTerms::load(&mut s)?))),
            OVERRIDE_RELEASE => Ok(Some(Self::Release)),
            _ => Ok(None),
        }
    }
}
