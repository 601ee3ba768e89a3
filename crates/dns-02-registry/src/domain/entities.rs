//! # Domain Entities
//!
//! Persistent state of the registrar and of each domain record, with their
//! exact cell layouts.
//!
//! ## Record layout
//!
//! | Field | Encoding | Present |
//! |-------|----------|---------|
//! | index | `uint256` | always |
//! | collection | `MsgAddress` | always |
//! | owner | `MsgAddress` (`addr_none` while unowned) | initialized |
//! | content | `^Cell` | initialized |
//! | domain | `^Cell` snake string | initialized |
//! | auction | `Maybe ^(bidder, bid, end_time:64)` | initialized |
//! | last fill-up | `uint64` | initialized |

use crate::domain::value_objects::opcodes;
use crate::errors::ContractError;
use dns_01_cell_codec::{Cell, CellBuilder, CellSlice};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Coins, UnixTime, U256};

// =============================================================================
// AUCTION & TENURE
// =============================================================================

/// Running auction for an unowned domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    /// Current top bidder.
    pub bidder: Address,
    /// Current top bid, held in escrow.
    pub bid: Coins,
    /// Settlement time.
    pub end_time: UnixTime,
}

impl Auction {
    /// Returns true once bids are no longer accepted.
    #[must_use]
    pub fn is_finished(&self, now: UnixTime) -> bool {
        self.end_time <= now
    }

    fn to_cell(self) -> Result<Cell, ContractError> {
        let mut b = CellBuilder::new();
        b.store_address(&self.bidder)?
            .store_coins(self.bid)?
            .store_uint(self.end_time, 64)?;
        Ok(b.build()?)
    }

    fn from_cell(cell: &Cell) -> Result<Self, ContractError> {
        let mut s = cell.parse();
        Ok(Self {
            bidder: s.load_std_address()?,
            bid: s.load_coins()?,
            end_time: s.load_uint(64)?,
        })
    }
}

/// Who holds a domain. An owner and an auction never coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tenure {
    /// Neither owned nor at auction.
    Unclaimed,
    /// Bidding in progress.
    Auction(Auction),
    /// Settled owner.
    Owned(Address),
}

impl Tenure {
    /// Settled owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<Address> {
        match self {
            Self::Owned(owner) => Some(*owner),
            _ => None,
        }
    }

    /// Running auction, if any.
    #[must_use]
    pub fn auction(&self) -> Option<&Auction> {
        match self {
            Self::Auction(auction) => Some(auction),
            _ => None,
        }
    }
}

/// Lifecycle phase of a record at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordPhase {
    /// Not yet deployed by the registrar, or ownerless.
    Uninitialized,
    /// Auction accepting bids.
    AuctionActive,
    /// Owned and renewed within the window.
    OwnedCurrent,
    /// Owned but idle past the renewal window; releasable.
    OwnedStale,
}

// =============================================================================
// RECORD STATE
// =============================================================================

/// State a record holds once the registrar has deployed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBody {
    /// Ownership or auction.
    pub tenure: Tenure,
    /// Content cell (see `DomainContent`).
    pub content: Cell,
    /// The literal domain name.
    pub domain: Vec<u8>,
    /// Last renewal or owner action.
    pub last_fill_up: UnixTime,
}

/// Persistent data of a domain record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordState {
    /// Hash of the domain name cell; identity of the record.
    pub index: U256,
    /// Registrar that deployed the record.
    pub collection: Address,
    /// `None` until initialized by the registrar.
    pub body: Option<RecordBody>,
}

impl RecordState {
    /// Initial data the registrar deploys a record with.
    #[must_use]
    pub fn uninitialized(index: U256, collection: Address) -> Self {
        Self {
            index,
            collection,
            body: None,
        }
    }

    /// Phase at time `now` given the renewal window.
    #[must_use]
    pub fn phase(&self, now: UnixTime, renewal_window: u64) -> RecordPhase {
        let Some(body) = &self.body else {
            return RecordPhase::Uninitialized;
        };
        match body.tenure {
            Tenure::Unclaimed => RecordPhase::Uninitialized,
            Tenure::Auction(a) if !a.is_finished(now) => RecordPhase::AuctionActive,
            // unsettled; settlement resets last_fill_up
            Tenure::Auction(_) => RecordPhase::OwnedCurrent,
            Tenure::Owned(_) => {
                if now.saturating_sub(body.last_fill_up) > renewal_window {
                    RecordPhase::OwnedStale
                } else {
                    RecordPhase::OwnedCurrent
                }
            }
        }
    }

    /// Settled owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<Address> {
        self.body.as_ref().and_then(|b| b.tenure.owner())
    }

    /// Running auction, if any.
    #[must_use]
    pub fn auction(&self) -> Option<Auction> {
        self.body.as_ref().and_then(|b| b.tenure.auction().copied())
    }

    /// Serializes the record data.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, ContractError> {
        let mut b = CellBuilder::new();
        b.store_u256(&self.index, 256)?
            .store_address(&self.collection)?;
        if let Some(body) = &self.body {
            let mut domain = CellBuilder::new();
            domain.store_string_tail(&body.domain)?;
            let auction = match body.tenure.auction() {
                Some(a) => Some(a.to_cell()?),
                None => None,
            };
            b.store_maybe_address(body.tenure.owner().as_ref())?
                .store_ref(body.content.clone())?
                .store_ref(domain.build()?)?
                .store_maybe_ref(auction)?
                .store_uint(body.last_fill_up, 64)?;
        }
        Ok(b.build()?)
    }

    /// Parses record data. Data that stops after the content reference has
    /// no domain, no auction and a zero fill-up time.
    ///
    /// # Errors
    ///
    /// Returns a cell error for truncated or malformed data.
    pub fn from_cell(cell: &Cell) -> Result<Self, ContractError> {
        let mut s = cell.parse();
        let index = s.load_u256(256)?;
        let collection = s.load_std_address()?;
        if s.remaining_bits() == 0 && s.remaining_refs() == 0 {
            return Ok(Self::uninitialized(index, collection));
        }

        let owner = s.load_address()?;
        let content = s.load_ref()?;
        let (domain, auction, last_fill_up) = if s.remaining_refs() > 0 {
            let domain = s.load_ref()?.parse().load_string_tail()?;
            let auction = match s.load_maybe_ref()? {
                Some(cell) => Some(Auction::from_cell(&cell)?),
                None => None,
            };
            (domain, auction, s.load_uint(64)?)
        } else {
            (Vec::new(), None, 0)
        };

        let tenure = match (auction, owner) {
            (Some(a), _) => Tenure::Auction(a),
            (None, Some(o)) => Tenure::Owned(o),
            (None, None) => Tenure::Unclaimed,
        };

        Ok(Self {
            index,
            collection,
            body: Some(RecordBody {
                tenure,
                content,
                domain,
                last_fill_up,
            }),
        })
    }
}

// =============================================================================
// REGISTRAR STATE
// =============================================================================

/// Royalty parameters reported by the registrar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltyParams {
    /// Royalty numerator.
    pub numerator: u16,
    /// Royalty denominator.
    pub denominator: u16,
    /// Royalty destination.
    pub destination: Address,
}

impl RoyaltyParams {
    /// Zero royalty paid to `destination`.
    #[must_use]
    pub fn none(destination: Address) -> Self {
        Self {
            numerator: 0,
            denominator: 1,
            destination,
        }
    }

    /// Appends `numerator:16 denominator:16 destination`.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn store(&self, b: &mut CellBuilder) -> Result<(), ContractError> {
        b.store_uint(u64::from(self.numerator), 16)?
            .store_uint(u64::from(self.denominator), 16)?
            .store_address(&self.destination)?;
        Ok(())
    }

    /// Reads `numerator:16 denominator:16 destination`.
    ///
    /// # Errors
    ///
    /// Returns a cell error on truncated input.
    pub fn load(s: &mut CellSlice) -> Result<Self, ContractError> {
        Ok(Self {
            numerator: u16::try_from(s.load_uint(16)?).unwrap_or(u16::MAX),
            denominator: u16::try_from(s.load_uint(16)?).unwrap_or(u16::MAX),
            destination: s.load_std_address()?,
        })
    }
}

/// Persistent data of the registrar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrarState {
    /// Collection-level content.
    pub content: Cell,
    /// Code every record is deployed with.
    pub item_code: Cell,
    /// Royalty parameters, if configured.
    pub royalty: Option<RoyaltyParams>,
    /// Privileged owner; `None` means registrations are open to all.
    pub owner: Option<Address>,
}

impl RegistrarState {
    /// Serializes as `^content ^item_code [^royalty] [owner]`.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, ContractError> {
        let mut b = CellBuilder::new();
        b.store_ref(self.content.clone())?
            .store_ref(self.item_code.clone())?;
        if let Some(royalty) = &self.royalty {
            let mut r = CellBuilder::new();
            royalty.store(&mut r)?;
            b.store_ref(r.build()?)?;
        }
        if let Some(owner) = &self.owner {
            b.store_address(owner)?;
        }
        Ok(b.build()?)
    }

    /// Parses registrar data.
    ///
    /// # Errors
    ///
    /// Returns a cell error for truncated data.
    pub fn from_cell(cell: &Cell) -> Result<Self, ContractError> {
        let mut s = cell.parse();
        let content = s.load_ref()?;
        let item_code = s.load_ref()?;
        let royalty = if s.remaining_refs() > 0 {
            Some(RoyaltyParams::load(&mut s.load_ref()?.parse())?)
        } else {
            None
        };
        let owner = if s.remaining_bits() >= 2 {
            s.load_address()?
        } else {
            None
        };
        Ok(Self {
            content,
            item_code,
            royalty,
            owner,
        })
    }
}

// =============================================================================
// MESSAGE HELPERS
// =============================================================================

/// Query id of a body shaped `op:32 query_id:64 ...`, or 0.
#[must_use]
pub fn peek_query_id(body: &Cell) -> u64 {
    let mut s = body.parse();
    match s.load_uint(32) {
        Ok(op) if op != u64::from(opcodes::DEPLOY) => s.load_uint(64).unwrap_or(0),
        _ => 0,
    }
}
