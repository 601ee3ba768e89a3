//! # Value Objects
//!
//! Opcodes, record categories and the typed DNS record encodings.

use crate::errors::ContractError;
use dns_01_cell_codec::{Cell, CellBuilder};
use sha2::{Digest, Sha256};
use shared_types::{Address, U256};

/// Message opcodes (first 32 bits of a body).
pub mod opcodes {
    /// Registration, bid, renewal, record deployment.
    pub const DEPLOY: u32 = 0;
    /// Batch deployment by the registrar owner.
    pub const BATCH_DEPLOY: u32 = 2;
    /// Proceeds and pings addressed to the registrar.
    pub const FILL_UP: u32 = 0x370f_ec51;
    /// Royalty query.
    pub const GET_ROYALTY_PARAMS: u32 = 0x693d_3950;
    /// Royalty reply.
    pub const REPORT_ROYALTY_PARAMS: u32 = 0xa8cb_00ad;
    /// Ownership transfer.
    pub const TRANSFER: u32 = 0x5fcc_3d14;
    /// Notification to a new owner.
    pub const OWNERSHIP_ASSIGNED: u32 = 0x0513_8d91;
    /// Unspent value returned to the response destination.
    pub const EXCESSES: u32 = 0xd532_76db;
    /// Static data query.
    pub const GET_STATIC_DATA: u32 = 0x2fcb_26a2;
    /// Static data reply.
    pub const REPORT_STATIC_DATA: u32 = 0x8b77_1735;
    /// Release of a stale domain.
    pub const DNS_BALANCE_RELEASE: u32 = 0x4ed1_4b65;
    /// Set or delete one content record.
    pub const EDIT_RECORD: u32 = 0x4eb1_f0f9;
    /// Replace the whole content cell.
    pub const EDIT_CONTENT: u32 = 0x1a0b_9d51;
    /// Apply the network override decision.
    pub const PROCESS_OVERRIDE: u32 = 0x44be_ae41;
    /// Refund to an outbid bidder.
    pub const OUTBID: u32 = 0x557c_ea20;
    /// Prefix of a bounced message body.
    pub const BOUNCED: u32 = 0xffff_ffff;
}

/// SHA-256 of a category name as a 256-bit key.
#[must_use]
pub fn category_hash(name: &str) -> U256 {
    U256::from_big_endian(&Sha256::digest(name.as_bytes()))
}

/// Well-known record categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Wallet the domain pays to.
    Wallet,
    /// Delegate resolver for subdomains.
    NextResolver,
    /// Display name metadata.
    Name,
    /// Description metadata.
    Description,
    /// Image URL metadata.
    Image,
}

impl Category {
    /// All known categories.
    pub const ALL: [Category; 5] = [
        Category::Wallet,
        Category::NextResolver,
        Category::Name,
        Category::Description,
        Category::Image,
    ];

    /// Name hashed to form the key.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::NextResolver => "dns_next_resolver",
            Self::Name => "name",
            Self::Description => "description",
            Self::Image => "image",
        }
    }

    /// Dictionary key.
    #[must_use]
    pub fn key(self) -> U256 {
        category_hash(self.name())
    }

    /// Looks a key up among the known categories.
    #[must_use]
    pub fn from_key(key: &U256) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == *key)
    }
}

/// `dns_next_resolver#ba93`
pub const NEXT_RESOLVER_PREFIX: u64 = 0xba93;

/// `dns_smc_address#9fd3`
pub const SMC_ADDRESS_PREFIX: u64 = 0x9fd3;

/// A typed record value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsRecord {
    /// Delegate resolution of the remaining path to this contract.
    NextResolver(Address),
    /// Smart contract (wallet) address, no capability flags.
    Wallet(Address),
}

impl DnsRecord {
    /// Encodes the record as a value cell.
    ///
    /// # Errors
    ///
    /// Propagates builder errors.
    pub fn to_cell(&self) -> Result<Cell, ContractError> {
        let mut b = CellBuilder::new();
        match self {
            Self::NextResolver(addr) => {
                b.store_uint(NEXT_RESOLVER_PREFIX, 16)?.store_address(addr)?;
            }
            Self::Wallet(addr) => {
                b.store_uint(SMC_ADDRESS_PREFIX, 16)?
                    .store_address(addr)?
                    .store_uint(0, 1)?;
            }
        }
        Ok(b.build()?)
    }

    /// Decodes a value cell. Returns `None` for other record kinds.
    #[must_use]
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        let mut s = cell.parse();
        match s.load_uint(16).ok()? {
            NEXT_RESOLVER_PREFIX => s.load_std_address().ok().map(Self::NextResolver),
            SMC_ADDRESS_PREFIX => s.load_std_address().ok().map(Self::Wallet),
            _ => None,
        }
    }

    /// Address the record points to.
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            Self::NextResolver(a) | Self::Wallet(a) => *a,
        }
    }
}
