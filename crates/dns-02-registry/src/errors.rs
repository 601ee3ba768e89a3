//! # Error Types
//!
//! All error types for registrar and record execution, the sandbox host and
//! the service facade.

use dns_01_cell_codec::CellError;
use shared_types::{Address, Coins};
use thiserror::Error;

// =============================================================================
// EXIT CODES
// =============================================================================

/// Numeric result codes surfaced by contract execution.
pub mod exit_codes {
    /// Success.
    pub const OK: u32 = 0;
    /// Integer does not fit its field.
    pub const RANGE_CHECK: u32 = 5;
    /// Builder overflow.
    pub const CELL_OVERFLOW: u32 = 8;
    /// Slice underflow.
    pub const CELL_UNDERFLOW: u32 = 9;
    /// Outbound message value exceeds the balance (action phase).
    pub const NOT_ENOUGH_VALUE: u32 = 37;
    /// Resolve path is not a whole number of bytes.
    pub const RESOLVE_MISALIGNED: u32 = 70;
    /// Resolve path has an empty top label.
    pub const RESOLVE_EMPTY_LABEL: u32 = 71;
    /// Registration before the auction epoch.
    pub const AUCTION_NOT_STARTED: u32 = 199;
    /// Domain shorter than 4 characters.
    pub const DOMAIN_TOO_SHORT: u32 = 200;
    /// Domain longer than 126 characters.
    pub const DOMAIN_TOO_LONG: u32 = 201;
    /// Domain bits are not byte-aligned.
    pub const MALFORMED_BODY: u32 = 202;
    /// Character outside `[a-z0-9-]` or hyphen at an edge.
    pub const INVALID_CHARACTER: u32 = 203;
    /// Payment below the current price.
    pub const INSUFFICIENT_PAYMENT: u32 = 204;
    /// Name is claimed by the network override table.
    pub const OVERRIDE_BLOCKED: u32 = 205;
    /// Sender is not the owner (transfer, batch deploy).
    pub const UNAUTHORIZED_TRANSFER: u32 = 401;
    /// Forward amount exceeds what the record can spare.
    pub const FORWARD_EXCEEDS_BALANCE: u32 = 402;
    /// Uninitialized record addressed by someone other than its registrar.
    pub const NOT_INITIALIZED_BY_REGISTRAR: u32 = 405;
    /// Renewal by a non-owner.
    pub const UNAUTHORIZED_RENEW: u32 = 406;
    /// Bid not above the current bid, or release underpaid.
    pub const BID_TOO_LOW: u32 = 407;
    /// Content replacement by a non-owner.
    pub const UNAUTHORIZED_CONTENT_EDIT: u32 = 410;
    /// Record edit by a non-owner.
    pub const UNAUTHORIZED_RECORD_EDIT: u32 = 411;
    /// Record resolve path without a leading separator.
    pub const RESOLVE_NO_SEPARATOR: u32 = 413;
    /// Balance release before the renewal window elapsed.
    pub const RELEASE_NOT_AVAILABLE: u32 = 414;
    /// Unrecognized operation, consumed without effect.
    pub const UNKNOWN_OP: u32 = 0xffff;
}

// =============================================================================
// CONTRACT ERRORS
// =============================================================================

/// Errors that abort a contract transaction. Each maps to one exit code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Cell encoding or decoding failed.
    #[error("cell error: {0}")]
    Cell(#[from] CellError),

    /// Resolve path is not byte-aligned.
    #[error("resolve path of {bits} bits is not byte-aligned")]
    ResolvePathMisaligned { bits: usize },

    /// Resolve path has no top-level label.
    #[error("resolve path has an empty label")]
    EmptyLabel,

    /// Resolve path on a record does not start with the separator.
    #[error("resolve path must start with a zero byte")]
    MissingSeparator,

    /// Registration before the auctions opened.
    #[error("auctions start after {epoch}, now is {now}")]
    AuctionNotStarted { now: u64, epoch: u64 },

    /// Domain shorter than the minimum.
    #[error("domain of {len} characters is too short")]
    DomainTooShort { len: usize },

    /// Domain longer than the maximum.
    #[error("domain of {len} characters is too long")]
    DomainTooLong { len: usize },

    /// Domain chunk not byte-aligned.
    #[error("registration body is not byte-aligned")]
    MalformedBody,

    /// Forbidden character or edge hyphen.
    #[error("invalid character {byte:#04x} at position {position}")]
    InvalidCharacter { byte: u8, position: usize },

    /// Payment below price.
    #[error("payment {paid} below price {price}")]
    InsufficientPayment { paid: Coins, price: Coins },

    /// Name claimed by the override table.
    #[error("domain is reserved by the network override table")]
    OverrideBlocked,

    /// Sender is not the owner.
    #[error("sender {sender} may not transfer")]
    UnauthorizedTransfer { sender: Address },

    /// Forward amount exceeds the spendable balance.
    #[error("forward amount {forward} exceeds spendable {spendable}")]
    ForwardExceedsBalance { forward: Coins, spendable: Coins },

    /// Uninitialized record touched by a stranger.
    #[error("record not initialized; only the registrar may deploy it")]
    NotInitializedByRegistrar { sender: Address },

    /// Renewal by a non-owner.
    #[error("sender {sender} may not renew")]
    UnauthorizedRenew { sender: Address },

    /// Bid too low or release underpaid.
    #[error("offer {offered} does not beat {required}")]
    BidTooLow { offered: Coins, required: Coins },

    /// Content replacement by a non-owner.
    #[error("sender {sender} may not replace content")]
    UnauthorizedContentEdit { sender: Address },

    /// Record edit by a non-owner.
    #[error("sender {sender} may not edit records")]
    UnauthorizedRecordEdit { sender: Address },

    /// Release attempted too early.
    #[error("balance release not available")]
    ReleaseNotAvailable,
}

impl ContractError {
    /// Exit code this error surfaces as.
    #[must_use]
    pub fn exit_code(&self) -> u32 {
        use exit_codes::*;
        match self {
            Self::Cell(e) => e.exit_code(),
            Self::ResolvePathMisaligned { .. } => RESOLVE_MISALIGNED,
            Self::EmptyLabel => RESOLVE_EMPTY_LABEL,
            Self::MissingSeparator => RESOLVE_NO_SEPARATOR,
            Self::AuctionNotStarted { .. } => AUCTION_NOT_STARTED,
            Self::DomainTooShort { .. } => DOMAIN_TOO_SHORT,
            Self::DomainTooLong { .. } => DOMAIN_TOO_LONG,
            Self::MalformedBody => MALFORMED_BODY,
            Self::InvalidCharacter { .. } => INVALID_CHARACTER,
            Self::InsufficientPayment { .. } => INSUFFICIENT_PAYMENT,
            Self::OverrideBlocked => OVERRIDE_BLOCKED,
            Self::UnauthorizedTransfer { .. } => UNAUTHORIZED_TRANSFER,
            Self::ForwardExceedsBalance { .. } => FORWARD_EXCEEDS_BALANCE,
            Self::NotInitializedByRegistrar { .. } => NOT_INITIALIZED_BY_REGISTRAR,
            Self::UnauthorizedRenew { .. } => UNAUTHORIZED_RENEW,
            Self::BidTooLow { .. } => BID_TOO_LOW,
            Self::UnauthorizedContentEdit { .. } => UNAUTHORIZED_CONTENT_EDIT,
            Self::UnauthorizedRecordEdit { .. } => UNAUTHORIZED_RECORD_EDIT,
            Self::ReleaseNotAvailable => RELEASE_NOT_AVAILABLE,
        }
    }

    /// Returns true for failures caused by the sender lacking rights.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::UnauthorizedTransfer { .. }
                | Self::NotInitializedByRegistrar { .. }
                | Self::UnauthorizedRenew { .. }
                | Self::UnauthorizedContentEdit { .. }
                | Self::UnauthorizedRecordEdit { .. }
        )
    }

    /// Returns true for domain-name validation failures.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DomainTooShort { .. }
                | Self::DomainTooLong { .. }
                | Self::MalformedBody
                | Self::InvalidCharacter { .. }
        )
    }
}

// =============================================================================
// SANDBOX ERRORS
// =============================================================================

/// Errors raised by the in-memory host itself, never by contract logic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// No account lives at the address.
    #[error("account not found: {0}")]
    AccountNotFound(Address),

    /// The account has no contract code the host can run.
    #[error("account {0} is not a contract")]
    NotAContract(Address),

    /// The account runs a different contract than expected.
    #[error("account {address} runs {found}, expected {expected}")]
    WrongContract {
        address: Address,
        expected: &'static str,
        found: &'static str,
    },

    /// A treasury cannot cover an external send.
    #[error("insufficient funds at {address}: required {required}, available {available}")]
    InsufficientFunds {
        address: Address,
        required: Coins,
        available: Coins,
    },

    /// A deployment's state init does not hash to the destination.
    #[error("state init does not match destination {0}")]
    StateInitMismatch(Address),

    /// Recursive resolution did not terminate.
    #[error("resolution exceeded {0} hops")]
    ResolutionDepthExceeded(usize),

    /// A delegate record is not a next-resolver pointer.
    #[error("resolver returned a non-delegation record mid-path")]
    UnexpectedRecord,

    /// Cell encoding or decoding failed.
    #[error("cell error: {0}")]
    Cell(#[from] CellError),

    /// A get-method failed.
    #[error("get-method failed: {0}")]
    GetMethod(#[from] ContractError),
}

// =============================================================================
// API ERRORS
// =============================================================================

/// Errors returned by the service facade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The domain string could not be encoded.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// The message was delivered but the contract rejected it.
    #[error("rejected with exit code {exit_code}")]
    Rejected { exit_code: u32 },

    /// The record already existed; the payment was refunded.
    #[error("domain {domain} is already registered")]
    AlreadyRegistered { domain: String },

    /// Host failure.
    #[error("sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    /// Cell encoding failed.
    #[error("cell error: {0}")]
    Cell(#[from] CellError),
}

impl ApiError {
    /// Exit code when the contract rejected the request.
    #[must_use]
    pub fn exit_code(&self) -> Option<u32> {
        match self {
            Self::Rejected { exit_code } => Some(*exit_code),
            Self::Sandbox(SandboxError::GetMethod(e)) => Some(e.exit_code()),
            _ => None,
        }
    }
}
