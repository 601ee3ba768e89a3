//! # Inbound Ports
//!
//! `ContractHandler` is how the host drives a contract; `NameRegistryApi`
//! is the user-facing surface of the service.

use crate::domain::code::ContractKind;
use crate::domain::entities::{Auction, RecordPhase};
use crate::domain::execution::{ContractContext, InboundMessage, Outcome};
use crate::errors::{ApiError, ContractError};
use async_trait::async_trait;
use dns_01_cell_codec::Cell;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Coins, UnixTime, U256};
use uuid::Uuid;

/// A contract the host can deliver messages to.
pub trait ContractHandler: Send + Sync {
    /// Code this handler runs.
    fn kind(&self) -> ContractKind;

    /// Processes one inbound message against the current data.
    ///
    /// An `Err` aborts the transaction: data and balance are rolled back
    /// and bounceable value is returned.
    ///
    /// # Errors
    ///
    /// Returns the contract error that maps to the transaction's exit code.
    fn receive(
        &self,
        ctx: &ContractContext<'_>,
        data: &Cell,
        msg: &InboundMessage,
    ) -> Result<Outcome, ContractError>;
}

/// Result of a user operation that reached its target contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Correlation id assigned by the service.
    pub correlation_id: Uuid,
    /// Record the operation concerned.
    pub record: Address,
    /// Exit code at the target (0 or the unknown-op code).
    pub exit_code: u32,
    /// Transactions the operation caused, including follow-ups.
    pub transactions: usize,
}

/// Snapshot of a domain as seen through its record's get-methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfo {
    /// The domain name.
    pub domain: String,
    /// Record address.
    pub record: Address,
    /// Record index.
    pub index: U256,
    /// Whether the record has been deployed.
    pub deployed: bool,
    /// Phase at the time of the query.
    pub phase: RecordPhase,
    /// Settled owner.
    pub owner: Option<Address>,
    /// Auction, if one is stored.
    pub auction: Option<Auction>,
    /// Last renewal.
    pub last_fill_up: UnixTime,
    /// Record balance.
    pub balance: Coins,
}

/// Public API of the name registry service.
#[async_trait]
pub trait NameRegistryApi: Send + Sync {
    /// Opens an auction for `domain` with `payment` as the first bid.
    async fn register(
        &self,
        registrant: Address,
        domain: &str,
        payment: Coins,
    ) -> Result<Receipt, ApiError>;

    /// Outbids the current bidder.
    async fn bid(&self, bidder: Address, domain: &str, amount: Coins)
        -> Result<Receipt, ApiError>;

    /// Refreshes the renewal timer.
    async fn renew(&self, owner: Address, domain: &str, value: Coins)
        -> Result<Receipt, ApiError>;

    /// Hands the domain to `new_owner`, excess value back to the sender.
    async fn transfer(
        &self,
        owner: Address,
        domain: &str,
        new_owner: Address,
        forward_amount: Coins,
        value: Coins,
    ) -> Result<Receipt, ApiError>;

    /// Sets (`Some`) or deletes (`None`) one record.
    async fn edit_record(
        &self,
        owner: Address,
        domain: &str,
        category: U256,
        value: Option<Cell>,
    ) -> Result<Receipt, ApiError>;

    /// Re-auctions an expired domain.
    async fn release(&self, sender: Address, domain: &str, payment: Coins)
        -> Result<Receipt, ApiError>;

    /// Resolves `domain` to its `category` record, following delegation.
    async fn resolve(&self, domain: &str, category: U256) -> Result<Option<Cell>, ApiError>;

    /// Current minimum registration price.
    async fn quote(&self, domain: &str) -> Result<Coins, ApiError>;

    /// Record snapshot.
    async fn domain_info(&self, domain: &str) -> Result<DomainInfo, ApiError>;
}
