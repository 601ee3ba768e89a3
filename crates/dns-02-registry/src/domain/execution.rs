//! # Execution Model
//!
//! What a contract sees when a message arrives and what it hands back to
//! the host. Contracts are pure: they read their data cell and the inbound
//! message, and return new data plus outbound messages. The host applies
//! both atomically.

use crate::config::RegistryConfig;
use crate::ports::outbound::OverrideTable;
use dns_01_cell_codec::{Cell, StateInit};
use shared_types::{Address, Coins, LogicalTime, UnixTime};

/// Outbound message send mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SendMode(pub u8);

impl SendMode {
    /// Value is taken from the balance as stated.
    pub const ORDINARY: Self = Self(0);
    /// Fees are paid separately; the host charges no fees so this is a marker.
    pub const PAY_FEES_SEPARATELY: Self = Self(1);
    /// Skip the message instead of failing when the balance is short.
    pub const IGNORE_ERRORS: Self = Self(2);
    /// Destroy the account if its balance reaches zero.
    pub const DESTROY_IF_ZERO: Self = Self(32);
    /// Add the whole inbound value to the stated value.
    pub const CARRY_INBOUND_VALUE: Self = Self(64);
    /// Send the entire remaining balance.
    pub const CARRY_ALL_BALANCE: Self = Self(128);

    /// Returns true if every flag of `other` is set.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SendMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Internal message delivered to a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sending account.
    pub sender: Address,
    /// Attached value, already credited to the balance.
    pub value: Coins,
    /// Message body.
    pub body: Cell,
    /// Set if this is a bounce of a message the contract sent.
    pub bounced: bool,
    /// Set if the sender wants the value back on failure.
    pub bounce: bool,
}

/// Message a contract asks the host to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination account.
    pub destination: Address,
    /// Stated value; see `mode` for additions.
    pub value: Coins,
    /// Send mode flags.
    pub mode: SendMode,
    /// Bounce flag for the receiver.
    pub bounce: bool,
    /// Body.
    pub body: Cell,
    /// Deployment payload.
    pub state_init: Option<StateInit>,
}

impl OutboundMessage {
    /// Non-bounceable message without state init.
    #[must_use]
    pub fn new(destination: Address, value: Coins, mode: SendMode, body: Cell) -> Self {
        Self {
            destination,
            value,
            mode,
            bounce: false,
            body,
            state_init: None,
        }
    }

    /// Attaches a state init.
    #[must_use]
    pub fn with_state_init(mut self, init: StateInit) -> Self {
        self.state_init = Some(init);
        self
    }
}

/// Everything a contract may read besides its data and the message.
#[derive(Clone, Copy)]
pub struct ContractContext<'a> {
    /// Current unix time.
    pub now: UnixTime,
    /// Logical time of this transaction.
    pub lt: LogicalTime,
    /// The contract's own address.
    pub address: Address,
    /// Balance including the inbound value.
    pub balance: Coins,
    /// Network override table.
    pub overrides: &'a dyn OverrideTable,
    /// Protocol parameters.
    pub config: &'a RegistryConfig,
}

impl std::fmt::Debug for ContractContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractContext")
            .field("now", &self.now)
            .field("lt", &self.lt)
            .field("address", &self.address)
            .field("balance", &self.balance)
            .finish_non_exhaustive()
    }
}

/// Result of a successful (or non-fatally ignored) message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// 0, or `exit_codes::UNKNOWN_OP` for an ignored message.
    pub exit_code: u32,
    /// New persistent data.
    pub data: Cell,
    /// Messages to send, in order.
    pub actions: Vec<OutboundMessage>,
}

impl Outcome {
    /// Success with new data.
    #[must_use]
    pub fn commit(data: Cell, actions: Vec<OutboundMessage>) -> Self {
        Self {
            exit_code: 0,
            data,
            actions,
        }
    }

    /// Success without changes.
    #[must_use]
    pub fn unchanged(data: &Cell) -> Self {
        Self::commit(data.clone(), Vec::new())
    }

    /// Non-fatal rejection with a result code.
    #[must_use]
    pub fn ignored(data: Cell, actions: Vec<OutboundMessage>, exit_code: u32) -> Self {
        Self {
            exit_code,
            data,
            actions,
        }
    }
}
