//! # Sandbox Host
//!
//! Deterministic in-memory network the contracts run on. Messages are
//! processed one at a time from a FIFO queue; each delivery is one
//! transaction that either commits new data, balance and outbound messages
//! together, or rolls back and bounces the value to the sender.
//!
//! ## Transaction phases
//!
//! | Phase | Effect |
//! |-------|--------|
//! | deploy | state init that hashes to the destination activates the account |
//! | credit | inbound value added to the balance |
//! | compute | contract handler runs against a copy of the data |
//! | action | outbound messages debited in order; failure aborts with 37 |
//! | bounce | on abort, bounceable value goes back with `0xffffffff` prefix |
//!
//! No fees are charged, so the sum of all balances and in-flight values only
//! changes when a treasury is minted.

use crate::config::RegistryConfig;
use crate::domain::code::ContractKind;
use crate::domain::entities::{RecordState, RegistrarState};
use crate::domain::execution::{ContractContext, InboundMessage, OutboundMessage, SendMode};
use crate::domain::record::RecordContract;
use crate::domain::registrar::RegistrarContract;
use crate::domain::resolution::{domain_index, encode_dns_path, Resolution};
use crate::domain::value_objects::opcodes;
use crate::errors::{exit_codes, SandboxError};
use crate::events::simple_body;
use crate::ports::inbound::ContractHandler;
use crate::ports::outbound::OverrideTable;
use dns_01_cell_codec::{Cell, CellBuilder, CellError, StateInit};
use dns_telemetry::{metric_inc, ACCOUNTS, AUCTIONS_SETTLED, REJECTIONS, TRANSACTIONS};
use sha2::{Digest, Sha256};
use shared_types::{Address, Coins, LogicalTime, UnixTime, U256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Hops a recursive resolution may take before giving up.
pub const MAX_RESOLVE_HOPS: usize = 16;

/// Bits of the original body a bounce carries.
const BOUNCE_BODY_BITS: usize = 256;

static REGISTRAR: RegistrarContract = RegistrarContract;
static RECORD: RecordContract = RecordContract;

fn handler_for(kind: ContractKind) -> Option<&'static dyn ContractHandler> {
    match kind {
        ContractKind::Registrar => Some(&REGISTRAR),
        ContractKind::Record => Some(&RECORD),
        ContractKind::Wallet => None,
    }
}

// =============================================================================
// ACCOUNTS & MESSAGES
// =============================================================================

/// One account on the sandbox network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Address.
    pub address: Address,
    /// Balance.
    pub balance: Coins,
    /// Contract the account runs; `None` while uninitialized.
    pub kind: Option<ContractKind>,
    /// Code cell.
    pub code: Cell,
    /// Persistent data.
    pub data: Cell,
}

impl Account {
    fn uninit(address: Address, balance: Coins) -> Self {
        Self {
            address,
            balance,
            kind: None,
            code: Cell::empty(),
            data: Cell::empty(),
        }
    }

    /// Returns true once code has been deployed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }
}

/// Message in flight between accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Sender.
    pub sender: Address,
    /// Destination.
    pub destination: Address,
    /// Attached value.
    pub value: Coins,
    /// Body.
    pub body: Cell,
    /// Return the value if processing fails.
    pub bounce: bool,
    /// This message is itself a bounce.
    pub bounced: bool,
    /// Deployment payload.
    pub state_init: Option<StateInit>,
}

impl Envelope {
    /// Bounceable message.
    #[must_use]
    pub fn new(sender: Address, destination: Address, value: Coins, body: Cell) -> Self {
        Self {
            sender,
            destination,
            value,
            body,
            bounce: true,
            bounced: false,
            state_init: None,
        }
    }

    /// Clears the bounce flag.
    #[must_use]
    pub fn non_bounceable(mut self) -> Self {
        self.bounce = false;
        self
    }

    /// Attaches a state init.
    #[must_use]
    pub fn with_state_init(mut self, init: StateInit) -> Self {
        self.state_init = Some(init);
        self
    }

    /// Leading 32-bit opcode, if the body has one.
    #[must_use]
    pub fn op(&self) -> Option<u32> {
        let raw = self.body.parse().preload_uint(32).ok()?;
        u32::try_from(raw).ok()
    }

    fn bounce_back(&self) -> Self {
        Self {
            sender: self.destination,
            destination: self.sender,
            value: self.value,
            body: bounce_body(&self.body).unwrap_or_default(),
            bounce: false,
            bounced: true,
            state_init: None,
        }
    }
}

fn bounce_body(original: &Cell) -> Result<Cell, CellError> {
    let mut s = original.parse();
    let mut left = s.remaining_bits().min(BOUNCE_BODY_BITS);
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(opcodes::BOUNCED), 32)?;
    while left > 0 {
        let chunk = left.min(64);
        b.store_uint(s.load_uint(chunk)?, chunk)?;
        left -= chunk;
    }
    b.build()
}

/// Log entry for one delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Logical time.
    pub lt: LogicalTime,
    /// Unix time.
    pub now: UnixTime,
    /// Sender of the inbound message.
    pub sender: Address,
    /// Account the transaction ran on.
    pub destination: Address,
    /// Inbound value.
    pub value: Coins,
    /// Inbound opcode.
    pub op: Option<u32>,
    /// Inbound message was a bounce.
    pub bounced_in: bool,
    /// Contract exit code; 0 for value-only accounts.
    pub exit_code: u32,
    /// Rolled back.
    pub aborted: bool,
    /// Account was activated by this message.
    pub deployed: bool,
    /// Account was destroyed.
    pub destroyed: bool,
    /// Messages sent, including a bounce.
    pub out_messages: Vec<Envelope>,
}

impl Transaction {
    fn begin(lt: LogicalTime, now: UnixTime, msg: &Envelope) -> Self {
        Self {
            lt,
            now,
            sender: msg.sender,
            destination: msg.destination,
            value: msg.value,
            op: msg.op(),
            bounced_in: msg.bounced,
            exit_code: exit_codes::OK,
            aborted: false,
            deployed: false,
            destroyed: false,
            out_messages: Vec::new(),
        }
    }

    /// Returns true if the transaction committed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.aborted
    }
}

// =============================================================================
// ACTION PHASE
// =============================================================================

struct ActionPlan {
    messages: Vec<Envelope>,
    remaining: Coins,
    destroy: bool,
}

fn plan_actions(
    source: Address,
    balance: Coins,
    inbound: Coins,
    actions: Vec<OutboundMessage>,
) -> Result<ActionPlan, u32> {
    let mut remaining = balance;
    let mut destroy = false;
    let mut messages = Vec::with_capacity(actions.len());

    for action in actions {
        let value = if action.mode.contains(SendMode::CARRY_ALL_BALANCE) {
            remaining
        } else if action.mode.contains(SendMode::CARRY_INBOUND_VALUE) {
            action.value.checked_add(inbound).unwrap_or(Coins::MAX)
        } else {
            action.value
        };
        let Some(left) = remaining.checked_sub(value) else {
            if action.mode.contains(SendMode::IGNORE_ERRORS) {
                continue;
            }
            return Err(exit_codes::NOT_ENOUGH_VALUE);
        };
        remaining = left;
        if action.mode.contains(SendMode::DESTROY_IF_ZERO) && remaining.is_zero() {
            destroy = true;
        }
        messages.push(Envelope {
            sender: source,
            destination: action.destination,
            value,
            body: action.body,
            bounce: action.bounce,
            bounced: false,
            state_init: action.state_init,
        });
    }

    Ok(ActionPlan {
        messages,
        remaining,
        destroy,
    })
}

// =============================================================================
// SANDBOX
// =============================================================================

/// The in-memory network.
pub struct Sandbox {
    config: RegistryConfig,
    overrides: Arc<dyn OverrideTable>,
    accounts: HashMap<Address, Account>,
    queue: VecDeque<Envelope>,
    transactions: Vec<Transaction>,
    now: UnixTime,
    lt: LogicalTime,
    minted: Coins,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("now", &self.now)
            .field("lt", &self.lt)
            .field("accounts", &self.accounts.len())
            .field("transactions", &self.transactions.len())
            .finish_non_exhaustive()
    }
}

impl Sandbox {
    /// Empty network whose clock starts one second after the auction epoch.
    #[must_use]
    pub fn new(config: RegistryConfig, overrides: Arc<dyn OverrideTable>) -> Self {
        let now = config.auction_epoch + 1;
        Self {
            config,
            overrides,
            accounts: HashMap::new(),
            queue: VecDeque::new(),
            transactions: Vec::new(),
            now,
            lt: 0,
            minted: Coins::ZERO,
        }
    }

    /// Protocol parameters.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Current unix time.
    #[must_use]
    pub fn now(&self) -> UnixTime {
        self.now
    }

    /// Sets the clock.
    pub fn set_time(&mut self, now: UnixTime) {
        self.now = now;
    }

    /// Moves the clock forward.
    pub fn advance_time(&mut self, seconds: u64) {
        self.now += seconds;
    }

    /// Logical time of the last transaction.
    #[must_use]
    pub fn lt(&self) -> LogicalTime {
        self.lt
    }

    /// Account at `address`.
    #[must_use]
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Balance at `address`, zero if there is no account.
    #[must_use]
    pub fn balance(&self, address: &Address) -> Coins {
        self.accounts.get(address).map_or(Coins::ZERO, |a| a.balance)
    }

    /// Every transaction so far, oldest first.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Value ever created by treasuries.
    #[must_use]
    pub fn minted(&self) -> Coins {
        self.minted
    }

    /// Sum of all balances plus value in flight.
    #[must_use]
    pub fn total_value(&self) -> Coins {
        let held: Coins = self.accounts.values().map(|a| a.balance).sum();
        let in_flight: Coins = self.queue.iter().map(|m| m.value).sum();
        held + in_flight
    }

    #[allow(clippy::cast_precision_loss)]
    fn update_account_gauge(&self) {
        ACCOUNTS.set(self.accounts.len() as f64);
    }

    /// Funded wallet for `name`, created on first use. Its address is the
    /// SHA-256 of the name.
    pub fn treasury(&mut self, name: &str) -> Address {
        let hash: [u8; 32] = Sha256::digest(format!("treasury:{name}").as_bytes()).into();
        let address = Address::new(self.config.workchain, hash);
        if !self.accounts.contains_key(&address) {
            let funding = self.config.treasury_funding;
            self.accounts.insert(
                address,
                Account {
                    address,
                    balance: funding,
                    kind: Some(ContractKind::Wallet),
                    code: ContractKind::Wallet.code(),
                    data: Cell::empty(),
                },
            );
            self.minted += funding;
            self.update_account_gauge();
            debug!(%address, name, %funding, "treasury created");
        }
        address
    }

    // =========================================================================
    // MESSAGE PROCESSING
    // =========================================================================

    /// Sends `msg` from an existing account and processes the queue until
    /// it drains. Returns the transactions this send caused, in order.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` or `InsufficientFunds` for the sender; nothing is
    /// sent in that case.
    pub fn send(&mut self, msg: Envelope) -> Result<Vec<Transaction>, SandboxError> {
        let sender = self
            .accounts
            .get_mut(&msg.sender)
            .ok_or(SandboxError::AccountNotFound(msg.sender))?;
        sender.balance = sender.balance.checked_sub(msg.value).ok_or(
            SandboxError::InsufficientFunds {
                address: msg.sender,
                required: msg.value,
                available: sender.balance,
            },
        )?;

        let start = self.transactions.len();
        self.queue.push_back(msg);
        while let Some(next) = self.queue.pop_front() {
            let tx = self.deliver(next);
            self.transactions.push(tx);
        }
        self.update_account_gauge();
        Ok(self.transactions[start..].to_vec())
    }

    fn try_deploy(&mut self, destination: Address, init: &StateInit) -> bool {
        if self.accounts.get(&destination).is_some_and(Account::is_active) {
            return false;
        }
        match init.address(self.config.workchain) {
            Ok(address) if address == destination => {}
            _ => {
                debug!(%destination, "state init does not match destination");
                return false;
            }
        }
        let Some(kind) = ContractKind::from_code(&init.code) else {
            return false;
        };
        let account = self
            .accounts
            .entry(destination)
            .or_insert_with(|| Account::uninit(destination, Coins::ZERO));
        account.kind = Some(kind);
        account.code = init.code.clone();
        account.data = init.data.clone();
        true
    }

    fn deliver(&mut self, msg: Envelope) -> Transaction {
        self.lt += 1;
        let mut tx = Transaction::begin(self.lt, self.now, &msg);
        metric_inc!(TRANSACTIONS);

        if let Some(init) = &msg.state_init {
            tx.deployed = self.try_deploy(msg.destination, init);
        }

        let Some(account) = self.accounts.get_mut(&msg.destination) else {
            if msg.bounce && !msg.bounced {
                self.bounce(&msg, &mut tx, false);
            } else {
                self.accounts
                    .insert(msg.destination, Account::uninit(msg.destination, msg.value));
            }
            return tx;
        };
        account.balance += msg.value;
        let (Some(kind), balance, data) = (account.kind, account.balance, account.data.clone())
        else {
            return tx;
        };
        let Some(handler) = handler_for(kind) else {
            return tx;
        };

        let ctx = ContractContext {
            now: self.now,
            lt: self.lt,
            address: msg.destination,
            balance,
            overrides: self.overrides.as_ref(),
            config: &self.config,
        };
        let inbound = InboundMessage {
            sender: msg.sender,
            value: msg.value,
            body: msg.body.clone(),
            bounced: msg.bounced,
            bounce: msg.bounce,
        };
        let result = handler.receive(&ctx, &data, &inbound);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(destination = %msg.destination, exit_code = err.exit_code(), error = %err, "compute phase failed");
                self.abort(&msg, &mut tx, kind, err.exit_code());
                return tx;
            }
        };
        tx.exit_code = outcome.exit_code;

        let plan = match plan_actions(msg.destination, balance, msg.value, outcome.actions) {
            Ok(plan) => plan,
            Err(code) => {
                debug!(destination = %msg.destination, exit_code = code, "action phase failed");
                self.abort(&msg, &mut tx, kind, code);
                return tx;
            }
        };

        if kind == ContractKind::Record && auction_settled(&data, &outcome.data, self.now) {
            metric_inc!(AUCTIONS_SETTLED);
        }
        if let Some(account) = self.accounts.get_mut(&msg.destination) {
            account.data = outcome.data;
            account.balance = plan.remaining;
        }
        if plan.destroy {
            self.accounts.remove(&msg.destination);
            tx.destroyed = true;
            info!(address = %msg.destination, "account destroyed");
        }
        self.queue.extend(plan.messages.iter().cloned());
        tx.out_messages = plan.messages;

        trace!(
            lt = tx.lt,
            destination = %tx.destination,
            op = ?tx.op,
            exit_code = tx.exit_code,
            out = tx.out_messages.len(),
            "transaction committed"
        );
        tx
    }

    fn abort(&mut self, msg: &Envelope, tx: &mut Transaction, kind: ContractKind, code: u32) {
        tx.aborted = true;
        tx.exit_code = code;
        metric_inc!(REJECTIONS, &[kind.name(), code.to_string().as_str()]);
        if msg.bounce && !msg.bounced {
            self.bounce(msg, tx, true);
        }
    }

    fn bounce(&mut self, msg: &Envelope, tx: &mut Transaction, credited: bool) {
        if credited {
            if let Some(account) = self.accounts.get_mut(&msg.destination) {
                account.balance = account.balance.saturating_sub(msg.value);
            }
        }
        let bounce = msg.bounce_back();
        self.queue.push_back(bounce.clone());
        tx.aborted = true;
        tx.out_messages.push(bounce);
        trace!(lt = tx.lt, destination = %msg.destination, "bounced");
    }

    // =========================================================================
    // CONTRACT HELPERS
    // =========================================================================

    /// Deploys a registrar with `state` from `deployer`, funded with
    /// `value`.
    ///
    /// # Errors
    ///
    /// Fails if the deployer cannot pay or the state does not serialize.
    pub fn deploy_registrar(
        &mut self,
        deployer: Address,
        state: &RegistrarState,
        value: Coins,
    ) -> Result<Address, SandboxError> {
        let init = StateInit::new(ContractKind::Registrar.code(), state.to_cell()?);
        let address = init.address(self.config.workchain)?;
        let body = simple_body(opcodes::FILL_UP, 0)?;
        self.send(
            Envelope::new(deployer, address, value, body)
                .non_bounceable()
                .with_state_init(init),
        )?;
        if !self.accounts.get(&address).is_some_and(Account::is_active) {
            return Err(SandboxError::StateInitMismatch(address));
        }
        info!(%address, "registrar deployed");
        Ok(address)
    }

    fn contract_data(&self, address: &Address, expected: ContractKind) -> Result<&Cell, SandboxError> {
        let account = self
            .accounts
            .get(address)
            .ok_or(SandboxError::AccountNotFound(*address))?;
        match account.kind {
            Some(kind) if kind == expected => Ok(&account.data),
            Some(kind) => Err(SandboxError::WrongContract {
                address: *address,
                expected: expected.name(),
                found: kind.name(),
            }),
            None => Err(SandboxError::NotAContract(*address)),
        }
    }

    /// Parsed record data.
    ///
    /// # Errors
    ///
    /// Fails if no record lives at `address`.
    pub fn record_state(&self, address: &Address) -> Result<RecordState, SandboxError> {
        Ok(RecordState::from_cell(self.contract_data(address, ContractKind::Record)?)?)
    }

    /// Parsed registrar data.
    ///
    /// # Errors
    ///
    /// Fails if no registrar lives at `address`.
    pub fn registrar_state(&self, address: &Address) -> Result<RegistrarState, SandboxError> {
        Ok(RegistrarState::from_cell(self.contract_data(address, ContractKind::Registrar)?)?)
    }

    /// Address of the record for `domain` under `registrar`, deployed or
    /// not.
    ///
    /// # Errors
    ///
    /// Fails if no registrar lives at `registrar`.
    pub fn record_address(&self, registrar: &Address, domain: &[u8]) -> Result<Address, SandboxError> {
        let state = self.registrar_state(registrar)?;
        Ok(state.nft_address_by_index(*registrar, domain_index(domain)?, self.config.workchain)?)
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// Runs `dnsresolve` on the contract at `address`.
    ///
    /// # Errors
    ///
    /// Fails for non-resolver accounts or when the get-method throws.
    pub fn resolve_at(
        &self,
        address: &Address,
        path: &[u8],
        category: &U256,
    ) -> Result<Resolution, SandboxError> {
        let account = self
            .accounts
            .get(address)
            .ok_or(SandboxError::AccountNotFound(*address))?;
        let slice = Cell::from_bytes(path)?.parse();
        match account.kind {
            Some(ContractKind::Registrar) => Ok(RegistrarState::from_cell(&account.data)?
                .dnsresolve(*address, &slice, self.config.workchain)?),
            Some(ContractKind::Record) => {
                Ok(RecordState::from_cell(&account.data)?.dnsresolve(&slice, category)?)
            }
            _ => Err(SandboxError::NotAContract(*address)),
        }
    }

    /// Resolves `domain` starting at `root`, following next-resolver
    /// records until the path is consumed.
    ///
    /// Returns `None` when a resolver declines, a hop has no record, or the
    /// delegate was never deployed.
    ///
    /// # Errors
    ///
    /// `UnexpectedRecord` if a partial answer is not a delegation,
    /// `ResolutionDepthExceeded` for delegation loops, or get-method errors.
    pub fn resolve(
        &self,
        root: &Address,
        domain: &str,
        category: &U256,
    ) -> Result<Option<Cell>, SandboxError> {
        let path = encode_dns_path(domain)?;
        let mut remaining: &[u8] = &path;
        let mut resolver = *root;

        for _ in 0..MAX_RESOLVE_HOPS {
            if !self.accounts.get(&resolver).is_some_and(Account::is_active) {
                return Ok(None);
            }
            let res = self.resolve_at(&resolver, remaining, category)?;
            let consumed = res.consumed_bits / 8;
            if consumed == 0 {
                return Ok(None);
            }
            remaining = &remaining[consumed.min(remaining.len())..];
            if remaining.is_empty() {
                return Ok(res.value);
            }
            if res.value.is_none() {
                return Ok(None);
            }
            resolver = res.next_resolver().ok_or(SandboxError::UnexpectedRecord)?;
            trace!(%resolver, left = remaining.len(), "delegating");
        }
        Err(SandboxError::ResolutionDepthExceeded(MAX_RESOLVE_HOPS))
    }
}

fn auction_settled(before: &Cell, after: &Cell, now: UnixTime) -> bool {
    let finished = RecordState::from_cell(before)
        .ok()
        .and_then(|s| s.auction())
        .is_some_and(|a| a.is_finished(now));
    finished
        && RecordState::from_cell(after)
            .ok()
            .is_some_and(|s| s.owner().is_some())
}
