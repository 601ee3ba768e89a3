//! # Name Registry Service
//!
//! Async facade over the sandbox network. Each user operation becomes one
//! bounceable message from the user's account to the registrar or to a
//! domain record; the receipt reports the exit code at that target.
//!
//! ## Accounts
//!
//! Users are treasuries opened with [`NameRegistryService::open_account`].
//! The registrar is deployed at construction from the configured deployer
//! treasury.

use crate::adapters::sandbox::{Envelope, Sandbox, Transaction};
use crate::config::RegistryConfig;
use crate::domain::code::ContractKind;
use crate::domain::content::DomainContent;
use crate::domain::entities::{RecordPhase, RegistrarState, RoyaltyParams};
use crate::domain::pricing::min_price;
use crate::domain::resolution::domain_index;
use crate::domain::validation::validate_domain;
use crate::domain::value_objects::opcodes;
use crate::errors::{exit_codes, ApiError, SandboxError};
use crate::events::{
    registration_body, simple_body, BatchDeploy, BatchItem, EditContent, EditRecord,
    ForwardPayload, TransferRequest, TransferTerms,
};
use crate::ports::inbound::{DomainInfo, NameRegistryApi, Receipt};
use crate::ports::outbound::OverrideTable;

use async_trait::async_trait;
use dns_01_cell_codec::Cell;
use dns_telemetry::{log_domain_event, metric_inc, BIDS, REGISTRATIONS, RELEASES, RESOLUTIONS};
use shared_types::{Address, Coins, UnixTime, U256};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Name registry service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Protocol parameters.
    pub registry: RegistryConfig,
    /// Treasury that deploys (and optionally owns) the registrar.
    pub deployer: String,
    /// Initial registrar balance.
    pub registrar_funding: Coins,
    /// Make the deployer the registrar owner, gating batch deployment.
    pub owned_registrar: bool,
    /// Royalty parameters the registrar reports.
    pub royalty: Option<RoyaltyParams>,
    /// Value attached to edits and queries.
    pub message_value: Coins,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            deployer: "deployer".into(),
            registrar_funding: Coins::from_coins(1),
            owned_registrar: true,
            royalty: None,
            message_value: Coins::from_nanos(50_000_000),
        }
    }
}

impl ServiceConfig {
    /// Defaults with protocol parameters from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            registry: RegistryConfig::from_env(),
            ..Self::default()
        }
    }
}

/// Statistics for the name registry service.
#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    /// Messages submitted on behalf of users.
    pub messages_submitted: u64,
    /// Messages the target accepted.
    pub messages_accepted: u64,
    /// Messages the target rejected.
    pub messages_rejected: u64,
    /// Successful registrations.
    pub registrations: u64,
    /// Successful bids.
    pub bids: u64,
    /// Successful releases.
    pub releases: u64,
    /// Resolutions served.
    pub resolutions: u64,
    /// Average submit latency in microseconds.
    pub avg_latency_us: u64,
}

/// The name registry service.
pub struct NameRegistryService<O: OverrideTable + 'static> {
    /// Service configuration.
    config: ServiceConfig,
    /// Network override table, shared with the sandbox.
    overrides: Arc<O>,
    /// The network.
    sandbox: Arc<RwLock<Sandbox>>,
    /// Root registrar.
    registrar: Address,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<O: OverrideTable + 'static> NameRegistryService<O> {
    /// Creates the network and deploys the registrar.
    ///
    /// # Errors
    ///
    /// Fails if the registrar cannot be deployed.
    pub fn new(config: ServiceConfig, overrides: O) -> Result<Self, ApiError> {
        let overrides = Arc::new(overrides);
        let shared: Arc<dyn OverrideTable> = overrides.clone();
        let mut sandbox = Sandbox::new(config.registry.clone(), shared);

        let deployer = sandbox.treasury(&config.deployer);
        let state = RegistrarState {
            content: DomainContent::new().to_cell().map_err(SandboxError::from)?,
            item_code: ContractKind::Record.code(),
            royalty: config.royalty,
            owner: config.owned_registrar.then_some(deployer),
        };
        let registrar = sandbox.deploy_registrar(deployer, &state, config.registrar_funding)?;
        info!(%registrar, "name registry service started");

        Ok(Self {
            config,
            overrides,
            sandbox: Arc::new(RwLock::new(sandbox)),
            registrar,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        })
    }

    /// Root registrar address.
    #[must_use]
    pub fn registrar(&self) -> Address {
        self.registrar
    }

    /// Service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Override table the contracts consult.
    #[must_use]
    pub fn overrides(&self) -> &Arc<O> {
        &self.overrides
    }

    /// Shared handle to the network.
    #[must_use]
    pub fn sandbox(&self) -> Arc<RwLock<Sandbox>> {
        Arc::clone(&self.sandbox)
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Opens (or returns) the funded account for `name`.
    pub async fn open_account(&self, name: &str) -> Address {
        self.sandbox.write().await.treasury(name)
    }

    /// The deployer account.
    pub async fn deployer(&self) -> Address {
        self.open_account(&self.config.deployer).await
    }

    /// Balance of any account.
    pub async fn balance(&self, address: &Address) -> Coins {
        self.sandbox.read().await.balance(address)
    }

    /// Current network time.
    pub async fn now(&self) -> UnixTime {
        self.sandbox.read().await.now()
    }

    /// Moves the network clock forward.
    pub async fn advance_time(&self, seconds: u64) {
        self.sandbox.write().await.advance_time(seconds);
    }

    /// Address of the record for `domain`, deployed or not.
    ///
    /// # Errors
    ///
    /// Fails if the name does not fit a cell.
    pub async fn record_address(&self, domain: &str) -> Result<Address, ApiError> {
        Ok(self
            .sandbox
            .read()
            .await
            .record_address(&self.registrar, domain.as_bytes())?)
    }

    async fn deployed_record(&self, domain: &str) -> Result<Address, ApiError> {
        let sandbox = self.sandbox.read().await;
        let record = sandbox.record_address(&self.registrar, domain.as_bytes())?;
        if !sandbox.account(&record).is_some_and(|a| a.is_active()) {
            return Err(SandboxError::AccountNotFound(record).into());
        }
        Ok(record)
    }

    async fn submit(
        &self,
        correlation_id: Uuid,
        sender: Address,
        target: Address,
        value: Coins,
        body: Cell,
        record: Address,
    ) -> Result<Receipt, ApiError> {
        self.deliver(correlation_id, sender, target, value, body, record)
            .await
            .map(|(receipt, _)| receipt)
    }

    #[instrument(skip(self, body), fields(correlation_id = %correlation_id))]
    async fn deliver(
        &self,
        correlation_id: Uuid,
        sender: Address,
        target: Address,
        value: Coins,
        body: Cell,
        record: Address,
    ) -> Result<(Receipt, Vec<Transaction>), ApiError> {
        let start = Instant::now();
        let transactions: Vec<Transaction> = {
            let mut sandbox = self.sandbox.write().await;
            sandbox.send(Envelope::new(sender, target, value, body))?
        };
        let elapsed = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        let first = transactions.first();
        let exit_code = first.map_or(exit_codes::OK, |tx| tx.exit_code);
        let aborted = first.is_some_and(|tx| tx.aborted);

        {
            let mut stats = self.stats.write().await;
            stats.messages_submitted += 1;
            if aborted {
                stats.messages_rejected += 1;
            } else {
                stats.messages_accepted += 1;
            }
            let n = stats.messages_submitted;
            stats.avg_latency_us = (stats.avg_latency_us * (n - 1) + elapsed) / n;
        }

        if aborted {
            warn!(%target, exit_code, "message rejected");
            return Err(ApiError::Rejected { exit_code });
        }
        debug!(%target, exit_code, transactions = transactions.len(), "message accepted");
        let receipt = Receipt {
            correlation_id,
            record,
            exit_code,
            transactions: transactions.len(),
        };
        Ok((receipt, transactions))
    }

    /// Asks the record for `domain` to apply its network override.
    ///
    /// # Errors
    ///
    /// `Rejected` with the contract's exit code, or a host error.
    pub async fn process_override(
        &self,
        sender: Address,
        domain: &str,
        value: Coins,
    ) -> Result<Receipt, ApiError> {
        let correlation_id = Uuid::new_v4();
        let record = self.deployed_record(domain).await?;
        let body = simple_body(opcodes::PROCESS_OVERRIDE, query_id(&correlation_id))?;
        self.submit(correlation_id, sender, record, value, body, record)
            .await
    }

    /// Replaces the whole content cell of `domain`.
    ///
    /// # Errors
    ///
    /// `Rejected` with the contract's exit code, or a host error.
    pub async fn edit_content(
        &self,
        owner: Address,
        domain: &str,
        content: Cell,
    ) -> Result<Receipt, ApiError> {
        let correlation_id = Uuid::new_v4();
        let record = self.deployed_record(domain).await?;
        let body = EditContent {
            query_id: query_id(&correlation_id),
            content,
        }
        .to_cell()?;
        self.submit(correlation_id, owner, record, self.config.message_value, body, record)
            .await
    }

    /// Deploys owned records directly, bypassing auctions.
    ///
    /// # Errors
    ///
    /// `Rejected` with 401 unless `sender` owns the registrar (when it has
    /// an owner).
    pub async fn batch_deploy(
        &self,
        sender: Address,
        items: Vec<BatchItem>,
    ) -> Result<Receipt, ApiError> {
        let correlation_id = Uuid::new_v4();
        let value = items
            .iter()
            .map(|i| i.value)
            .sum::<Coins>()
            .checked_add(self.config.message_value)
            .unwrap_or(Coins::MAX);
        let body = BatchDeploy {
            query_id: query_id(&correlation_id),
            items,
        }
        .to_cell()?;
        let registrar = self.registrar;
        self.submit(correlation_id, sender, registrar, value, body, registrar)
            .await
    }
}

/// The record answered the registrar's deploy by sending the payment back,
/// so it existed before this registration.
fn refunded_by_record(
    transactions: &[Transaction],
    registrar: Address,
    record: Address,
    registrant: Address,
) -> bool {
    transactions.iter().any(|tx| {
        tx.sender == registrar
            && tx.destination == record
            && !tx.aborted
            && tx
                .out_messages
                .iter()
                .any(|m| m.destination == registrant && m.op() == Some(opcodes::DEPLOY))
    })
}

fn query_id(correlation_id: &Uuid) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&correlation_id.as_bytes()[..8]);
    u64::from_be_bytes(bytes)
}

#[async_trait]
impl<O: OverrideTable + 'static> NameRegistryApi for NameRegistryService<O> {
    async fn register(
        &self,
        registrant: Address,
        domain: &str,
        payment: Coins,
    ) -> Result<Receipt, ApiError> {
        let correlation_id = Uuid::new_v4();
        let record = self.record_address(domain).await?;
        let body = registration_body(domain.as_bytes())?;
        let (receipt, transactions) = self
            .deliver(correlation_id, registrant, self.registrar, payment, body, record)
            .await?;
        if refunded_by_record(&transactions, self.registrar, record, registrant) {
            log_domain_event!(info, "service", "already registered", domain, record, %registrant);
            return Err(ApiError::AlreadyRegistered {
                domain: domain.to_string(),
            });
        }
        self.stats.write().await.registrations += 1;
        metric_inc!(REGISTRATIONS);
        log_domain_event!(info, "service", "auction opened", domain, record, %registrant);
        Ok(receipt)
    }

    async fn bid(
        &self,
        bidder: Address,
        domain: &str,
        amount: Coins,
    ) -> Result<Receipt, ApiError> {
        let correlation_id = Uuid::new_v4();
        let record = self.deployed_record(domain).await?;
        let body = simple_body(opcodes::DEPLOY, query_id(&correlation_id))?;
        let receipt = self
            .submit(correlation_id, bidder, record, amount, body, record)
            .await?;
        self.stats.write().await.bids += 1;
        metric_inc!(BIDS);
        log_domain_event!(debug, "service", "bid placed", domain, record, %bidder, %amount);
        Ok(receipt)
    }

    async fn renew(&self, owner: Address, domain: &str, value: Coins) -> Result<Receipt, ApiError> {
        let correlation_id = Uuid::new_v4();
        let record = self.deployed_record(domain).await?;
        let body = simple_body(opcodes::DEPLOY, query_id(&correlation_id))?;
        self.submit(correlation_id, owner, record, value, body, record)
            .await
    }

    async fn transfer(
        &self,
        owner: Address,
        domain: &str,
        new_owner: Address,
        forward_amount: Coins,
        value: Coins,
    ) -> Result<Receipt, ApiError> {
        let correlation_id = Uuid::new_v4();
        let record = self.deployed_record(domain).await?;
        let body = TransferRequest {
            query_id: query_id(&correlation_id),
            terms: TransferTerms {
                new_owner,
                response_destination: Some(owner),
                custom_payload: None,
                forward_amount,
                forward_payload: ForwardPayload::default(),
            },
        }
        .to_cell()?;
        let receipt = self
            .submit(correlation_id, owner, record, value, body, record)
            .await?;
        log_domain_event!(info, "service", "domain transferred", domain, record, %new_owner);
        Ok(receipt)
    }

    async fn edit_record(
        &self,
        owner: Address,
        domain: &str,
        category: U256,
        value: Option<Cell>,
    ) -> Result<Receipt, ApiError> {
        let correlation_id = Uuid::new_v4();
        let record = self.deployed_record(domain).await?;
        let body = EditRecord {
            query_id: query_id(&correlation_id),
            category,
            value,
        }
        .to_cell()?;
        self.submit(correlation_id, owner, record, self.config.message_value, body, record)
            .await
    }

    async fn release(
        &self,
        sender: Address,
        domain: &str,
        payment: Coins,
    ) -> Result<Receipt, ApiError> {
        let correlation_id = Uuid::new_v4();
        let record = self.deployed_record(domain).await?;
        let body = simple_body(opcodes::DNS_BALANCE_RELEASE, query_id(&correlation_id))?;
        let receipt = self
            .submit(correlation_id, sender, record, payment, body, record)
            .await?;
        self.stats.write().await.releases += 1;
        metric_inc!(RELEASES);
        log_domain_event!(info, "service", "domain released", domain, record, %sender);
        Ok(receipt)
    }

    async fn resolve(&self, domain: &str, category: U256) -> Result<Option<Cell>, ApiError> {
        let result = self
            .sandbox
            .read()
            .await
            .resolve(&self.registrar, domain, &category);
        self.stats.write().await.resolutions += 1;
        let outcome = match &result {
            Ok(Some(_)) => "found",
            Ok(None) => "missing",
            Err(_) => "error",
        };
        metric_inc!(RESOLUTIONS, &[outcome]);
        Ok(result?)
    }

    async fn quote(&self, domain: &str) -> Result<Coins, ApiError> {
        validate_domain(domain.as_bytes()).map_err(|e| ApiError::InvalidDomain(e.to_string()))?;
        let sandbox = self.sandbox.read().await;
        Ok(min_price(domain.len(), sandbox.now(), sandbox.config()))
    }

    async fn domain_info(&self, domain: &str) -> Result<DomainInfo, ApiError> {
        let index = domain_index(domain.as_bytes()).map_err(SandboxError::from)?;
        let sandbox = self.sandbox.read().await;
        let record = sandbox.record_address(&self.registrar, domain.as_bytes())?;
        let deployed = sandbox.account(&record).is_some_and(|a| a.is_active());

        let mut info = DomainInfo {
            domain: domain.to_string(),
            record,
            index,
            deployed,
            phase: RecordPhase::Uninitialized,
            owner: None,
            auction: None,
            last_fill_up: 0,
            balance: sandbox.balance(&record),
        };
        if deployed {
            let state = sandbox.record_state(&record)?;
            info.phase = state.phase(sandbox.now(), sandbox.config().renewal_window);
            info.owner = state.owner();
            info.auction = state.auction_info();
            info.last_fill_up = state.last_fill_up_time();
        }
        Ok(info)
    }
}

// =============================================================================
// TESTS
// =============================================================================
