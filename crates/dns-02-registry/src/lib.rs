//! # DNS-02 Registry - Decentralized Domain Registry
//!
//! **Subsystem ID:** 2
//!
//! ## Purpose
//!
//! A registrar contract that auctions names, one record contract per name
//! that holds the owner and the DNS records, and an in-memory network that
//! runs both with atomic, bounceable message delivery.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Names are 4..=126 bytes of `[a-z0-9-]`, no edge hyphen | `domain/validation.rs` |
//! | Price decays 10% per month down to a floor | `domain/pricing.rs` |
//! | Owner and auction never coexist | `domain/entities.rs` (`Tenure`) |
//! | Bids strictly increase; late bids extend the auction | `domain/record.rs` |
//! | Only the owner transfers, renews or edits | `domain/record.rs` |
//! | Failed transactions change nothing but bounce value | `adapters/sandbox.rs` |
//! | Value is conserved across transactions | `adapters/sandbox.rs` |
//!
//! ## Contracts
//!
//! | Contract | Location | Role |
//! |----------|----------|------|
//! | Registrar | `domain/registrar.rs` | validate, price, deploy, root resolve |
//! | Record | `domain/record.rs` | auction, ownership, records, release |
//! | Wallet | `adapters/sandbox.rs` | value-only treasury accounts |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `OverrideTable` | network-wide forced transfers and releases |
//!
//! ## Usage Example
//!
//! ```ignore
//! use dns_02_registry::prelude::*;
//!
//! let service = NameRegistryService::new(ServiceConfig::default(), InMemoryOverrideTable::new())?;
//! let alice = service.open_account("alice").await;
//! let price = service.quote("alice").await?;
//! service.register(alice, "alice", price).await?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::{
        base_price, category_hash, domain_index, encode_dns_path, floor_price, min_price, opcodes,
        parse_domain, record_state_init, validate_domain, Auction, Category, CollectionData,
        ContractContext, ContractKind, DnsRecord, DomainContent, InboundMessage, NftData,
        Outcome, OutboundMessage, RecordBody, RecordContract, RecordPhase, RecordState,
        RegistrarContract, RegistrarState, Resolution, RoyaltyParams, SendMode, Tenure,
    };

    // Messages
    pub use crate::events::{
        registration_body, simple_body, BatchDeploy, BatchItem, DeployItem, DeployKind,
        EditContent, EditRecord, Excesses, ForwardPayload, OverrideDecision, OwnershipAssigned,
        RoyaltyReport, StaticDataReport, TransferRequest, TransferTerms,
    };

    // Ports
    pub use crate::ports::inbound::{ContractHandler, DomainInfo, NameRegistryApi, Receipt};
    pub use crate::ports::outbound::OverrideTable;

    // Adapters
    pub use crate::adapters::{Account, Envelope, InMemoryOverrideTable, Sandbox, Transaction};

    // Service
    pub use crate::service::{NameRegistryService, ServiceConfig, ServiceStats};

    // Config & errors
    pub use crate::config::RegistryConfig;
    pub use crate::errors::{exit_codes, ApiError, ContractError, SandboxError};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem identifier.
pub const SUBSYSTEM_ID: u8 = 2;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Domain Registry";

// =============================================================================
// TESTS
// =============================================================================
