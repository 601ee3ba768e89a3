//! # Registrar Contract
//!
//! The root of the namespace. It validates and prices new names, deploys
//! one record per name and resolves top-level labels to those records.
//!
//! ## Inbound messages
//!
//! | Body | Action |
//! |------|--------|
//! | empty | ignored |
//! | `op = fill_up` | accept value |
//! | `op = 2` | batch deploy (owner only) |
//! | `op = get_royalty_params` | reply with royalty parameters |
//! | `op = 0`, name | register |
//! | name (first byte non-zero) | register |

use crate::domain::code::ContractKind;
use crate::domain::entities::{RecordState, RegistrarState, RoyaltyParams};
use crate::domain::execution::{
    ContractContext, InboundMessage, Outcome, OutboundMessage, SendMode,
};
use crate::domain::pricing::min_price;
use crate::domain::resolution::{domain_index, resolve_root, Resolution};
use crate::domain::validation::parse_domain;
use crate::domain::value_objects::opcodes;
use crate::errors::{exit_codes, ContractError};
use crate::events::{load_op, BatchDeploy, DeployItem, DeployKind, RoyaltyReport};
use crate::ports::inbound::ContractHandler;
use dns_01_cell_codec::{Cell, CellSlice, StateInit};
use shared_types::{Address, U256};
use tracing::debug;

/// The registrar contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrarContract;

impl ContractHandler for RegistrarContract {
    fn kind(&self) -> ContractKind {
        ContractKind::Registrar
    }

    fn receive(
        &self,
        ctx: &ContractContext<'_>,
        data: &Cell,
        msg: &InboundMessage,
    ) -> Result<Outcome, ContractError> {
        if msg.bounced {
            return Ok(Outcome::unchanged(data));
        }
        let body = msg.body.parse();
        if body.is_empty() {
            return Ok(Outcome::ignored(data.clone(), Vec::new(), exit_codes::UNKNOWN_OP));
        }
        let state = RegistrarState::from_cell(data)?;

        if body.remaining_bits() >= 32 {
            let mut s = body.clone();
            match load_op(&mut s)? {
                opcodes::FILL_UP => return Ok(Outcome::unchanged(data)),
                opcodes::BATCH_DEPLOY => return batch_deploy(ctx, &state, data, msg, &mut s),
                opcodes::GET_ROYALTY_PARAMS => {
                    return royalty_reply(ctx, &state, data, msg, &mut s)
                }
                opcodes::DEPLOY => return register(ctx, &state, data, msg, &s),
                _ => {}
            }
        }
        if body.remaining_bits() >= 8 && body.preload_uint(8)? == 0 {
            return Ok(Outcome::ignored(data.clone(), Vec::new(), exit_codes::UNKNOWN_OP));
        }
        register(ctx, &state, data, msg, &body)
    }
}

/// State init of the record for `index` under `registrar`.
///
/// # Errors
///
/// Propagates serialization errors.
pub fn record_state_init(
    registrar: Address,
    item_code: &Cell,
    index: U256,
) -> Result<StateInit, ContractError> {
    let data = RecordState::uninitialized(index, registrar).to_cell()?;
    Ok(StateInit::new(item_code.clone(), data))
}

fn register(
    ctx: &ContractContext<'_>,
    state: &RegistrarState,
    data: &Cell,
    msg: &InboundMessage,
    name: &CellSlice,
) -> Result<Outcome, ContractError> {
    let epoch = ctx.config.auction_epoch;
    if ctx.now <= epoch {
        return Err(ContractError::AuctionNotStarted { now: ctx.now, epoch });
    }
    let domain = parse_domain(name)?;
    let price = min_price(domain.len(), ctx.now, ctx.config);
    if msg.value < price {
        return Err(ContractError::InsufficientPayment {
            paid: msg.value,
            price,
        });
    }
    let index = domain_index(&domain)?;
    if ctx.overrides.contains(&index) {
        return Err(ContractError::OverrideBlocked);
    }

    let init = record_state_init(ctx.address, &state.item_code, index)?;
    let record = init.address(ctx.config.workchain)?;
    let deploy = DeployItem {
        query_id: ctx.lt,
        kind: DeployKind::Auction {
            registrant: msg.sender,
            domain,
        },
    };
    debug!(%record, %price, "deploying record");
    let action = OutboundMessage::new(
        record,
        shared_types::Coins::ZERO,
        SendMode::CARRY_INBOUND_VALUE,
        deploy.to_cell()?,
    )
    .with_state_init(init);
    Ok(Outcome::commit(data.clone(), vec![action]))
}

fn batch_deploy(
    ctx: &ContractContext<'_>,
    state: &RegistrarState,
    data: &Cell,
    msg: &InboundMessage,
    body: &mut CellSlice,
) -> Result<Outcome, ContractError> {
    if let Some(owner) = state.owner {
        if owner != msg.sender {
            return Err(ContractError::UnauthorizedTransfer { sender: msg.sender });
        }
    }
    let batch = BatchDeploy::load(body)?;
    let mut actions = Vec::with_capacity(batch.items.len());
    for item in batch.items {
        let init = record_state_init(ctx.address, &state.item_code, U256::from(item.index))?;
        let deploy = DeployItem {
            query_id: batch.query_id,
            kind: DeployKind::Direct {
                owner: item.owner,
                content: item.content,
            },
        };
        actions.push(
            OutboundMessage::new(
                init.address(ctx.config.workchain)?,
                item.value,
                SendMode::PAY_FEES_SEPARATELY,
                deploy.to_cell()?,
            )
            .with_state_init(init),
        );
    }
    debug!(count = actions.len(), "batch deploy");
    Ok(Outcome::commit(data.clone(), actions))
}

fn royalty_reply(
    ctx: &ContractContext<'_>,
    state: &RegistrarState,
    data: &Cell,
    msg: &InboundMessage,
    body: &mut CellSlice,
) -> Result<Outcome, ContractError> {
    let report = RoyaltyReport {
        query_id: body.load_uint(64)?,
        params: state.royalty_params(ctx.address),
    };
    let reply = OutboundMessage::new(
        msg.sender,
        shared_types::Coins::ZERO,
        SendMode::CARRY_INBOUND_VALUE,
        report.to_cell()?,
    );
    Ok(Outcome::commit(data.clone(), vec![reply]))
}

// =============================================================================
// GET-METHODS
// =============================================================================

/// `get_collection_data` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionData {
    /// Next item index; -1 because indices are name hashes.
    pub next_item_index: i64,
    /// Collection content.
    pub content: Cell,
    /// Collection owner.
    pub owner: Option<Address>,
}

impl RegistrarState {
    /// NFT-collection data.
    #[must_use]
    pub fn collection_data(&self) -> CollectionData {
        CollectionData {
            next_item_index: -1,
            content: self.content.clone(),
            owner: self.owner,
        }
    }

    /// Address of the record with `index` under the registrar at `address`.
    ///
    /// # Errors
    ///
    /// Propagates serialization errors.
    pub fn nft_address_by_index(
        &self,
        address: Address,
        index: U256,
        workchain: i8,
    ) -> Result<Address, ContractError> {
        Ok(record_state_init(address, &self.item_code, index)?.address(workchain)?)
    }

    /// Full content of an item; records store theirs on-chain already.
    #[must_use]
    pub fn nft_content(&self, _index: U256, individual: &Cell) -> Cell {
        individual.clone()
    }

    /// Configured royalty, or zero royalty to the registrar itself.
    #[must_use]
    pub fn royalty_params(&self, address: Address) -> RoyaltyParams {
        self.royalty.unwrap_or_else(|| RoyaltyParams::none(address))
    }

    /// Root `dnsresolve`: consumes the top-level label and points at its
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `ResolvePathMisaligned` or `EmptyLabel`.
    pub fn dnsresolve(
        &self,
        address: Address,
        path: &CellSlice,
        workchain: i8,
    ) -> Result<Resolution, ContractError> {
        resolve_root(path, |index| {
            self.nft_address_by_index(address, index, workchain)
        })
    }
}
