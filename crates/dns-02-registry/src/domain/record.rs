//! # Domain Record Contract
//!
//! One record per domain, deployed by the registrar at an address derived
//! from the domain's index. The record runs the auction, holds the owner and
//! the DNS records, and enforces the renewal window.
//!
//! ## Lifecycle
//!
//! ```text
//! uninitialized ──deploy──► auction ──end_time──► owned ──idle > window──► stale
//!                    │                              ▲                        │
//!                    └──batch──────────────────────►┘◄───────release─────────┘
//! ```
//!
//! A finished auction is settled lazily by the first message that arrives
//! after its end time, before that message is processed.

use crate::domain::code::ContractKind;
use crate::domain::content::DomainContent;
use crate::domain::entities::{Auction, RecordBody, RecordState, Tenure};
use crate::domain::execution::{
    ContractContext, InboundMessage, Outcome, OutboundMessage, SendMode,
};
use crate::domain::pricing::min_price;
use crate::domain::resolution::{resolve_in_record, Resolution};
use crate::domain::value_objects::opcodes;
use crate::errors::{exit_codes, ContractError};
use crate::events::{
    load_op, simple_body, DeployItem, DeployKind, EditContent, EditRecord, Excesses,
    OverrideDecision, OwnershipAssigned, StaticDataReport, TransferRequest, TransferTerms,
};
use crate::ports::inbound::ContractHandler;
use dns_01_cell_codec::{Cell, CellSlice};
use shared_types::{Address, Coins, UnixTime, U256};
use tracing::debug;

/// The record contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordContract;

impl ContractHandler for RecordContract {
    fn kind(&self) -> ContractKind {
        ContractKind::Record
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
        let state = RecordState::from_cell(data)?;
        let Some(body) = state.body.clone() else {
            return initialize(ctx, state, msg);
        };

        let mut slice = msg.body.parse();
        let op = if slice.remaining_bits() == 0 {
            opcodes::DEPLOY
        } else {
            load_op(&mut slice)?
        };

        if op == opcodes::DEPLOY && msg.sender == state.collection {
            return refund_duplicate_deploy(data, &mut slice);
        }

        let mut run = Execution {
            ctx,
            msg,
            index: state.index,
            collection: state.collection,
            body,
            actions: Vec::new(),
        };
        run.settle_auction();
        run.dispatch(op, &mut slice)
    }
}

/// First message from the registrar: record starts at auction, or owned
/// for batch deployments.
fn initialize(
    ctx: &ContractContext<'_>,
    mut state: RecordState,
    msg: &InboundMessage,
) -> Result<Outcome, ContractError> {
    if msg.sender != state.collection {
        return Err(ContractError::NotInitializedByRegistrar { sender: msg.sender });
    }
    let mut slice = msg.body.parse();
    if load_op(&mut slice)? != opcodes::DEPLOY {
        return Ok(Outcome::ignored(
            state.to_cell()?,
            Vec::new(),
            exit_codes::UNKNOWN_OP,
        ));
    }

    let deploy = DeployItem::load(&mut slice)?;
    let body = match deploy.kind {
        DeployKind::Auction { registrant, domain } => RecordBody {
            tenure: Tenure::Auction(Auction {
                bidder: registrant,
                bid: msg.value,
                end_time: ctx.now + ctx.config.auction_duration,
            }),
            content: DomainContent::new().to_cell()?,
            domain,
            last_fill_up: ctx.now,
        },
        DeployKind::Direct { owner, content } => RecordBody {
            tenure: Tenure::Owned(owner),
            content,
            domain: Vec::new(),
            last_fill_up: ctx.now,
        },
    };
    debug!(index = %state.index, "record initialized");
    state.body = Some(body);
    Ok(Outcome::commit(state.to_cell()?, Vec::new()))
}

/// Registrar deployed an already-initialized record again; hand the value
/// back to whoever paid for it.
fn refund_duplicate_deploy(data: &Cell, slice: &mut CellSlice) -> Result<Outcome, ContractError> {
    let deploy = DeployItem::load(slice)?;
    let refund = OutboundMessage::new(
        deploy.beneficiary(),
        Coins::ZERO,
        SendMode::CARRY_INBOUND_VALUE,
        simple_body(opcodes::DEPLOY, deploy.query_id)?,
    );
    Ok(Outcome::commit(data.clone(), vec![refund]))
}

struct Execution<'c, 'a> {
    ctx: &'c ContractContext<'a>,
    msg: &'c InboundMessage,
    index: U256,
    collection: Address,
    body: RecordBody,
    actions: Vec<OutboundMessage>,
}

impl Execution<'_, '_> {
    fn data(&self) -> Result<Cell, ContractError> {
        RecordState {
            index: self.index,
            collection: self.collection,
            body: Some(self.body.clone()),
        }
        .to_cell()
    }

    fn commit(self) -> Result<Outcome, ContractError> {
        Ok(Outcome::commit(self.data()?, self.actions))
    }

    fn spendable(&self) -> Coins {
        self.ctx
            .balance
            .saturating_sub(self.ctx.config.storage_reserve)
    }

    fn owned_by_sender(&self) -> bool {
        self.body.tenure.owner() == Some(self.msg.sender)
    }

    /// Turns a finished auction into ownership and pays the winning bid,
    /// minus the storage reserve, to the registrar.
    fn settle_auction(&mut self) {
        let Tenure::Auction(auction) = self.body.tenure else {
            return;
        };
        if !auction.is_finished(self.ctx.now) {
            return;
        }
        self.body.tenure = Tenure::Owned(auction.bidder);
        self.body.last_fill_up = self.ctx.now;

        let payout = auction.bid.min(self.spendable());
        let query_id = crate::domain::entities::peek_query_id(&self.msg.body);
        if let Ok(body) = simple_body(opcodes::FILL_UP, query_id) {
            self.actions.push(OutboundMessage::new(
                self.collection,
                payout,
                SendMode::IGNORE_ERRORS,
                body,
            ));
        }
        debug!(index = %self.index, winner = %auction.bidder, bid = %auction.bid, "auction settled");
    }

    fn dispatch(mut self, op: u32, slice: &mut CellSlice) -> Result<Outcome, ContractError> {
        match op {
            opcodes::DEPLOY => self.bid_or_fill_up(),
            opcodes::TRANSFER => {
                let request = TransferRequest::load(slice)?;
                if !self.owned_by_sender() {
                    return Err(ContractError::UnauthorizedTransfer {
                        sender: self.msg.sender,
                    });
                }
                let excess_to = request.terms.response_destination;
                self.apply_transfer(request.query_id, &request.terms, excess_to)?;
                self.commit()
            }
            opcodes::GET_STATIC_DATA => {
                let query_id = slice.load_uint(64)?;
                let report = StaticDataReport {
                    query_id,
                    index: self.index,
                    collection: self.collection,
                };
                self.actions.push(OutboundMessage::new(
                    self.msg.sender,
                    Coins::ZERO,
                    SendMode::CARRY_INBOUND_VALUE,
                    report.to_cell()?,
                ));
                self.commit()
            }
            opcodes::EDIT_RECORD => {
                let edit = EditRecord::load(slice)?;
                if !self.owned_by_sender() {
                    return Err(ContractError::UnauthorizedRecordEdit {
                        sender: self.msg.sender,
                    });
                }
                let mut content = DomainContent::from_cell(&self.body.content)?;
                match edit.value {
                    Some(value) => content.set(edit.category, value)?,
                    None => {
                        content.remove(&edit.category);
                    }
                }
                self.body.content = content.to_cell()?;
                self.body.last_fill_up = self.ctx.now;
                self.commit()
            }
            opcodes::EDIT_CONTENT => {
                let edit = EditContent::load(slice)?;
                if !self.owned_by_sender() {
                    return Err(ContractError::UnauthorizedContentEdit {
                        sender: self.msg.sender,
                    });
                }
                self.body.content = edit.content;
                self.body.last_fill_up = self.ctx.now;
                self.commit()
            }
            opcodes::DNS_BALANCE_RELEASE => {
                let query_id = slice.load_uint(64)?;
                self.release(query_id)?;
                self.commit()
            }
            opcodes::PROCESS_OVERRIDE => {
                let query_id = slice.load_uint(64)?;
                self.process_override(query_id)
            }
            _ => {
                let data = self.data()?;
                Ok(Outcome::ignored(data, self.actions, exit_codes::UNKNOWN_OP))
            }
        }
    }

    /// Op 0 from anyone but the registrar: a bid while the auction runs, a
    /// renewal once owned.
    fn bid_or_fill_up(mut self) -> Result<Outcome, ContractError> {
        match self.body.tenure {
            Tenure::Auction(auction) => {
                if self.msg.value <= auction.bid {
                    return Err(ContractError::BidTooLow {
                        offered: self.msg.value,
                        required: auction.bid,
                    });
                }
                self.actions.push(OutboundMessage::new(
                    auction.bidder,
                    auction.bid,
                    SendMode::PAY_FEES_SEPARATELY,
                    simple_body(opcodes::OUTBID, self.ctx.lt)?,
                ));

                let now = self.ctx.now;
                let prolongation = self.ctx.config.auction_prolongation;
                let end_time = if auction.end_time.saturating_sub(now) < prolongation {
                    now + prolongation
                } else {
                    auction.end_time
                };
                self.body.tenure = Tenure::Auction(Auction {
                    bidder: self.msg.sender,
                    bid: self.msg.value,
                    end_time,
                });
                self.commit()
            }
            Tenure::Owned(owner) if owner == self.msg.sender => {
                self.body.last_fill_up = self.ctx.now;
                self.commit()
            }
            _ => Err(ContractError::UnauthorizedRenew {
                sender: self.msg.sender,
            }),
        }
    }

    /// Hands the domain to `terms.new_owner`. Whatever the message carried
    /// beyond the forward amount goes to `excess_to`.
    fn apply_transfer(
        &mut self,
        query_id: u64,
        terms: &TransferTerms,
        excess_to: Option<Address>,
    ) -> Result<(), ContractError> {
        let spendable = self.spendable();
        if terms.forward_amount > spendable {
            return Err(ContractError::ForwardExceedsBalance {
                forward: terms.forward_amount,
                spendable,
            });
        }

        if !terms.forward_amount.is_zero() {
            let notice = OwnershipAssigned {
                query_id,
                prev_owner: self.body.tenure.owner(),
                forward_payload: terms.forward_payload.clone(),
            };
            self.actions.push(OutboundMessage::new(
                terms.new_owner,
                terms.forward_amount,
                SendMode::PAY_FEES_SEPARATELY,
                notice.to_cell()?,
            ));
        }

        if let Some(response) = excess_to {
            let excess = self.msg.value.saturating_sub(terms.forward_amount);
            if !excess.is_zero() {
                self.actions.push(OutboundMessage::new(
                    response,
                    excess,
                    SendMode::PAY_FEES_SEPARATELY,
                    Excesses { query_id }.to_cell()?,
                ));
            }
        }

        self.body.tenure = Tenure::Owned(terms.new_owner);
        self.body.last_fill_up = self.ctx.now;
        Ok(())
    }

    /// Anyone may put an idle domain back to auction by paying at least the
    /// current price; the previous owner gets the stored balance back.
    fn release(&mut self, query_id: u64) -> Result<(), ContractError> {
        let Tenure::Owned(prior_owner) = self.body.tenure else {
            return Err(ContractError::ReleaseNotAvailable);
        };
        let idle = self.ctx.now.saturating_sub(self.body.last_fill_up);
        if idle <= self.ctx.config.renewal_window {
            return Err(ContractError::ReleaseNotAvailable);
        }
        let price = min_price(self.body.domain.len(), self.ctx.now, self.ctx.config);
        if self.msg.value < price {
            return Err(ContractError::BidTooLow {
                offered: self.msg.value,
                required: price,
            });
        }

        let refund = self
            .ctx
            .balance
            .saturating_sub(self.msg.value)
            .saturating_sub(self.ctx.config.storage_reserve);
        if !refund.is_zero() {
            self.actions.push(OutboundMessage::new(
                prior_owner,
                refund,
                SendMode::IGNORE_ERRORS,
                simple_body(opcodes::DNS_BALANCE_RELEASE, query_id)?,
            ));
        }

        self.body.tenure = Tenure::Auction(Auction {
            bidder: self.msg.sender,
            bid: self.msg.value,
            end_time: self.ctx.now + self.ctx.config.auction_duration,
        });
        self.body.last_fill_up = self.ctx.now;
        debug!(index = %self.index, %prior_owner, "domain released to auction");
        Ok(())
    }

    fn process_override(mut self, query_id: u64) -> Result<Outcome, ContractError> {
        let decision = match self.ctx.overrides.lookup(&self.index) {
            Some(cell) => OverrideDecision::from_cell(&cell)?,
            None => None,
        };
        match decision {
            Some(OverrideDecision::Release) => {
                self.actions.push(OutboundMessage::new(
                    self.collection,
                    Coins::ZERO,
                    SendMode::CARRY_ALL_BALANCE | SendMode::DESTROY_IF_ZERO,
                    simple_body(opcodes::FILL_UP, query_id)?,
                ));
                debug!(index = %self.index, "override release");
                self.commit()
            }
            Some(OverrideDecision::Transfer(terms)) => {
                if let Tenure::Auction(auction) = self.body.tenure {
                    self.actions.push(OutboundMessage::new(
                        auction.bidder,
                        auction.bid,
                        SendMode::PAY_FEES_SEPARATELY,
                        simple_body(opcodes::OUTBID, self.ctx.lt)?,
                    ));
                }
                // no response destination: the requester gets the excess
                let excess_to = terms.response_destination.or(Some(self.msg.sender));
                self.apply_transfer(query_id, &terms, excess_to)?;
                debug!(index = %self.index, new_owner = %terms.new_owner, "override transfer");
                self.commit()
            }
            None => {
                let data = self.data()?;
                Ok(Outcome::ignored(data, self.actions, exit_codes::UNKNOWN_OP))
            }
        }
    }
}

// =============================================================================
// GET-METHODS
// =============================================================================

/// `get_nft_data` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftData {
    /// Whether the registrar has initialized the record.
    pub initialized: bool,
    /// Record index.
    pub index: U256,
    /// Registrar address.
    pub collection: Address,
    /// Settled owner.
    pub owner: Option<Address>,
    /// Content cell.
    pub content: Option<Cell>,
}

impl RecordState {
    /// NFT-standard static and dynamic data.
    #[must_use]
    pub fn nft_data(&self) -> NftData {
        NftData {
            initialized: self.body.is_some(),
            index: self.index,
            collection: self.collection,
            owner: self.owner(),
            content: self.body.as_ref().map(|b| b.content.clone()),
        }
    }

    /// The domain name this record was registered for; empty for batch
    /// deployments.
    #[must_use]
    pub fn domain(&self) -> &[u8] {
        self.body.as_ref().map_or(&[], |b| b.domain.as_slice())
    }

    /// Last renewal time, 0 before initialization.
    #[must_use]
    pub fn last_fill_up_time(&self) -> UnixTime {
        self.body.as_ref().map_or(0, |b| b.last_fill_up)
    }

    /// `get_auction_info`: stored auction, whether or not it has ended.
    #[must_use]
    pub fn auction_info(&self) -> Option<Auction> {
        self.auction()
    }

    /// `dnsresolve` on the record. While an auction is stored the record
    /// resolves nothing.
    ///
    /// # Errors
    ///
    /// Returns `ResolvePathMisaligned`, `MissingSeparator` or a cell error
    /// for corrupt content.
    pub fn dnsresolve(&self, path: &CellSlice, category: &U256) -> Result<Resolution, ContractError> {
        let Some(body) = &self.body else {
            return Ok(Resolution::unresolved());
        };
        if matches!(body.tenure, Tenure::Auction(_) | Tenure::Unclaimed) {
            return Ok(Resolution::unresolved());
        }
        let content = DomainContent::from_cell(&body.content)?;
        resolve_in_record(path, category, &content)
    }
}
