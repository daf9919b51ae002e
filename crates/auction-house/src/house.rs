//! The auction house: one instance owning governance, parameters, custody and
//! a [`RoundLedger`] per enabled from-token.
//!
//! Every mutation of a from-token runs under that token's mutex for its whole
//! read-derive-write sequence, reading the clock once inside the lock.
//! Different from-tokens never contend. Lock order is governance, then ledger,
//! then parameters; no path acquires them in another order.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use auction_core::clock::SystemClock;
use auction_core::constants::EVENT_CHANNEL_CAPACITY;
use auction_core::error::{AuctionError, ParameterError, PricingError, RoundError};
use auction_core::governance::{GovernanceGate, GovernanceState};
use auction_core::traits::{Clock, PriceCalculator, TokenVault};
use auction_core::types::{
    AuctionEvent, AuctionParams, ParamsUpdate, Round, RoundStatus, Settlement, Take, TokenSpec,
};
use auction_core::vault::MemoryVault;
use auction_decay::{next_step_at, DecayPricer};

use crate::config::{ConfigError, HouseConfig};
use crate::ledger::RoundLedger;
use crate::settlement::SettlementEngine;

/// Snapshot of a from-token's latest round with its derived state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub round: Round,
    pub status: RoundStatus,
    /// `None` once the round is expired or exhausted.
    pub current_price: Option<U256>,
    pub next_step_at: Option<u64>,
    /// First timestamp at which the round counts as expired.
    pub expires_at: u64,
}

pub struct AuctionHouse {
    want: TokenSpec,
    governance: RwLock<GovernanceGate>,
    params: RwLock<AuctionParams>,
    ledgers: DashMap<Address, Arc<Mutex<RoundLedger>>>,
    engine: SettlementEngine,
    pricer: Arc<dyn PriceCalculator>,
    vault: Arc<dyn TokenVault>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<AuctionEvent>,
}

impl AuctionHouse {
    /// Create a house with no enabled from-tokens.
    pub fn new(
        governance: Address,
        want: TokenSpec,
        params: AuctionParams,
        pricer: Arc<dyn PriceCalculator>,
        vault: Arc<dyn TokenVault>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuctionError> {
        if governance.is_zero() {
            return Err(ParameterError::ZeroAddress.into());
        }
        params.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            want,
            governance: RwLock::new(GovernanceGate::new(governance)),
            params: RwLock::new(params),
            ledgers: DashMap::new(),
            engine: SettlementEngine::new(Arc::clone(&pricer), Arc::clone(&vault), want),
            pricer,
            vault,
            clock,
            events,
        })
    }

    /// Build a house from validated configuration, with the step-decay
    /// pricer, an in-memory vault and the system clock.
    pub fn from_config(config: &HouseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let house = Self::new(
            config.governance_address()?,
            config.want()?,
            config.params()?,
            Arc::new(DecayPricer::new()),
            Arc::new(MemoryVault::new()),
            Arc::new(SystemClock),
        )
        .map_err(invalid_config)?;
        for token in config.from_token_specs()? {
            house.insert_ledger(token).map_err(invalid_config)?;
        }
        Ok(house)
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AuctionEvent> {
        self.events.subscribe()
    }

    pub fn want(&self) -> TokenSpec {
        self.want
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    // --- Read-only views ---------------------------------------------------

    /// Current price of the active round for `from`, or `None` when there is
    /// no priced round (unknown token, never kicked, exhausted, expired).
    ///
    /// Only numeric failures are reported as errors.
    pub fn current_price(&self, from: Address) -> Result<Option<U256>, AuctionError> {
        let Some(ledger) = self.ledger(from) else {
            return Ok(None);
        };
        let ledger = ledger.lock();
        let now = self.clock.now();
        match ledger.active_round(now) {
            Some(round) => self.quiet_price(round, now),
            None => Ok(None),
        }
    }

    /// Remaining amount of the active round, zero if none.
    pub fn available_amount(&self, from: Address) -> U256 {
        self.ledger(from)
            .map(|ledger| ledger.lock().committed(self.clock.now()))
            .unwrap_or_default()
    }

    /// Amount a kick of `from` would commit right now.
    pub fn kickable(&self, from: Address) -> U256 {
        let Some(ledger) = self.ledger(from) else {
            return U256::ZERO;
        };
        let ledger = ledger.lock();
        ledger.kickable(self.vault.balance_of(from), self.clock.now())
    }

    pub fn is_kickable(&self, from: Address) -> bool {
        !self.kickable(from).is_zero()
    }

    /// Want-token units needed to take `amount_wanted` of `from` now, after
    /// clamping to what the round has left. Zero when there is no active round.
    pub fn amount_needed(&self, from: Address, amount_wanted: U256) -> Result<U256, AuctionError> {
        let Some(ledger) = self.ledger(from) else {
            return Ok(U256::ZERO);
        };
        let ledger = ledger.lock();
        let now = self.clock.now();
        let Some(round) = ledger.active_round(now) else {
            return Ok(U256::ZERO);
        };
        let Some(price) = self.quiet_price(round, now)? else {
            return Ok(U256::ZERO);
        };
        let amount = amount_wanted.min(round.available_remaining);
        let token = ledger.token();
        Ok(self
            .pricer
            .amount_to_pay(amount, price, token.decimals, self.want.decimals)?)
    }

    /// The latest round of `from` with its derived status, if it was ever kicked.
    pub fn round(&self, from: Address) -> Result<Option<RoundView>, AuctionError> {
        let Some(ledger) = self.ledger(from) else {
            return Ok(None);
        };
        let ledger = ledger.lock();
        let now = self.clock.now();
        let Some(round) = ledger.latest_round() else {
            return Ok(None);
        };
        let status = round.status(now);
        let (current_price, next_step) = match status {
            RoundStatus::Active => (
                self.quiet_price(round, now)?,
                next_step_at(&round.params, round.kicked_at, now),
            ),
            RoundStatus::Exhausted | RoundStatus::Expired => (None, None),
        };
        Ok(Some(RoundView {
            round: round.clone(),
            status,
            current_price,
            next_step_at: next_step,
            expires_at: round.expires_at(),
        }))
    }

    /// Full take history of `from`, oldest first.
    pub fn takes(&self, from: Address) -> Vec<Take> {
        self.ledger(from)
            .map(|ledger| ledger.lock().takes().to_vec())
            .unwrap_or_default()
    }

    /// Timestamp of the next price step of the active round of `from`.
    pub fn next_step_at(&self, from: Address) -> Option<u64> {
        let ledger = self.ledger(from)?;
        let ledger = ledger.lock();
        let now = self.clock.now();
        let round = ledger.active_round(now)?;
        next_step_at(&round.params, round.kicked_at, now)
    }

    /// Parameters applied to the next kick.
    pub fn params(&self) -> AuctionParams {
        *self.params.read()
    }

    pub fn governance(&self) -> Address {
        self.governance.read().governance()
    }

    pub fn pending_governance(&self) -> Option<Address> {
        self.governance.read().pending_governance()
    }

    pub fn governance_state(&self) -> GovernanceState {
        self.governance.read().state()
    }

    /// Enabled from-tokens, sorted by address.
    pub fn enabled_tokens(&self) -> Vec<TokenSpec> {
        let mut tokens: Vec<TokenSpec> = self
            .ledgers
            .iter()
            .filter_map(|entry| {
                let ledger = entry.value().lock();
                ledger.is_enabled().then(|| ledger.token())
            })
            .collect();
        tokens.sort_by_key(|token| token.address);
        tokens
    }

    /// Vault balance of `token`.
    pub fn balance_of(&self, token: Address) -> U256 {
        self.vault.balance_of(token)
    }

    // --- Public mutations --------------------------------------------------

    /// Credit `amount` of `token` to the house. `token` must be the want
    /// token or an enabled from-token. Returns the new balance.
    pub fn deposit(
        &self,
        caller: Address,
        token: Address,
        amount: U256,
    ) -> Result<U256, AuctionError> {
        if amount.is_zero() {
            return Err(RoundError::ZeroAmount.into());
        }
        let balance = if token == self.want.address {
            self.vault.credit(token, amount)?
        } else {
            let ledger = self.ledger(token).ok_or(RoundError::TokenNotEnabled(token))?;
            let ledger = ledger.lock();
            if !ledger.is_enabled() {
                return Err(RoundError::TokenNotEnabled(token).into());
            }
            self.vault.credit(token, amount)?
        };
        let timestamp = self.clock.now();
        debug!(%token, %amount, %balance, "deposit");
        self.publish(AuctionEvent::Deposited { token, amount, actor: caller, timestamp });
        Ok(balance)
    }

    /// Open a new round for `from` committing its whole vault balance.
    pub fn kick(&self, caller: Address, from: Address) -> Result<Round, AuctionError> {
        let ledger = self.ledger(from).ok_or(RoundError::TokenNotEnabled(from))?;
        let mut ledger = ledger.lock();
        let now = self.clock.now();
        let params = *self.params.read();
        let balance = self.vault.balance_of(from);

        let round = ledger
            .kick(balance, params, now)
            .inspect_err(|e| debug!(%from, "kick rejected: {e}"))?
            .clone();

        info!(
            %from,
            round_id = round.round_id,
            available = %round.initial_available,
            "round kicked"
        );
        self.publish(AuctionEvent::Kicked {
            from,
            round_id: round.round_id,
            available: round.initial_available,
            starting_price: round.params.starting_price,
            actor: caller,
            timestamp: now,
        });
        Ok(round)
    }

    /// Take up to `amount` of `from` at the current price.
    pub fn take(
        &self,
        caller: Address,
        from: Address,
        amount: U256,
    ) -> Result<Settlement, AuctionError> {
        let ledger = self.ledger(from).ok_or(RoundError::NoActiveRound(from))?;
        let mut ledger = ledger.lock();
        let now = self.clock.now();

        let (settlement, take) = self
            .engine
            .take(&mut ledger, amount, caller, now)
            .inspect_err(|e| debug!(%from, %amount, "take rejected: {e}"))?;

        info!(
            %from,
            round_id = take.round_id,
            take_seq = take.take_seq,
            amount = %take.amount_taken,
            paid = %take.amount_paid,
            price = %take.price_at_take,
            "take settled"
        );
        self.publish(AuctionEvent::Taken {
            from,
            round_id: take.round_id,
            take_seq: take.take_seq,
            amount_taken: take.amount_taken,
            amount_paid: take.amount_paid,
            price: take.price_at_take,
            actor: caller,
            timestamp: now,
        });
        Ok(settlement)
    }

    // --- Governance --------------------------------------------------------

    pub fn propose_transfer(
        &self,
        caller: Address,
        new_governance: Address,
    ) -> Result<(), AuctionError> {
        let mut gate = self.governance.write();
        gate.propose_transfer(caller, new_governance)
            .inspect_err(|e| debug!(%caller, "transfer proposal rejected: {e}"))?;
        info!(governance = %caller, pending = %new_governance, "governance transfer proposed");
        self.publish(AuctionEvent::TransferProposed {
            governance: caller,
            pending: new_governance,
            timestamp: self.clock.now(),
        });
        Ok(())
    }

    /// Complete a pending transfer. Returns the previous governor.
    pub fn accept_transfer(&self, caller: Address) -> Result<Address, AuctionError> {
        let mut gate = self.governance.write();
        let previous = gate
            .accept_transfer(caller)
            .inspect_err(|e| debug!(%caller, "transfer acceptance rejected: {e}"))?;
        info!(%previous, governance = %caller, "governance transferred");
        self.publish(AuctionEvent::TransferAccepted {
            previous,
            governance: caller,
            timestamp: self.clock.now(),
        });
        Ok(previous)
    }

    /// Enable `token` as a from-token. A previously disabled token keeps its
    /// round numbering and take history.
    pub fn enable(&self, caller: Address, token: TokenSpec) -> Result<(), AuctionError> {
        let gate = self.governance.read();
        gate.ensure_governance(caller)?;
        self.insert_ledger(token)
            .inspect_err(|e| debug!(token = %token.address, "enable rejected: {e}"))?;
        drop(gate);

        info!(token = %token.address, decimals = token.decimals, "token enabled");
        self.publish(AuctionEvent::TokenEnabled {
            token: token.address,
            decimals: token.decimals,
            actor: caller,
            timestamp: self.clock.now(),
        });
        Ok(())
    }

    /// Disable `from`. Refused while it has an active round.
    pub fn disable(&self, caller: Address, from: Address) -> Result<(), AuctionError> {
        let gate = self.governance.read();
        gate.ensure_governance(caller)?;
        let ledger = self.ledger(from).ok_or(RoundError::TokenNotEnabled(from))?;
        let mut ledger = ledger.lock();
        if !ledger.is_enabled() {
            return Err(RoundError::TokenNotEnabled(from).into());
        }
        let now = self.clock.now();
        ledger
            .disable(now)
            .inspect_err(|e| debug!(%from, "disable rejected: {e}"))?;
        drop(ledger);
        drop(gate);

        info!(token = %from, "token disabled");
        self.publish(AuctionEvent::TokenDisabled { token: from, actor: caller, timestamp: now });
        Ok(())
    }

    /// Apply a partial parameter update. Rounds already kicked keep the
    /// parameters they were kicked with.
    pub fn set_params(
        &self,
        caller: Address,
        update: ParamsUpdate,
    ) -> Result<AuctionParams, AuctionError> {
        let gate = self.governance.read();
        gate.ensure_governance(caller)?;
        if update.is_empty() {
            return Err(ParameterError::Invalid {
                field: "params",
                reason: "empty update".to_string(),
            }
            .into());
        }
        let mut params = self.params.write();
        let updated = update
            .apply(&params)
            .inspect_err(|e| debug!("parameter update rejected: {e}"))?;
        *params = updated;
        drop(params);
        drop(gate);

        info!(
            decay_rate = %updated.decay_rate,
            update_interval = updated.update_interval,
            auction_length = updated.auction_length,
            starting_price = %updated.starting_price,
            "parameters updated"
        );
        self.publish(AuctionEvent::ParametersUpdated {
            params: updated,
            actor: caller,
            timestamp: self.clock.now(),
        });
        Ok(updated)
    }

    pub fn set_decay_rate(
        &self,
        caller: Address,
        decay_rate: U256,
    ) -> Result<AuctionParams, AuctionError> {
        self.set_params(
            caller,
            ParamsUpdate { decay_rate: Some(decay_rate), ..ParamsUpdate::default() },
        )
    }

    pub fn set_update_interval(
        &self,
        caller: Address,
        update_interval: u64,
    ) -> Result<AuctionParams, AuctionError> {
        self.set_params(
            caller,
            ParamsUpdate { update_interval: Some(update_interval), ..ParamsUpdate::default() },
        )
    }

    pub fn set_auction_length(
        &self,
        caller: Address,
        auction_length: u64,
    ) -> Result<AuctionParams, AuctionError> {
        self.set_params(
            caller,
            ParamsUpdate { auction_length: Some(auction_length), ..ParamsUpdate::default() },
        )
    }

    pub fn set_starting_price(
        &self,
        caller: Address,
        starting_price: U256,
    ) -> Result<AuctionParams, AuctionError> {
        self.set_params(
            caller,
            ParamsUpdate { starting_price: Some(starting_price), ..ParamsUpdate::default() },
        )
    }

    /// Withdraw the uncommitted balance of `token` to governance. Balance
    /// committed to an active round stays in the vault.
    pub fn sweep(&self, caller: Address, token: Address) -> Result<U256, AuctionError> {
        let gate = self.governance.read();
        gate.ensure_governance(caller)?;
        let to = gate.governance();

        let (amount, now) = match self.ledger(token) {
            Some(ledger) => {
                let ledger = ledger.lock();
                let now = self.clock.now();
                let amount = self.vault.balance_of(token).saturating_sub(ledger.committed(now));
                self.withdraw(token, amount)?;
                (amount, now)
            }
            None => {
                let amount = self.vault.balance_of(token);
                self.withdraw(token, amount)?;
                (amount, self.clock.now())
            }
        };
        drop(gate);

        info!(%token, %amount, %to, "swept");
        self.publish(AuctionEvent::Swept { token, amount, to, timestamp: now });
        Ok(amount)
    }

    // --- Internals ---------------------------------------------------------

    fn ledger(&self, from: Address) -> Option<Arc<Mutex<RoundLedger>>> {
        self.ledgers.get(&from).map(|entry| Arc::clone(entry.value()))
    }

    fn insert_ledger(&self, token: TokenSpec) -> Result<(), AuctionError> {
        if token.address.is_zero() {
            return Err(ParameterError::ZeroAddress.into());
        }
        if token.address == self.want.address {
            return Err(ParameterError::WantTokenAsFrom(token.address).into());
        }
        match self.ledgers.entry(token.address) {
            Entry::Occupied(entry) => {
                let mut ledger = entry.get().lock();
                if ledger.is_enabled() {
                    return Err(ParameterError::AlreadyEnabled(token.address).into());
                }
                ledger.enable(token.decimals);
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(RoundLedger::new(token))));
            }
        }
        Ok(())
    }

    fn withdraw(&self, token: Address, amount: U256) -> Result<(), AuctionError> {
        if amount.is_zero() {
            return Err(RoundError::ZeroAmount.into());
        }
        self.vault.debit(token, amount)?;
        Ok(())
    }

    /// Price of `round` at `now`, mapping the temporal failures of read-only
    /// queries to `None`.
    fn quiet_price(&self, round: &Round, now: u64) -> Result<Option<U256>, AuctionError> {
        match self.pricer.round_price(round, now) {
            Ok(price) => Ok(Some(price)),
            Err(PricingError::PriceExpired { .. } | PricingError::InvalidTime { .. }) => Ok(None),
            Err(PricingError::Math(e)) => Err(e.into()),
        }
    }

    fn publish(&self, event: AuctionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn invalid_config(err: AuctionError) -> ConfigError {
    match err {
        AuctionError::Parameter(e) => ConfigError::Invalid(e),
        other => ConfigError::Invalid(ParameterError::Invalid {
            field: "house",
            reason: other.to_string(),
        }),
    }
}
