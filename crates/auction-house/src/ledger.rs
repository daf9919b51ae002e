//! Per-token round state machine.
//!
//! A [`RoundLedger`] owns everything the house knows about one from token: its
//! decimals, whether it is enabled, the latest round and the append-only take
//! history. The ledger is either `Inactive` or `Active`, and that state is
//! always derived from the latest round and the clock, never stored.
//!
//! The ledger performs no locking and no token movements; the house wraps each
//! ledger in its own mutex and moves balances through the vault.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use auction_core::error::{AuctionError, PricingError, RoundError};
use auction_core::traits::PriceCalculator;
use auction_core::types::{AuctionParams, Round, RoundStatus, Take, TokenSpec};

/// Derived state of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerState {
    /// No round, or the latest round is exhausted or expired.
    Inactive,
    /// The latest round can be taken from.
    Active,
}

#[derive(Debug, Clone)]
pub struct RoundLedger {
    token: TokenSpec,
    enabled: bool,
    latest: Option<Round>,
    takes: Vec<Take>,
}

impl RoundLedger {
    /// Create an enabled ledger with no rounds.
    pub fn new(token: TokenSpec) -> Self {
        Self {
            token,
            enabled: true,
            latest: None,
            takes: Vec::new(),
        }
    }

    pub fn token(&self) -> TokenSpec {
        self.token
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Re-enable with possibly new decimals. Round numbering continues.
    pub fn enable(&mut self, decimals: u8) {
        self.token.decimals = decimals;
        self.enabled = true;
    }

    /// Disable the token. Refused while a round is active.
    pub fn disable(&mut self, now: u64) -> Result<(), RoundError> {
        if let Some(round) = self.active_round(now) {
            return Err(RoundError::RoundActive {
                from: self.token.address,
                round_id: round.round_id,
            });
        }
        self.enabled = false;
        Ok(())
    }

    /// The most recent round, whatever its status.
    pub fn latest_round(&self) -> Option<&Round> {
        self.latest.as_ref()
    }

    /// The latest round if it is active at `now`.
    pub fn active_round(&self, now: u64) -> Option<&Round> {
        self.latest.as_ref().filter(|round| round.is_active(now))
    }

    pub fn state(&self, now: u64) -> LedgerState {
        match self.active_round(now) {
            Some(_) => LedgerState::Active,
            None => LedgerState::Inactive,
        }
    }

    /// Balance reserved for the active round.
    pub fn committed(&self, now: u64) -> U256 {
        self.active_round(now)
            .map(|round| round.available_remaining)
            .unwrap_or_default()
    }

    /// Amount a kick at `now` would commit, given the vault `balance`.
    ///
    /// Zero while a round is active or the token is disabled.
    pub fn kickable(&self, balance: U256, now: u64) -> U256 {
        if !self.enabled || self.state(now) == LedgerState::Active {
            U256::ZERO
        } else {
            balance
        }
    }

    pub fn is_kickable(&self, balance: U256, now: u64) -> bool {
        !self.kickable(balance, now).is_zero()
    }

    /// Open a new round committing `available`.
    ///
    /// Fails with `NothingToKick` while a round is active or when `available`
    /// is zero, and with `TokenNotEnabled` for a disabled token.
    pub fn kick(
        &mut self,
        available: U256,
        params: AuctionParams,
        now: u64,
    ) -> Result<&Round, RoundError> {
        if !self.enabled {
            return Err(RoundError::TokenNotEnabled(self.token.address));
        }
        if self.state(now) == LedgerState::Active || available.is_zero() {
            return Err(RoundError::NothingToKick(self.token.address));
        }

        let round_id = self.latest.as_ref().map_or(0, |round| round.round_id) + 1;
        let round = Round {
            from: self.token.address,
            round_id,
            kicked_at: now,
            initial_available: available,
            available_remaining: available,
            take_seq: 0,
            params,
        };
        Ok(&*self.latest.insert(round))
    }

    /// Compute the round that results from debiting `amount` at `now`,
    /// without changing the ledger.
    ///
    /// Expiry is re-derived through `pricer` so that a debit can never land
    /// on a round that no longer has a price.
    pub fn prepare_debit(
        &self,
        amount: U256,
        pricer: &dyn PriceCalculator,
        now: u64,
    ) -> Result<Round, AuctionError> {
        let round = self
            .latest
            .as_ref()
            .ok_or(RoundError::NoActiveRound(self.token.address))?;

        match pricer.round_price(round, now) {
            Ok(_) => {}
            Err(PricingError::PriceExpired { .. }) => {
                return Err(RoundError::RoundExpired { round_id: round.round_id }.into());
            }
            Err(e) => return Err(e.into()),
        }
        if round.status(now) != RoundStatus::Active {
            return Err(RoundError::NoActiveRound(self.token.address).into());
        }
        if amount.is_zero() {
            return Err(RoundError::ZeroAmount.into());
        }
        if amount > round.available_remaining {
            return Err(RoundError::InsufficientAvailable {
                requested: amount,
                available: round.available_remaining,
            }
            .into());
        }

        let mut updated = round.clone();
        updated.available_remaining -= amount;
        updated.take_seq += 1;
        Ok(updated)
    }

    /// Install a round produced by [`prepare_debit`](Self::prepare_debit).
    ///
    /// The round must be the successor of the latest round: same id, exactly
    /// one more take, and no more remaining than before.
    pub(crate) fn commit(&mut self, updated: Round) -> &Round {
        debug_assert!(self.latest.as_ref().is_some_and(|current| {
            current.round_id == updated.round_id
                && current.take_seq + 1 == updated.take_seq
                && updated.available_remaining <= current.available_remaining
        }));
        &*self.latest.insert(updated)
    }

    /// Debit `amount` from the active round and advance its take sequence.
    pub fn debit(
        &mut self,
        amount: U256,
        pricer: &dyn PriceCalculator,
        now: u64,
    ) -> Result<&Round, AuctionError> {
        let updated = self.prepare_debit(amount, pricer, now)?;
        Ok(self.commit(updated))
    }

    /// Append a take record.
    pub(crate) fn record(&mut self, take: Take) {
        self.takes.push(take);
    }

    /// Every take ever recorded for this token, oldest first.
    pub fn takes(&self) -> &[Take] {
        &self.takes
    }
}
