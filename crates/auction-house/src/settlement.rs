//! Take settlement.
//!
//! [`SettlementEngine::take`] runs one take end to end against a locked
//! [`RoundLedger`]: price lookup, clamping, payment computation, the round
//! debit, token movements and the take record. Every check runs before the
//! first write, and the ledger is only updated after both vault movements
//! succeed, so a failed take leaves no trace.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tracing::warn;

use auction_core::error::{AuctionError, RoundError};
use auction_core::traits::{PriceCalculator, TokenVault};
use auction_core::types::{RoundStatus, Settlement, Take, TokenSpec};

use crate::ledger::RoundLedger;

pub struct SettlementEngine {
    pricer: Arc<dyn PriceCalculator>,
    vault: Arc<dyn TokenVault>,
    want: TokenSpec,
}

impl SettlementEngine {
    pub fn new(
        pricer: Arc<dyn PriceCalculator>,
        vault: Arc<dyn TokenVault>,
        want: TokenSpec,
    ) -> Self {
        Self { pricer, vault, want }
    }

    pub fn want(&self) -> TokenSpec {
        self.want
    }

    /// Quote for taking up to `requested` at `now`: the clamped amount, the
    /// price and the payment. Nothing is mutated.
    pub fn quote(
        &self,
        ledger: &RoundLedger,
        requested: U256,
        now: u64,
    ) -> Result<(U256, U256, U256), AuctionError> {
        let from = ledger.token();
        let round = ledger
            .latest_round()
            .filter(|round| round.status(now) != RoundStatus::Exhausted)
            .ok_or(RoundError::NoActiveRound(from.address))?;

        let price = self.pricer.round_price(round, now)?;

        let amount = requested.min(round.available_remaining);
        if amount.is_zero() {
            return Err(RoundError::ZeroAmount.into());
        }

        let to_pay = self
            .pricer
            .amount_to_pay(amount, price, from.decimals, self.want.decimals)?;
        Ok((amount, price, to_pay))
    }

    /// Execute a take of up to `requested` from-token units for `taker`.
    pub fn take(
        &self,
        ledger: &mut RoundLedger,
        requested: U256,
        taker: Address,
        now: u64,
    ) -> Result<(Settlement, Take), AuctionError> {
        let from = ledger.token();
        let (amount, price, amount_paid) = self.quote(ledger, requested, now)?;
        let updated = ledger.prepare_debit(amount, self.pricer.as_ref(), now)?;

        self.vault.debit(from.address, amount)?;
        if let Err(e) = self.vault.credit(self.want.address, amount_paid) {
            // Undo the from-token debit; crediting back what was just removed cannot overflow.
            if let Err(restore) = self.vault.credit(from.address, amount) {
                warn!(from = %from.address, %amount, "failed to restore balance: {restore}");
            }
            return Err(e);
        }

        let round = ledger.commit(updated);
        let take = Take {
            from: from.address,
            round_id: round.round_id,
            take_seq: round.take_seq,
            taker,
            amount_taken: amount,
            amount_paid,
            price_at_take: price,
            timestamp: now,
        };
        let settlement = Settlement {
            round_id: take.round_id,
            take_seq: take.take_seq,
            amount_taken: amount,
            amount_paid,
            price,
        };
        ledger.record(take.clone());

        Ok((settlement, take))
    }
}
