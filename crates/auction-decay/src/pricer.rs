//! Decay pricer implementing the [`PriceCalculator`] trait.
//!
//! The price of a round is a pure function of its parameters, its kick time
//! and the current time:
//!
//! ```text
//! steps = (now - kicked_at) / update_interval
//! price = starting_price * (RAY - decay_rate)^steps / RAY
//! ```
//!
//! Because `RAY - decay_rate` never exceeds `RAY`, the price is non-increasing
//! from step to step and constant within a step.

use auction_core::U256;
use auction_core::error::{MathError, PricingError};
use auction_core::math::{payment_for, rmul, rpow};
use auction_core::traits::PriceCalculator;
use auction_core::types::AuctionParams;
use tracing::warn;

use crate::schedule::step_index;

/// The production price calculator.
///
/// Stateless; all inputs arrive with each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecayPricer;

impl DecayPricer {
    pub fn new() -> Self {
        Self
    }

    /// RAY-scaled retention after `steps` steps: `(RAY - decay_rate)^steps`.
    pub fn decay_factor(params: &AuctionParams, steps: u64) -> Result<U256, MathError> {
        rpow(params.retention(), steps)
    }
}

impl PriceCalculator for DecayPricer {
    fn current_price(
        &self,
        params: &AuctionParams,
        kicked_at: u64,
        now: u64,
    ) -> Result<U256, PricingError> {
        let steps = step_index(params, kicked_at, now)?;
        let price = Self::decay_factor(params, steps)
            .and_then(|factor| rmul(params.starting_price, factor))
            .inspect_err(|e| {
                warn!(
                    steps,
                    starting_price = %params.starting_price,
                    decay_rate = %params.decay_rate,
                    "price computation failed: {e}"
                );
            })?;
        Ok(price)
    }

    fn amount_to_pay(
        &self,
        amount: U256,
        price: U256,
        from_decimals: u8,
        want_decimals: u8,
    ) -> Result<U256, MathError> {
        payment_for(amount, price, from_decimals, want_decimals)
    }
}
