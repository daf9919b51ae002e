//! Trait interfaces for the auction engine.
//!
//! These traits define the seams between crates:
//! - [`PriceCalculator`] — decay pricing (auction-decay implements)
//! - [`TokenVault`] — token custody held by the auction house
//! - [`Clock`] — the time source every operation reads once

use alloy_primitives::{Address, U256};

use crate::error::{AuctionError, MathError, PricingError};
use crate::types::{AuctionParams, Round};

/// Pure computation of the clearing price of a round.
pub trait PriceCalculator: Send + Sync {
    /// Price at `now` for a round kicked at `kicked_at` under `params`.
    ///
    /// Fails with `InvalidTime` if `now` precedes the kick and with
    /// `PriceExpired` once `auction_length` has elapsed.
    fn current_price(
        &self,
        params: &AuctionParams,
        kicked_at: u64,
        now: u64,
    ) -> Result<U256, PricingError>;

    /// Price at `now` for `round`, using the parameters it was kicked with.
    ///
    /// Default implementation delegates to [`current_price`](Self::current_price).
    fn round_price(&self, round: &Round, now: u64) -> Result<U256, PricingError> {
        self.current_price(&round.params, round.kicked_at, now)
    }

    /// Want-token base units owed for `amount` from-token base units at `price`.
    fn amount_to_pay(
        &self,
        amount: U256,
        price: U256,
        from_decimals: u8,
        want_decimals: u8,
    ) -> Result<U256, MathError>;
}

/// Balances held by the auction house, per token.
///
/// Implementations must make `credit` and `debit` individually atomic. The
/// house serialises all mutations of one from token, so a caller holding that
/// token's lock observes a stable from-token balance.
pub trait TokenVault: Send + Sync {
    /// Current balance of `token`.
    fn balance_of(&self, token: Address) -> U256;

    /// Add `amount` of `token`, returning the new balance.
    fn credit(&self, token: Address, amount: U256) -> Result<U256, AuctionError>;

    /// Remove `amount` of `token`, returning the new balance.
    ///
    /// Fails with `InsufficientAvailable` without changing the balance if the
    /// vault holds less than `amount`.
    fn debit(&self, token: Address, amount: U256) -> Result<U256, AuctionError>;
}

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WAD;

    struct FlatPrice(U256);

    impl PriceCalculator for FlatPrice {
        fn current_price(
            &self,
            params: &AuctionParams,
            kicked_at: u64,
            now: u64,
        ) -> Result<U256, PricingError> {
            if now < kicked_at {
                return Err(PricingError::InvalidTime { now, kicked_at });
            }
            let elapsed = now - kicked_at;
            if elapsed >= params.auction_length {
                return Err(PricingError::PriceExpired {
                    elapsed,
                    auction_length: params.auction_length,
                });
            }
            Ok(self.0)
        }

        fn amount_to_pay(
            &self,
            amount: U256,
            price: U256,
            _from_decimals: u8,
            _want_decimals: u8,
        ) -> Result<U256, MathError> {
            crate::math::wmul(amount, price)
        }
    }

    #[test]
    fn round_price_uses_round_params() {
        let calc = FlatPrice(WAD);
        let round = Round {
            from: Address::repeat_byte(1),
            round_id: 1,
            kicked_at: 100,
            initial_available: U256::from(5u64),
            available_remaining: U256::from(5u64),
            take_seq: 0,
            params: AuctionParams { auction_length: 10, ..AuctionParams::default() },
        };
        assert_eq!(calc.round_price(&round, 105).unwrap(), WAD);
        assert!(matches!(
            calc.round_price(&round, 110),
            Err(PricingError::PriceExpired { elapsed: 10, auction_length: 10 })
        ));
        assert_eq!(
            calc.round_price(&round, 99),
            Err(PricingError::InvalidTime { now: 99, kicked_at: 100 })
        );
    }

    #[test]
    fn traits_are_object_safe() {
        let calc = FlatPrice(WAD);
        let dyn_calc: &dyn PriceCalculator = &calc;
        assert_eq!(
            dyn_calc.amount_to_pay(U256::from(3u64), WAD, 18, 18).unwrap(),
            U256::from(3u64)
        );
    }
}
