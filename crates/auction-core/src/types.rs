//! Core auction types: parameters, rounds, takes and events.
//!
//! Amounts are token base units, prices are WAD-scaled want tokens per whole
//! from token, and timestamps are Unix seconds.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{
    bps_to_ray, DEFAULT_AUCTION_LENGTH, DEFAULT_DECAY_RATE_BPS, DEFAULT_STARTING_PRICE,
    DEFAULT_UPDATE_INTERVAL, MAX_TOKEN_DECIMALS, RAY, WAD,
};
use crate::error::ParameterError;

/// Decay schedule shared by all rounds kicked while it is in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    /// Fraction of the price lost per update interval, RAY-scaled.
    pub decay_rate: U256,
    /// Length of one price step in seconds.
    pub update_interval: u64,
    /// Maximum round duration in seconds.
    pub auction_length: u64,
    /// Price at the moment of the kick, WAD-scaled.
    pub starting_price: U256,
}

impl Default for AuctionParams {
    fn default() -> Self {
        Self {
            decay_rate: bps_to_ray(DEFAULT_DECAY_RATE_BPS),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            auction_length: DEFAULT_AUCTION_LENGTH,
            starting_price: U256::from(DEFAULT_STARTING_PRICE) * WAD,
        }
    }
}

impl AuctionParams {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.decay_rate > RAY {
            return Err(ParameterError::DecayRateTooHigh(self.decay_rate));
        }
        if self.update_interval == 0 {
            return Err(ParameterError::ZeroUpdateInterval);
        }
        if self.auction_length == 0 {
            return Err(ParameterError::ZeroAuctionLength);
        }
        if self.starting_price.is_zero() {
            return Err(ParameterError::ZeroStartingPrice);
        }
        Ok(())
    }

    /// Per-step retention factor `RAY - decay_rate`.
    pub fn retention(&self) -> U256 {
        RAY.saturating_sub(self.decay_rate)
    }
}

/// Partial update of [`AuctionParams`]; `None` fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsUpdate {
    pub decay_rate: Option<U256>,
    pub update_interval: Option<u64>,
    pub auction_length: Option<u64>,
    pub starting_price: Option<U256>,
}

impl ParamsUpdate {
    /// Apply the update to `params`, returning the validated result.
    pub fn apply(&self, params: &AuctionParams) -> Result<AuctionParams, ParameterError> {
        let updated = AuctionParams {
            decay_rate: self.decay_rate.unwrap_or(params.decay_rate),
            update_interval: self.update_interval.unwrap_or(params.update_interval),
            auction_length: self.auction_length.unwrap_or(params.auction_length),
            starting_price: self.starting_price.unwrap_or(params.starting_price),
        };
        updated.validate()?;
        Ok(updated)
    }

    pub fn is_empty(&self) -> bool {
        self.decay_rate.is_none()
            && self.update_interval.is_none()
            && self.auction_length.is_none()
            && self.starting_price.is_none()
    }
}

/// A token and its decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSpec {
    pub address: Address,
    pub decimals: u8,
}

impl TokenSpec {
    pub fn new(address: Address, decimals: u8) -> Result<Self, ParameterError> {
        if address.is_zero() {
            return Err(ParameterError::ZeroAddress);
        }
        if decimals > MAX_TOKEN_DECIMALS {
            return Err(ParameterError::DecimalsTooLarge(decimals));
        }
        Ok(Self { address, decimals })
    }
}

/// Derived state of a round at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Available amount remains and the round has not reached its length.
    Active,
    /// Everything was taken.
    Exhausted,
    /// The auction length elapsed.
    Expired,
}

/// One auction round for a from token.
///
/// Activity is never stored: [`Round::status`] derives it from the clock and the
/// remaining amount each time it is asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub from: Address,
    /// Monotonic per from token, starting at 1.
    pub round_id: u64,
    pub kicked_at: u64,
    pub initial_available: U256,
    pub available_remaining: U256,
    /// Number of takes so far; the next take gets `take_seq + 1`.
    pub take_seq: u64,
    /// Parameters in force when the round was kicked.
    pub params: AuctionParams,
}

impl Round {
    pub fn status(&self, now: u64) -> RoundStatus {
        if self.available_remaining.is_zero() {
            RoundStatus::Exhausted
        } else if now.saturating_sub(self.kicked_at) >= self.params.auction_length {
            RoundStatus::Expired
        } else {
            RoundStatus::Active
        }
    }

    pub fn is_active(&self, now: u64) -> bool {
        self.status(now) == RoundStatus::Active
    }

    /// First timestamp at which the round is expired.
    pub fn expires_at(&self) -> u64 {
        self.kicked_at.saturating_add(self.params.auction_length)
    }

    /// Amount taken so far.
    pub fn taken(&self) -> U256 {
        self.initial_available - self.available_remaining
    }
}

/// Immutable record of one settlement, keyed by `(from, round_id, take_seq)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Take {
    pub from: Address,
    pub round_id: u64,
    pub take_seq: u64,
    pub taker: Address,
    /// From-token base units delivered to the taker.
    pub amount_taken: U256,
    /// Want-token base units paid by the taker.
    pub amount_paid: U256,
    pub price_at_take: U256,
    pub timestamp: u64,
}

/// Result of a successful take, returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub round_id: u64,
    pub take_seq: u64,
    pub amount_taken: U256,
    pub amount_paid: U256,
    pub price: U256,
}

/// Structured record of every committed mutation, for indexers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuctionEvent {
    Kicked {
        from: Address,
        round_id: u64,
        available: U256,
        starting_price: U256,
        actor: Address,
        timestamp: u64,
    },
    Taken {
        from: Address,
        round_id: u64,
        take_seq: u64,
        amount_taken: U256,
        amount_paid: U256,
        price: U256,
        actor: Address,
        timestamp: u64,
    },
    Deposited {
        token: Address,
        amount: U256,
        actor: Address,
        timestamp: u64,
    },
    TransferProposed {
        governance: Address,
        pending: Address,
        timestamp: u64,
    },
    TransferAccepted {
        previous: Address,
        governance: Address,
        timestamp: u64,
    },
    TokenEnabled {
        token: Address,
        decimals: u8,
        actor: Address,
        timestamp: u64,
    },
    TokenDisabled {
        token: Address,
        actor: Address,
        timestamp: u64,
    },
    ParametersUpdated {
        params: AuctionParams,
        actor: Address,
        timestamp: u64,
    },
    Swept {
        token: Address,
        amount: U256,
        to: Address,
        timestamp: u64,
    },
}

impl AuctionEvent {
    /// Timestamp carried by every event.
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Kicked { timestamp, .. }
            | Self::Taken { timestamp, .. }
            | Self::Deposited { timestamp, .. }
            | Self::TransferProposed { timestamp, .. }
            | Self::TransferAccepted { timestamp, .. }
            | Self::TokenEnabled { timestamp, .. }
            | Self::TokenDisabled { timestamp, .. }
            | Self::ParametersUpdated { timestamp, .. }
            | Self::Swept { timestamp, .. } => *timestamp,
        }
    }
}
