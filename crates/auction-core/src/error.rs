//! Error types for the auction engine.
use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow")] Overflow,
    #[error("division by zero")] DivisionByZero,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("unauthorized caller: {caller}")] Unauthorized { caller: Address },
    #[error("invalid pending governance: {0}")] InvalidPending(Address),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("price expired: {elapsed}s elapsed of {auction_length}s")] PriceExpired { elapsed: u64, auction_length: u64 },
    #[error("invalid time: now {now} precedes kick at {kicked_at}")] InvalidTime { now: u64, kicked_at: u64 },
    #[error(transparent)] Math(#[from] MathError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("nothing to kick for {0}")] NothingToKick(Address),
    #[error("no active round for {0}")] NoActiveRound(Address),
    #[error("insufficient available: requested {requested}, available {available}")] InsufficientAvailable { requested: U256, available: U256 },
    #[error("zero amount")] ZeroAmount,
    #[error("round {round_id} expired")] RoundExpired { round_id: u64 },
    #[error("token not enabled: {0}")] TokenNotEnabled(Address),
    #[error("round {round_id} still active for {from}")] RoundActive { from: Address, round_id: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("decay rate {0} exceeds RAY")] DecayRateTooHigh(U256),
    #[error("update interval must be positive")] ZeroUpdateInterval,
    #[error("auction length must be positive")] ZeroAuctionLength,
    #[error("starting price must be positive")] ZeroStartingPrice,
    #[error("decimals {0} exceed maximum")] DecimalsTooLarge(u8),
    #[error("token already enabled: {0}")] AlreadyEnabled(Address),
    #[error("want token cannot be auctioned: {0}")] WantTokenAsFrom(Address),
    #[error("zero address")] ZeroAddress,
    #[error("invalid value for {field}: {reason}")] Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuctionError {
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Governance(#[from] GovernanceError),
    #[error(transparent)] Pricing(#[from] PricingError),
    #[error(transparent)] Round(#[from] RoundError),
    #[error(transparent)] Parameter(#[from] ParameterError),
}

impl AuctionError {
    /// Stable machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Math(MathError::Overflow) => "Overflow",
            Self::Math(MathError::DivisionByZero) => "DivisionByZero",
            Self::Governance(GovernanceError::Unauthorized { .. }) => "Unauthorized",
            Self::Governance(GovernanceError::InvalidPending(_)) => "InvalidParameter",
            Self::Pricing(PricingError::PriceExpired { .. }) => "PriceExpired",
            Self::Pricing(PricingError::InvalidTime { .. }) => "InvalidTime",
            Self::Pricing(PricingError::Math(inner)) => Self::Math(*inner).kind(),
            Self::Round(RoundError::NothingToKick(_)) => "NothingToKick",
            Self::Round(RoundError::NoActiveRound(_)) => "NoActiveRound",
            Self::Round(RoundError::InsufficientAvailable { .. }) => "InsufficientAvailable",
            Self::Round(RoundError::ZeroAmount) => "ZeroAmount",
            Self::Round(RoundError::RoundExpired { .. }) => "RoundExpired",
            Self::Round(RoundError::TokenNotEnabled(_)) => "TokenNotEnabled",
            Self::Round(RoundError::RoundActive { .. }) => "RoundActive",
            Self::Parameter(_) => "InvalidParameter",
        }
    }
}
