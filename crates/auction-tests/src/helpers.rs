//! Shared helpers for scenario and integration tests.

use std::sync::Arc;

use auction_core::clock::ManualClock;
use auction_core::constants::{RAY, WAD};
use auction_core::types::{AuctionParams, TokenSpec};
use auction_core::vault::MemoryVault;
use auction_core::{Address, U256};
use auction_decay::DecayPricer;
use auction_house::AuctionHouse;

/// Address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address::repeat_byte(seed)
}

pub fn governor() -> Address {
    addr(0xA0)
}

pub fn want_token() -> TokenSpec {
    TokenSpec { address: addr(0xEE), decimals: 18 }
}

pub fn from_token() -> TokenSpec {
    TokenSpec { address: addr(0xF0), decimals: 18 }
}

/// Whole tokens at 18 decimals.
pub fn tokens(n: u64) -> U256 {
    U256::from(n) * WAD
}

/// 1000 WAD start, 1% decay per 60 s step, one-hour rounds.
pub fn scenario_params() -> AuctionParams {
    AuctionParams {
        decay_rate: RAY / U256::from(100u64),
        update_interval: 60,
        auction_length: 3_600,
        starting_price: tokens(1_000),
    }
}

/// A house at t=0 with [`from_token`] enabled.
pub struct TestHouse {
    pub house: Arc<AuctionHouse>,
    pub clock: Arc<ManualClock>,
    pub vault: Arc<MemoryVault>,
}

impl TestHouse {
    pub fn new(params: AuctionParams) -> Self {
        Self::with_tokens(params, want_token(), &[from_token()])
    }

    pub fn with_tokens(params: AuctionParams, want: TokenSpec, from: &[TokenSpec]) -> Self {
        let clock = Arc::new(ManualClock::new(0));
        let vault = Arc::new(MemoryVault::new());
        let house = AuctionHouse::new(
            governor(),
            want,
            params,
            Arc::new(DecayPricer::new()),
            vault.clone(),
            clock.clone(),
        )
        .expect("valid house");
        for token in from {
            house.enable(governor(), *token).expect("enable from token");
        }
        Self { house: Arc::new(house), clock, vault }
    }

    /// Deposit `amount` of the from token and kick a round at the current time.
    pub fn kicked(params: AuctionParams, amount: U256) -> Self {
        let test = Self::new(params);
        let from = from_token().address;
        test.house.deposit(addr(1), from, amount).expect("deposit");
        test.house.kick(addr(1), from).expect("kick");
        test
    }
}
