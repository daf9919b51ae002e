//! In-memory [`TokenVault`] backed by a concurrent map.

use alloy_primitives::{Address, U256};
use dashmap::DashMap;

use crate::error::{AuctionError, MathError, RoundError};
use crate::traits::TokenVault;

/// Token balances kept in process memory.
///
/// Each `credit`/`debit` runs under the map's per-shard lock, so concurrent
/// updates to the same token never lose a write.
#[derive(Debug, Default)]
pub struct MemoryVault {
    balances: DashMap<Address, U256>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenVault for MemoryVault {
    fn balance_of(&self, token: Address) -> U256 {
        self.balances
            .get(&token)
            .map(|balance| *balance)
            .unwrap_or_default()
    }

    fn credit(&self, token: Address, amount: U256) -> Result<U256, AuctionError> {
        let mut entry = self.balances.entry(token).or_default();
        let updated = entry.checked_add(amount).ok_or(MathError::Overflow)?;
        *entry = updated;
        Ok(updated)
    }

    fn debit(&self, token: Address, amount: U256) -> Result<U256, AuctionError> {
        let mut entry = self.balances.entry(token).or_default();
        let available = *entry;
        let updated = available
            .checked_sub(amount)
            .ok_or(RoundError::InsufficientAvailable { requested: amount, available })?;
        *entry = updated;
        Ok(updated)
    }
}
