//! Step arithmetic shared by the pricer and by pollers.

use auction_core::error::{MathError, PricingError};
use auction_core::types::AuctionParams;

/// Index of the price step in force at `now` for a round kicked at `kicked_at`.
///
/// Step 0 covers `[kicked_at, kicked_at + update_interval)`. Fails exactly
/// where pricing fails: before the kick and from expiry onward.
pub fn step_index(params: &AuctionParams, kicked_at: u64, now: u64) -> Result<u64, PricingError> {
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
    if params.update_interval == 0 {
        return Err(MathError::DivisionByZero.into());
    }
    Ok(elapsed / params.update_interval)
}

/// Timestamp of the next price change after `now`, if the round lives to see it.
///
/// Returns `None` when `now` is outside the round or when the next step
/// boundary falls at or after expiry.
pub fn next_step_at(params: &AuctionParams, kicked_at: u64, now: u64) -> Option<u64> {
    let step = step_index(params, kicked_at, now).ok()?;
    let offset = step.checked_add(1)?.checked_mul(params.update_interval)?;
    if offset >= params.auction_length {
        return None;
    }
    kicked_at.checked_add(offset)
}
