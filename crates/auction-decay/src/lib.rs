//! # auction-decay — Step-wise exponential price decay.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Step function**: the price only moves at `update_interval` boundaries
//!   measured from the kick, so every observer within one step sees one price.
//! - **Compound decay**: `price = starting_price * (1 - decay_rate)^steps`
//!   using RAY-precision binary exponentiation.
//! - **Hard expiry**: once `auction_length` has elapsed there is no price.

pub mod pricer;
pub mod schedule;

pub use pricer::DecayPricer;
pub use schedule::{next_step_at, step_index};
