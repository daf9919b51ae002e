//! # auction-core
//! Foundation types, fixed-point math and governance for the Dutch-auction engine.
//!
//! - [`math`] — WAD/RAY fixed-point arithmetic and `rpow`
//! - [`governance`] — two-step governance transfer
//! - [`types`] — parameters, rounds, takes and events
//! - [`traits`] — pricing, custody and clock seams

pub mod clock;
pub mod constants;
pub mod error;
pub mod governance;
pub mod math;
pub mod traits;
pub mod types;
pub mod vault;

pub use alloy_primitives::{Address, U256};
