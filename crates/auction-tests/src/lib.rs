//! Scenario and adversarial test suite for the auction engine.
//!
//! Integration tests drive the public [`auction_house::AuctionHouse`] API
//! with a manual clock, checking the pricing schedule, settlement
//! conservation and the governance handoff under adversarial inputs.

pub mod helpers;
