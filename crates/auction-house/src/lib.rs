//! # auction-house — Rounds, settlement, configuration and RPC.
//!
//! Composes the auction engine into a running service:
//! - [`ledger::RoundLedger`] — per from-token round state machine
//! - [`settlement::SettlementEngine`] — atomic take execution
//! - [`house::AuctionHouse`] — governance, parameters and per-token locking
//! - [`config::HouseConfig`] — file and environment configuration
//! - [`rpc`] — JSON-RPC server for external access

pub mod config;
pub mod house;
pub mod ledger;
pub mod rpc;
pub mod settlement;

pub use config::HouseConfig;
pub use house::{AuctionHouse, RoundView};
pub use ledger::{LedgerState, RoundLedger};
pub use rpc::start_rpc_server;
pub use settlement::SettlementEngine;
