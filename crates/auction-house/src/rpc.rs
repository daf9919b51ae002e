//! JSON-RPC server for the auction house.
//!
//! Uses jsonrpsee 0.24. Methods live in the `auction` namespace
//! (`auction_currentPrice`, `auction_take`, ...). Read-only methods answer
//! benign "no active round" conditions with `null`, `0` or `false`. Mutating
//! methods take the acting address as their first parameter; authenticating it
//! is the job of the transport in front of this server.
//!
//! Batch requests are handled by jsonrpsee itself.

use std::net::SocketAddr;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};

use auction_core::error::AuctionError;
use auction_core::governance::GovernanceState;
use auction_core::types::{AuctionParams, ParamsUpdate, Round, Settlement, Take, TokenSpec};

use crate::house::{AuctionHouse, RoundView};

/// Governance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceJson {
    pub governance: Address,
    pub pending: Option<Address>,
    pub state: GovernanceState,
}

/// Stable JSON-RPC error code for an error kind.
pub fn error_code(kind: &str) -> i32 {
    match kind {
        "Unauthorized" => -32001,
        "NothingToKick" => -32002,
        "NoActiveRound" => -32003,
        "InsufficientAvailable" => -32004,
        "ZeroAmount" => -32005,
        "RoundExpired" => -32006,
        "PriceExpired" => -32007,
        "InvalidTime" => -32008,
        "Overflow" => -32009,
        "DivisionByZero" => -32010,
        "TokenNotEnabled" => -32011,
        "RoundActive" => -32012,
        "InvalidParameter" => -32013,
        _ => -32000,
    }
}

/// Map an [`AuctionError`] to a JSON-RPC error carrying its kind as data.
pub fn rpc_error(err: AuctionError) -> ErrorObjectOwned {
    let kind = err.kind();
    ErrorObjectOwned::owned(error_code(kind), err.to_string(), Some(kind))
}

#[rpc(server, client, namespace = "auction")]
pub trait AuctionRpc {
    /// Current price of the active round, or null.
    #[method(name = "currentPrice")]
    async fn current_price(&self, from: Address) -> Result<Option<U256>, ErrorObjectOwned>;

    /// Remaining amount of the active round.
    #[method(name = "availableAmount")]
    async fn available_amount(&self, from: Address) -> Result<U256, ErrorObjectOwned>;

    #[method(name = "isKickable")]
    async fn is_kickable(&self, from: Address) -> Result<bool, ErrorObjectOwned>;

    /// Amount a kick would commit now.
    #[method(name = "kickable")]
    async fn kickable(&self, from: Address) -> Result<U256, ErrorObjectOwned>;

    /// Want-token units needed to take `amount` now.
    #[method(name = "amountNeeded")]
    async fn amount_needed(&self, from: Address, amount: U256) -> Result<U256, ErrorObjectOwned>;

    #[method(name = "round")]
    async fn round(&self, from: Address) -> Result<Option<RoundView>, ErrorObjectOwned>;

    #[method(name = "takes")]
    async fn takes(&self, from: Address) -> Result<Vec<Take>, ErrorObjectOwned>;

    #[method(name = "params")]
    async fn params(&self) -> Result<AuctionParams, ErrorObjectOwned>;

    #[method(name = "governance")]
    async fn governance(&self) -> Result<GovernanceJson, ErrorObjectOwned>;

    #[method(name = "enabledTokens")]
    async fn enabled_tokens(&self) -> Result<Vec<TokenSpec>, ErrorObjectOwned>;

    #[method(name = "nextStepAt")]
    async fn next_step_at(&self, from: Address) -> Result<Option<u64>, ErrorObjectOwned>;

    #[method(name = "kick")]
    async fn kick(&self, caller: Address, from: Address) -> Result<Round, ErrorObjectOwned>;

    #[method(name = "take")]
    async fn take(
        &self,
        caller: Address,
        from: Address,
        amount: U256,
    ) -> Result<Settlement, ErrorObjectOwned>;

    /// Credit inventory; returns the new balance.
    #[method(name = "deposit")]
    async fn deposit(
        &self,
        caller: Address,
        token: Address,
        amount: U256,
    ) -> Result<U256, ErrorObjectOwned>;

    #[method(name = "proposeTransfer")]
    async fn propose_transfer(
        &self,
        caller: Address,
        new_governance: Address,
    ) -> Result<(), ErrorObjectOwned>;

    /// Returns the previous governor.
    #[method(name = "acceptTransfer")]
    async fn accept_transfer(&self, caller: Address) -> Result<Address, ErrorObjectOwned>;

    #[method(name = "enable")]
    async fn enable(
        &self,
        caller: Address,
        token: Address,
        decimals: u8,
    ) -> Result<(), ErrorObjectOwned>;

    #[method(name = "disable")]
    async fn disable(&self, caller: Address, token: Address) -> Result<(), ErrorObjectOwned>;

    #[method(name = "setParameters")]
    async fn set_parameters(
        &self,
        caller: Address,
        update: ParamsUpdate,
    ) -> Result<AuctionParams, ErrorObjectOwned>;

    /// Withdraw the uncommitted balance to governance; returns the amount.
    #[method(name = "sweep")]
    async fn sweep(&self, caller: Address, token: Address) -> Result<U256, ErrorObjectOwned>;
}

pub struct RpcServerImpl {
    house: Arc<AuctionHouse>,
}

impl RpcServerImpl {
    pub fn new(house: Arc<AuctionHouse>) -> Self {
        Self { house }
    }
}

#[async_trait]
impl AuctionRpcServer for RpcServerImpl {
    async fn current_price(&self, from: Address) -> Result<Option<U256>, ErrorObjectOwned> {
        self.house.current_price(from).map_err(rpc_error)
    }

    async fn available_amount(&self, from: Address) -> Result<U256, ErrorObjectOwned> {
        Ok(self.house.available_amount(from))
    }

    async fn is_kickable(&self, from: Address) -> Result<bool, ErrorObjectOwned> {
        Ok(self.house.is_kickable(from))
    }

    async fn kickable(&self, from: Address) -> Result<U256, ErrorObjectOwned> {
        Ok(self.house.kickable(from))
    }

    async fn amount_needed(&self, from: Address, amount: U256) -> Result<U256, ErrorObjectOwned> {
        self.house.amount_needed(from, amount).map_err(rpc_error)
    }

    async fn round(&self, from: Address) -> Result<Option<RoundView>, ErrorObjectOwned> {
        self.house.round(from).map_err(rpc_error)
    }

    async fn takes(&self, from: Address) -> Result<Vec<Take>, ErrorObjectOwned> {
        Ok(self.house.takes(from))
    }

    async fn params(&self) -> Result<AuctionParams, ErrorObjectOwned> {
        Ok(self.house.params())
    }

    async fn governance(&self) -> Result<GovernanceJson, ErrorObjectOwned> {
        Ok(GovernanceJson {
            governance: self.house.governance(),
            pending: self.house.pending_governance(),
            state: self.house.governance_state(),
        })
    }

    async fn enabled_tokens(&self) -> Result<Vec<TokenSpec>, ErrorObjectOwned> {
        Ok(self.house.enabled_tokens())
    }

    async fn next_step_at(&self, from: Address) -> Result<Option<u64>, ErrorObjectOwned> {
        Ok(self.house.next_step_at(from))
    }

    async fn kick(&self, caller: Address, from: Address) -> Result<Round, ErrorObjectOwned> {
        self.house.kick(caller, from).map_err(rpc_error)
    }

    async fn take(
        &self,
        caller: Address,
        from: Address,
        amount: U256,
    ) -> Result<Settlement, ErrorObjectOwned> {
        self.house.take(caller, from, amount).map_err(rpc_error)
    }

    async fn deposit(
        &self,
        caller: Address,
        token: Address,
        amount: U256,
    ) -> Result<U256, ErrorObjectOwned> {
        self.house.deposit(caller, token, amount).map_err(rpc_error)
    }

    async fn propose_transfer(
        &self,
        caller: Address,
        new_governance: Address,
    ) -> Result<(), ErrorObjectOwned> {
        self.house
            .propose_transfer(caller, new_governance)
            .map_err(rpc_error)
    }

    async fn accept_transfer(&self, caller: Address) -> Result<Address, ErrorObjectOwned> {
        self.house.accept_transfer(caller).map_err(rpc_error)
    }

    async fn enable(
        &self,
        caller: Address,
        token: Address,
        decimals: u8,
    ) -> Result<(), ErrorObjectOwned> {
        let spec = TokenSpec::new(token, decimals).map_err(|e| rpc_error(e.into()))?;
        self.house.enable(caller, spec).map_err(rpc_error)
    }

    async fn disable(&self, caller: Address, token: Address) -> Result<(), ErrorObjectOwned> {
        self.house.disable(caller, token).map_err(rpc_error)
    }

    async fn set_parameters(
        &self,
        caller: Address,
        update: ParamsUpdate,
    ) -> Result<AuctionParams, ErrorObjectOwned> {
        self.house.set_params(caller, update).map_err(rpc_error)
    }

    async fn sweep(&self, caller: Address, token: Address) -> Result<U256, ErrorObjectOwned> {
        self.house.sweep(caller, token).map_err(rpc_error)
    }
}

/// Start the JSON-RPC server on `addr`.
///
/// Returns the bound address (useful with port 0) and a [`ServerHandle`]
/// that stops the server when told to.
pub async fn start_rpc_server(
    addr: &str,
    house: Arc<AuctionHouse>,
) -> std::io::Result<(SocketAddr, ServerHandle)> {
    let server = Server::builder().build(addr).await?;
    let local = server.local_addr()?;
    let handle = server.start(RpcServerImpl::new(house).into_rpc());
    Ok((local, handle))
}
