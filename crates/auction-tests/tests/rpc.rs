//! JSON-RPC round trips against a live server on an ephemeral port.

use std::sync::Arc;

use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::BatchRequestBuilder;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;

use auction_core::governance::GovernanceState;
use auction_core::types::ParamsUpdate;
use auction_core::U256;
use auction_house::rpc::{error_code, AuctionRpcClient};
use auction_house::start_rpc_server;
use auction_tests::helpers::*;

async fn serve(test: &TestHouse) -> (HttpClient, jsonrpsee::server::ServerHandle) {
    let (addr, handle) = start_rpc_server("127.0.0.1:0", Arc::clone(&test.house))
        .await
        .unwrap();
    let client = HttpClientBuilder::default()
        .build(format!("http://{addr}"))
        .unwrap();
    (client, handle)
}

#[tokio::test]
async fn read_only_queries_on_idle_token() {
    let test = TestHouse::new(scenario_params());
    let (client, handle) = serve(&test).await;
    let from = from_token().address;

    assert_eq!(client.current_price(from).await.unwrap(), None);
    assert_eq!(client.available_amount(from).await.unwrap(), U256::ZERO);
    assert!(!client.is_kickable(from).await.unwrap());
    assert_eq!(client.amount_needed(from, tokens(1)).await.unwrap(), U256::ZERO);
    assert_eq!(client.round(from).await.unwrap(), None);
    assert_eq!(client.next_step_at(from).await.unwrap(), None);
    assert_eq!(client.enabled_tokens().await.unwrap(), vec![from_token()]);
    assert_eq!(client.params().await.unwrap(), scenario_params());

    handle.stop().unwrap();
}

#[tokio::test]
async fn kick_and_take_over_rpc() {
    let test = TestHouse::new(scenario_params());
    let (client, handle) = serve(&test).await;
    let from = from_token().address;

    client.deposit(addr(1), from, tokens(1_000)).await.unwrap();
    assert_eq!(client.kickable(from).await.unwrap(), tokens(1_000));
    let round = client.kick(addr(1), from).await.unwrap();
    assert_eq!(round.round_id, 1);

    test.clock.set(60);
    assert_eq!(client.current_price(from).await.unwrap(), Some(tokens(990)));
    assert_eq!(client.next_step_at(from).await.unwrap(), Some(120));

    let settlement = client.take(addr(2), from, tokens(100)).await.unwrap();
    assert_eq!(settlement.price, tokens(990));
    assert_eq!(settlement.take_seq, 1);

    let takes = client.takes(from).await.unwrap();
    assert_eq!(takes.len(), 1);
    assert_eq!(takes[0].amount_paid, tokens(99_000));

    handle.stop().unwrap();
}

#[tokio::test]
async fn errors_carry_stable_codes() {
    let test = TestHouse::new(scenario_params());
    let (client, handle) = serve(&test).await;
    let from = from_token().address;

    let err = client.kick(addr(1), from).await.unwrap_err();
    match err {
        jsonrpsee::core::client::Error::Call(obj) => {
            assert_eq!(obj.code(), error_code("NothingToKick"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = client
        .set_parameters(addr(9), ParamsUpdate { update_interval: Some(30), ..ParamsUpdate::default() })
        .await
        .unwrap_err();
    match err {
        jsonrpsee::core::client::Error::Call(obj) => {
            assert_eq!(obj.code(), error_code("Unauthorized"));
        }
        other => panic!("unexpected error: {other}"),
    }

    handle.stop().unwrap();
}

#[tokio::test]
async fn governance_over_rpc() {
    let test = TestHouse::new(scenario_params());
    let (client, handle) = serve(&test).await;

    client.propose_transfer(governor(), addr(0xB0)).await.unwrap();
    let snapshot = client.governance().await.unwrap();
    assert_eq!(snapshot.pending, Some(addr(0xB0)));
    assert_eq!(snapshot.state, GovernanceState::PendingTransfer);
    assert_eq!(client.accept_transfer(addr(0xB0)).await.unwrap(), governor());
    let snapshot = client.governance().await.unwrap();
    assert_eq!(snapshot.governance, addr(0xB0));
    assert_eq!(snapshot.state, GovernanceState::Set);

    client.enable(addr(0xB0), addr(0x55), 6).await.unwrap();
    assert_eq!(client.enabled_tokens().await.unwrap().len(), 2);

    handle.stop().unwrap();
}

#[tokio::test]
async fn batched_reads() {
    let test = TestHouse::kicked(scenario_params(), tokens(10));
    let (client, handle) = serve(&test).await;
    let from = from_token().address;

    let mut batch = BatchRequestBuilder::new();
    batch.insert("auction_isKickable", rpc_params![from]).unwrap();
    batch.insert("auction_availableAmount", rpc_params![from]).unwrap();
    batch.insert("auction_currentPrice", rpc_params![from]).unwrap();

    let response = client.batch_request::<serde_json::Value>(batch).await.unwrap();
    assert_eq!(response.num_successful_calls(), 3);
    let values: Vec<serde_json::Value> = response.into_iter().map(|value| value.unwrap()).collect();
    assert_eq!(values[0], serde_json::Value::Bool(false));
    assert_eq!(values[1], serde_json::to_value(tokens(10)).unwrap());
    assert_eq!(values[2], serde_json::to_value(tokens(1_000)).unwrap());

    handle.stop().unwrap();
}
