//! Concrete end-to-end scenarios against the auction house.

use auction_core::constants::WAD;
use auction_core::error::{AuctionError, GovernanceError, PricingError, RoundError};
use auction_core::types::{AuctionEvent, RoundStatus, TokenSpec};
use auction_core::U256;
use auction_house::AuctionHouse;
use auction_tests::helpers::*;

fn price(house: &AuctionHouse) -> Option<U256> {
    house.current_price(from_token().address).unwrap()
}

// ======================================================================
// Pricing schedule
// ======================================================================

#[test]
fn one_percent_decay_schedule() {
    let test = TestHouse::kicked(scenario_params(), tokens(1_000));

    test.clock.set(0);
    assert_eq!(price(&test.house), Some(tokens(1_000)));

    test.clock.set(60);
    assert_eq!(price(&test.house), Some(tokens(990)));

    test.clock.set(119);
    assert_eq!(price(&test.house), Some(tokens(990)));

    test.clock.set(120);
    // 1000 * 0.99^2 = 980.1
    assert_eq!(price(&test.house), Some(U256::from(9_801u64) * WAD / U256::from(10u64)));
}

#[test]
fn take_at_first_step_records_price() {
    let test = TestHouse::kicked(scenario_params(), tokens(1_000));
    let from = from_token().address;
    let taker = addr(0x7A);

    test.clock.set(60);
    let settlement = test.house.take(taker, from, tokens(100)).unwrap();
    assert_eq!(settlement.take_seq, 1);
    assert_eq!(settlement.amount_taken, tokens(100));
    assert_eq!(settlement.price, tokens(990));
    assert_eq!(settlement.amount_paid, tokens(99_000));

    assert_eq!(test.house.available_amount(from), tokens(900));
    let takes = test.house.takes(from);
    assert_eq!(takes.len(), 1);
    assert_eq!(takes[0].price_at_take, tokens(990));
    assert_eq!(takes[0].taker, taker);
    assert_eq!(takes[0].timestamp, 60);
}

#[test]
fn price_expires_at_auction_length() {
    let test = TestHouse::kicked(scenario_params(), tokens(10));
    let from = from_token().address;

    test.clock.set(3_599);
    assert!(price(&test.house).is_some());

    test.clock.set(3_600);
    assert_eq!(price(&test.house), None);
    assert_eq!(
        test.house.take(addr(2), from, tokens(1)),
        Err(AuctionError::Pricing(PricingError::PriceExpired {
            elapsed: 3_600,
            auction_length: 3_600,
        }))
    );
    let view = test.house.round(from).unwrap().unwrap();
    assert_eq!(view.status, RoundStatus::Expired);
    assert_eq!(view.current_price, None);
}

#[test]
fn flat_auction_never_decays() {
    let params = auction_core::types::AuctionParams { decay_rate: U256::ZERO, ..scenario_params() };
    let test = TestHouse::kicked(params, tokens(10));
    for t in [0, 60, 61, 1_800, 3_599] {
        test.clock.set(t);
        assert_eq!(price(&test.house), Some(tokens(1_000)));
    }
}

#[test]
fn full_decay_reaches_zero_after_first_step() {
    let params = auction_core::types::AuctionParams {
        decay_rate: auction_core::constants::RAY,
        ..scenario_params()
    };
    let test = TestHouse::kicked(params, tokens(10));
    test.clock.set(59);
    assert_eq!(price(&test.house), Some(tokens(1_000)));
    test.clock.set(60);
    assert_eq!(price(&test.house), Some(U256::ZERO));

    // A zero price is still a price: the take succeeds and pays nothing.
    let settlement = test.house.take(addr(2), from_token().address, tokens(1)).unwrap();
    assert_eq!(settlement.amount_paid, U256::ZERO);
}

// ======================================================================
// Round lifecycle
// ======================================================================

#[test]
fn exhausting_a_round_allows_the_next_kick() {
    let test = TestHouse::kicked(scenario_params(), tokens(50));
    let from = from_token().address;

    test.clock.set(10);
    let settlement = test.house.take(addr(2), from, tokens(80)).unwrap();
    assert_eq!(settlement.amount_taken, tokens(50));
    assert_eq!(test.house.round(from).unwrap().unwrap().status, RoundStatus::Exhausted);
    assert_eq!(
        test.house.take(addr(2), from, tokens(1)),
        Err(AuctionError::Round(RoundError::NoActiveRound(from)))
    );
    assert!(!test.house.is_kickable(from));
    assert!(matches!(
        test.house.kick(addr(1), from),
        Err(AuctionError::Round(RoundError::NothingToKick(_)))
    ));

    test.house.deposit(addr(1), from, tokens(5)).unwrap();
    assert!(test.house.is_kickable(from));
    let round = test.house.kick(addr(1), from).unwrap();
    assert_eq!(round.round_id, 2);
    assert_eq!(round.kicked_at, 10);
    assert_eq!(round.initial_available, tokens(5));
}

#[test]
fn active_round_rejects_second_kick() {
    let test = TestHouse::kicked(scenario_params(), tokens(50));
    let from = from_token().address;
    test.house.deposit(addr(1), from, tokens(5)).unwrap();
    test.clock.set(1_000);
    assert_eq!(
        test.house.kick(addr(1), from),
        Err(AuctionError::Round(RoundError::NothingToKick(from)))
    );
    assert_eq!(test.house.kickable(from), U256::ZERO);
}

#[test]
fn independent_from_tokens() {
    let second = TokenSpec { address: addr(0xF1), decimals: 6 };
    let test = TestHouse::with_tokens(scenario_params(), want_token(), &[from_token(), second]);
    let house = &test.house;

    house.deposit(addr(1), from_token().address, tokens(10)).unwrap();
    house.deposit(addr(1), second.address, U256::from(5_000_000u64)).unwrap();
    house.kick(addr(1), from_token().address).unwrap();
    test.clock.set(120);
    house.kick(addr(1), second.address).unwrap();

    test.clock.set(180);
    assert_eq!(house.current_price(second.address).unwrap(), Some(tokens(990)));
    assert_eq!(
        house.current_price(from_token().address).unwrap(),
        Some(U256::from(970_299u64) * WAD / U256::from(1_000u64))
    );
}

#[test]
fn decimals_are_reconciled_in_payment() {
    // From token with 6 decimals, want token with 18.
    let from = TokenSpec { address: addr(0xF6), decimals: 6 };
    let test = TestHouse::with_tokens(scenario_params(), want_token(), &[from]);
    test.house.deposit(addr(1), from.address, U256::from(2_000_000u64)).unwrap();
    test.house.kick(addr(1), from.address).unwrap();

    // 1.5 from tokens at 1000 want each = 1500 want tokens.
    let settlement = test.house.take(addr(2), from.address, U256::from(1_500_000u64)).unwrap();
    assert_eq!(settlement.amount_paid, tokens(1_500));
    assert_eq!(
        test.house.amount_needed(from.address, U256::from(1u64)).unwrap(),
        U256::from(1_000u64) * U256::from(10u64).pow(U256::from(12u64))
    );
}

#[test]
fn payment_rounds_up() {
    // Want token with 6 decimals: one from base unit at 990 is worth
    // 990e6 / 1e18 want base units, which must round up to 1.
    let want = TokenSpec { address: addr(0xE6), decimals: 6 };
    let test = TestHouse::with_tokens(scenario_params(), want, &[from_token()]);
    let from = from_token().address;
    test.house.deposit(addr(1), from, tokens(1)).unwrap();
    test.house.kick(addr(1), from).unwrap();
    test.clock.set(60);
    let settlement = test.house.take(addr(2), from, U256::from(1u64)).unwrap();
    assert_eq!(settlement.amount_paid, U256::from(1u64));
}

// ======================================================================
// Governance handoff
// ======================================================================

#[test]
fn two_step_governance_transfer() {
    let test = TestHouse::new(scenario_params());
    let house = &test.house;
    let (a, b, c) = (governor(), addr(0xB0), addr(0xC0));

    house.propose_transfer(a, b).unwrap();
    assert_eq!(
        house.accept_transfer(c),
        Err(AuctionError::Governance(GovernanceError::Unauthorized { caller: c }))
    );
    assert_eq!(house.accept_transfer(b).unwrap(), a);
    assert_eq!(house.governance(), b);
    assert_eq!(
        house.propose_transfer(a, c),
        Err(AuctionError::Governance(GovernanceError::Unauthorized { caller: a }))
    );
}

#[test]
fn events_describe_history() {
    let test = TestHouse::new(scenario_params());
    let mut rx = test.house.subscribe();
    let from = from_token().address;

    test.house.deposit(addr(1), from, tokens(10)).unwrap();
    test.house.kick(addr(1), from).unwrap();
    test.clock.set(60);
    test.house.take(addr(2), from, tokens(4)).unwrap();
    test.house.take(addr(3), from, tokens(4)).unwrap();

    let events: Vec<AuctionEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    let taken: Vec<(u64, u64, U256)> = events
        .iter()
        .filter_map(|event| match event {
            AuctionEvent::Taken { round_id, take_seq, amount_taken, .. } => {
                Some((*round_id, *take_seq, *amount_taken))
            }
            _ => None,
        })
        .collect();
    assert_eq!(taken, vec![(1, 1, tokens(4)), (1, 2, tokens(4))]);
    assert!(matches!(
        events[1],
        AuctionEvent::Kicked { round_id: 1, timestamp: 0, .. }
    ));
}
