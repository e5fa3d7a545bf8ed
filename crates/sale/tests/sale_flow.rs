//! Sale Flow Smoke Test
//!
//! Drives the full engine end-to-end over in-memory collaborators:
//! - Round-boundary pricing on the reference schedule
//! - Escrow for unapproved contributors and retroactive settlement
//! - Self-service and administrative refunds
//! - Cap enforcement with no partial acceptance
//! - The raised-total/ledger-sum invariant after every operation
//!
//! Run with: cargo test -p roundsale-sale --test sale_flow -- --nocapture

use parking_lot::Mutex;
use roundsale_sale::{
    CreditIssuer, InMemoryCreditIssuer, InMemoryValueChannel, SaleConfig, SaleEngine, SaleError,
};
use roundsale_types::{val, Address, AttoVal, ATTO_PER_VAL};
use std::sync::Arc;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn addr(label: &str) -> Address {
    Address::from_label(label)
}

/// 0.001 VAL minimum, like the reference deployment's test configuration.
const MIN_CONTRIBUTION: AttoVal = ATTO_PER_VAL / 1_000;

/// Hundredths of a VAL, the granularity the reference schedule uses.
fn centival(n: u128) -> AttoVal {
    n * ATTO_PER_VAL / 100
}

fn reference_config() -> SaleConfig {
    SaleConfig {
        beneficiary: addr("wallet"),
        administrator: addr("admin"),
        round_goals: vec![
            centival(5),
            centival(10),
            centival(15),
            centival(20),
            centival(25),
        ],
        round_rates: vec![12_500, 12_000, 11_500, 11_000, 10_500],
        min_contribution: MIN_CONTRIBUTION,
    }
}

struct Sale {
    engine: SaleEngine,
    issuer: Arc<Mutex<InMemoryCreditIssuer>>,
    channel: Arc<Mutex<InMemoryValueChannel>>,
}

fn new_sale() -> Sale {
    let issuer = Arc::new(Mutex::new(InMemoryCreditIssuer::new(addr("sale"))));
    let channel = Arc::new(Mutex::new(InMemoryValueChannel::new()));
    let engine = SaleEngine::new(
        reference_config(),
        Box::new(issuer.clone()),
        Box::new(channel.clone()),
    )
    .expect("reference config is valid");
    Sale {
        engine,
        issuer,
        channel,
    }
}

fn assert_invariant(sale: &Sale) {
    assert_eq!(
        sale.engine.total_raised(),
        sale.engine.ledger_total(),
        "raised total must equal the ledger sum"
    );
    assert!(sale.engine.total_raised() <= sale.engine.cap());
}

// =============================================================================
// TEST 1: WHITELISTED CONTRIBUTOR WALKS EVERY ROUND TO THE CAP
// =============================================================================

#[test]
fn whitelisted_contributor_walks_every_round() {
    let mut sale = new_sale();
    let investor = addr("investor");

    sale.engine.approve(&addr("admin"), &investor).unwrap();

    // Round 0: 0.01 VAL at 12500.
    sale.engine.purchase(&investor, centival(1)).unwrap();
    let mut expected = centival(1) * 12_500;
    assert_eq!(sale.issuer.lock().balance_of(&investor), expected);

    // Each following 0.05 VAL purchase crosses one boundary: 0.04 in the
    // old round plus 0.01 in the next.
    let crossings = [
        (12_500u128, 12_000u128),
        (12_000, 11_500),
        (11_500, 11_000),
        (11_000, 10_500),
    ];
    for (old_rate, new_rate) in crossings {
        sale.engine.purchase(&investor, centival(5)).unwrap();
        expected += centival(4) * old_rate + centival(1) * new_rate;
        assert_eq!(sale.issuer.lock().balance_of(&investor), expected);
        assert_invariant(&sale);
    }

    // The final 0.04 VAL lands exactly on the cap.
    sale.engine.purchase(&investor, centival(4)).unwrap();
    expected += centival(4) * 10_500;
    assert_eq!(sale.issuer.lock().balance_of(&investor), expected);
    assert_eq!(sale.engine.total_raised(), sale.engine.cap());
    assert_eq!(sale.engine.current_round(), None);

    // Every contribution was forwarded to the beneficiary as it settled.
    assert_eq!(
        sale.channel.lock().forwarded_to(&addr("wallet")),
        sale.engine.cap()
    );

    // Even the smallest further contribution is rejected outright.
    let err = sale.engine.purchase(&investor, MIN_CONTRIBUTION).unwrap_err();
    assert!(matches!(err, SaleError::SaleClosed { .. }));
    assert_invariant(&sale);
}

// =============================================================================
// TEST 2: ESCROW THEN RETROACTIVE SETTLEMENT ON APPROVAL
// =============================================================================

#[test]
fn escrowed_value_settles_exactly_on_approval() {
    let mut sale = new_sale();
    let investor = addr("investor");

    // Purchase before whitelisting: recorded, nothing minted or forwarded.
    sale.engine.purchase(&investor, centival(1)).unwrap();
    let record = sale.engine.contributor_record(&investor);
    assert_eq!(record.total_contributed, centival(1));
    assert!(!record.approved());
    assert_eq!(sale.issuer.lock().balance_of(&investor), 0);
    assert_eq!(sale.channel.lock().forwarded_to(&addr("wallet")), 0);
    assert_invariant(&sale);

    // Approval mints exactly what the escrow earned and forwards exactly
    // the escrowed value. No more, no less.
    sale.engine.approve(&addr("admin"), &investor).unwrap();
    assert_eq!(
        sale.issuer.lock().balance_of(&investor),
        centival(1) * 12_500
    );
    assert_eq!(
        sale.channel.lock().forwarded_to(&addr("wallet")),
        centival(1)
    );
    assert!(sale.engine.contributor_record(&investor).approved());

    // A repeat approval changes nothing.
    sale.engine.approve(&addr("admin"), &investor).unwrap();
    assert_eq!(
        sale.issuer.lock().total_minted(),
        centival(1) * 12_500
    );
    assert_invariant(&sale);
}

// =============================================================================
// TEST 3: ESCROW PRICING IS FIXED AT CONTRIBUTION TIME
// =============================================================================

#[test]
fn escrow_keeps_contribution_time_rates() {
    let mut sale = new_sale();
    let early = addr("early-bird");
    let whale = addr("whale");

    // The early bird contributes in round 0 but stays unapproved while a
    // whale pushes the sale into round 2.
    sale.engine.purchase(&early, centival(2)).unwrap();
    sale.engine.approve(&addr("admin"), &whale).unwrap();
    sale.engine.purchase(&whale, centival(10)).unwrap();
    assert_eq!(sale.engine.current_round(), Some(2));

    // Approval settles the early escrow at round-0 pricing, not today's.
    sale.engine.approve(&addr("admin"), &early).unwrap();
    assert_eq!(sale.issuer.lock().balance_of(&early), centival(2) * 12_500);
    assert_invariant(&sale);
}

// =============================================================================
// TEST 4: REFUNDS, SELF-SERVICE AND ADMINISTRATIVE
// =============================================================================

#[test]
fn refunds_return_escrow_and_zero_the_record() {
    let mut sale = new_sale();
    let investor = addr("investor");
    let other = addr("other");

    sale.engine.purchase(&investor, centival(1)).unwrap();
    sale.engine.purchase(&other, centival(2)).unwrap();

    // Self-service refund returns exactly the escrowed amount.
    let refunded = sale.engine.refund_self(&investor).unwrap();
    assert_eq!(refunded, centival(1));
    assert_eq!(sale.channel.lock().returned_to(&investor), centival(1));
    assert_eq!(
        sale.engine.contributor_record(&investor).total_contributed,
        0
    );
    assert_invariant(&sale);

    // A second refund finds nothing.
    let err = sale.engine.refund_self(&investor).unwrap_err();
    assert!(matches!(err, SaleError::NothingToRefund));

    // Administrative refund works for the administrator only.
    let err = sale.engine.refund_for(&investor, &other).unwrap_err();
    assert!(matches!(err, SaleError::Unauthorized));
    let refunded = sale.engine.refund_for(&addr("admin"), &other).unwrap();
    assert_eq!(refunded, centival(2));
    assert_eq!(sale.engine.total_raised(), 0);
    assert_invariant(&sale);
}

// =============================================================================
// TEST 5: REFUNDED CAPACITY IS RESOLD AT TODAY'S ROUND
// =============================================================================

#[test]
fn refund_reopens_capacity_at_current_pricing() {
    let mut sale = new_sale();
    let quitter = addr("quitter");
    let investor = addr("investor");

    sale.engine.approve(&addr("admin"), &investor).unwrap();

    // Fill round 0 completely, then refund the escrowed half.
    sale.engine.purchase(&quitter, centival(3)).unwrap();
    sale.engine.purchase(&investor, centival(2)).unwrap();
    assert_eq!(sale.engine.current_round(), Some(1));

    sale.engine.refund_self(&quitter).unwrap();
    assert_eq!(sale.engine.total_raised(), centival(2));
    assert_eq!(sale.engine.current_round(), Some(0));

    // The freed capacity prices at round 0 again.
    let outcome = sale.engine.purchase(&investor, centival(3)).unwrap();
    assert_eq!(outcome.units, centival(3) * 12_500);
    assert_invariant(&sale);
}

// =============================================================================
// TEST 6: MINIMUM AND AUTHORIZATION GATES
// =============================================================================

#[test]
fn minimum_and_authorization_gates_hold() {
    let mut sale = new_sale();
    let investor = addr("investor");

    let err = sale
        .engine
        .purchase(&investor, MIN_CONTRIBUTION / 2)
        .unwrap_err();
    assert!(matches!(err, SaleError::BelowMinimum { .. }));
    assert_eq!(sale.engine.total_raised(), 0);

    let err = sale
        .engine
        .approve(&investor, &investor)
        .unwrap_err();
    assert!(matches!(err, SaleError::Unauthorized));

    let err = sale
        .engine
        .transfer_issuer_control(&investor, &investor)
        .unwrap_err();
    assert!(matches!(err, SaleError::Unauthorized));

    // The administrator can hand issuer control over; balances stay put.
    sale.engine.approve(&addr("admin"), &investor).unwrap();
    sale.engine.purchase(&investor, centival(1)).unwrap();
    let balance_before = sale.issuer.lock().balance_of(&investor);
    sale.engine
        .transfer_issuer_control(&addr("admin"), &addr("governance"))
        .unwrap();
    assert_eq!(sale.issuer.lock().controller(), &addr("governance"));
    assert_eq!(sale.issuer.lock().balance_of(&investor), balance_before);
    assert_invariant(&sale);
}
