use approx::assert_abs_diff_eq;
use cmkt_core::{
    models::{Bidder, BidderId, Good, GoodId, Market},
    ports::Allocator,
};
use cmkt_solver::{AscendingAuction, AscendingAuctionSettings};
use rstest::*;

fn g(i: usize) -> GoodId {
    GoodId::from(i)
}

fn b(j: usize) -> BidderId {
    BidderId::from(j)
}

fn auction(increment: f64, unit_expansion: bool) -> AscendingAuction {
    AscendingAuction::new(AscendingAuctionSettings {
        increment,
        unit_expansion,
    })
    .unwrap()
}

#[rstest]
#[case::whole_goods(false)]
#[case::unit_expansion(true)]
fn unsold_goods_stay_free(#[case] unit_expansion: bool) {
    // Two goods, but the only bidder needs just the cheaper of the two
    let market = Market::new(
        vec![Good::new(2), Good::new(2)],
        vec![Bidder::new(2, 5.0, [g(0), g(1)]).unwrap()],
    )
    .unwrap();
    let outcome = auction(0.01, unit_expansion).solve(&market).unwrap();

    assert_eq!(outcome.prices(), &[0.0, 0.0]);
    assert_eq!(outcome.allocation().allocation(g(0), b(0)), Ok(2));
    assert_eq!(outcome.market_clearance_violations(), (0, 0.0));
}

#[rstest]
#[case::whole_goods(false)]
#[case::unit_expansion(true)]
fn competition_moves_bidders_to_cheaper_goods(#[case] unit_expansion: bool) {
    // Both bidders start on good 0; once it gets pricier, one of them moves
    let market = Market::new(
        vec![Good::new(1), Good::new(1)],
        vec![
            Bidder::new(1, 5.0, [g(0), g(1)]).unwrap(),
            Bidder::new(1, 5.0, [g(0), g(1)]).unwrap(),
        ],
    )
    .unwrap();
    let outcome = auction(0.01, unit_expansion).solve(&market).unwrap();
    let allocation = outcome.allocation();

    assert_eq!(allocation.number_of_winners(), 2);
    assert_eq!(allocation.allocation_from_good(g(0)), Ok(1));
    assert_eq!(allocation.allocation_from_good(g(1)), Ok(1));
    assert!(outcome.prices().iter().all(|&p| p < 0.05));
    assert!(outcome.envy_bidders(0.05).is_empty());
}

#[test]
fn unit_expansion_prices_goods_at_their_cheapest_copy() {
    // Three units, two bidders wanting two each: only one can be served
    let market = Market::new(
        vec![Good::new(3)],
        vec![
            Bidder::new(2, 4.0, [g(0)]).unwrap(),
            Bidder::new(2, 3.0, [g(0)]).unwrap(),
        ],
    )
    .unwrap();
    let eps = 0.01;
    let outcome = auction(eps, true).solve(&market).unwrap();
    let allocation = outcome.allocation();

    assert_eq!(allocation.bundle_size(b(0)), Ok(2));
    assert_eq!(allocation.is_bidder_bundle_zero(b(1)), Ok(true));
    // Copies climb together until bidder 1 cannot pay for two of them
    let price = outcome.price(g(0)).unwrap();
    assert!(price > 1.0);
    assert!(price < 2.0);
    // The revenue is computed at the single per-good price
    assert_abs_diff_eq!(outcome.seller_revenue(), 2.0 * price);
}

#[test]
fn prices_never_exceed_what_some_bidder_could_pay() {
    let market = Market::new(
        vec![Good::new(2), Good::new(1)],
        vec![
            Bidder::new(2, 3.0, [g(0), g(1)]).unwrap(),
            Bidder::new(1, 2.0, [g(0)]).unwrap(),
            Bidder::new(2, 9.0, [g(0)]).unwrap(),
        ],
    )
    .unwrap();
    let eps = 0.005;
    let outcome = auction(eps, false).solve(&market).unwrap();
    let allocation = outcome.allocation();

    for (good, price) in market.good_ids().zip(outcome.prices()) {
        let best = market
            .bidders_of(good)
            .iter()
            .map(|&bidder| market.bidders()[bidder.index()].reward())
            .fold(0.0, f64::max);
        assert!(*price >= 0.0);
        assert!(*price <= best + eps);
    }
    for (bidder, spec) in market.bidder_ids().zip(market.bidders()) {
        let bundle = allocation.bundle_size(bidder).unwrap();
        assert!(bundle == 0 || bundle == spec.demand());
        if bundle > 0 {
            assert!(outcome.bundle_cost(bidder).unwrap() <= spec.reward());
        }
    }
}
