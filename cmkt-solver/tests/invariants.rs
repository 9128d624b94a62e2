use cmkt_core::{models::Market, ports::Allocator};
use cmkt_solver::GreedyAllocation;
use rstest::*;
use rstest_reuse::{self, *};

use all_allocators::all_allocators;


#[fixture]
fn markets() -> Vec<Market> {
    samples::sample_markets()
}

// No good is over-allocated, no bidder over-served or given more of a good
// than its level allows, and nothing flows across a missing edge.
#[apply(all_allocators)]
fn respects_supply_demand_and_connectivity(allocator: impl Allocator, markets: Vec<Market>) {
    for market in &markets {
        let allocation = allocator.allocate(market).unwrap();

        for (id, good) in market.good_ids().zip(market.goods()) {
            assert!(allocation.allocation_from_good(id).unwrap() <= good.supply());
        }
        for (id, bidder) in market.bidder_ids().zip(market.bidders()) {
            assert!(allocation.bundle_size(id).unwrap() <= bidder.demand());
        }
        for edge in allocation.iter() {
            assert!(market.is_connected(edge.good, edge.bidder));
            let bidder = &market.bidders()[edge.bidder.index()];
            assert!(edge.quantity <= bidder.cap(&market.goods()[edge.good.index()]));
            assert_eq!(allocation.allocation(edge.good, edge.bidder), Ok(edge.quantity));
        }
    }
}

#[apply(all_allocators)]
fn solving_twice_is_identical(allocator: impl Allocator, markets: Vec<Market>) {
    for market in &markets {
        let first = allocator.allocate(market).unwrap();
        let second = allocator.allocate(market).unwrap();
        assert_eq!(first.matrix(), second.matrix());
    }
}

#[apply(all_allocators)]
fn allocations_carry_the_objective(allocator: impl Allocator, markets: Vec<Market>) {
    for market in &markets {
        let allocation = allocator.allocate(market).unwrap();
        assert_eq!(allocation.objective(), Some(allocator.objective()));
        assert!(allocation.value().unwrap() >= 0.0);
    }
}

#[apply(all_allocators)]
fn empty_market(allocator: impl Allocator) {
    let market = Market::new(Vec::new(), Vec::new()).unwrap();
    let allocation = allocator.allocate(&market).unwrap();
    assert_eq!(allocation.number_of_winners(), 0);
    assert_eq!(allocation.iter().count(), 0);
}

#[rstest]
#[case::classic(GreedyAllocation::classic())]
#[case::egalitarian(GreedyAllocation::egalitarian())]
#[case::max_bidder(GreedyAllocation::max_bidder())]
fn greedy_is_all_or_nothing(#[case] allocator: GreedyAllocation, markets: Vec<Market>) {
    for market in &markets {
        let allocation = allocator.allocate(market).unwrap();
        for (id, bidder) in market.bidder_ids().zip(market.bidders()) {
            let bundle = allocation.bundle_size(id).unwrap();
            assert!(bundle == 0 || bundle == bidder.demand());
            if bundle > 0 {
                assert!(bidder.net_reward() > 0.0);
            }
        }
    }
}
