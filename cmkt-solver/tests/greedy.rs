use approx::assert_abs_diff_eq;
use cmkt_core::{
    Error,
    models::{Bidder, BidderId, Good, GoodId, Market, ObjectiveFunction},
    ports::Allocator,
};
use cmkt_solver::{
    BidderOrder, GoodOrder, GreedyAllocation, GreedySettings, MultiStepGreedyAllocation,
    MultiStepSettings, SingleMindedGreedyAllocation,
};
use rstest::*;

fn g(i: usize) -> GoodId {
    GoodId::from(i)
}

fn b(j: usize) -> BidderId {
    BidderId::from(j)
}

// Four units, three bidders who cannot all be served
#[fixture]
fn contested() -> Market {
    Market::new(
        vec![Good::new(4)],
        vec![
            Bidder::new(4, 10.0, [g(0)]).unwrap(),
            Bidder::new(1, 3.0, [g(0)]).unwrap(),
            Bidder::new(2, 8.0, [g(0)]).unwrap(),
        ],
    )
    .unwrap()
}

#[rstest]
#[case::classic(GreedyAllocation::classic(), [0, 1, 2], 11.0)]
#[case::egalitarian(GreedyAllocation::egalitarian(), [0, 1, 2], 11.0)]
#[case::max_bidder(GreedyAllocation::max_bidder(), [4, 0, 0], 10.0)]
fn presets(
    contested: Market,
    #[case] allocator: GreedyAllocation,
    #[case] bundles: [u32; 3],
    #[case] value: f64,
) {
    let allocation = allocator.allocate(&contested).unwrap();
    for (j, bundle) in bundles.into_iter().enumerate() {
        assert_eq!(allocation.bundle_size(b(j)), Ok(bundle));
    }
    assert_abs_diff_eq!(allocation.value().unwrap(), value);
}

#[rstest]
fn max_winners_caps_the_number_served(contested: Market) {
    let allocator = GreedyAllocation::new(GreedySettings {
        max_winners: Some(1),
        ..Default::default()
    });
    let allocation = allocator.allocate(&contested).unwrap();
    assert_eq!(allocation.number_of_winners(), 1);
    assert_eq!(allocation.bundle_size(b(2)), Ok(2));
}

#[rstest]
#[case::ascending_remaining(GoodOrder::AscendingRemainingSupply, [1, 2])]
#[case::descending_remaining(GoodOrder::DescendingRemainingSupply, [3, 0])]
#[case::ascending_supply(GoodOrder::AscendingSupply, [3, 0])]
#[case::descending_supply(GoodOrder::DescendingSupply, [1, 2])]
#[case::unordered(GoodOrder::Unordered, [3, 0])]
fn good_order_decides_where_units_come_from(
    #[case] good_order: GoodOrder,
    #[case] expected: [u32; 2],
) {
    let market = Market::new(
        vec![Good::new(4), Good::new(5)],
        vec![
            // Served first, leaving remaining supply (4, 2)
            Bidder::new(3, 100.0, [g(1)]).unwrap(),
            Bidder::new(3, 10.0, [g(0), g(1)]).unwrap(),
        ],
    )
    .unwrap();
    let allocator = GreedyAllocation::new(GreedySettings {
        bidder_order: BidderOrder::Reward,
        good_order,
        max_winners: None,
    });
    let allocation = allocator.allocate(&market).unwrap();

    let drawn = [
        allocation.allocation(g(0), b(1)).unwrap(),
        allocation.allocation(g(1), b(1)).unwrap(),
    ];
    assert_eq!(drawn, expected);
}

#[rstest]
fn level_caps_each_good() {
    // Half of each good at most: 2 + 2 units reachable
    let capped = |demand| {
        Market::new(
            vec![Good::new(4), Good::new(4)],
            vec![
                Bidder::new(demand, 10.0, [g(0), g(1)])
                    .unwrap()
                    .with_level(0.5)
                    .unwrap(),
            ],
        )
        .unwrap()
    };

    let market = capped(3);
    let allocation = GreedyAllocation::classic().allocate(&market).unwrap();
    assert_eq!(allocation.allocation(g(0), b(0)), Ok(2));
    assert_eq!(allocation.allocation(g(1), b(0)), Ok(1));

    let market = capped(5);
    let allocation = GreedyAllocation::classic().allocate(&market).unwrap();
    assert_eq!(allocation.number_of_winners(), 0);
}

#[fixture]
fn chunked() -> Market {
    Market::new(
        vec![Good::new(3), Good::new(2)],
        vec![
            Bidder::new(4, 8.0, [g(0), g(1)]).unwrap(),
            Bidder::new(2, 10.0, [g(0), g(1)]).unwrap(),
        ],
    )
    .unwrap()
}

#[rstest]
fn multistep_serves_the_most_valuable_chunk_first(chunked: Market) {
    let allocation = MultiStepGreedyAllocation::default()
        .allocate(&chunked)
        .unwrap();

    assert_eq!(allocation.allocation(g(0), b(1)), Ok(2));
    assert_eq!(allocation.allocation(g(1), b(1)), Ok(0));
    assert_eq!(allocation.allocation(g(0), b(0)), Ok(1));
    assert_eq!(allocation.allocation(g(1), b(0)), Ok(2));
    assert_abs_diff_eq!(allocation.value().unwrap(), 16.0);
}

#[rstest]
fn multistep_chunks_must_fit_in_one_good(chunked: Market) {
    let allocator = MultiStepGreedyAllocation::new(MultiStepSettings {
        step: 2,
        objective: ObjectiveFunction::Identity,
    })
    .unwrap();
    let allocation = allocator.allocate(&chunked).unwrap();

    assert_eq!(allocation.allocation(g(0), b(1)), Ok(2));
    assert_eq!(allocation.allocation(g(1), b(0)), Ok(2));
    assert_eq!(allocation.allocation(g(0), b(0)), Ok(0));
    assert_eq!(allocation.bundle_size(b(0)), Ok(2));
}

#[rstest]
fn multistep_single_step_only_serves_whole_chunks(chunked: Market) {
    // Under an all-or-nothing objective a unit chunk is worthless unless it
    // completes the demand
    let allocator = MultiStepGreedyAllocation::new(MultiStepSettings {
        step: 1,
        objective: ObjectiveFunction::SingleStep,
    })
    .unwrap();
    let allocation = allocator.allocate(&chunked).unwrap();
    assert_eq!(allocation.number_of_winners(), 0);

    let allocator = MultiStepGreedyAllocation::new(MultiStepSettings {
        step: 2,
        objective: ObjectiveFunction::SingleStep,
    })
    .unwrap();
    let allocation = allocator.allocate(&chunked).unwrap();
    assert_eq!(allocation.bundle_size(b(1)), Ok(2));
    assert_eq!(allocation.bundle_size(b(0)), Ok(0));
}

#[test]
fn multistep_rejects_zero_step() {
    let result = MultiStepGreedyAllocation::new(MultiStepSettings {
        step: 0,
        objective: ObjectiveFunction::Identity,
    });
    assert!(matches!(result, Err(Error::InvalidStepSize(0))));
}

// Three unit goods; bidder 1 overlaps both others
#[fixture]
fn single_minded() -> Market {
    Market::new(
        vec![Good::new(1), Good::new(1), Good::new(1)],
        vec![
            Bidder::new(2, 10.0, [g(0), g(1)]).unwrap(),
            Bidder::new(2, 12.0, [g(1), g(2)]).unwrap(),
            Bidder::new(1, 1.0, [g(2)]).unwrap(),
        ],
    )
    .unwrap()
}

#[rstest]
#[case::by_reward(BidderOrder::Reward, [0, 2, 0])]
#[case::by_sqrt_demand(BidderOrder::RewardToSqrtDemand, [0, 2, 0])]
#[case::smallest_first(BidderOrder::InverseSqrtDemand, [2, 0, 1])]
fn single_minded_blocks_overlapping_bidders(
    single_minded: Market,
    #[case] bidder_order: BidderOrder,
    #[case] bundles: [u32; 3],
) {
    let allocator = SingleMindedGreedyAllocation { bidder_order };
    let allocation = allocator.allocate(&single_minded).unwrap();
    for (j, bundle) in bundles.into_iter().enumerate() {
        assert_eq!(allocation.bundle_size(b(j)), Ok(bundle));
    }
}

#[rstest]
fn single_minded_rejects_other_markets(chunked: Market) {
    let result = SingleMindedGreedyAllocation::default().allocate(&chunked);
    assert!(matches!(result, Err(Error::NonUnitSupply { .. })));
}

#[test]
fn single_minded_skips_bidders_capped_out_of_their_goods() {
    let market = Market::new(
        vec![Good::new(1), Good::new(1)],
        vec![
            Bidder::new(1, 20.0, [g(0)]).unwrap().with_level(0.5).unwrap(),
            Bidder::new(1, 5.0, [g(0)]).unwrap(),
        ],
    )
    .unwrap();
    let allocator = SingleMindedGreedyAllocation {
        bidder_order: BidderOrder::Reward,
    };
    let allocation = allocator.allocate(&market).unwrap();
    assert_eq!(allocation.bundle_size(b(0)), Ok(0));
    assert_eq!(allocation.bundle_size(b(1)), Ok(1));
}
