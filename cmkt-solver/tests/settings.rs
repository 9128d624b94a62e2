use cmkt_core::{Error, models::ObjectiveFunction};
use cmkt_solver::{
    AscendingAuction, AscendingAuctionSettings, BidderOrder, GoodOrder, GreedySettings,
    MultiStepGreedyAllocation, MultiStepSettings, SingleMindedGreedyAllocation, TieBreak,
    WaterfallSettings,
};
use rstest::*;

#[test]
fn missing_fields_take_defaults() {
    let greedy: GreedySettings = serde_json::from_str(r#"{"max_winners": 2}"#).unwrap();
    assert_eq!(
        greedy,
        GreedySettings {
            bidder_order: BidderOrder::RewardToSqrtDemand,
            good_order: GoodOrder::AscendingRemainingSupply,
            max_winners: Some(2),
        }
    );

    let auction: AscendingAuctionSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(auction, AscendingAuctionSettings::default());
    assert_eq!(auction.increment, 0.005);

    let multistep: MultiStepSettings = serde_json::from_str(r#"{"step": 3}"#).unwrap();
    assert_eq!(multistep.objective, ObjectiveFunction::Identity);
}

#[test]
fn enums_are_snake_case() {
    let waterfall: WaterfallSettings =
        serde_json::from_str(r#"{"tie_break": "max", "reserve": 0.25}"#).unwrap();
    assert_eq!(waterfall.tie_break, TieBreak::Max);
    assert_eq!(waterfall.reserve, 0.25);

    let allocator: SingleMindedGreedyAllocation =
        serde_json::from_str(r#"{"bidder_order": "inverse_sqrt_demand"}"#).unwrap();
    assert_eq!(allocator.bidder_order, BidderOrder::InverseSqrtDemand);

    let json = serde_json::to_value(GreedySettings {
        bidder_order: BidderOrder::RewardToDemand,
        good_order: GoodOrder::DescendingSupply,
        max_winners: None,
    })
    .unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "bidder_order": "reward_to_demand",
            "good_order": "descending_supply",
            "max_winners": null,
        })
    );
}

// Deserialization accepts any value; the allocators validate on construction
#[rstest]
fn invalid_settings_are_caught_by_constructors() {
    let multistep: MultiStepSettings =
        serde_json::from_str(r#"{"step": 0, "objective": "concave"}"#).unwrap();
    assert!(matches!(
        MultiStepGreedyAllocation::new(multistep),
        Err(Error::InvalidStepSize(0))
    ));

    let auction: AscendingAuctionSettings =
        serde_json::from_str(r#"{"increment": -1.0, "unit_expansion": true}"#).unwrap();
    assert!(matches!(
        AscendingAuction::new(auction),
        Err(Error::InvalidIncrement(_))
    ));
}
