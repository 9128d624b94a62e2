use crate::{BidderOrder, GoodOrder, state::WorkingState};
use cmkt_core::{
    Result,
    models::{BidderId, GoodId, Market, MarketAllocation, ObjectiveFunction},
    ports::Allocator,
};
use tracing::{Level, event};

/// Configuration of a [`GreedyAllocation`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct GreedySettings {
    /// The order in which bidders are served
    pub bidder_order: BidderOrder,
    /// The order in which a bidder draws on its goods
    pub good_order: GoodOrder,
    /// Stop after this many bidders have been served
    pub max_winners: Option<usize>,
}

/// One-pass, all-or-nothing greedy allocation.
///
/// Bidders with a positive reward net of reserve are ranked by the bidder
/// order. Each in turn is served its full demand from its goods (drawn in the
/// good order, honoring level caps) if enough supply remains, and skipped
/// otherwise. There is no backtracking.
#[derive(Clone, Debug, Default)]
pub struct GreedyAllocation(GreedySettings);

impl GreedyAllocation {
    /// Create an allocator with the given settings
    pub fn new(settings: GreedySettings) -> Self {
        Self(settings)
    }

    /// Reward over the square root of demand, scarcest goods first
    pub fn classic() -> Self {
        Self::default()
    }

    /// Smallest campaigns first, regardless of reward
    pub fn egalitarian() -> Self {
        Self(GreedySettings {
            bidder_order: BidderOrder::InverseSqrtDemand,
            ..Default::default()
        })
    }

    /// Serve only the single highest-reward bidder that can be satisfied
    pub fn max_bidder() -> Self {
        Self(GreedySettings {
            bidder_order: BidderOrder::Reward,
            max_winners: Some(1),
            ..Default::default()
        })
    }

    /// The settings of this allocator
    pub fn settings(&self) -> &GreedySettings {
        &self.0
    }
}

impl Allocator for GreedyAllocation {
    type Outcome<'m> = MarketAllocation<'m>;

    fn solve<'m>(&self, market: &'m Market) -> Result<MarketAllocation<'m>> {
        event!(
            Level::DEBUG,
            goods = market.num_goods(),
            bidders = market.num_bidders(),
            bidder_order = ?self.0.bidder_order,
            good_order = ?self.0.good_order,
        );

        let mut state = WorkingState::new(market);

        let mut candidates = market
            .bidder_ids()
            .filter(|&id| market.has_connections(id) && market.bidders()[id.index()].net_reward() > 0.0)
            .collect::<Vec<_>>();
        self.0.bidder_order.sort(market, &mut candidates);

        let mut winners = 0;
        for bidder in candidates {
            if self.0.max_winners.is_some_and(|max| winners >= max) {
                break;
            }
            if serve(&mut state, bidder, self.0.good_order) {
                winners += 1;
            }
        }

        let allocation = state.finish()?.with_objective(self.objective());
        event!(Level::DEBUG, winners = allocation.number_of_winners());
        Ok(allocation)
    }

    fn objective(&self) -> ObjectiveFunction {
        ObjectiveFunction::SingleStep
    }
}

// Give the bidder its whole remaining demand, or nothing at all
fn serve(state: &mut WorkingState<'_>, bidder: BidderId, order: GoodOrder) -> bool {
    let market = state.market;
    let mut needed = state.demand[bidder.index()];

    let mut goods = market.bidders()[bidder.index()]
        .demand_set()
        .iter()
        .copied()
        .filter(|&good| state.room(good, bidder) > 0)
        .collect::<Vec<GoodId>>();
    let available: u64 = goods
        .iter()
        .map(|&good| state.room(good, bidder) as u64)
        .sum();

    if available < needed as u64 {
        event!(Level::TRACE, %bidder, needed, available, "skipped");
        return false;
    }

    order.sort(market, &state.supply, &mut goods);
    for good in goods {
        if needed == 0 {
            break;
        }
        let take = needed.min(state.room(good, bidder));
        state.assign(good, bidder, take);
        needed -= take;
    }

    event!(Level::TRACE, %bidder, "served");
    true
}
