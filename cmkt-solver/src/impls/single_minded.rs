use crate::BidderOrder;
use cmkt_core::{
    Result,
    models::{AllocationMatrix, Market, MarketAllocation, ObjectiveFunction, SingleMindedMarket},
    ports::Allocator,
};
use tracing::{Level, event};

/// Greedy allocation for single-minded markets, where every good is in unit
/// supply and every bidder wants exactly its demand set.
///
/// Bidders are visited in the bidder order, skipping any whose level forbids
/// taking its whole demand set. An unblocked bidder receives its
/// whole demand set, and every other bidder that shares one of those goods is
/// blocked. Markets that are not single-minded are rejected.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SingleMindedGreedyAllocation {
    /// The order in which bidders are served
    pub bidder_order: BidderOrder,
}

impl Allocator for SingleMindedGreedyAllocation {
    type Outcome<'m> = MarketAllocation<'m>;

    fn solve<'m>(&self, market: &'m Market) -> Result<MarketAllocation<'m>> {
        let market = SingleMindedMarket::new(market)?.market();
        event!(
            Level::DEBUG,
            goods = market.num_goods(),
            bidders = market.num_bidders(),
            bidder_order = ?self.bidder_order,
        );

        let mut candidates = market
            .bidder_ids()
            .filter(|&id| {
                let bidder = &market.bidders()[id.index()];
                // A level below one caps every unit good at zero
                bidder.net_reward() > 0.0
                    && market
                        .reachable_supply(id)
                        .is_ok_and(|units| units >= bidder.demand() as u64)
            })
            .collect::<Vec<_>>();
        self.bidder_order.sort(market, &mut candidates);

        let mut blocked = vec![false; market.num_bidders()];
        let mut allocation = AllocationMatrix::for_market(market);
        for bidder in candidates {
            if blocked[bidder.index()] {
                event!(Level::TRACE, %bidder, "blocked");
                continue;
            }
            for &good in market.bidders()[bidder.index()].demand_set() {
                allocation.set(good, bidder, 1);
                for &other in market.bidders_of(good) {
                    blocked[other.index()] = true;
                }
            }
            event!(Level::TRACE, %bidder, "served");
        }

        let allocation = MarketAllocation::new(market, allocation)?.with_objective(self.objective());
        event!(Level::DEBUG, winners = allocation.number_of_winners());
        Ok(allocation)
    }

    fn objective(&self) -> ObjectiveFunction {
        ObjectiveFunction::SingleStep
    }
}
