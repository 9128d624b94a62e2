use crate::state::WorkingState;
use cmkt_core::{
    Result,
    models::{BidderId, GoodId, Market, ObjectiveFunction, WaterfallPrices},
    ports::Allocator,
};
use tracing::{Level, event};

/// Which cleared good a waterfall round settles when several goods have a
/// winning bidder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TieBreak {
    /// The good with the lowest second-highest bid (favors buyers)
    #[default]
    Min,
    /// The good with the highest second-highest bid (favors the seller)
    Max,
}

/// Configuration of a [`Waterfall`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct WaterfallSettings {
    /// How a round picks among the goods it could clear
    pub tie_break: TieBreak,
    /// A per-unit reserve applied to every bidder on top of its own
    pub reserve: f64,
}

/// Sequential second-price clearing.
///
/// Each round, every bidder that can still reach enough supply (within its
/// level cap) to cover its remaining demand bids `budget / demand` per unit on every good it is
/// connected to, next to the good's reserve price. A good is won by its
/// highest bidder at the second-highest bid. The round settles one good
/// (chosen by the tie-break on that second price), allocating as much as the
/// winner needs or may still take from the good, and charging the winner's
/// budget.
/// Rounds repeat until no bidder is feasible or no good can be cleared.
///
/// Prices are recorded per (good, bidder) edge.
#[derive(Clone, Debug, Default)]
pub struct Waterfall(WaterfallSettings);

impl Waterfall {
    /// Create a waterfall with the given settings
    pub fn new(settings: WaterfallSettings) -> Self {
        Self(settings)
    }

    /// The settings of this waterfall
    pub fn settings(&self) -> &WaterfallSettings {
        &self.0
    }

    // Is the second price `a` preferred over the second price `b`?
    fn prefers(&self, a: f64, b: f64) -> bool {
        match self.0.tie_break {
            TieBreak::Min => a < b,
            TieBreak::Max => a > b,
        }
    }
}

// The outcome of the bidding on one good in one round
struct Clearing {
    good: GoodId,
    bidder: BidderId,
    bid: f64,
    price: f64,
}

impl Allocator for Waterfall {
    type Outcome<'m> = WaterfallPrices<'m>;

    fn solve<'m>(&self, market: &'m Market) -> Result<WaterfallPrices<'m>> {
        event!(
            Level::DEBUG,
            goods = market.num_goods(),
            bidders = market.num_bidders(),
            tie_break = ?self.0.tie_break,
            reserve = self.0.reserve,
        );

        let mut state = WorkingState::new(market);
        let mut budget = market
            .bidders()
            .iter()
            .map(|bidder| bidder.reward())
            .collect::<Vec<_>>();
        let mut prices = vec![vec![0.0; market.num_bidders()]; market.num_goods()];

        let mut active = market
            .bidder_ids()
            .filter(|&id| {
                let bidder = &market.bidders()[id.index()];
                let reserve = bidder.reserve().max(self.0.reserve);
                market.has_connections(id)
                    && market
                        .reachable_supply(id)
                        .is_ok_and(|units| units >= bidder.demand() as u64)
                    && bidder.reward() - bidder.demand() as f64 * reserve > 0.0
            })
            .collect::<Vec<_>>();

        loop {
            // Room only shrinks, so a bidder that cannot be covered now never can be
            active.retain(|&bidder| {
                let reachable: u64 = market.bidders()[bidder.index()]
                    .demand_set()
                    .iter()
                    .map(|&good| state.room(good, bidder) as u64)
                    .sum();
                reachable >= state.demand[bidder.index()] as u64
            });
            if active.is_empty() {
                break;
            }

            let mut best: Option<Clearing> = None;
            for good in market.good_ids() {
                if state.supply[good.index()] == 0 {
                    continue;
                }
                let Some(clearing) = self.bid(&state, &budget, &active, good) else {
                    continue;
                };
                if best
                    .as_ref()
                    .is_none_or(|best| self.prefers(clearing.price, best.price))
                {
                    best = Some(clearing);
                }
            }

            let Some(Clearing {
                good,
                bidder,
                bid,
                price,
            }) = best
            else {
                break;
            };

            let quantity = state.demand[bidder.index()].min(state.room(good, bidder));
            state.assign(good, bidder, quantity);
            budget[bidder.index()] = (budget[bidder.index()] - price * quantity as f64).max(0.0);
            prices[good.index()][bidder.index()] = price;
            event!(Level::TRACE, %good, %bidder, quantity, bid, price);

            if state.demand[bidder.index()] == 0 {
                active.retain(|&other| other != bidder);
            }
        }

        let allocation = state.finish()?.with_objective(self.objective());
        let outcome = WaterfallPrices::new(allocation, prices)?;
        event!(
            Level::DEBUG,
            winners = outcome.allocation().number_of_winners(),
            revenue = outcome.seller_revenue(),
        );
        Ok(outcome)
    }

    fn objective(&self) -> ObjectiveFunction {
        ObjectiveFunction::Identity
    }
}

impl Waterfall {
    // Collect the bids on one good. Bidder bids rank ahead of the reserve
    // floor on ties, and lower bidder indices ahead of higher ones. The good
    // cannot be cleared when no bidder beats its floor.
    fn bid(
        &self,
        state: &WorkingState<'_>,
        budget: &[f64],
        active: &[BidderId],
        good: GoodId,
    ) -> Option<Clearing> {
        let floor = (state.market.goods()[good.index()].reserve_price(), None);
        let mut bids = active
            .iter()
            .filter(|&&bidder| {
                state.market.is_connected(good, bidder) && state.room(good, bidder) > 0
            })
            .map(|&bidder| {
                (
                    budget[bidder.index()] / state.demand[bidder.index()] as f64,
                    Some(bidder),
                )
            })
            .chain(std::iter::once(floor))
            .collect::<Vec<(f64, Option<BidderId>)>>();
        if bids.len() < 2 {
            return None;
        }

        bids.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then(a.1.is_none().cmp(&b.1.is_none()))
                .then(a.1.cmp(&b.1))
        });

        let (bid, Some(bidder)) = bids[0] else {
            return None;
        };
        Some(Clearing {
            good,
            bidder,
            bid,
            price: bids[1].0,
        })
    }
}
