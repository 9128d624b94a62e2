use cmkt_core::{
    Error, Result,
    models::{
        AllocationMatrix, Bidder, BidderId, Good, GoodId, Market, MarketAllocation, MarketOutcome,
        ObjectiveFunction,
    },
    ports::Allocator,
};
use tracing::{Level, event};

/// Configuration of an [`AscendingAuction`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct AscendingAuctionSettings {
    /// The price step ε; must be finite and positive
    pub increment: f64,
    /// Run the auction on unit-supply copies of every good. Markets whose
    /// total supply exceeds [`AscendingAuction::MAX_EXPANDED_UNITS`] are
    /// rejected, since every unit becomes a good of its own.
    pub unit_expansion: bool,
}

impl Default for AscendingAuctionSettings {
    fn default() -> Self {
        Self {
            increment: 0.005,
            unit_expansion: false,
        }
    }
}

/// A simultaneous ascending-price auction.
///
/// Prices start at zero. Unallocated bidders wait in a pool, in index order.
/// The first bidder in the pool whose cheapest bundle (cheapest goods first,
/// every unit costing its price plus ε) meets its demand within its reward is
/// allocated that bundle. Any good it pushes over supply has its price raised
/// by ε, and every other holder of that good loses its entire bundle and
/// rejoins the end of the pool. The auction stops when no pooled bidder can
/// afford a bundle.
#[derive(Clone, Debug)]
pub struct AscendingAuction(AscendingAuctionSettings);

// The most units each bidder may take, per good of the original market, and
// the original good behind each good the auction actually runs on
struct Caps {
    origin: Vec<GoodId>,
    limits: AllocationMatrix,
}

impl Caps {
    fn new(market: &Market, origin: Vec<GoodId>) -> Self {
        let mut limits = AllocationMatrix::for_market(market);
        for (id, bidder) in market.bidder_ids().zip(market.bidders()) {
            for &good in bidder.demand_set() {
                limits.set(good, id, bidder.cap(&market.goods()[good.index()]));
            }
        }
        Self { origin, limits }
    }

    fn direct(market: &Market) -> Self {
        Self::new(market, market.good_ids().collect())
    }
}

impl AscendingAuction {
    /// The largest total supply a unit-expanded auction accepts
    pub const MAX_EXPANDED_UNITS: u64 = 1 << 16;

    /// Create an auction, rejecting a non-finite or non-positive increment
    pub fn new(settings: AscendingAuctionSettings) -> Result<Self> {
        if !(settings.increment.is_finite() && settings.increment > 0.0) {
            return Err(Error::InvalidIncrement(settings.increment));
        }
        Ok(Self(settings))
    }

    /// The settings of this auction
    pub fn settings(&self) -> &AscendingAuctionSettings {
        &self.0
    }

    fn run(&self, market: &Market, caps: &Caps) -> (AllocationMatrix, Vec<f64>) {
        let eps = self.0.increment;
        let mut prices = vec![0.0_f64; market.num_goods()];
        let mut allocation = AllocationMatrix::for_market(market);
        let mut pool = market.bidder_ids().collect::<Vec<_>>();

        loop {
            let mut by_price = market.good_ids().collect::<Vec<_>>();
            by_price.sort_by(|a, b| {
                prices[a.index()]
                    .total_cmp(&prices[b.index()])
                    .then(a.cmp(b))
            });

            let Some((position, bundle)) = pool.iter().enumerate().find_map(|(position, &bidder)| {
                self.cheapest_bundle(market, &prices, &by_price, caps, bidder)
                    .map(|bundle| (position, bundle))
            }) else {
                break;
            };

            let bidder = pool.remove(position);
            for &(good, quantity) in &bundle {
                allocation.set(good, bidder, quantity);
            }
            event!(Level::TRACE, %bidder, goods = bundle.len());

            for &(good, _) in &bundle {
                if allocation.good_total(good) <= market.goods()[good.index()].supply() as u64 {
                    continue;
                }
                prices[good.index()] += eps;
                event!(Level::TRACE, %good, price = prices[good.index()]);
                for &other in market.bidders_of(good) {
                    if other != bidder && allocation.get(good, other) > 0 {
                        allocation.clear_bidder(other);
                        pool.push(other);
                        event!(Level::TRACE, bidder = %other, "displaced");
                    }
                }
            }
        }

        (allocation, prices)
    }

    // The bidder's cheapest bundle if it is complete and affordable. No more
    // than the bidder's cap is taken from the copies of any one original good.
    fn cheapest_bundle(
        &self,
        market: &Market,
        prices: &[f64],
        by_price: &[GoodId],
        caps: &Caps,
        bidder: BidderId,
    ) -> Option<Vec<(GoodId, u32)>> {
        let profile = &market.bidders()[bidder.index()];
        let mut needed = profile.demand();
        let mut cost = 0.0;
        let mut bundle = Vec::new();
        let mut used = vec![0_u32; caps.limits.shape().0];

        for &good in by_price.iter().filter(|&&good| profile.demands_good(good)) {
            if needed == 0 {
                break;
            }
            let origin = caps.origin[good.index()];
            let left = caps.limits.get(origin, bidder) - used[origin.index()];
            let take = needed.min(market.goods()[good.index()].supply()).min(left);
            if take == 0 {
                continue;
            }
            used[origin.index()] += take;
            cost += take as f64 * (prices[good.index()] + self.0.increment);
            bundle.push((good, take));
            needed -= take;
        }

        (needed == 0 && cost <= profile.reward()).then_some(bundle)
    }

    // Run on unit-supply copies of every good, then fold the result back:
    // allocations are summed per good and each good takes the cheapest
    // price among its copies.
    fn run_expanded(&self, market: &Market) -> Result<(AllocationMatrix, Vec<f64>)> {
        let units = market.total_supply();
        if units > Self::MAX_EXPANDED_UNITS {
            return Err(Error::ExpansionTooLarge {
                units,
                limit: Self::MAX_EXPANDED_UNITS,
            });
        }

        let mut origin = Vec::new();
        let mut copies = Vec::with_capacity(market.num_goods());
        let mut goods = Vec::new();
        for (id, good) in market.good_ids().zip(market.goods()) {
            let first = goods.len();
            for _ in 0..good.supply() {
                goods.push(Good::with_reserve(1, good.reserve_price())?);
                origin.push(id);
            }
            copies.push(first..goods.len());
        }

        let bidders = market
            .bidders()
            .iter()
            .map(|bidder| {
                let demand_set = bidder
                    .demand_set()
                    .iter()
                    .flat_map(|good| copies[good.index()].clone())
                    .map(GoodId::from);
                Bidder::new(bidder.demand(), bidder.reward(), demand_set)?
                    .with_reserve(bidder.reserve())
            })
            .collect::<Result<Vec<_>>>()?;

        let expanded = Market::new(goods, bidders)?;
        event!(Level::DEBUG, expanded_goods = expanded.num_goods());
        let caps = Caps::new(market, origin);
        let (unit_allocation, unit_prices) = self.run(&expanded, &caps);

        let mut allocation = AllocationMatrix::for_market(market);
        for edge in unit_allocation.nonzero() {
            allocation.add(caps.origin[edge.good.index()], edge.bidder, edge.quantity);
        }
        let prices = copies
            .into_iter()
            .map(|range| {
                unit_prices[range]
                    .iter()
                    .copied()
                    .reduce(f64::min)
                    .unwrap_or(0.0)
            })
            .collect();

        Ok((allocation, prices))
    }
}

impl Default for AscendingAuction {
    fn default() -> Self {
        Self(AscendingAuctionSettings::default())
    }
}

impl Allocator for AscendingAuction {
    type Outcome<'m> = MarketOutcome<'m>;

    fn solve<'m>(&self, market: &'m Market) -> Result<MarketOutcome<'m>> {
        event!(
            Level::DEBUG,
            goods = market.num_goods(),
            bidders = market.num_bidders(),
            increment = self.0.increment,
            unit_expansion = self.0.unit_expansion,
        );

        let (allocation, prices) = if self.0.unit_expansion {
            self.run_expanded(market)?
        } else {
            self.run(market, &Caps::direct(market))
        };

        let allocation = MarketAllocation::new(market, allocation)?.with_objective(self.objective());
        let outcome = MarketOutcome::new(allocation, prices)?;
        event!(
            Level::DEBUG,
            winners = outcome.allocation().number_of_winners(),
            revenue = outcome.seller_revenue(),
        );
        Ok(outcome)
    }

    fn objective(&self) -> ObjectiveFunction {
        ObjectiveFunction::SingleStep
    }
}
