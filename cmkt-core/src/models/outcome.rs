use super::{BidderId, GoodId, MarketAllocation};
use crate::{Error, Result};

/// An allocation together with a price per good.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MarketOutcome<'m> {
    allocation: MarketAllocation<'m>,
    prices: Vec<f64>,
}

impl<'m> MarketOutcome<'m> {
    /// Pair an allocation with one price per good of its market
    pub fn new(allocation: MarketAllocation<'m>, prices: Vec<f64>) -> Result<Self> {
        let goods = allocation.market().num_goods();
        if prices.len() != goods {
            return Err(Error::DimensionMismatch {
                what: "price vector",
                expected: (goods, 1),
                found: (prices.len(), 1),
            });
        }
        Ok(Self { allocation, prices })
    }

    /// The underlying allocation
    pub fn allocation(&self) -> &MarketAllocation<'m> {
        &self.allocation
    }

    /// All prices, indexed by `GoodId`
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// The price of one good
    pub fn price(&self, good: GoodId) -> Result<f64> {
        self.prices
            .get(good.index())
            .copied()
            .ok_or(Error::UnknownGood(good))
    }

    /// What the bidder pays for its bundle: `Σ price × quantity`
    pub fn bundle_cost(&self, bidder: BidderId) -> Result<f64> {
        self.allocation.market().bidder(bidder)?;
        let matrix = self.allocation.matrix();
        Ok(self
            .allocation
            .market()
            .good_ids()
            .map(|good| matrix.get(good, bidder) as f64 * self.prices[good.index()])
            .sum())
    }

    /// The revenue the seller collects from one bidder
    pub fn seller_revenue_from_bidder(&self, bidder: BidderId) -> Result<f64> {
        self.bundle_cost(bidder)
    }

    /// The revenue the seller collects over all bidders
    pub fn seller_revenue(&self) -> f64 {
        self.allocation
            .iter()
            .map(|edge| edge.quantity as f64 * self.prices[edge.good.index()])
            .sum()
    }

    /// The bidders that would rather buy a different bundle at these prices.
    ///
    /// For each bidder the cheapest bundle meeting its demand is assembled
    /// from its demand set, cheapest goods first. A bidder that cannot be
    /// satisfied at all is envy-free. A satisfied bidder is envious when its
    /// bundle costs more than `eps` above the cheapest bundle; an unsatisfied
    /// one when its reward exceeds the cheapest bundle by more than `eps`.
    pub fn envy_bidders(&self, eps: f64) -> Vec<BidderId> {
        let market = self.allocation.market();
        let mut by_price: Vec<GoodId> = market.good_ids().collect();
        by_price.sort_by(|a, b| {
            self.prices[a.index()]
                .total_cmp(&self.prices[b.index()])
                .then(a.cmp(b))
        });

        market
            .bidder_ids()
            .zip(market.bidders())
            .filter(|&(id, bidder)| {
                let mut needed = bidder.demand();
                let mut cheapest = 0.0;
                for &good in by_price.iter().filter(|&&good| bidder.demands_good(good)) {
                    if needed == 0 {
                        break;
                    }
                    let take = needed.min(market.goods()[good.index()].supply());
                    cheapest += take as f64 * self.prices[good.index()];
                    needed -= take;
                }
                if needed > 0 {
                    return false;
                }

                let bundle = self.allocation.matrix().bidder_total(id);
                let surplus = if bundle >= bidder.demand() as u64 {
                    self.bundle_cost(id).unwrap_or_default() - cheapest
                } else {
                    bidder.reward() - cheapest
                };
                surplus > eps
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Market clearance requires unsold goods to be free. Returns the number
    /// of goods with no units sold and a positive price, and the share of the
    /// total price those goods account for (zero when all prices are zero).
    pub fn market_clearance_violations(&self) -> (usize, f64) {
        let matrix = self.allocation.matrix();
        let mut violations = 0;
        let mut total = 0.0;
        let mut violating = 0.0;
        for (good, &price) in self.allocation.market().good_ids().zip(&self.prices) {
            total += price;
            if matrix.good_total(good) == 0 && price > 0.0 {
                violations += 1;
                violating += price;
            }
        }
        let ratio = if total == 0.0 { 0.0 } else { violating / total };
        (violations, ratio)
    }
}

impl<'m> From<MarketOutcome<'m>> for MarketAllocation<'m> {
    fn from(value: MarketOutcome<'m>) -> Self {
        value.allocation
    }
}

/// An allocation together with a price per (good, bidder) edge, as produced
/// by waterfall clearing.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WaterfallPrices<'m> {
    allocation: MarketAllocation<'m>,
    prices: Vec<Vec<f64>>,
}

impl<'m> WaterfallPrices<'m> {
    /// Pair an allocation with a goods-by-bidders price matrix
    pub fn new(allocation: MarketAllocation<'m>, prices: Vec<Vec<f64>>) -> Result<Self> {
        let expected = (
            allocation.market().num_goods(),
            allocation.market().num_bidders(),
        );
        if let Some(row) = prices.iter().find(|row| row.len() != expected.1) {
            return Err(Error::DimensionMismatch {
                what: "price matrix",
                expected,
                found: (prices.len(), row.len()),
            });
        }
        if prices.len() != expected.0 {
            return Err(Error::DimensionMismatch {
                what: "price matrix",
                expected,
                found: (prices.len(), expected.1),
            });
        }
        Ok(Self { allocation, prices })
    }

    /// The underlying allocation
    pub fn allocation(&self) -> &MarketAllocation<'m> {
        &self.allocation
    }

    /// The price charged on one edge
    pub fn price(&self, good: GoodId, bidder: BidderId) -> Result<f64> {
        let market = self.allocation.market();
        market.good(good)?;
        market.bidder(bidder)?;
        Ok(self.prices[good.index()][bidder.index()])
    }

    /// `Σ price × quantity` over all edges
    pub fn seller_revenue(&self) -> f64 {
        self.allocation
            .iter()
            .map(|edge| edge.quantity as f64 * self.prices[edge.good.index()][edge.bidder.index()])
            .sum()
    }

    /// The total violation of the compact condition.
    ///
    /// Whenever bidder `j` holds units of good `i`, every good `k` connected
    /// to `j` that `j` has not exhausted should be priced no lower for `j`.
    /// Each shortfall `p[i][j] − p[k][j]` adds to the total.
    pub fn violations(&self) -> f64 {
        let market = self.allocation.market();
        let matrix = self.allocation.matrix();
        let mut error = 0.0;
        for edge in self.allocation.iter() {
            let j = edge.bidder;
            let paid = self.prices[edge.good.index()][j.index()];
            for &k in market.bidders()[j.index()].demand_set() {
                if matrix.get(k, j) < market.goods()[k.index()].supply() {
                    let other = self.prices[k.index()][j.index()];
                    if paid > other {
                        error += paid - other;
                    }
                }
            }
        }
        error
    }
}

impl<'m> From<WaterfallPrices<'m>> for MarketAllocation<'m> {
    fn from(value: WaterfallPrices<'m>) -> Self {
        value.allocation
    }
}
