use cmkt_core::{
    Result,
    models::{AllocationMatrix, BidderId, GoodId, Market, MarketAllocation},
};

/// The per-run bookkeeping shared by the one-pass engines: what is left of
/// each good's supply and each bidder's demand, and what has been handed out
/// so far. The market itself is never touched.
pub(crate) struct WorkingState<'m> {
    pub market: &'m Market,
    pub supply: Vec<u32>,
    pub demand: Vec<u32>,
    pub allocation: AllocationMatrix,
}

impl<'m> WorkingState<'m> {
    pub fn new(market: &'m Market) -> Self {
        Self {
            market,
            supply: market.goods().iter().map(|good| good.supply()).collect(),
            demand: market.bidders().iter().map(|bidder| bidder.demand()).collect(),
            allocation: AllocationMatrix::for_market(market),
        }
    }

    /// Move `quantity` units of `good` to `bidder`. The caller guarantees
    /// enough supply and demand remain.
    pub fn assign(&mut self, good: GoodId, bidder: BidderId, quantity: u32) {
        self.supply[good.index()] -= quantity;
        self.demand[bidder.index()] -= quantity;
        self.allocation.add(good, bidder, quantity);
    }

    /// The units of `good` that `bidder` may still take, given its level cap
    pub fn room(&self, good: GoodId, bidder: BidderId) -> u32 {
        let cap = self.market.bidders()[bidder.index()].cap(&self.market.goods()[good.index()]);
        let taken = self.allocation.get(good, bidder);
        self.supply[good.index()].min(cap.saturating_sub(taken))
    }

    /// Freeze the run into a validated allocation
    pub fn finish(self) -> Result<MarketAllocation<'m>> {
        MarketAllocation::new(self.market, self.allocation)
    }
}
