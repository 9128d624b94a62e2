use super::{BidderId, GoodId, Market, ObjectiveFunction};
use crate::{Error, Result};

/// The quantity of one good allocated to one bidder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Allocation {
    /// The good supplying the units
    pub good: GoodId,
    /// The bidder receiving the units
    pub bidder: BidderId,
    /// The number of units
    pub quantity: u32,
}

impl Allocation {
    /// Creates an allocation, failing if the quantity is negative
    pub fn new(good: GoodId, bidder: BidderId, quantity: i64) -> Result<Self> {
        let quantity = u32::try_from(quantity).map_err(|_| Error::NegativeAllocation {
            good,
            bidder,
            quantity,
        })?;
        Ok(Self {
            good,
            bidder,
            quantity,
        })
    }
}

/// A dense goods-by-bidders matrix of allocated quantities.
///
/// This is the mutable working representation engines fill in during a run;
/// it is frozen into a [`MarketAllocation`] once the run completes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Vec<i64>>", into = "Vec<Vec<u32>>")
)]
pub struct AllocationMatrix {
    goods: usize,
    bidders: usize,
    data: Vec<u32>,
}

impl AllocationMatrix {
    /// An all-zero matrix of the given shape
    pub fn zeros(goods: usize, bidders: usize) -> Self {
        Self {
            goods,
            bidders,
            data: vec![0; goods * bidders],
        }
    }

    /// An all-zero matrix shaped for the market
    pub fn for_market(market: &Market) -> Self {
        Self::zeros(market.num_goods(), market.num_bidders())
    }

    /// The (goods, bidders) shape of the matrix
    pub fn shape(&self) -> (usize, usize) {
        (self.goods, self.bidders)
    }

    fn offset(&self, good: GoodId, bidder: BidderId) -> usize {
        assert!(
            good.index() < self.goods && bidder.index() < self.bidders,
            "({good}, {bidder}) is out of bounds for a {:?} allocation matrix",
            self.shape()
        );
        good.index() * self.bidders + bidder.index()
    }

    /// The quantity on an edge. Panics if either id is out of bounds.
    pub fn get(&self, good: GoodId, bidder: BidderId) -> u32 {
        self.data[self.offset(good, bidder)]
    }

    /// Overwrite the quantity on an edge. Panics if either id is out of bounds.
    pub fn set(&mut self, good: GoodId, bidder: BidderId, quantity: u32) {
        let offset = self.offset(good, bidder);
        self.data[offset] = quantity;
    }

    /// Increment the quantity on an edge. Panics if either id is out of bounds.
    pub fn add(&mut self, good: GoodId, bidder: BidderId, quantity: u32) {
        let offset = self.offset(good, bidder);
        self.data[offset] += quantity;
    }

    /// Zero out every allocation to the bidder
    pub fn clear_bidder(&mut self, bidder: BidderId) {
        for i in 0..self.goods {
            let offset = self.offset(GoodId::from(i), bidder);
            self.data[offset] = 0;
        }
    }

    /// The units allocated from one good, over all bidders
    pub fn good_total(&self, good: GoodId) -> u64 {
        assert!(good.index() < self.goods, "{good} is out of bounds");
        let start = good.index() * self.bidders;
        self.data[start..start + self.bidders]
            .iter()
            .map(|&x| x as u64)
            .sum()
    }

    /// The units allocated to one bidder, over all goods
    pub fn bidder_total(&self, bidder: BidderId) -> u64 {
        (0..self.goods)
            .map(|i| self.get(GoodId::from(i), bidder) as u64)
            .sum()
    }

    /// Iterate over the edges with positive quantity
    pub fn nonzero(&self) -> impl Iterator<Item = Allocation> + '_ {
        self.data.iter().enumerate().filter_map(|(offset, &quantity)| {
            (quantity > 0).then(|| Allocation {
                good: GoodId::from(offset / self.bidders),
                bidder: BidderId::from(offset % self.bidders),
                quantity,
            })
        })
    }
}

impl TryFrom<Vec<Vec<i64>>> for AllocationMatrix {
    type Error = Error;

    fn try_from(rows: Vec<Vec<i64>>) -> Result<Self> {
        let goods = rows.len();
        let bidders = rows.first().map(Vec::len).unwrap_or(0);
        let mut matrix = Self::zeros(goods, bidders);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != bidders {
                return Err(Error::DimensionMismatch {
                    what: "allocation matrix row",
                    expected: (goods, bidders),
                    found: (goods, row.len()),
                });
            }
            for (j, x) in row.into_iter().enumerate() {
                let edge = Allocation::new(GoodId::from(i), BidderId::from(j), x)?;
                matrix.set(edge.good, edge.bidder, edge.quantity);
            }
        }
        Ok(matrix)
    }
}

impl From<AllocationMatrix> for Vec<Vec<u32>> {
    fn from(value: AllocationMatrix) -> Self {
        if value.bidders == 0 {
            return vec![Vec::new(); value.goods];
        }
        value
            .data
            .chunks(value.bidders)
            .map(|row| row.to_vec())
            .collect()
    }
}

/// An allocation of a market: per-edge quantities bound to the market they
/// were computed for, optionally together with the objective function that
/// monetizes partial fulfillment.
///
/// A `MarketAllocation` is a value object. Its constructor checks that it
/// respects supply, demand and connectivity, so consumers may rely on these
/// invariants.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MarketAllocation<'m> {
    #[cfg_attr(feature = "serde", serde(skip))]
    market: &'m Market,
    allocation: AllocationMatrix,
    objective: Option<ObjectiveFunction>,
}

impl<'m> MarketAllocation<'m> {
    /// Bind a matrix of quantities to a market, validating its shape and that
    /// it is feasible: no good over-allocated, no bidder over-served or given
    /// more of a good than its level allows, and nothing allocated across a
    /// disconnected edge.
    pub fn new(market: &'m Market, allocation: AllocationMatrix) -> Result<Self> {
        let expected = (market.num_goods(), market.num_bidders());
        if allocation.shape() != expected {
            return Err(Error::DimensionMismatch {
                what: "allocation matrix",
                expected,
                found: allocation.shape(),
            });
        }

        for edge in allocation.nonzero() {
            if !market.is_connected(edge.good, edge.bidder) {
                return Err(Error::Disconnected {
                    good: edge.good,
                    bidder: edge.bidder,
                });
            }
            let cap = market.bidders()[edge.bidder.index()].cap(&market.goods()[edge.good.index()]);
            if edge.quantity > cap {
                return Err(Error::OverLevel {
                    good: edge.good,
                    bidder: edge.bidder,
                    allocated: edge.quantity,
                    cap,
                });
            }
        }

        for (good, id) in market.goods().iter().zip(market.good_ids()) {
            let allocated = allocation.good_total(id);
            if allocated > good.supply() as u64 {
                return Err(Error::OverSupply {
                    good: id,
                    allocated,
                    supply: good.supply(),
                });
            }
        }

        for (bidder, id) in market.bidders().iter().zip(market.bidder_ids()) {
            let allocated = allocation.bidder_total(id);
            if allocated > bidder.demand() as u64 {
                return Err(Error::OverDemand {
                    bidder: id,
                    allocated,
                    demand: bidder.demand(),
                });
            }
        }

        Ok(Self {
            market,
            allocation,
            objective: None,
        })
    }

    /// Build an allocation from a list of edges. Repeated edges accumulate.
    pub fn from_allocations(
        market: &'m Market,
        allocations: impl IntoIterator<Item = Allocation>,
    ) -> Result<Self> {
        let mut matrix = AllocationMatrix::for_market(market);
        for Allocation {
            good,
            bidder,
            quantity,
        } in allocations
        {
            let supply = market.good(good)?.supply();
            market.bidder(bidder)?;
            let held = matrix.get(good, bidder);
            // Anything past u32::MAX already exceeds every supply
            let total = held.checked_add(quantity).ok_or(Error::OverSupply {
                good,
                allocated: held as u64 + quantity as u64,
                supply,
            })?;
            matrix.set(good, bidder, total);
        }
        Self::new(market, matrix)
    }

    /// The empty allocation of a market
    pub fn empty(market: &'m Market) -> Self {
        Self {
            market,
            allocation: AllocationMatrix::for_market(market),
            objective: None,
        }
    }

    /// Attach the objective function used to value this allocation
    pub fn with_objective(mut self, objective: ObjectiveFunction) -> Self {
        self.objective = Some(objective);
        self
    }

    /// The market that was allocated
    pub fn market(&self) -> &'m Market {
        self.market
    }

    /// The raw quantities
    pub fn matrix(&self) -> &AllocationMatrix {
        &self.allocation
    }

    /// The objective function, if one was provided
    pub fn objective(&self) -> Option<ObjectiveFunction> {
        self.objective
    }

    /// Iterate over the edges with positive quantity
    pub fn iter(&self) -> impl Iterator<Item = Allocation> + '_ {
        self.allocation.nonzero()
    }

    /// The units of `good` allocated to `bidder`.
    ///
    /// Fails if either id is unknown, or if the pair is not connected.
    pub fn allocation(&self, good: GoodId, bidder: BidderId) -> Result<u32> {
        self.market.good(good)?;
        self.market.bidder(bidder)?;
        if !self.market.is_connected(good, bidder) {
            return Err(Error::Disconnected { good, bidder });
        }
        Ok(self.allocation.get(good, bidder))
    }

    /// The total units allocated to the bidder
    pub fn bundle_size(&self, bidder: BidderId) -> Result<u32> {
        self.market.bidder(bidder)?;
        // Bounded by the bidder's demand, as checked at construction
        Ok(self.allocation.bidder_total(bidder) as u32)
    }

    /// Does the bidder receive nothing at all?
    pub fn is_bidder_bundle_zero(&self, bidder: BidderId) -> Result<bool> {
        Ok(self.bundle_size(bidder)? == 0)
    }

    /// Does the bidder receive its full demand?
    pub fn is_satisfied(&self, bidder: BidderId) -> Result<bool> {
        Ok(self.bundle_size(bidder)? == self.market.bidder(bidder)?.demand())
    }

    /// The total units allocated from the good
    pub fn allocation_from_good(&self, good: GoodId) -> Result<u32> {
        self.market.good(good)?;
        // Bounded by the good's supply, as checked at construction
        Ok(self.allocation.good_total(good) as u32)
    }

    /// The number of bidders receiving a non-empty bundle
    pub fn number_of_winners(&self) -> usize {
        self.market
            .bidder_ids()
            .filter(|&bidder| self.allocation.bidder_total(bidder) > 0)
            .count()
    }

    /// The value a bidder realizes from its bundle, under the objective function
    pub fn marginal_value(&self, bidder: BidderId) -> Result<f64> {
        let objective = self.objective.ok_or(Error::MissingObjective)?;
        let profile = self.market.bidder(bidder)?;
        let bundle = self.bundle_size(bidder)?;
        Ok(objective.marginal(
            profile.reward(),
            profile.demand() as f64,
            0.0,
            bundle as f64,
        ))
    }

    /// The total value realized by all bidders
    pub fn value(&self) -> Result<f64> {
        self.market
            .bidder_ids()
            .map(|bidder| self.marginal_value(bidder))
            .sum()
    }
}
