use super::{Bidder, BidderId, Good, GoodId};
use crate::{Error, Result};

/// A market is a bipartite graph of goods and bidders, where a bidder is
/// connected to every good in its demand set.
///
/// Markets are immutable once constructed, which allows any number of
/// allocation engines to run against the same instance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "MarketDto", into = "MarketDto")
)]
pub struct Market {
    goods: Vec<Good>,
    bidders: Vec<Bidder>,
    // For each good, the bidders connected to it (in bidder order)
    adjacency: Vec<Vec<BidderId>>,
}

impl Market {
    /// Creates a market, validating that every demand set only refers to
    /// goods of this market.
    pub fn new(goods: Vec<Good>, bidders: Vec<Bidder>) -> Result<Self> {
        let mut adjacency = vec![Vec::new(); goods.len()];
        for (j, bidder) in bidders.iter().enumerate() {
            for &good in bidder.demand_set() {
                adjacency
                    .get_mut(good.index())
                    .ok_or(Error::UnknownGood(good))?
                    .push(BidderId::from(j));
            }
        }
        Ok(Self {
            goods,
            bidders,
            adjacency,
        })
    }

    /// The goods of this market, indexed by `GoodId`
    pub fn goods(&self) -> &[Good] {
        &self.goods
    }

    /// The bidders of this market, indexed by `BidderId`
    pub fn bidders(&self) -> &[Bidder] {
        &self.bidders
    }

    /// Look up a good by id
    pub fn good(&self, id: GoodId) -> Result<&Good> {
        self.goods.get(id.index()).ok_or(Error::UnknownGood(id))
    }

    /// Look up a bidder by id
    pub fn bidder(&self, id: BidderId) -> Result<&Bidder> {
        self.bidders.get(id.index()).ok_or(Error::UnknownBidder(id))
    }

    /// Iterate over the ids of all goods, in order
    pub fn good_ids(&self) -> impl ExactSizeIterator<Item = GoodId> + use<> {
        (0..self.goods.len()).map(GoodId::from)
    }

    /// Iterate over the ids of all bidders, in order
    pub fn bidder_ids(&self) -> impl ExactSizeIterator<Item = BidderId> + use<> {
        (0..self.bidders.len()).map(BidderId::from)
    }

    /// The number of goods
    pub fn num_goods(&self) -> usize {
        self.goods.len()
    }

    /// The number of bidders
    pub fn num_bidders(&self) -> usize {
        self.bidders.len()
    }

    /// Is `good` in the demand set of `bidder`? Unknown ids are never connected.
    pub fn is_connected(&self, good: GoodId, bidder: BidderId) -> bool {
        self.bidders
            .get(bidder.index())
            .is_some_and(|b| b.demands_good(good))
    }

    /// The bidders connected to `good`, in bidder order
    pub fn bidders_of(&self, good: GoodId) -> &[BidderId] {
        self.adjacency
            .get(good.index())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Does the bidder demand at least one good?
    pub fn has_connections(&self, bidder: BidderId) -> bool {
        self.bidders
            .get(bidder.index())
            .is_some_and(|b| !b.demand_set().is_empty())
    }

    /// The total supply over all goods
    pub fn total_supply(&self) -> u64 {
        self.goods.iter().map(|good| good.supply() as u64).sum()
    }

    /// The units the bidder could take over its whole demand set, each good
    /// capped by the bidder's level
    pub fn reachable_supply(&self, bidder: BidderId) -> Result<u64> {
        let bidder = self.bidder(bidder)?;
        Ok(bidder
            .demand_set()
            .iter()
            .map(|good| bidder.cap(&self.goods[good.index()]) as u64)
            .sum())
    }
}

/// A DTO to ensure that we always validate when we deserialize from an untrusted source
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug)]
pub struct MarketDto {
    /// The goods, in id order
    pub goods: Vec<Good>,
    /// The bidders, in id order
    pub bidders: Vec<Bidder>,
}

impl TryFrom<MarketDto> for Market {
    type Error = Error;

    fn try_from(value: MarketDto) -> Result<Self> {
        Market::new(value.goods, value.bidders)
    }
}

impl From<Market> for MarketDto {
    fn from(value: Market) -> Self {
        Self {
            goods: value.goods,
            bidders: value.bidders,
        }
    }
}

/// A view of a market whose goods are all in unit supply and whose bidders
/// each demand exactly their demand set.
#[derive(Clone, Copy, Debug)]
pub struct SingleMindedMarket<'m>(&'m Market);

impl<'m> SingleMindedMarket<'m> {
    /// Validates the single-minded structure of the market
    pub fn new(market: &'m Market) -> Result<Self> {
        for (good, id) in market.goods().iter().zip(market.good_ids()) {
            if good.supply() != 1 {
                return Err(Error::NonUnitSupply {
                    good: id,
                    supply: good.supply(),
                });
            }
        }
        for (bidder, id) in market.bidders().iter().zip(market.bidder_ids()) {
            if bidder.demand() as usize != bidder.demand_set().len() {
                return Err(Error::DemandMismatch {
                    bidder: id,
                    demand: bidder.demand(),
                    demand_set: bidder.demand_set().len(),
                });
            }
        }
        Ok(Self(market))
    }

    /// The underlying market
    pub fn market(&self) -> &'m Market {
        self.0
    }
}

impl std::ops::Deref for SingleMindedMarket<'_> {
    type Target = Market;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}
