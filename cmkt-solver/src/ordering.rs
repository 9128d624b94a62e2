use cmkt_core::models::{Bidder, BidderId, GoodId, Market};
use std::cmp::Ordering;

/// The order in which greedy engines visit bidders.
///
/// Every policy ranks bidders by a score computed from the reward net of
/// reserve (highest score first); equal scores fall back to bidder index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BidderOrder {
    /// By net reward
    Reward,
    /// By net reward per unit demanded
    RewardToDemand,
    /// By net reward over the square root of demand
    #[default]
    RewardToSqrtDemand,
    /// By the inverse square root of demand, favoring small campaigns
    InverseSqrtDemand,
}

impl BidderOrder {
    /// The score of a bidder under this policy
    pub fn score(&self, bidder: &Bidder) -> f64 {
        let demand = bidder.demand() as f64;
        match self {
            Self::Reward => bidder.net_reward(),
            Self::RewardToDemand => bidder.net_reward() / demand,
            Self::RewardToSqrtDemand => bidder.net_reward() / demand.sqrt(),
            Self::InverseSqrtDemand => 1.0 / demand.sqrt(),
        }
    }

    /// Sort bidder ids into visiting order
    pub fn sort(&self, market: &Market, bidders: &mut [BidderId]) {
        let scores: Vec<f64> = market.bidders().iter().map(|b| self.score(b)).collect();
        bidders.sort_by(|a, b| {
            scores[b.index()]
                .total_cmp(&scores[a.index()])
                .then(a.cmp(b))
        });
    }
}

/// The order in which a greedy engine draws on a bidder's goods.
///
/// Equal keys fall back to good index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum GoodOrder {
    /// Scarcest remaining supply first
    #[default]
    AscendingRemainingSupply,
    /// Largest remaining supply first
    DescendingRemainingSupply,
    /// Smallest total supply first
    AscendingSupply,
    /// Largest total supply first
    DescendingSupply,
    /// By index only
    Unordered,
}

impl GoodOrder {
    fn compare(&self, market: &Market, remaining: &[u32], a: GoodId, b: GoodId) -> Ordering {
        let supply = |id: GoodId| market.goods()[id.index()].supply();
        let by_key = match self {
            Self::AscendingRemainingSupply => remaining[a.index()].cmp(&remaining[b.index()]),
            Self::DescendingRemainingSupply => remaining[b.index()].cmp(&remaining[a.index()]),
            Self::AscendingSupply => supply(a).cmp(&supply(b)),
            Self::DescendingSupply => supply(b).cmp(&supply(a)),
            Self::Unordered => Ordering::Equal,
        };
        by_key.then(a.cmp(&b))
    }

    /// Sort good ids into drawing order, given the remaining supply of every good
    pub fn sort(&self, market: &Market, remaining: &[u32], goods: &mut [GoodId]) {
        goods.sort_by(|&a, &b| self.compare(market, remaining, a, b));
    }
}
