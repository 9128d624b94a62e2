use super::{Good, GoodId, Set};
use crate::{Error, Result};

/// A bidder (a campaign) demanding a number of units drawn from a set of goods,
/// for a total reward.
///
/// Bidders are size-interchangeable: any unit of any good in the demand set is
/// as good as any other.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "BidderDto", into = "BidderDto")
)]
pub struct Bidder {
    demand: u32,
    reward: f64,
    demand_set: Set<GoodId>,
    reserve: f64,
    level: Option<f64>,
}

impl Bidder {
    /// Creates a new bidder, validating that the demand is positive and the
    /// reward finite and non-negative.
    pub fn new(
        demand: u32,
        reward: f64,
        demand_set: impl IntoIterator<Item = GoodId>,
    ) -> Result<Self> {
        BidderDto {
            demand,
            reward,
            demand_set: demand_set.into_iter().collect(),
            reserve: None,
            level: None,
        }
        .try_into()
    }

    /// Sets the per-unit reserve price this bidder must pay
    pub fn with_reserve(self, reserve: f64) -> Result<Self> {
        let mut dto = BidderDto::from(self);
        dto.reserve = Some(reserve);
        dto.try_into()
    }

    /// Caps the share of any one good's supply this bidder may receive
    pub fn with_level(self, level: f64) -> Result<Self> {
        let mut dto = BidderDto::from(self);
        dto.level = Some(level);
        dto.try_into()
    }

    /// The total number of units demanded
    pub fn demand(&self) -> u32 {
        self.demand
    }

    /// The total reward offered for the full demand
    pub fn reward(&self) -> f64 {
        self.reward
    }

    /// The goods this bidder is connected to
    pub fn demand_set(&self) -> &Set<GoodId> {
        &self.demand_set
    }

    /// The per-unit reserve price
    pub fn reserve(&self) -> f64 {
        self.reserve
    }

    /// The fraction of a good's supply this bidder may take, if capped
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    /// Does this bidder want the given good?
    pub fn demands_good(&self, good: GoodId) -> bool {
        self.demand_set.contains(&good)
    }

    /// The reward net of paying the reserve price on every demanded unit
    pub fn net_reward(&self) -> f64 {
        self.reward - self.reserve * self.demand as f64
    }

    /// The most units of `good` this bidder may take, honoring its level
    pub fn cap(&self, good: &Good) -> u32 {
        match self.level {
            Some(level) => (level * good.supply() as f64).floor() as u32,
            None => good.supply(),
        }
    }
}

/// A DTO to ensure that we always validate when we deserialize from an untrusted source
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug)]
pub struct BidderDto {
    /// The number of units demanded (positive)
    pub demand: u32,
    /// The total reward (finite, non-negative)
    pub reward: f64,
    /// The goods this bidder is connected to
    pub demand_set: Vec<GoodId>,
    /// The per-unit reserve price, defaulting to zero
    #[cfg_attr(feature = "serde", serde(default))]
    pub reserve: Option<f64>,
    /// The per-good supply share cap, in (0, 1]
    #[cfg_attr(feature = "serde", serde(default))]
    pub level: Option<f64>,
}

impl TryFrom<BidderDto> for Bidder {
    type Error = Error;

    fn try_from(value: BidderDto) -> Result<Self> {
        let BidderDto {
            demand,
            reward,
            demand_set,
            reserve,
            level,
        } = value;

        if demand == 0 {
            return Err(Error::InvalidBidder {
                reason: "the demand of a bidder must be a positive integer",
            });
        }
        if !reward.is_finite() || reward < 0.0 {
            return Err(Error::InvalidBidder {
                reason: "the reward of a bidder must be finite and non-negative",
            });
        }
        let reserve = reserve.unwrap_or(0.0);
        if !reserve.is_finite() || reserve < 0.0 {
            return Err(Error::InvalidBidder {
                reason: "the reserve of a bidder must be finite and non-negative",
            });
        }
        if let Some(level) = level {
            if !(level > 0.0 && level <= 1.0) {
                return Err(Error::InvalidBidder {
                    reason: "the level of a bidder must lie in (0, 1]",
                });
            }
        }

        Ok(Self {
            demand,
            reward,
            demand_set: demand_set.into_iter().collect(),
            reserve,
            level,
        })
    }
}

impl From<Bidder> for BidderDto {
    fn from(value: Bidder) -> Self {
        Self {
            demand: value.demand,
            reward: value.reward,
            demand_set: value.demand_set.into_iter().collect(),
            reserve: if value.reserve == 0.0 {
                None
            } else {
                Some(value.reserve)
            },
            level: value.level,
        }
    }
}
