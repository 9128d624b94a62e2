mod allocation;
mod bidder;
mod good;
mod ids;
mod market;
mod objective;
mod outcome;
mod set;

pub use allocation::{Allocation, AllocationMatrix, MarketAllocation};
pub use bidder::{Bidder, BidderDto};
pub use good::{Good, GoodDto};
pub use ids::{BidderId, GoodId};
pub use market::{Market, MarketDto, SingleMindedMarket};
pub use objective::ObjectiveFunction;
pub use outcome::{MarketOutcome, WaterfallPrices};
pub use set::Set;
