use crate::models::{BidderId, GoodId};
use thiserror::Error;

/// The ways in which constructing or querying markets, allocations and
/// outcomes can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A good was defined with an invalid reserve price
    #[error("invalid good: reserve price must be finite and non-negative, got {reserve_price}")]
    InvalidGood {
        /// The offending reserve price
        reserve_price: f64,
    },

    /// A bidder was defined with invalid parameters
    #[error("invalid bidder: {reason}")]
    InvalidBidder {
        /// Which rule the bidder violated
        reason: &'static str,
    },

    /// A good id does not refer to a good of the market
    #[error("unknown good {0}")]
    UnknownGood(GoodId),

    /// A bidder id does not refer to a bidder of the market
    #[error("unknown bidder {0}")]
    UnknownBidder(BidderId),

    /// An allocation quantity was negative
    #[error("allocation of good {good} to bidder {bidder} is negative ({quantity})")]
    NegativeAllocation {
        /// The good of the edge
        good: GoodId,
        /// The bidder of the edge
        bidder: BidderId,
        /// The offending quantity
        quantity: i64,
    },

    /// A matrix or vector does not have the shape implied by the market
    #[error("{what} has shape {found:?}, but the market requires {expected:?}")]
    DimensionMismatch {
        /// What was being constructed
        what: &'static str,
        /// The shape implied by the market
        expected: (usize, usize),
        /// The shape that was provided
        found: (usize, usize),
    },

    /// A good and a bidder are not connected
    #[error("good {good} is not in the demand set of bidder {bidder}")]
    Disconnected {
        /// The good of the edge
        good: GoodId,
        /// The bidder of the edge
        bidder: BidderId,
    },

    /// More units of a good were allocated than it supplies
    #[error("good {good} allocates {allocated} units but only supplies {supply}")]
    OverSupply {
        /// The exhausted good
        good: GoodId,
        /// Total units allocated from the good
        allocated: u64,
        /// The supply of the good
        supply: u32,
    },

    /// More units were allocated to a bidder than it demands
    #[error("bidder {bidder} receives {allocated} units but only demands {demand}")]
    OverDemand {
        /// The over-served bidder
        bidder: BidderId,
        /// Total units allocated to the bidder
        allocated: u64,
        /// The demand of the bidder
        demand: u32,
    },

    /// A bidder received more of a good than its level allows
    #[error("bidder {bidder} receives {allocated} units of good {good} but its level caps it at {cap}")]
    OverLevel {
        /// The good of the edge
        good: GoodId,
        /// The capped bidder
        bidder: BidderId,
        /// Units allocated on the edge
        allocated: u32,
        /// The most the bidder may take from the good
        cap: u32,
    },

    /// Unit expansion would create more goods than an auction will handle
    #[error("unit expansion would create {units} goods, more than the limit of {limit}")]
    ExpansionTooLarge {
        /// The total supply of the market
        units: u64,
        /// The largest total supply that may be expanded
        limit: u64,
    },

    /// A single-minded bidder's demand differs from the size of its demand set
    #[error("bidder {bidder} demands {demand} units but its demand set has {demand_set} goods")]
    DemandMismatch {
        /// The offending bidder
        bidder: BidderId,
        /// The declared demand
        demand: u32,
        /// The cardinality of the demand set
        demand_set: usize,
    },

    /// A good was required to be in unit supply
    #[error("good {good} has supply {supply}, but unit supply is required")]
    NonUnitSupply {
        /// The offending good
        good: GoodId,
        /// Its supply
        supply: u32,
    },

    /// A multi-step allocator was configured with a non-positive step size
    #[error("step size must be positive, got {0}")]
    InvalidStepSize(u32),

    /// An ascending auction was configured with an invalid price increment
    #[error("price increment must be finite and positive, got {0}")]
    InvalidIncrement(f64),

    /// A value query was made without an objective function
    #[error("an objective function is required to compute the value of an allocation")]
    MissingObjective,
}

/// A specialized Result type for market operations
pub type Result<T> = std::result::Result<T, Error>;
