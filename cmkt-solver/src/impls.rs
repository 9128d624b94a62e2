/// One-pass, all-or-nothing greedy allocation
mod greedy;
pub use greedy::{GreedyAllocation, GreedySettings};

/// Greedy allocation in fixed-size chunks, driven by an objective function
mod multistep;
pub use multistep::{MultiStepGreedyAllocation, MultiStepSettings};

/// Greedy allocation for single-minded markets
mod single_minded;
pub use single_minded::SingleMindedGreedyAllocation;

/// Sequential second-price clearing with per-edge prices
mod waterfall;
pub use waterfall::{TieBreak, Waterfall, WaterfallSettings};

/// Ascending-price tâtonnement with per-good prices
mod ascending;
pub use ascending::{AscendingAuction, AscendingAuctionSettings};
