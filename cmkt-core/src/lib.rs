#![warn(missing_docs)]
//! Core types for computing allocations and prices in combinatorial
//! advertising markets.
//!
//! A [`Market`](models::Market) is a bipartite relation between goods
//! (impression pools with a finite supply) and bidders (campaigns demanding a
//! number of impressions drawn from a subset of goods, for a total reward).
//! Allocation engines consume a market through the
//! [`Allocator`](ports::Allocator) port and produce a
//! [`MarketAllocation`](models::MarketAllocation), optionally paired with
//! prices.

/// Core domain models for combinatorial markets.
///
/// Markets are immutable once constructed. Allocation engines keep their
/// bookkeeping (remaining supply, allocation so far) in private working state,
/// so a single market may be solved any number of times, by any number of
/// engines, with reproducible results.
pub mod models;

/// Interface traits for allocation engines.
///
/// This module contains the "ports" that concrete engines (greedy heuristics,
/// waterfall, ascending auction, or an external optimizer) implement.
pub mod ports;

mod error;
pub use error::{Error, Result};
