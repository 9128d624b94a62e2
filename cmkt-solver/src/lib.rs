#![warn(missing_docs)]
//! Allocation engines for combinatorial advertising markets.
//!
//! Every engine implements [`Allocator`](cmkt_core::ports::Allocator) and
//! runs synchronously against an immutable
//! [`Market`](cmkt_core::models::Market), keeping its bookkeeping in private
//! per-run state.

/**
 * These are the allocation engines.
 */
mod impls;
pub use impls::*;

/**
 * These are the policies that order bidders and goods for the greedy engines.
 */
mod ordering;
pub use ordering::{BidderOrder, GoodOrder};

mod state;
