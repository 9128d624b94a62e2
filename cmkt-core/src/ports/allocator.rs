use crate::{
    Result,
    models::{Market, MarketAllocation, ObjectiveFunction},
};

/// Interface for allocation engines.
///
/// An allocator reads an immutable market and produces an outcome, which is
/// at least a feasible [`MarketAllocation`] and may carry prices as well.
/// Allocators keep all of their working state local to a call, so the same
/// allocator may solve the same market any number of times with identical
/// results.
pub trait Allocator {
    /// The full result of a run. Price-producing engines return a richer
    /// type than the bare allocation.
    type Outcome<'m>: Into<MarketAllocation<'m>>;

    /// Run the engine against the market.
    fn solve<'m>(&self, market: &'m Market) -> Result<Self::Outcome<'m>>;

    /// Run the engine and keep only the allocation.
    fn allocate<'m>(&self, market: &'m Market) -> Result<MarketAllocation<'m>> {
        self.solve(market).map(Into::into)
    }

    /// The objective function this engine optimizes for, which is attached
    /// to the allocations it returns
    fn objective(&self) -> ObjectiveFunction;
}
