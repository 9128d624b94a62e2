use crate::state::WorkingState;
use cmkt_core::{
    Error, Result,
    models::{BidderId, GoodId, Market, MarketAllocation, ObjectiveFunction},
    ports::Allocator,
};
use std::{cmp::Ordering, collections::BinaryHeap};
use tracing::{Level, event};

/// Configuration of a [`MultiStepGreedyAllocation`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MultiStepSettings {
    /// The number of units handed out per step; must be positive
    pub step: u32,
    /// How the value of a partially served bidder is computed
    pub objective: ObjectiveFunction,
}

impl Default for MultiStepSettings {
    fn default() -> Self {
        Self {
            step: 1,
            objective: ObjectiveFunction::Identity,
        }
    }
}

/// Greedy allocation in fixed-size chunks.
///
/// Bidders wait in a priority queue keyed by the marginal value of their next
/// chunk under the objective function. The most valuable bidder takes one
/// chunk from the connected good with the most remaining supply that can hold
/// it, and re-enters the queue with a recomputed value. The run ends when the
/// queue is empty.
#[derive(Clone, Debug)]
pub struct MultiStepGreedyAllocation(MultiStepSettings);

impl MultiStepGreedyAllocation {
    /// Create an allocator, rejecting a zero step size
    pub fn new(settings: MultiStepSettings) -> Result<Self> {
        if settings.step == 0 {
            return Err(Error::InvalidStepSize(settings.step));
        }
        Ok(Self(settings))
    }

    /// The settings of this allocator
    pub fn settings(&self) -> &MultiStepSettings {
        &self.0
    }

    // The value of moving the bidder from its current bundle to one more chunk
    fn next_value(&self, state: &WorkingState<'_>, bidder: BidderId) -> Option<f64> {
        let profile = &state.market.bidders()[bidder.index()];
        let held = profile.demand() - state.demand[bidder.index()];
        if state.demand[bidder.index()] < self.0.step {
            return None;
        }
        let value = self.0.objective.marginal(
            profile.net_reward(),
            profile.demand() as f64,
            held as f64,
            (held + self.0.step) as f64,
        );
        (value > 0.0).then_some(value)
    }

    // The good with the most remaining supply that can take a whole chunk
    fn next_good(&self, state: &WorkingState<'_>, bidder: BidderId) -> Option<GoodId> {
        state.market.bidders()[bidder.index()]
            .demand_set()
            .iter()
            .copied()
            .filter(|&good| state.room(good, bidder) >= self.0.step)
            .min_by(|&a, &b| {
                state.supply[b.index()]
                    .cmp(&state.supply[a.index()])
                    .then(a.cmp(&b))
            })
    }
}

impl Default for MultiStepGreedyAllocation {
    fn default() -> Self {
        Self(MultiStepSettings::default())
    }
}

// A queue entry; higher values pop first, then lower bidder indices
struct Candidate {
    value: f64,
    bidder: BidderId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then(other.bidder.cmp(&self.bidder))
    }
}

impl Allocator for MultiStepGreedyAllocation {
    type Outcome<'m> = MarketAllocation<'m>;

    fn solve<'m>(&self, market: &'m Market) -> Result<MarketAllocation<'m>> {
        event!(
            Level::DEBUG,
            goods = market.num_goods(),
            bidders = market.num_bidders(),
            step = self.0.step,
            objective = ?self.0.objective,
        );

        let mut state = WorkingState::new(market);
        let mut queue = market
            .bidder_ids()
            .filter(|&id| market.bidders()[id.index()].net_reward() > 0.0)
            .filter_map(|bidder| {
                self.next_value(&state, bidder)
                    .map(|value| Candidate { value, bidder })
            })
            .collect::<BinaryHeap<_>>();

        while let Some(Candidate { value, bidder }) = queue.pop() {
            let Some(good) = self.next_good(&state, bidder) else {
                event!(Level::TRACE, %bidder, "no good can hold another chunk");
                continue;
            };
            state.assign(good, bidder, self.0.step);
            event!(Level::TRACE, %bidder, %good, value);

            if let Some(value) = self.next_value(&state, bidder) {
                queue.push(Candidate { value, bidder });
            }
        }

        let allocation = state.finish()?.with_objective(self.objective());
        event!(Level::DEBUG, winners = allocation.number_of_winners());
        Ok(allocation)
    }

    fn objective(&self) -> ObjectiveFunction {
        self.0.objective
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_step() {
        let result = MultiStepGreedyAllocation::new(MultiStepSettings {
            step: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidStepSize(0))));
    }

    #[test]
    fn candidates_pop_by_value_then_index() {
        let mut queue = BinaryHeap::from([
            Candidate {
                value: 1.0,
                bidder: BidderId::from(0),
            },
            Candidate {
                value: 2.0,
                bidder: BidderId::from(2),
            },
            Candidate {
                value: 2.0,
                bidder: BidderId::from(1),
            },
        ]);
        let order = std::iter::from_fn(|| queue.pop().map(|c| c.bidder.index())).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
