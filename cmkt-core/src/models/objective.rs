/// How partial fulfillment of a bidder's demand is monetized.
///
/// Each variant maps `(reward, demand, x)` to the value realized by a bidder
/// offering `reward` for `demand` units when it receives `x` units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ObjectiveFunction {
    /// Linear in `x`, capped at the reward once demand is met
    Identity,
    /// All-or-nothing: the reward is only realized when demand is met
    #[default]
    SingleStep,
    /// A concave (quadratic) approximation of the effective reach ratio
    Concave,
    /// A convex (quadratic) approximation of the effective reach ratio
    Convex,
    /// Identity for the first half of demand, convex for the second half
    LinearConvex,
    /// The effective reach ratio (an arctangent sigmoid)
    EffectiveReach,
    /// Identity for the first half of demand, effective reach for the second half
    LinearSigmoid,
}

// Constants of the effective reach ratio curve.
const REACH_A: f64 = 4.08577;
const REACH_B: f64 = 3.08577;

impl ObjectiveFunction {
    /// The value realized for `x` units out of `demand`, given `reward`
    pub fn objective(&self, reward: f64, demand: f64, x: f64) -> f64 {
        match self {
            Self::Identity => {
                if x <= demand {
                    reward / demand * x
                } else {
                    reward
                }
            }
            Self::SingleStep => {
                if x >= demand {
                    reward
                } else {
                    0.0
                }
            }
            Self::Concave => -(reward / (demand * demand)) * x * x + 2.0 * (reward / demand) * x,
            Self::Convex => reward / (demand * demand) * x * x,
            Self::LinearConvex => {
                if x > demand / 2.0 {
                    Self::Convex.objective(reward, demand, x)
                } else {
                    Self::Identity.objective(reward, demand, x)
                }
            }
            Self::EffectiveReach => {
                reward
                    * (2.0 / REACH_A)
                    * ((REACH_A * (x / demand) - REACH_B).atan() - (-REACH_B).atan())
            }
            Self::LinearSigmoid => {
                if x > demand / 2.0 {
                    Self::EffectiveReach.objective(reward, demand, x)
                } else {
                    Self::Identity.objective(reward, demand, x)
                }
            }
        }
    }

    /// The value gained by moving from `from` to `to` units
    pub fn marginal(&self, reward: f64, demand: f64, from: f64, to: f64) -> f64 {
        self.objective(reward, demand, to) - self.objective(reward, demand, from)
    }

    /// Whether this objective can be combined with reserve prices without
    /// overcharging partially served bidders
    pub fn is_safe_for_reserve(&self) -> bool {
        !matches!(self, Self::Convex)
    }
}
