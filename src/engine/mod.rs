//! Decision engine: per-tick policy fusion.
//!
//! Each tick the [`DecisionEngine`]:
//!
//! 1. with probability `exploration_rate` returns a uniformly random move;
//! 2. scores the four moves with the noisy-tree ensemble ([`ForestScorer`]);
//! 3. scores them with the first learned tier that knows the state
//!    ([`DecisionTier`]);
//! 4. scores them with behaviour cloning;
//! 5. blends the three and selects ([`Selection`]);
//! 6. records the destination in the episode's visit counts.
//!
//! Setting `ensemble_weight` and `bc_weight` to zero reduces the engine to
//! the plain learned-tier chain.

pub mod cloning;
pub mod decision;
pub mod forest;
pub mod policy;
pub mod selection;
pub mod tiers;

pub use decision::{Decision, DecisionEngine, ScoreBreakdown, TickContext};
pub use forest::ForestScorer;
pub use policy::{Policy, RandomPolicy};
pub use selection::Selection;
pub use tiers::DecisionTier;

#[cfg(test)]
mod tests;
