//! Offline-learned policy artifacts.
//!
//! The [`PolicyStore`] holds up to four state-keyed tables (action values,
//! imitation, behaviour cloning, reward gradient) plus two optional extras:
//! goal-position counts and the [`ParameterSummary`] of scorer tunables.
//! Each loads independently; loading never fails.

pub mod artifacts;
pub mod parameters;
pub mod store;
pub mod tables;

pub use parameters::{DecisionWeights, DirectionScores, ParameterSummary, TileScores};
pub use store::{ArtifactKind, ArtifactPaths, ArtifactStatus, LoadReport, PolicyStore};
pub use tables::{
    ActionValueRow, BehaviorCloningEntry, BehaviorCloningTable, CloningKey, ImitationEntry,
    PolicyTable, RewardGradientEntry, SIGNAL_EPSILON,
};
