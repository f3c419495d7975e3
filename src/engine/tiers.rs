//! The tiered learned signal.
//!
//! Tiers are tried in order and the first with data wins:
//!
//! 1. action-value row with signal
//! 2. imitation frequency shares, optionally vetoing live holes
//! 3. reward-gradient averages of the four candidate next states
//! 4. safe fallback over live tiles and known danger zones

use std::fmt;

use crate::grid::{Action, Coordinate, GridEnvironment, TileType};
use crate::memory::MapKnowledge;
use crate::policy::PolicyStore;
use crate::state::{StateEncoder, StateKey};

/// Which source decided a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionTier {
    /// Random exploration override; no scoring happened.
    Exploration,
    ActionValue,
    Imitation,
    RewardGradient,
    /// No table knew the state (`NoPolicyDataForState`).
    SafeFallback,
}

impl fmt::Display for DecisionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecisionTier::Exploration => "exploration",
            DecisionTier::ActionValue => "action-value",
            DecisionTier::Imitation => "imitation",
            DecisionTier::RewardGradient => "reward-gradient",
            DecisionTier::SafeFallback => "safe-fallback",
        };
        f.write_str(name)
    }
}

/// Inputs shared by every tier.
pub struct TierInputs<'a> {
    pub env: &'a dyn GridEnvironment,
    pub position: Coordinate,
    pub key: &'a StateKey,
    pub encoder: &'a StateEncoder,
    pub store: &'a PolicyStore,
    pub knowledge: &'a MapKnowledge,
    /// `Some(score)` forces imitation suggestions into live holes to `score`.
    pub imitation_veto: Option<f64>,
}

/// Scores from the first tier that has data for this state.
pub fn learned_scores(inputs: &TierInputs<'_>) -> ([f64; 4], DecisionTier) {
    if let Some(row) = inputs.store.action_values().get(inputs.key) {
        if row.has_signal() {
            return (row.0, DecisionTier::ActionValue);
        }
    }

    if let Some(shares) = imitation_scores(inputs) {
        return (shares, DecisionTier::Imitation);
    }

    if let Some(rewards) = reward_scores(inputs) {
        return (rewards, DecisionTier::RewardGradient);
    }

    (safe_scores(inputs), DecisionTier::SafeFallback)
}

fn imitation_scores(inputs: &TierInputs<'_>) -> Option<[f64; 4]> {
    let mut shares = inputs.store.imitation().get(inputs.key)?.distribution()?;
    if let Some(veto) = inputs.imitation_veto {
        for action in Action::ALL {
            if inputs.env.tile(inputs.position.step(action)) == TileType::Hole {
                shares[action.index()] = veto;
            }
        }
    }
    Some(shares)
}

fn reward_scores(inputs: &TierInputs<'_>) -> Option<[f64; 4]> {
    let table = inputs.store.reward_gradient();
    if table.is_empty() {
        return None;
    }

    let next = inputs.encoder.neighbor_keys(inputs.env, inputs.position);
    let averages = next.map(|key| {
        table
            .get(&key)
            .filter(|entry| entry.count > 0)
            .map(|entry| entry.avg)
    });

    let floor = averages
        .iter()
        .flatten()
        .copied()
        .fold(f64::INFINITY, f64::min);
    if floor == f64::INFINITY {
        return None;
    }
    Some(averages.map(|avg| avg.unwrap_or(floor)))
}

/// `1 + 1 / (1 + distance to goal)` for safe destinations, `0` otherwise.
///
/// A destination is unsafe if the live grid or the map memory says hole, or
/// it is a known danger zone. A remembered goal counts as distance zero.
fn safe_scores(inputs: &TierInputs<'_>) -> [f64; 4] {
    let memory = &inputs.knowledge.memory;
    Action::ALL.map(|action| {
        let dest = inputs.position.step(action);
        let remembered = memory.get(dest);
        let safe = inputs.env.tile(dest) != TileType::Hole
            && remembered != Some(TileType::Hole)
            && !memory.is_danger(dest);
        if !safe {
            return 0.0;
        }
        let closeness = if remembered == Some(TileType::Goal) {
            1.0
        } else {
            inputs
                .knowledge
                .goal
                .map(|goal| 1.0 / (1.0 + dest.distance_to(&goal)))
                .unwrap_or(0.0)
        };
        1.0 + closeness
    })
}
