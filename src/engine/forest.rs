//! Ensemble ("random forest") heuristic scorer.
//!
//! Each tree evaluates the same per-direction formula:
//!
//! ```text
//! noise × (tile_score + hole_fear + trap_interest)
//!     + goal_bonus + revisit_penalty × visits + unexplored_bonus + danger_penalty
//! ```
//!
//! and differs from its siblings only by a multiplicative noise factor drawn
//! once at construction. Direction scores are averaged across trees.
//!
//! The tile is the live one, upgraded by map memory (a remembered goal or
//! trap on live floor counts as such). `goal_bonus` applies to moves that
//! shrink the Manhattan distance to the goal:
//! `goal_direction_bonus × (goal_bias + goal_approach_rate × euclidean_gain)`.

use rand::Rng;

use crate::config::ForestConfig;
use crate::episode::VisitedTiles;
use crate::grid::{Action, Coordinate, GridEnvironment, TileType};
use crate::memory::MapKnowledge;
use crate::policy::ParameterSummary;

#[derive(Debug, Clone)]
pub struct ForestScorer {
    config: ForestConfig,
    noise: Vec<f64>,
}

impl ForestScorer {
    /// Draws one noise factor in `1 ± tree_noise` per tree.
    pub fn new<R: Rng + ?Sized>(config: ForestConfig, rng: &mut R) -> Self {
        let spread = config.tree_noise;
        let noise = (0..config.num_trees.max(1))
            .map(|_| {
                if spread > 0.0 {
                    1.0 + rng.gen_range(-spread..spread)
                } else {
                    1.0
                }
            })
            .collect();
        Self { config, noise }
    }

    pub fn num_trees(&self) -> usize {
        self.noise.len()
    }

    pub fn noise(&self) -> &[f64] {
        &self.noise
    }

    /// Averaged per-direction scores in [`Action::ALL`] order.
    pub fn score(
        &self,
        env: &dyn GridEnvironment,
        position: Coordinate,
        knowledge: &MapKnowledge,
        visited: &VisitedTiles,
        params: &ParameterSummary,
    ) -> [f64; 4] {
        let weights = &params.weights;
        let scores = &params.scores;

        Action::ALL.map(|action| {
            let dest = position.step(action);
            let tile = knowledge.memory.refine(dest, env.tile(dest));

            let mut noised = scores.tile_scores.score(tile);
            match tile {
                TileType::Hole => noised += weights.hole_fear_index * self.config.hole_fear_scale,
                TileType::Trap => noised += weights.trap_interest * self.config.trap_interest_scale,
                TileType::Floor | TileType::Goal => {}
            }

            let mut shared = 0.0;
            if let Some(goal) = knowledge.goal {
                if dest.manhattan(&goal) < position.manhattan(&goal) {
                    let gain = position.distance_to(&goal) - dest.distance_to(&goal);
                    shared += scores.goal_direction_bonus
                        * (weights.goal_bias + weights.goal_approach_rate * gain);
                }
            }
            let visits = visited.count(dest);
            shared += scores.revisit_penalty * f64::from(visits);
            if visits == 0 {
                shared += scores.unexplored_bonus;
            }
            if knowledge.memory.is_danger(dest) {
                shared += self.config.danger_penalty;
            }

            let total: f64 = self.noise.iter().map(|n| n * noised + shared).sum();
            total / self.noise.len() as f64
        })
    }
}
