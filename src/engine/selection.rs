//! Turning four direction scores into one action.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::grid::Action;

/// How the fused scores pick an action.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Selection {
    /// Highest score; exact ties are broken uniformly at random.
    #[default]
    Argmax,
    /// Sample with probability proportional to `exp(score / temperature)`.
    Softmax { temperature: f64 },
}

impl Selection {
    pub fn select<R: Rng + ?Sized>(&self, scores: &[f64; 4], rng: &mut R) -> Action {
        match *self {
            Selection::Argmax => argmax(scores, rng),
            Selection::Softmax { temperature } => softmax(scores, temperature, rng),
        }
    }
}

/// Every action holding the maximum score, in [`Action::ALL`] order.
pub fn best_actions(scores: &[f64; 4]) -> Vec<Action> {
    let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Action::ALL
        .into_iter()
        .filter(|a| scores[a.index()] == best)
        .collect()
}

fn argmax<R: Rng + ?Sized>(scores: &[f64; 4], rng: &mut R) -> Action {
    let tied = best_actions(scores);
    match tied.choose(rng) {
        Some(action) => *action,
        // Only reachable when every score is NaN.
        None => Action::ALL[rng.gen_range(0..Action::ALL.len())],
    }
}

fn softmax<R: Rng + ?Sized>(scores: &[f64; 4], temperature: f64, rng: &mut R) -> Action {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights = scores.map(|s| ((s - max) / temperature).exp());
    match WeightedIndex::new(weights) {
        Ok(dist) => Action::ALL[dist.sample(rng)],
        Err(_) => argmax(scores, rng),
    }
}
