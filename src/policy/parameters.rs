//! Scalar tunables exported alongside the policy tables.
//!
//! Two shapes exist on disk and both are accepted:
//!
//! ```text
//! {"estimated_goal": {"x": 0, "y": 24, "known": true},
//!  "danger_zones": [{"x": 1, "y": 3}],
//!  "decision_weights": {...}, "direction_scores": {...}}
//!
//! {"estimated_goal": "0,24", "hole_fear_index": -3.1, "trap_interest": 0.2}
//! ```
//!
//! Every field is optional; missing values fall back to the defaults below.

use serde::Deserialize;

use crate::grid::{Coordinate, TileType};

/// Weights shaping the ensemble scorer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecisionWeights {
    /// Negative values push away from holes.
    pub hole_fear_index: f64,
    /// `-1.0` avoids traps, `1.0` seeks them.
    pub trap_interest: f64,
    /// `0.0..=1.0`, how strongly the goal direction is preferred.
    pub goal_bias: f64,
    /// Share of goal approaches in the demonstrations; scales the extra
    /// goal bonus per unit of Euclidean distance gained.
    pub goal_approach_rate: f64,
}

impl Default for DecisionWeights {
    fn default() -> Self {
        Self {
            hole_fear_index: -2.5,
            trap_interest: 0.0,
            goal_bias: 0.5,
            goal_approach_rate: 0.5,
        }
    }
}

/// Base score per destination tile class.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TileScores {
    pub hole: f64,
    /// Plain floor; the trainer calls it "flat".
    #[serde(alias = "floor")]
    pub flat: f64,
    pub goal: f64,
    pub trap: f64,
}

impl TileScores {
    pub fn score(&self, tile: TileType) -> f64 {
        match tile {
            TileType::Hole => self.hole,
            TileType::Floor => self.flat,
            TileType::Goal => self.goal,
            TileType::Trap => self.trap,
        }
    }
}

impl Default for TileScores {
    fn default() -> Self {
        Self {
            hole: -100.0,
            flat: 0.0,
            goal: 100.0,
            trap: -10.0,
        }
    }
}

/// Per-direction terms of the forest scorer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectionScores {
    pub tile_scores: TileScores,
    pub goal_direction_bonus: f64,
    /// Applied once per previous visit to the destination.
    pub revisit_penalty: f64,
    pub unexplored_bonus: f64,
}

impl Default for DirectionScores {
    fn default() -> Self {
        Self {
            tile_scores: TileScores::default(),
            goal_direction_bonus: 10.0,
            revisit_penalty: -5.0,
            unexplored_bonus: 5.0,
        }
    }
}

/// Everything read from the optional parameter-summary artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSummary {
    pub estimated_goal: Option<Coordinate>,
    pub danger_zones: Vec<Coordinate>,
    pub weights: DecisionWeights,
    pub scores: DirectionScores,
}

#[derive(Deserialize)]
struct RawPoint {
    x: i32,
    y: i32,
}

#[derive(Deserialize)]
struct RawGoal {
    x: i32,
    y: i32,
    #[serde(default = "known_default")]
    known: bool,
}

fn known_default() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEstimatedGoal {
    Object(RawGoal),
    Text(String),
}

impl RawEstimatedGoal {
    fn coordinate(self) -> Option<Coordinate> {
        match self {
            RawEstimatedGoal::Object(g) => g.known.then(|| Coordinate::new(g.x, g.y)),
            RawEstimatedGoal::Text(s) => {
                let (x, y) = s.split_once(',')?;
                Some(Coordinate::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
            }
        }
    }
}

#[derive(Deserialize)]
struct RawSummary {
    estimated_goal: Option<RawEstimatedGoal>,
    #[serde(default)]
    danger_zones: Vec<RawPoint>,
    decision_weights: Option<DecisionWeights>,
    direction_scores: Option<DirectionScores>,
    // Flat, human-readable form.
    hole_fear_index: Option<f64>,
    trap_interest: Option<f64>,
    goal_bias: Option<f64>,
    goal_approach_rate: Option<f64>,
}

impl ParameterSummary {
    /// Parses either summary shape.
    ///
    /// Unknown keys (`version`, `description`, embedded tables) are ignored.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let raw: RawSummary = serde_json::from_str(text)?;

        let mut weights = raw.decision_weights.unwrap_or_default();
        if let Some(v) = raw.hole_fear_index {
            weights.hole_fear_index = v;
        }
        if let Some(v) = raw.trap_interest {
            weights.trap_interest = v;
        }
        if let Some(v) = raw.goal_bias {
            weights.goal_bias = v;
        }
        if let Some(v) = raw.goal_approach_rate {
            weights.goal_approach_rate = v;
        }

        Ok(Self {
            estimated_goal: raw.estimated_goal.and_then(RawEstimatedGoal::coordinate),
            danger_zones: raw
                .danger_zones
                .into_iter()
                .map(|p| Coordinate::new(p.x, p.y))
                .collect(),
            weights,
            scores: raw.direction_scores.unwrap_or_default(),
        })
    }
}
