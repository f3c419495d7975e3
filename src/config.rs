//! Configuration for the decision engine, episode controller and session.
//!
//! All structs are plain data with trainer-compatible defaults. Build them
//! with struct-update syntax in code, or deserialize a [`SessionConfig`]
//! from JSON where every field is optional.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::engine::Selection;
use crate::error::{Error, Result};
use crate::grid::Coordinate;
use crate::memory::StageVariant;
use crate::policy::ArtifactPaths;
use crate::state::KeyEncoding;

/// Ensemble ("random forest") scorer settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of independently noised scorers.
    pub num_trees: usize,
    /// Half-width of each tree's multiplicative noise, `1 ± tree_noise`.
    pub tree_noise: f64,
    /// Multiplier on `hole_fear_index` for Hole destinations.
    pub hole_fear_scale: f64,
    /// Multiplier on `trap_interest` for Trap destinations.
    pub trap_interest_scale: f64,
    /// Added when the destination is a known danger zone.
    pub danger_penalty: f64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 10,
            tree_noise: 0.1,
            hole_fear_scale: 10.0,
            trap_interest_scale: 10.0,
            danger_penalty: -50.0,
        }
    }
}

/// Decision engine settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Probability of a uniformly random move before any scoring.
    pub exploration_rate: f64,
    /// Blend weight of the behaviour-cloning score.
    pub bc_weight: f64,
    /// Blend between the forest (1.0) and the tiered learned signal (0.0).
    pub ensemble_weight: f64,
    /// Behaviour-cloning score of a certain, fully weighted direction.
    pub bc_base_score: f64,
    /// Sample count at which behaviour-cloning confidence saturates.
    pub confidence_saturation_samples: f64,
    /// Force imitation suggestions that lead into a live Hole down to `veto_score`.
    pub imitation_hole_veto: bool,
    pub veto_score: f64,
    pub selection: Selection,
    pub forest: ForestConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exploration_rate: 0.1,
            bc_weight: 0.3,
            ensemble_weight: 1.0,
            bc_base_score: 10.0,
            confidence_saturation_samples: 20.0,
            imitation_hole_veto: true,
            veto_score: -1.0,
            selection: Selection::Argmax,
            forest: ForestConfig::default(),
        }
    }
}

/// Episode controller settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    pub start: Coordinate,
    /// Inclusive range of the random lateral (x) offset applied on reset.
    pub start_offset_min: i32,
    pub start_offset_max: i32,
    /// Exceeding this many steps counts as a fall.
    pub max_steps_per_episode: u32,
    pub max_attempts: u32,
    /// Goals to reach before the session ends successfully.
    pub episode_budget: u32,
    /// Chained trap displacements allowed before a forced fall.
    pub max_trap_chain: u32,
    /// Inclusive displacement distance range of one trap trigger.
    pub trap_distance_min: i32,
    pub trap_distance_max: i32,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            start: Coordinate::new(0, 0),
            start_offset_min: -2,
            start_offset_max: 3,
            max_steps_per_episode: 100,
            max_attempts: 7,
            episode_budget: 1,
            max_trap_chain: 20,
            trap_distance_min: 2,
            trap_distance_max: 4,
        }
    }
}

impl EpisodeConfig {
    /// Checks the counts are positive and the random ranges non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_config("max_attempts must be at least 1"));
        }
        if self.episode_budget == 0 {
            return Err(Error::invalid_config("episode_budget must be at least 1"));
        }
        if self.start_offset_min > self.start_offset_max {
            return Err(Error::invalid_config(format!(
                "start_offset_min ({}) exceeds start_offset_max ({})",
                self.start_offset_min, self.start_offset_max
            )));
        }
        if self.trap_distance_min < 1 || self.trap_distance_min > self.trap_distance_max {
            return Err(Error::invalid_config(format!(
                "trap distance range {}..={} is empty or non-positive",
                self.trap_distance_min, self.trap_distance_max
            )));
        }
        Ok(())
    }
}

/// Thresholds used to derive map knowledge from the tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Best value (or reward average) above which a state is taken as the goal.
    pub success_threshold: f64,
    /// Worst value below `-hole_threshold` marks the state a danger zone.
    pub hole_threshold: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            success_threshold: 300.0,
            hole_threshold: 300.0,
        }
    }
}

/// Everything needed to start a [`Session`](crate::session::Session).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub artifacts: ArtifactPaths,
    pub encoding: KeyEncoding,
    pub stage: StageVariant,
    /// Fixed seed for reproducible runs; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub engine: EngineConfig,
    pub episode: EpisodeConfig,
    pub inference: InferenceConfig,
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

impl SessionConfig {
    /// Reads and validates a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config {}", path.display()),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parses and validates a JSON configuration string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every tunable is within its usable range.
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        unit_interval("exploration_rate", engine.exploration_rate)?;
        unit_interval("bc_weight", engine.bc_weight)?;
        unit_interval("ensemble_weight", engine.ensemble_weight)?;
        if engine.forest.num_trees == 0 {
            return Err(Error::invalid_config("num_trees must be at least 1"));
        }
        if !(0.0..1.0).contains(&engine.forest.tree_noise) {
            return Err(Error::invalid_config(format!(
                "tree_noise must be within [0, 1), got {}",
                engine.forest.tree_noise
            )));
        }
        if let Selection::Softmax { temperature } = engine.selection {
            if !(temperature.is_finite() && temperature > 0.0) {
                return Err(Error::invalid_config(format!(
                    "softmax temperature must be positive, got {temperature}"
                )));
            }
        }

        self.episode.validate()
    }
}
