//! Derives map knowledge and an estimated goal from loaded policy tables.

use std::cmp::Ordering;

use serde::Deserialize;

use super::map::MapMemory;
use crate::config::InferenceConfig;
use crate::grid::Coordinate;
use crate::policy::{ParameterSummary, PolicyStore};

/// Whether the live stage is the one the tables were trained on or its
/// left-right reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageVariant {
    #[default]
    Normal,
    Mirrored,
}

/// Which evidence produced the estimated goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalSource {
    ActionValues,
    RewardGradient,
    Summary,
    GoalPositions,
}

/// Everything the engine knows about the maze beyond live tile queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapKnowledge {
    pub memory: MapMemory,
    pub goal: Option<Coordinate>,
    pub goal_source: Option<GoalSource>,
}

impl MapKnowledge {
    /// Knowledge adjusted for the given stage variant.
    pub fn for_stage(&self, stage: StageVariant) -> Self {
        match stage {
            StageVariant::Normal => self.clone(),
            StageVariant::Mirrored => Self {
                memory: self.memory.mirrored(),
                goal: self.goal.map(|g| g.mirrored()),
                goal_source: self.goal_source,
            },
        }
    }
}

/// Keeps the strongest candidate; equal scores go to the smallest coordinate.
fn better(candidate: (Coordinate, f64), best: Option<(Coordinate, f64)>) -> bool {
    match best {
        None => true,
        Some((at, score)) => match candidate.1.partial_cmp(&score) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => candidate.0 < at,
            _ => false,
        },
    }
}

/// Builds map knowledge from every position-bearing key in the store.
///
/// Tile observations are merged by priority, so the result does not depend
/// on table iteration order. The goal comes from the first source with a
/// candidate: action values, reward averages, the summary, then the most
/// frequently reached goal position.
pub fn infer(
    store: &PolicyStore,
    summary: &ParameterSummary,
    config: &InferenceConfig,
) -> MapKnowledge {
    let mut memory = MapMemory::new();
    for key in store.keys() {
        memory.observe_all(key.observations());
    }

    for zone in &summary.danger_zones {
        memory.mark_danger(*zone);
    }

    let mut from_values: Option<(Coordinate, f64)> = None;
    for (key, row) in store.action_values() {
        let Some(at) = key.position else { continue };
        if row.min() < -config.hole_threshold {
            memory.mark_danger(at);
        } else if row.max() > config.success_threshold && better((at, row.max()), from_values) {
            from_values = Some((at, row.max()));
        }
    }

    let mut from_rewards: Option<(Coordinate, f64)> = None;
    for (key, entry) in store.reward_gradient() {
        let Some(at) = key.position else { continue };
        if entry.count > 0 && entry.avg > config.success_threshold && better((at, entry.avg), from_rewards)
        {
            from_rewards = Some((at, entry.avg));
        }
    }

    let mut from_positions: Option<(Coordinate, f64)> = None;
    for (at, count) in store.goal_positions() {
        if *count > 0 && better((*at, f64::from(*count)), from_positions) {
            from_positions = Some((*at, f64::from(*count)));
        }
    }

    let (goal, goal_source) = if let Some((at, _)) = from_values {
        (Some(at), Some(GoalSource::ActionValues))
    } else if let Some((at, _)) = from_rewards {
        (Some(at), Some(GoalSource::RewardGradient))
    } else if let Some(at) = summary.estimated_goal {
        (Some(at), Some(GoalSource::Summary))
    } else if let Some((at, _)) = from_positions {
        (Some(at), Some(GoalSource::GoalPositions))
    } else {
        (None, None)
    };

    if let Some(at) = goal {
        memory.mark_goal(at);
        log::info!("estimated goal {at} from {goal_source:?}");
    }
    log::debug!(
        "inferred {} tiles, {} danger zones",
        memory.len(),
        memory.danger_count()
    );

    MapKnowledge {
        memory,
        goal,
        goal_source,
    }
}
