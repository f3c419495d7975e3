//! On-disk artifact formats written by the offline trainer.
//!
//! Each artifact is a JSON object keyed by state-key strings. A document that
//! is not valid JSON (or not an object) fails as a whole; individual rows with
//! an unparseable key or value are skipped and counted.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::tables::{
    ActionValueRow, BehaviorCloningEntry, CloningKey, ImitationEntry, PolicyTable,
    RewardGradientEntry,
};
use crate::grid::{Action, Coordinate};
use crate::state::StateKey;

/// A parsed table plus the number of rows that were dropped.
#[derive(Debug, Clone)]
pub struct ParsedTable<K, V> {
    pub entries: HashMap<K, V>,
    pub skipped: usize,
}

fn parse_rows<K, R, V>(
    text: &str,
    parse_key: impl Fn(&str) -> Option<K>,
    convert: impl Fn(R) -> Option<V>,
) -> serde_json::Result<ParsedTable<K, V>>
where
    K: std::hash::Hash + Eq,
    R: DeserializeOwned,
{
    let raw: HashMap<String, Value> = serde_json::from_str(text)?;
    Ok(collect_rows(raw, parse_key, convert))
}

fn collect_rows<K, R, V>(
    raw: HashMap<String, Value>,
    parse_key: impl Fn(&str) -> Option<K>,
    convert: impl Fn(R) -> Option<V>,
) -> ParsedTable<K, V>
where
    K: std::hash::Hash + Eq,
    R: DeserializeOwned,
{
    let mut entries = HashMap::with_capacity(raw.len());
    let mut skipped = 0;

    for (key, value) in raw {
        let row = parse_key(&key).and_then(|k| {
            serde_json::from_value::<R>(value)
                .ok()
                .and_then(&convert)
                .map(|v| (k, v))
        });
        match row {
            Some((k, v)) => {
                entries.insert(k, v);
            }
            None => {
                log::debug!("skipping malformed artifact row '{key}'");
                skipped += 1;
            }
        }
    }

    ParsedTable { entries, skipped }
}

fn state_key(s: &str) -> Option<StateKey> {
    s.parse().ok()
}

/// Per-action counts keyed by trainer action number (`"1"`..`"4"`) or name.
fn counts_by_action(map: &HashMap<String, f64>) -> Option<[f64; 4]> {
    let mut counts = [0.0; 4];
    let mut seen = false;
    for (name, value) in map {
        let action = match name.as_str() {
            "up" => Some(Action::Up),
            "right" => Some(Action::Right),
            "down" => Some(Action::Down),
            "left" => Some(Action::Left),
            other => other.parse::<i64>().ok().and_then(Action::from_code),
        };
        if let Some(action) = action {
            counts[action.index()] = *value;
            seen = true;
        }
    }
    seen.then_some(counts)
}

/// Parses the action-value table: `key -> [reserved, up, right, down, left]`.
pub fn parse_action_values(
    text: &str,
) -> serde_json::Result<ParsedTable<StateKey, ActionValueRow>> {
    parse_rows(text, state_key, |values: Vec<f64>| {
        ActionValueRow::from_values(&values)
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawImitation {
    Single(i64),
    Counts(HashMap<String, f64>),
}

/// Parses the imitation table: `key -> action` or `key -> {"1": n, ...}`.
pub fn parse_imitation(text: &str) -> serde_json::Result<ParsedTable<StateKey, ImitationEntry>> {
    parse_rows(text, state_key, |raw: RawImitation| match raw {
        RawImitation::Single(code) => Action::from_code(code).map(ImitationEntry::Single),
        RawImitation::Counts(map) => {
            let counts = counts_by_action(&map)?;
            if counts.iter().any(|c| *c < 0.0 || !c.is_finite()) {
                return None;
            }
            Some(ImitationEntry::Frequencies(counts.map(|c| c.round() as u32)))
        }
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCloning {
    Probabilities {
        up: f64,
        right: f64,
        down: f64,
        left: f64,
        #[serde(default)]
        samples: u32,
    },
    Counts(HashMap<String, f64>),
}

fn cloning_entry(raw: RawCloning) -> Option<BehaviorCloningEntry> {
    match raw {
        RawCloning::Probabilities {
            up,
            right,
            down,
            left,
            samples,
        } => {
            let weights = [up, right, down, left];
            weights
                .iter()
                .all(|w| w.is_finite() && *w >= 0.0)
                .then_some(BehaviorCloningEntry { weights, samples })
        }
        RawCloning::Counts(map) => BehaviorCloningEntry::from_counts(counts_by_action(&map)?),
    }
}

fn cloning_key(s: &str) -> Option<CloningKey> {
    s.parse().ok()
}

/// Parses the behaviour-cloning table.
///
/// Accepts probability rows (`{"up","right","down","left","samples"}`) and
/// raw count rows (`{"1": n, "2": n, "3": n, "4": n}`), which are normalized.
/// Keys are either state tuples or bare `up,down,right,left` surroundings.
pub fn parse_behavior_cloning(
    text: &str,
) -> serde_json::Result<ParsedTable<CloningKey, BehaviorCloningEntry>> {
    parse_rows(text, cloning_key, cloning_entry)
}

#[derive(Deserialize)]
struct EmbeddedCloning {
    #[serde(default)]
    bc_policy: HashMap<String, Value>,
}

/// Reads the behaviour-cloning table nested as `bc_policy` in a
/// parameter-summary document. A summary without one yields an empty table.
pub fn parse_embedded_cloning(
    text: &str,
) -> serde_json::Result<ParsedTable<CloningKey, BehaviorCloningEntry>> {
    let embedded: EmbeddedCloning = serde_json::from_str(text)?;
    Ok(collect_rows(embedded.bc_policy, cloning_key, cloning_entry))
}

#[derive(Deserialize)]
struct RawReward {
    avg: f64,
    max: f64,
    min: f64,
    count: u32,
}

/// Parses the reward-gradient table: `key -> {"avg","max","min","count"}`.
pub fn parse_reward_gradient(
    text: &str,
) -> serde_json::Result<ParsedTable<StateKey, RewardGradientEntry>> {
    parse_rows(text, state_key, |raw: RawReward| {
        Some(RewardGradientEntry {
            avg: raw.avg,
            min: raw.min,
            max: raw.max,
            count: raw.count,
        })
    })
}

/// Parses `"(x, y)"` into a coordinate.
fn coordinate_key(s: &str) -> Option<Coordinate> {
    let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (x, z) = inner.split_once(',')?;
    Some(Coordinate::new(x.trim().parse().ok()?, z.trim().parse().ok()?))
}

/// Parses the goal-positions artifact: `"(x, y)" -> times reached`.
pub fn parse_goal_positions(text: &str) -> serde_json::Result<ParsedTable<Coordinate, u32>> {
    parse_rows(text, coordinate_key, Some)
}

/// Convenience used by tests and callers building tables in memory.
pub fn table_from<V>(rows: impl IntoIterator<Item = (StateKey, V)>) -> PolicyTable<V> {
    rows.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileType;

    #[test]
    fn action_values_with_reserved_slot() {
        let text = r#"{"(0, 0, 1, 1, 0, 1, 0)": [0, 10.0, -5, -5, -5]}"#;
        let parsed = parse_action_values(text).unwrap();
        assert_eq!(parsed.skipped, 0);
        let key: StateKey = "(0, 0, 1, 1, 0, 1, 0)".parse().unwrap();
        assert_eq!(parsed.entries[&key].get(Action::Up), 10.0);
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let text = r#"{
            "(1, 1, 1, 1, 1)": [0, 1, 2, 3, 4],
            "not a key": [0, 1, 2, 3, 4],
            "(1, 1, 1, 1, 0)": "oops",
            "(1, 1, 1, 0, 0)": [1]
        }"#;
        let parsed = parse_action_values(text).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn malformed_document_fails() {
        assert!(parse_action_values("[1, 2, 3]").is_err());
        assert!(parse_reward_gradient("{ not json").is_err());
    }

    #[test]
    fn imitation_single_and_counts() {
        let text = r#"{"(1, 1, 1, 1, 1)": 2, "(1, 0, 1, 1, 1)": {"1": 3, "2": 0, "3": 1, "4": 0}, "(1, 1, 0, 1, 1)": 7}"#;
        let parsed = parse_imitation(text).unwrap();
        assert_eq!(parsed.skipped, 1);
        let single: StateKey = "(1, 1, 1, 1, 1)".parse().unwrap();
        assert_eq!(parsed.entries[&single], ImitationEntry::Single(Action::Right));
        let counted: StateKey = "(1, 0, 1, 1, 1)".parse().unwrap();
        assert_eq!(
            parsed.entries[&counted],
            ImitationEntry::Frequencies([3, 0, 1, 0])
        );
    }

    #[test]
    fn cloning_accepts_probabilities_and_counts() {
        let text = r#"{
            "(1, 1, 0, 1, 0)": {"up": 0.5, "right": 0.25, "down": 0.0, "left": 0.25, "samples": 4},
            "(1, 0, 1, 1, 0)": {"1": 0, "2": 6, "3": 2, "4": 0}
        }"#;
        let parsed = parse_behavior_cloning(text).unwrap();
        assert_eq!(parsed.skipped, 0);
        let probs: CloningKey = "(1, 1, 0, 1, 0)".parse().unwrap();
        assert_eq!(parsed.entries[&probs].samples, 4);
        let counts: CloningKey = "(1, 0, 1, 1, 0)".parse().unwrap();
        let entry = parsed.entries[&counts];
        assert_eq!(entry.samples, 8);
        assert!((entry.weights[Action::Right.index()] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn cloning_accepts_surroundings_keys() {
        let text = r#"{
            "1,0,1,0": {"up": 0.7, "right": 0.1, "down": 0.1, "left": 0.1, "samples": 30},
            "1,0,1": {"up": 1.0, "right": 0.0, "down": 0.0, "left": 0.0, "samples": 1}
        }"#;
        let parsed = parse_behavior_cloning(text).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.skipped, 1);

        let key: CloningKey = "1,0,1,0".parse().unwrap();
        let entry = parsed.entries[&key];
        assert_eq!(entry.samples, 30);
        assert_eq!(entry.weights[Action::Up.index()], 0.7);
    }

    #[test]
    fn embedded_cloning_from_model_data() {
        let text = r#"{
            "version": "1.0",
            "estimated_goal": {"x": 0, "y": 24, "known": true},
            "bc_policy": {
                "1,0,1,0": {"up": 0.7, "right": 0.1, "down": 0.1, "left": 0.1, "samples": 30},
                "1,1,0,0": {"up": 0.0, "right": 0.0, "down": 1.0, "left": 0.0, "samples": 2}
            }
        }"#;
        let parsed = parse_embedded_cloning(text).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.skipped, 0);

        let bare = parse_embedded_cloning(r#"{"estimated_goal": "unknown"}"#).unwrap();
        assert!(bare.entries.is_empty());
    }

    #[test]
    fn reward_gradient_rows() {
        let text = r#"{"(2, 1, 1, 1, 1)": {"avg": 1000.0, "max": 1000.0, "min": 1000.0, "count": 3}}"#;
        let parsed = parse_reward_gradient(text).unwrap();
        let entry = parsed.entries.values().next().unwrap();
        assert_eq!(entry.count, 3);
        assert_eq!(entry.avg, 1000.0);
        let key = parsed.entries.keys().next().unwrap();
        assert_eq!(key.neighborhood.center, TileType::Goal);
    }

    #[test]
    fn goal_positions_keys() {
        let parsed = parse_goal_positions(r#"{"(0, 24)": 5, "(-1, 24)": 2, "bad": 1}"#).unwrap();
        assert_eq!(parsed.entries[&Coordinate::new(0, 24)], 5);
        assert_eq!(parsed.entries[&Coordinate::new(-1, 24)], 2);
        assert_eq!(parsed.skipped, 1);
    }
}
