//! Typed policy table rows.
//!
//! Every table maps a [`StateKey`](crate::state::StateKey) to one of the
//! record types below. Arrays indexed per action use [`Action::index`] order.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::Error;
use crate::grid::Action;
use crate::state::{StateKey, SurroundingsKey};

/// Entries with magnitude at or below this are treated as "never trained".
pub const SIGNAL_EPSILON: f64 = 1e-6;

/// Exact-match table keyed by state.
pub type PolicyTable<V> = HashMap<StateKey, V>;

/// Action values for the four moves of one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionValueRow(pub [f64; 4]);

impl ActionValueRow {
    /// Builds a row from a trainer value list.
    ///
    /// Five values: index 0 is reserved and ignored. Four values: taken as-is.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let four = match values.len() {
            4 => values,
            n if n >= 5 => &values[1..5],
            _ => return None,
        };
        if four.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(Self([four[0], four[1], four[2], four[3]]))
    }

    pub fn get(&self, action: Action) -> f64 {
        self.0[action.index()]
    }

    /// False for an all-near-zero row: no signal, not "all moves equally bad".
    pub fn has_signal(&self) -> bool {
        self.0.iter().any(|v| v.abs() > SIGNAL_EPSILON)
    }

    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.0.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// Imitation-policy entry: a single recommendation or per-action counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImitationEntry {
    Single(Action),
    Frequencies([u32; 4]),
}

impl ImitationEntry {
    /// Per-action counts; a single recommendation counts once.
    pub fn counts(&self) -> [u32; 4] {
        match self {
            ImitationEntry::Single(action) => {
                let mut counts = [0; 4];
                counts[action.index()] = 1;
                counts
            }
            ImitationEntry::Frequencies(counts) => *counts,
        }
    }

    /// Normalized consensus distribution, or `None` when no action was counted.
    pub fn distribution(&self) -> Option<[f64; 4]> {
        let counts = self.counts();
        let total: u32 = counts.iter().sum();
        (total > 0).then(|| counts.map(|c| f64::from(c) / f64::from(total)))
    }
}

/// Behaviour-cloning entry: per-action weights plus the demonstration count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorCloningEntry {
    pub weights: [f64; 4],
    pub samples: u32,
}

impl BehaviorCloningEntry {
    /// Builds an entry from raw per-action counts.
    pub fn from_counts(counts: [f64; 4]) -> Option<Self> {
        if counts.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return None;
        }
        let total: f64 = counts.iter().sum();
        if total <= 0.0 {
            return None;
        }
        Some(Self {
            weights: counts.map(|c| c / total),
            samples: total.round() as u32,
        })
    }

    /// Confidence multiplier in `[0, 1]`, saturating at `saturation` samples.
    pub fn confidence(&self, saturation: f64) -> f64 {
        if saturation <= 0.0 {
            return 1.0;
        }
        (f64::from(self.samples) / saturation).min(1.0)
    }
}

/// Row key of a behaviour-cloning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloningKey {
    /// Full tuple key, `(env, up, down, right, left)` or positioned.
    State(StateKey),
    /// Bare `up,down,right,left` key.
    Surroundings(SurroundingsKey),
}

impl FromStr for CloningKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim_start().starts_with('(') {
            s.parse().map(CloningKey::State)
        } else {
            s.parse().map(CloningKey::Surroundings)
        }
    }
}

/// Behaviour-cloning rows under either key form.
///
/// Lookups try the exact state key first and fall back to its surroundings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BehaviorCloningTable {
    exact: PolicyTable<BehaviorCloningEntry>,
    surroundings: HashMap<SurroundingsKey, BehaviorCloningEntry>,
}

impl BehaviorCloningTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: CloningKey, entry: BehaviorCloningEntry) {
        match key {
            CloningKey::State(key) => {
                self.exact.insert(key, entry);
            }
            CloningKey::Surroundings(key) => {
                self.surroundings.insert(key, entry);
            }
        }
    }

    /// Entry for `key`, or for its four surrounding tiles.
    pub fn get(&self, key: &StateKey) -> Option<&BehaviorCloningEntry> {
        self.exact
            .get(key)
            .or_else(|| self.surroundings.get(&key.neighborhood.surroundings()))
    }

    /// Adds every row of `other` whose key is not already present.
    pub fn fill_from(&mut self, other: BehaviorCloningTable) {
        for (key, entry) in other.exact {
            self.exact.entry(key).or_insert(entry);
        }
        for (key, entry) in other.surroundings {
            self.surroundings.entry(key).or_insert(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.surroundings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.surroundings.is_empty()
    }

    /// Full state keys only; surroundings rows carry no position.
    pub fn state_keys(&self) -> impl Iterator<Item = &StateKey> {
        self.exact.keys()
    }
}

impl From<PolicyTable<BehaviorCloningEntry>> for BehaviorCloningTable {
    fn from(exact: PolicyTable<BehaviorCloningEntry>) -> Self {
        Self {
            exact,
            surroundings: HashMap::new(),
        }
    }
}

impl FromIterator<(CloningKey, BehaviorCloningEntry)> for BehaviorCloningTable {
    fn from_iter<I: IntoIterator<Item = (CloningKey, BehaviorCloningEntry)>>(rows: I) -> Self {
        let mut table = Self::new();
        for (key, entry) in rows {
            table.insert(key, entry);
        }
        table
    }
}

/// Observed reward statistics reachable from one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardGradientEntry {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: u32,
}
