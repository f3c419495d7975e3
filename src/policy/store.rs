//! Fail-soft loading of every policy artifact.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::artifacts::{self, ParsedTable};
use super::parameters::ParameterSummary;
use super::tables::{
    ActionValueRow, BehaviorCloningTable, ImitationEntry, PolicyTable, RewardGradientEntry,
};
use crate::error::{Error, Result};
use crate::grid::Coordinate;
use crate::state::StateKey;

/// The independently loadable artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    ActionValue,
    Imitation,
    BehaviorCloning,
    RewardGradient,
    GoalPositions,
    ParameterSummary,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::ActionValue,
        ArtifactKind::Imitation,
        ArtifactKind::BehaviorCloning,
        ArtifactKind::RewardGradient,
        ArtifactKind::GoalPositions,
        ArtifactKind::ParameterSummary,
    ];

    /// File name the trainer writes this artifact under.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            ArtifactKind::ActionValue => "ai-model_q_table.json",
            ArtifactKind::Imitation => "ai-model_il_policy.json",
            ArtifactKind::BehaviorCloning => "bc_policy.json",
            ArtifactKind::RewardGradient => "reward_gradient.json",
            ArtifactKind::GoalPositions => "goal_positions.json",
            ArtifactKind::ParameterSummary => "model_data.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::ActionValue => "action-value",
            ArtifactKind::Imitation => "imitation",
            ArtifactKind::BehaviorCloning => "behavior-cloning",
            ArtifactKind::RewardGradient => "reward-gradient",
            ArtifactKind::GoalPositions => "goal-positions",
            ArtifactKind::ParameterSummary => "parameter-summary",
        };
        f.write_str(name)
    }
}

/// Outcome of loading one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// No path was configured.
    Absent,
    Loaded { entries: usize, skipped: usize },
    NotFound,
    ParseError(String),
}

impl ArtifactStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ArtifactStatus::Loaded { .. })
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactStatus::Absent => write!(f, "absent"),
            ArtifactStatus::Loaded { entries, skipped } => {
                write!(f, "loaded {entries} entries ({skipped} skipped)")
            }
            ArtifactStatus::NotFound => write!(f, "not found"),
            ArtifactStatus::ParseError(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

/// Where each artifact lives. `None` means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub action_values: Option<PathBuf>,
    pub imitation: Option<PathBuf>,
    pub behavior_cloning: Option<PathBuf>,
    pub reward_gradient: Option<PathBuf>,
    pub goal_positions: Option<PathBuf>,
    pub parameter_summary: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Every artifact under `dir` with the trainer's default file names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let at = |kind: ArtifactKind| Some(dir.join(kind.default_file_name()));
        Self {
            action_values: at(ArtifactKind::ActionValue),
            imitation: at(ArtifactKind::Imitation),
            behavior_cloning: at(ArtifactKind::BehaviorCloning),
            reward_gradient: at(ArtifactKind::RewardGradient),
            goal_positions: at(ArtifactKind::GoalPositions),
            parameter_summary: at(ArtifactKind::ParameterSummary),
        }
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&Path> {
        match kind {
            ArtifactKind::ActionValue => self.action_values.as_deref(),
            ArtifactKind::Imitation => self.imitation.as_deref(),
            ArtifactKind::BehaviorCloning => self.behavior_cloning.as_deref(),
            ArtifactKind::RewardGradient => self.reward_gradient.as_deref(),
            ArtifactKind::GoalPositions => self.goal_positions.as_deref(),
            ArtifactKind::ParameterSummary => self.parameter_summary.as_deref(),
        }
    }
}

/// Per-artifact diagnostics from [`PolicyStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    statuses: Vec<(ArtifactKind, ArtifactStatus)>,
}

impl Default for LoadReport {
    fn default() -> Self {
        Self {
            statuses: ArtifactKind::ALL
                .iter()
                .map(|k| (*k, ArtifactStatus::Absent))
                .collect(),
        }
    }
}

impl LoadReport {
    pub fn status(&self, kind: ArtifactKind) -> &ArtifactStatus {
        self.statuses
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, s)| s)
            .unwrap_or(&ArtifactStatus::Absent)
    }

    fn record(&mut self, kind: ArtifactKind, status: ArtifactStatus) {
        if let Some(slot) = self.statuses.iter_mut().find(|(k, _)| *k == kind) {
            slot.1 = status;
        }
    }

    /// True if at least one artifact loaded.
    pub fn any_loaded(&self) -> bool {
        self.statuses.iter().any(|(_, s)| s.is_loaded())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &ArtifactStatus)> {
        self.statuses.iter().map(|(k, s)| (*k, s))
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, status) in self.iter() {
            writeln!(f, "{kind:>18}: {status}")?;
        }
        Ok(())
    }
}

/// Read-only holder of every offline-learned table.
///
/// Any table may be empty. The store is filled once per session and never
/// mutated while ticking.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    action_values: PolicyTable<ActionValueRow>,
    imitation: PolicyTable<ImitationEntry>,
    behavior_cloning: BehaviorCloningTable,
    reward_gradient: PolicyTable<RewardGradientEntry>,
    goal_positions: HashMap<Coordinate, u32>,
    summary: Option<ParameterSummary>,
}

fn read_artifact(kind: ArtifactKind, path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => Error::ArtifactNotFound {
            kind,
            path: path.to_path_buf(),
        },
        _ => Error::Io {
            operation: format!("read {kind} artifact {}", path.display()),
            source,
        },
    })
}

fn parse_error(kind: ArtifactKind, path: &Path, err: serde_json::Error) -> Error {
    Error::ArtifactParse {
        kind,
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Loads one table, reporting instead of failing.
fn load_table<K, V>(
    kind: ArtifactKind,
    path: Option<&Path>,
    parse: impl Fn(&str) -> serde_json::Result<ParsedTable<K, V>>,
    report: &mut LoadReport,
) -> HashMap<K, V> {
    let Some(path) = path else {
        return HashMap::new();
    };

    let parsed = read_artifact(kind, path)
        .and_then(|text| parse(&text).map_err(|e| parse_error(kind, path, e)));

    match parsed {
        Ok(table) => {
            log::info!(
                "loaded {kind} artifact: {} entries, {} skipped",
                table.entries.len(),
                table.skipped
            );
            report.record(
                kind,
                ArtifactStatus::Loaded {
                    entries: table.entries.len(),
                    skipped: table.skipped,
                },
            );
            table.entries
        }
        Err(err) => {
            log::warn!("{err}");
            report.record(kind, status_for(err));
            HashMap::new()
        }
    }
}

fn status_for(err: Error) -> ArtifactStatus {
    match err {
        Error::ArtifactNotFound { .. } => ArtifactStatus::NotFound,
        Error::ArtifactParse { message, .. } => ArtifactStatus::ParseError(message),
        other => ArtifactStatus::ParseError(other.to_string()),
    }
}

impl PolicyStore {
    /// Loads every configured artifact.
    ///
    /// Never fails: a missing or malformed artifact leaves its table empty
    /// and is recorded in the returned [`LoadReport`].
    pub fn load(paths: &ArtifactPaths) -> (Self, LoadReport) {
        let mut report = LoadReport::default();

        let action_values = load_table(
            ArtifactKind::ActionValue,
            paths.get(ArtifactKind::ActionValue),
            artifacts::parse_action_values,
            &mut report,
        );
        let imitation = load_table(
            ArtifactKind::Imitation,
            paths.get(ArtifactKind::Imitation),
            artifacts::parse_imitation,
            &mut report,
        );
        let mut behavior_cloning: BehaviorCloningTable = load_table(
            ArtifactKind::BehaviorCloning,
            paths.get(ArtifactKind::BehaviorCloning),
            artifacts::parse_behavior_cloning,
            &mut report,
        )
        .into_iter()
        .collect();
        let reward_gradient = load_table(
            ArtifactKind::RewardGradient,
            paths.get(ArtifactKind::RewardGradient),
            artifacts::parse_reward_gradient,
            &mut report,
        );
        let goal_positions = load_table(
            ArtifactKind::GoalPositions,
            paths.get(ArtifactKind::GoalPositions),
            artifacts::parse_goal_positions,
            &mut report,
        );
        let summary = paths
            .get(ArtifactKind::ParameterSummary)
            .and_then(|path| Self::load_summary(path, &mut report));
        let summary = summary.map(|(summary, embedded)| {
            // Rows from the dedicated file win over the summary's copy.
            behavior_cloning.fill_from(embedded);
            summary
        });

        let store = Self {
            action_values,
            imitation,
            behavior_cloning,
            reward_gradient,
            goal_positions,
            summary,
        };
        (store, report)
    }

    /// Loads the summary and any behaviour-cloning table nested in it.
    fn load_summary(
        path: &Path,
        report: &mut LoadReport,
    ) -> Option<(ParameterSummary, BehaviorCloningTable)> {
        let kind = ArtifactKind::ParameterSummary;
        let parsed = read_artifact(kind, path).and_then(|text| {
            let summary = ParameterSummary::from_json(&text);
            let embedded = artifacts::parse_embedded_cloning(&text);
            summary
                .and_then(|summary| embedded.map(|cloning| (summary, cloning)))
                .map_err(|e| parse_error(kind, path, e))
        });
        match parsed {
            Ok((summary, cloning)) => {
                log::info!(
                    "loaded {kind} artifact: goal {:?}, {} danger zones, {} embedded cloning rows ({} skipped)",
                    summary.estimated_goal,
                    summary.danger_zones.len(),
                    cloning.entries.len(),
                    cloning.skipped
                );
                report.record(
                    kind,
                    ArtifactStatus::Loaded {
                        entries: 1,
                        skipped: 0,
                    },
                );
                Some((summary, cloning.entries.into_iter().collect()))
            }
            Err(err) => {
                log::warn!("{err}");
                report.record(kind, status_for(err));
                None
            }
        }
    }

    pub fn with_action_values(mut self, table: PolicyTable<ActionValueRow>) -> Self {
        self.action_values = table;
        self
    }

    pub fn with_imitation(mut self, table: PolicyTable<ImitationEntry>) -> Self {
        self.imitation = table;
        self
    }

    pub fn with_behavior_cloning(mut self, table: impl Into<BehaviorCloningTable>) -> Self {
        self.behavior_cloning = table.into();
        self
    }

    pub fn with_reward_gradient(mut self, table: PolicyTable<RewardGradientEntry>) -> Self {
        self.reward_gradient = table;
        self
    }

    pub fn with_goal_positions(mut self, goals: HashMap<Coordinate, u32>) -> Self {
        self.goal_positions = goals;
        self
    }

    pub fn with_summary(mut self, summary: ParameterSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn action_values(&self) -> &PolicyTable<ActionValueRow> {
        &self.action_values
    }

    pub fn imitation(&self) -> &PolicyTable<ImitationEntry> {
        &self.imitation
    }

    pub fn behavior_cloning(&self) -> &BehaviorCloningTable {
        &self.behavior_cloning
    }

    pub fn reward_gradient(&self) -> &PolicyTable<RewardGradientEntry> {
        &self.reward_gradient
    }

    pub fn goal_positions(&self) -> &HashMap<Coordinate, u32> {
        &self.goal_positions
    }

    pub fn summary(&self) -> Option<&ParameterSummary> {
        self.summary.as_ref()
    }

    /// The loaded summary, or trainer defaults when none was loaded.
    pub fn summary_or_default(&self) -> ParameterSummary {
        self.summary.clone().unwrap_or_default()
    }

    /// True if no artifact contributed any data.
    pub fn is_empty(&self) -> bool {
        self.action_values.is_empty()
            && self.imitation.is_empty()
            && self.behavior_cloning.is_empty()
            && self.reward_gradient.is_empty()
            && self.goal_positions.is_empty()
            && self.summary.is_none()
    }

    /// Every state key present in any table.
    pub fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.action_values
            .keys()
            .chain(self.imitation.keys())
            .chain(self.behavior_cloning.state_keys())
            .chain(self.reward_gradient.keys())
    }
}
