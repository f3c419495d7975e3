//! Episode and session reporting.

use std::fmt;

use crate::grid::Coordinate;

/// How a single episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeOutcome {
    Goal,
    Fallen,
    TimedOut,
}

/// Reported once per finished episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeSummary {
    /// 1-based attempt number.
    pub attempt: u32,
    pub outcome: EpisodeOutcome,
    /// Moves decided; trap displacements are not counted.
    pub steps: u32,
    /// Tile the episode ended on.
    pub final_position: Coordinate,
    /// Traps fired during the episode, across every chain.
    pub trap_triggers: u32,
}

/// Reported exactly once when the session terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The episode budget of goals was reached.
    Succeeded { goals: u32, attempts: u32 },
    /// Attempts ran out first.
    Failed {
        goals: u32,
        failures: u32,
        attempts: u32,
    },
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Succeeded { .. })
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Succeeded { goals, attempts } => {
                write!(f, "succeeded: {goals} goal(s) in {attempts} attempt(s)")
            }
            SessionOutcome::Failed {
                goals,
                failures,
                attempts,
            } => write!(
                f,
                "failed: {failures} failure(s), {goals} goal(s) in {attempts} attempt(s)"
            ),
        }
    }
}

/// Receives episode and session reports.
pub trait EpisodeObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary);
    fn on_session_end(&mut self, outcome: &SessionOutcome);
}

/// Observer that keeps every report in memory.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    /// Episode summaries in the order they finished.
    pub episodes: Vec<EpisodeSummary>,
    /// Session outcomes; one per terminated session.
    pub sessions: Vec<SessionOutcome>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, outcome: EpisodeOutcome) -> usize {
        self.episodes.iter().filter(|e| e.outcome == outcome).count()
    }
}

impl EpisodeObserver for EventLog {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        self.episodes.push(summary.clone());
    }

    fn on_session_end(&mut self, outcome: &SessionOutcome) {
        self.sessions.push(*outcome);
    }
}
