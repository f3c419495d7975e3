//! A single agent run: engine, episode controller and load report together.
//!
//! # Example
//!
//! ```no_run
//! use tilepilot::config::SessionConfig;
//! use tilepilot::episode::EventLog;
//! use tilepilot::grid::{Coordinate, TileGrid};
//! use tilepilot::session::Session;
//!
//! let config = SessionConfig::from_json_file("session.json")?;
//! let mut session = Session::load(config)?;
//! let maze = TileGrid::from_rows(Coordinate::new(-2, 0), &["##G##", "#####"])?;
//! let mut log = EventLog::new();
//! let outcome = session.run(&maze, &mut log, 10_000);
//! println!("{outcome:?}");
//! # Ok::<(), tilepilot::error::Error>(())
//! ```

use uuid::Uuid;

use crate::config::SessionConfig;
use crate::engine::DecisionEngine;
use crate::episode::{
    EpisodeController, EpisodeObserver, InstantMotion, MotionDriver, SessionOutcome, TickOutcome,
};
use crate::error::Result;
use crate::grid::GridEnvironment;
use crate::policy::{LoadReport, PolicyStore};
use crate::state::StateEncoder;

/// Everything one agent needs between ticks. Passed explicitly; nothing is
/// global.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    engine: DecisionEngine,
    controller: EpisodeController,
    report: LoadReport,
}

impl Session {
    /// Validates `config`, loads every configured artifact and builds the
    /// engine and controller.
    ///
    /// Missing or malformed artifacts do not fail the call; they show up in
    /// [`report`](Self::report) and the engine falls back past them. Only an
    /// invalid configuration is an error.
    pub fn load(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let (store, report) = PolicyStore::load(&config.artifacts);
        if !report.any_loaded() {
            log::warn!("no policy artifacts loaded; using fallback scoring only");
        }
        Self::assemble(config, store, report)
    }

    /// Builds a session around an already populated store.
    pub fn from_store(config: SessionConfig, store: PolicyStore) -> Result<Self> {
        config.validate()?;
        Self::assemble(config, store, LoadReport::default())
    }

    fn assemble(config: SessionConfig, store: PolicyStore, report: LoadReport) -> Result<Self> {
        let SessionConfig {
            encoding,
            stage,
            seed,
            engine,
            episode,
            inference,
            ..
        } = config;

        let mut engine = DecisionEngine::new(engine, StateEncoder::new(encoding), seed)
            .with_inference(inference);
        engine.install(store);
        engine.set_stage(stage);

        // Separate stream so start offsets don't shift the engine's draws.
        let controller = EpisodeController::new(episode, seed.map(|s| s.wrapping_add(1)))?;

        let id = Uuid::new_v4();
        log::info!(
            "session {id} ready: policy '{}', goal {:?}",
            crate::engine::Policy::name(&engine),
            engine.knowledge().goal
        );
        Ok(Self {
            id,
            engine,
            controller,
            report,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut DecisionEngine {
        &mut self.engine
    }

    pub fn controller(&self) -> &EpisodeController {
        &self.controller
    }

    /// Outcome once the session has terminated.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.controller.outcome()
    }

    /// One think-tick. The host must call [`complete_motion`](Self::complete_motion)
    /// when `motion` finishes a started move.
    pub fn tick(
        &mut self,
        env: &dyn GridEnvironment,
        motion: &mut dyn MotionDriver,
        observer: &mut dyn EpisodeObserver,
    ) -> TickOutcome {
        self.controller.tick(env, &mut self.engine, motion, observer)
    }

    pub fn complete_motion(&mut self) {
        self.controller.complete_motion();
    }

    /// Abandons the current attempt; the next tick resets.
    pub fn cancel(&mut self) {
        log::debug!("session {} cancelled", self.id);
        self.controller.cancel();
    }

    /// Runs headless until the session terminates or `max_ticks` elapse,
    /// completing every motion as soon as it starts.
    ///
    /// Returns `None` if the tick limit was hit first.
    pub fn run(
        &mut self,
        env: &dyn GridEnvironment,
        observer: &mut dyn EpisodeObserver,
        max_ticks: usize,
    ) -> Option<SessionOutcome> {
        let mut motion = InstantMotion::new();
        for _ in 0..max_ticks {
            match self.tick(env, &mut motion, observer) {
                TickOutcome::SessionEnded(outcome) => return Some(outcome),
                TickOutcome::Terminated => return self.outcome(),
                _ => self.complete_motion(),
            }
        }
        log::warn!(
            "session {} stopped after {max_ticks} ticks without terminating",
            self.id
        );
        self.outcome()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;
    use crate::config::{EngineConfig, EpisodeConfig};
    use crate::episode::{EpisodeOutcome, EventLog};
    use crate::grid::{Coordinate, TileGrid};
    use crate::policy::{ArtifactKind, ArtifactPaths, ArtifactStatus};

    fn quiet_config() -> SessionConfig {
        SessionConfig {
            seed: Some(3),
            engine: EngineConfig {
                exploration_rate: 0.0,
                ..EngineConfig::default()
            },
            episode: EpisodeConfig {
                start: Coordinate::new(0, 0),
                start_offset_min: 0,
                start_offset_max: 0,
                ..EpisodeConfig::default()
            },
            ..SessionConfig::default()
        }
    }

    /// Straight corridor from (0, 0) up to a goal at (0, 4).
    fn corridor() -> TileGrid {
        TileGrid::from_rows(Coordinate::new(0, 0), &["G", "#", "#", "#", "#"]).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SessionConfig {
            engine: EngineConfig {
                bc_weight: 2.0,
                ..EngineConfig::default()
            },
            ..SessionConfig::default()
        };
        assert!(Session::load(config).is_err());
    }

    #[test]
    fn test_empty_session_walks_corridor() {
        let mut session = Session::load(quiet_config()).unwrap();
        assert!(!session.report().any_loaded());

        let mut log = EventLog::new();
        let outcome = session.run(&corridor(), &mut log, 1_000).unwrap();

        assert!(outcome.is_success());
        assert_eq!(log.count(EpisodeOutcome::Goal), 1);
        assert_eq!(log.sessions.len(), 1);
        assert_eq!(session.outcome(), Some(outcome));
    }

    #[test]
    fn test_run_respects_tick_limit() {
        let mut session = Session::load(quiet_config()).unwrap();
        let mut log = EventLog::new();
        assert_eq!(session.run(&corridor(), &mut log, 2), None);
        assert!(log.sessions.is_empty());
    }

    #[test]
    fn test_cancel_restarts_attempt() {
        let mut session = Session::load(quiet_config()).unwrap();
        let env = corridor();
        let mut motion = InstantMotion::new();
        let mut log = EventLog::new();

        session.tick(&env, &mut motion, &mut log);
        assert!(matches!(
            session.tick(&env, &mut motion, &mut log),
            TickOutcome::Moved(_)
        ));
        session.cancel();
        assert!(matches!(
            session.tick(&env, &mut motion, &mut log),
            TickOutcome::Reset { attempt: 2, .. }
        ));
    }

    #[test]
    fn test_load_reports_artifacts() {
        let dir = std::env::temp_dir().join(format!("tilepilot-session-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(ArtifactKind::ActionValue.default_file_name()),
            json!({ "(0, 3, 1, 2, 1, 0, 0)": [0.0, 10.0, 0.0, 0.0, 0.0] }).to_string(),
        )
        .unwrap();
        fs::write(
            dir.join(ArtifactKind::Imitation.default_file_name()),
            "{ not json",
        )
        .unwrap();

        let config = SessionConfig {
            artifacts: ArtifactPaths::in_dir(&dir),
            ..quiet_config()
        };
        let session = Session::load(config).unwrap();
        let report = session.report();

        assert!(matches!(
            report.status(ArtifactKind::ActionValue),
            ArtifactStatus::Loaded { entries: 1, .. }
        ));
        assert!(matches!(
            report.status(ArtifactKind::Imitation),
            ArtifactStatus::ParseError(_)
        ));
        assert!(matches!(
            report.status(ArtifactKind::BehaviorCloning),
            ArtifactStatus::NotFound
        ));

        fs::remove_dir_all(&dir).ok();
    }
}
