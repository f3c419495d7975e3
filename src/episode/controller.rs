//! Episode state machine: reset, step, terminal handling and retries.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::motion::{Motion, MotionDriver};
use super::observer::{EpisodeObserver, EpisodeOutcome, EpisodeSummary, SessionOutcome};
use super::visited::VisitedTiles;
use crate::config::EpisodeConfig;
use crate::engine::{Policy, TickContext};
use crate::error::Result;
use crate::grid::{Action, Coordinate, GridEnvironment, TileType};

/// Controller states.
///
/// ```text
/// Resetting -> Stepping -> {Goal, Fallen, TrapResolving, TimedOut}
///           -> Resetting | Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    Resetting,
    Stepping,
    /// A trap displacement is in flight.
    TrapResolving,
    Goal,
    Fallen,
    TimedOut,
    Terminated,
}

impl fmt::Display for EpisodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EpisodeState::Resetting => "resetting",
            EpisodeState::Stepping => "stepping",
            EpisodeState::TrapResolving => "trap-resolving",
            EpisodeState::Goal => "goal",
            EpisodeState::Fallen => "fallen",
            EpisodeState::TimedOut => "timed-out",
            EpisodeState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// What one call to [`EpisodeController::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A motion is still outstanding; nothing was decided.
    Busy,
    /// A new attempt started at `position`.
    Reset { attempt: u32, position: Coordinate },
    /// A decided move was handed to the motion driver.
    Moved(Motion),
    /// A trap fired and its displacement was handed to the motion driver.
    TrapTriggered(Motion),
    EpisodeEnded(EpisodeSummary),
    /// The session just terminated; reported exactly once.
    SessionEnded(SessionOutcome),
    /// The session had already terminated; nothing happened.
    Terminated,
}

/// Drives one agent through repeated episodes.
///
/// # Lifecycle
///
/// 1. Create with [`EpisodeController::new`]; the first tick resets.
/// 2. Call [`tick`](Self::tick) once per think-interval.
/// 3. When the motion driver finishes, call
///    [`complete_motion`](Self::complete_motion). Until then every tick
///    returns [`TickOutcome::Busy`].
/// 4. Stop after [`TickOutcome::SessionEnded`].
#[derive(Debug)]
pub struct EpisodeController {
    config: EpisodeConfig,
    state: EpisodeState,
    position: Coordinate,
    steps: u32,
    attempts: u32,
    failures: u32,
    goals: u32,
    trap_chain: u32,
    trap_triggers: u32,
    visited: VisitedTiles,
    in_flight: Option<Motion>,
    outcome: Option<SessionOutcome>,
    rng: StdRng,
}

impl EpisodeController {
    /// Creates a controller in the `Resetting` state.
    ///
    /// # Arguments
    ///
    /// * `config` - Start position, limits and trap settings
    /// * `seed` - Fixed RNG seed for start offsets and trap rolls
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`](crate::error::Error::InvalidConfiguration)
    /// if `config` has a zero count or an empty random range.
    pub fn new(config: EpisodeConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            position: config.start,
            config,
            state: EpisodeState::Resetting,
            steps: 0,
            attempts: 0,
            failures: 0,
            goals: 0,
            trap_chain: 0,
            trap_triggers: 0,
            visited: VisitedTiles::new(),
            in_flight: None,
            outcome: None,
            rng,
        })
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    /// Agent tile; updated only when a motion completes.
    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// Moves decided in the current episode.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Episodes started so far, including the current one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Falls and timeouts.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Episodes that reached a goal.
    pub fn goals(&self) -> u32 {
        self.goals
    }

    /// Consecutive trap displacements in the current chain.
    pub fn trap_chain(&self) -> u32 {
        self.trap_chain
    }

    /// Visit counts for the current episode.
    pub fn visited(&self) -> &VisitedTiles {
        &self.visited
    }

    /// Motion awaiting [`complete_motion`](Self::complete_motion).
    pub fn in_flight(&self) -> Option<&Motion> {
        self.in_flight.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Session result, set once terminated.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn is_terminated(&self) -> bool {
        self.state == EpisodeState::Terminated
    }

    /// Advances the state machine by one think-tick.
    pub fn tick(
        &mut self,
        env: &dyn GridEnvironment,
        policy: &mut dyn Policy,
        driver: &mut dyn MotionDriver,
        observer: &mut dyn EpisodeObserver,
    ) -> TickOutcome {
        if self.in_flight.is_some() {
            return TickOutcome::Busy;
        }

        match self.state {
            EpisodeState::Terminated => TickOutcome::Terminated,
            EpisodeState::Resetting => self.reset(observer),
            // TrapResolving always has a motion in flight, caught above.
            EpisodeState::Stepping | EpisodeState::TrapResolving => {
                self.step(env, policy, driver, observer)
            }
            EpisodeState::Goal => {
                if self.goals >= self.config.episode_budget {
                    self.terminate(observer)
                } else {
                    self.reset(observer)
                }
            }
            EpisodeState::Fallen | EpisodeState::TimedOut => {
                if self.failures >= self.config.max_attempts {
                    self.terminate(observer)
                } else {
                    self.reset(observer)
                }
            }
        }
    }

    /// Marks the outstanding motion as finished and moves the agent onto its
    /// target. Returns the motion, or `None` if nothing was in flight.
    pub fn complete_motion(&mut self) -> Option<Motion> {
        let motion = self.in_flight.take()?;
        self.position = motion.to;
        if self.state == EpisodeState::TrapResolving {
            self.state = EpisodeState::Stepping;
        }
        Some(motion)
    }

    /// Abandons any in-flight motion or trap chain and returns to `Resetting`
    /// immediately. No-op once terminated.
    pub fn cancel(&mut self) {
        if self.state == EpisodeState::Terminated {
            return;
        }
        if let Some(motion) = self.in_flight.take() {
            log::debug!("cancelled in-flight motion {:?}", motion.kind);
        }
        self.trap_chain = 0;
        self.state = EpisodeState::Resetting;
    }

    fn reset(&mut self, observer: &mut dyn EpisodeObserver) -> TickOutcome {
        if self.attempts >= self.config.max_attempts {
            return self.terminate(observer);
        }
        self.attempts += 1;

        let offset = self
            .rng
            .gen_range(self.config.start_offset_min..=self.config.start_offset_max);
        let start = self.config.start;
        self.position = Coordinate::new(start.x + offset, start.z);
        self.steps = 0;
        self.trap_chain = 0;
        self.trap_triggers = 0;
        self.visited.clear();
        self.in_flight = None;
        self.state = EpisodeState::Stepping;

        log::debug!("attempt {} starts at {}", self.attempts, self.position);
        TickOutcome::Reset {
            attempt: self.attempts,
            position: self.position,
        }
    }

    fn step(
        &mut self,
        env: &dyn GridEnvironment,
        policy: &mut dyn Policy,
        driver: &mut dyn MotionDriver,
        observer: &mut dyn EpisodeObserver,
    ) -> TickOutcome {
        if self.steps > self.config.max_steps_per_episode {
            return self.end_episode(EpisodeOutcome::TimedOut, observer);
        }

        match env.tile(self.position) {
            TileType::Goal => self.end_episode(EpisodeOutcome::Goal, observer),
            TileType::Hole => self.end_episode(EpisodeOutcome::Fallen, observer),
            TileType::Trap => self.trigger_trap(driver, observer),
            TileType::Floor => {
                self.trap_chain = 0;
                let mut ctx = TickContext::new(env, &mut self.visited);
                let action = policy.select_action(self.position, &mut ctx);
                let motion = Motion::step(self.position, action);
                self.steps += 1;
                self.begin(motion, driver);
                TickOutcome::Moved(motion)
            }
        }
    }

    fn trigger_trap(
        &mut self,
        driver: &mut dyn MotionDriver,
        observer: &mut dyn EpisodeObserver,
    ) -> TickOutcome {
        self.trap_chain += 1;
        self.trap_triggers += 1;
        if self.trap_chain > self.config.max_trap_chain {
            log::warn!(
                "trap chain at {} exceeded {} displacements; counting as a fall",
                self.position,
                self.config.max_trap_chain
            );
            return self.end_episode(EpisodeOutcome::Fallen, observer);
        }

        let direction = Action::ALL[self.rng.gen_range(0..Action::ALL.len())];
        let distance = self
            .rng
            .gen_range(self.config.trap_distance_min..=self.config.trap_distance_max);
        let motion = Motion::displacement(self.position, direction, distance);
        self.state = EpisodeState::TrapResolving;
        self.begin(motion, driver);
        log::debug!(
            "trap at {} throws the agent {distance} tiles {direction}",
            motion.from
        );
        TickOutcome::TrapTriggered(motion)
    }

    fn begin(&mut self, motion: Motion, driver: &mut dyn MotionDriver) {
        self.in_flight = Some(motion);
        driver.start(&motion);
    }

    fn end_episode(
        &mut self,
        outcome: EpisodeOutcome,
        observer: &mut dyn EpisodeObserver,
    ) -> TickOutcome {
        self.state = match outcome {
            EpisodeOutcome::Goal => {
                self.goals += 1;
                EpisodeState::Goal
            }
            EpisodeOutcome::Fallen => {
                self.failures += 1;
                EpisodeState::Fallen
            }
            EpisodeOutcome::TimedOut => {
                self.failures += 1;
                EpisodeState::TimedOut
            }
        };

        let summary = EpisodeSummary {
            attempt: self.attempts,
            outcome,
            steps: self.steps,
            final_position: self.position,
            trap_triggers: self.trap_triggers,
        };
        log::debug!(
            "attempt {} ended {} after {} steps at {}",
            summary.attempt,
            self.state,
            summary.steps,
            summary.final_position
        );
        observer.on_episode_end(&summary);
        TickOutcome::EpisodeEnded(summary)
    }

    fn terminate(&mut self, observer: &mut dyn EpisodeObserver) -> TickOutcome {
        let outcome = if self.goals >= self.config.episode_budget {
            SessionOutcome::Succeeded {
                goals: self.goals,
                attempts: self.attempts,
            }
        } else {
            SessionOutcome::Failed {
                goals: self.goals,
                failures: self.failures,
                attempts: self.attempts,
            }
        };
        self.state = EpisodeState::Terminated;
        self.outcome = Some(outcome);
        log::info!("session {outcome}");
        observer.on_session_end(&outcome);
        TickOutcome::SessionEnded(outcome)
    }
}
