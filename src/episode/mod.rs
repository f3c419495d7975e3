//! Episode lifecycle: resets, steps, traps, retries and reporting.
//!
//! The [`EpisodeController`] is ticked by its host. It asks a
//! [`Policy`](crate::engine::Policy) for a move, hands the move to a
//! [`MotionDriver`] and refuses to decide again until the host reports the
//! motion finished. Episode and session results go to an
//! [`EpisodeObserver`].

pub mod controller;
pub mod motion;
pub mod observer;
pub mod visited;

pub use controller::{EpisodeController, EpisodeState, TickOutcome};
pub use motion::{InstantMotion, Motion, MotionDriver, MotionKind};
pub use observer::{EpisodeObserver, EpisodeOutcome, EpisodeSummary, EventLog, SessionOutcome};
pub use visited::VisitedTiles;
