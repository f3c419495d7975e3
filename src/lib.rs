//! tilepilot - tile-maze navigation driven by offline-learned policy tables
//!
//! An agent walks a grid of floor, hole, trap and goal tiles. Each think-tick
//! it encodes its local neighbourhood into a [`StateKey`](state::StateKey),
//! consults whatever learned tables are available (action values, imitation,
//! behaviour cloning, reward gradients), blends them with a noisy-tree
//! heuristic and moves one tile. An [`EpisodeController`](episode::EpisodeController)
//! handles resets, traps, timeouts and retries; a [`Session`](session::Session)
//! ties everything together.
//!
//! Missing or malformed artifacts never stop the agent: it degrades to the
//! next scoring tier and, with no data at all, to a safe heuristic.

pub mod config;
pub mod engine;
pub mod episode;
pub mod error;
pub mod grid;
pub mod memory;
pub mod policy;
pub mod session;
pub mod state;

pub use config::SessionConfig;
pub use engine::{DecisionEngine, Policy};
pub use error::{Error, Result};
pub use grid::{Action, Coordinate, GridEnvironment, TileGrid, TileType};
pub use session::Session;
