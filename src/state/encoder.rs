//! Builds state keys from live tile queries.

use serde::{Deserialize, Serialize};

use super::key::{Neighborhood, StateKey};
use crate::grid::{Action, Coordinate, GridEnvironment};

/// Which of the two historical key encodings to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncoding {
    /// `(env, up, down, right, left)`. Transfers between maze instances that
    /// share a local pattern.
    #[default]
    PositionIndependent,
    /// `(x, y, env, up, down, right, left)`.
    PositionDependent,
}

/// Converts a position plus its 4-neighborhood into a [`StateKey`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StateEncoder {
    encoding: KeyEncoding,
}

impl StateEncoder {
    /// Creates an encoder producing the given key encoding.
    pub fn new(encoding: KeyEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Queries the five cells around `position`.
    pub fn sense<G: GridEnvironment + ?Sized>(env: &G, position: Coordinate) -> Neighborhood {
        Neighborhood::new(
            env.tile(position),
            env.tile(position.step(Action::Up)),
            env.tile(position.step(Action::Down)),
            env.tile(position.step(Action::Right)),
            env.tile(position.step(Action::Left)),
        )
    }

    /// Encodes the state at `position`. Pure over the environment's answers.
    pub fn encode<G: GridEnvironment + ?Sized>(&self, env: &G, position: Coordinate) -> StateKey {
        let neighborhood = Self::sense(env, position);
        match self.encoding {
            KeyEncoding::PositionIndependent => StateKey::pattern(neighborhood),
            KeyEncoding::PositionDependent => StateKey::positioned(position, neighborhood),
        }
    }

    /// Keys of the four candidate destinations, in [`Action::ALL`] order.
    pub fn neighbor_keys<G: GridEnvironment + ?Sized>(
        &self,
        env: &G,
        position: Coordinate,
    ) -> [StateKey; 4] {
        Action::ALL.map(|a| self.encode(env, position.step(a)))
    }
}
