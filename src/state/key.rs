//! Typed state keys and their trainer string form.
//!
//! The offline trainer writes keys as Python tuple strings:
//!
//! ```text
//! (env, up, down, right, left)          position-independent
//! (x, y, env, up, down, right, left)    position-dependent
//! up,down,right,left                    surroundings only
//! ```
//!
//! Field order is load-bearing: keys are matched exactly, never compared
//! semantically. Parsing happens once at load time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::grid::{Action, Coordinate, TileType};

/// The five sensed cells around the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Neighborhood {
    pub center: TileType,
    pub up: TileType,
    pub down: TileType,
    pub right: TileType,
    pub left: TileType,
}

impl Neighborhood {
    /// Creates a neighborhood in trainer field order.
    pub fn new(
        center: TileType,
        up: TileType,
        down: TileType,
        right: TileType,
        left: TileType,
    ) -> Self {
        Self {
            center,
            up,
            down,
            right,
            left,
        }
    }

    /// The tile one step away in the direction of `action`.
    pub fn toward(&self, action: Action) -> TileType {
        match action {
            Action::Up => self.up,
            Action::Right => self.right,
            Action::Down => self.down,
            Action::Left => self.left,
        }
    }

    /// Trainer field order: self, up, down, right, left.
    pub fn as_array(&self) -> [TileType; 5] {
        [self.center, self.up, self.down, self.right, self.left]
    }

    /// The four cells around the centre.
    pub fn surroundings(&self) -> SurroundingsKey {
        SurroundingsKey {
            up: self.up,
            down: self.down,
            right: self.right,
            left: self.left,
        }
    }
}

/// The four cells around the agent, without the centre or a position.
///
/// Behaviour-cloning exports of the forest trainer key their rows this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurroundingsKey {
    pub up: TileType,
    pub down: TileType,
    pub right: TileType,
    pub left: TileType,
}

impl fmt::Display for SurroundingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [u, d, r, l] = [self.up, self.down, self.right, self.left].map(|t| t.code());
        write!(f, "{u},{d},{r},{l}")
    }
}

impl FromStr for SurroundingsKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tiles = s
            .split(',')
            .map(|f| {
                let code = f
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| Error::invalid_key(s, e.to_string()))?;
                TileType::from_code(code)
                    .ok_or_else(|| Error::invalid_key(s, format!("unknown tile code {code}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match tiles[..] {
            [up, down, right, left] => Ok(Self {
                up,
                down,
                right,
                left,
            }),
            _ => Err(Error::invalid_key(
                s,
                format!("expected 4 fields, got {}", tiles.len()),
            )),
        }
    }
}

/// Exact-match lookup key into every policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    /// Absolute position, present only in the position-dependent encoding.
    pub position: Option<Coordinate>,
    pub neighborhood: Neighborhood,
}

impl StateKey {
    /// Position-independent key.
    pub fn pattern(neighborhood: Neighborhood) -> Self {
        Self {
            position: None,
            neighborhood,
        }
    }

    /// Position-dependent key.
    pub fn positioned(position: Coordinate, neighborhood: Neighborhood) -> Self {
        Self {
            position: Some(position),
            neighborhood,
        }
    }

    /// Every `(coordinate, tile)` observation embedded in a positioned key.
    ///
    /// Empty for position-independent keys.
    pub fn observations(&self) -> Vec<(Coordinate, TileType)> {
        let Some(at) = self.position else {
            return Vec::new();
        };
        let n = &self.neighborhood;
        vec![
            (at, n.center),
            (at.step(Action::Up), n.up),
            (at.step(Action::Down), n.down),
            (at.step(Action::Right), n.right),
            (at.step(Action::Left), n.left),
        ]
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [c, u, d, r, l] = self.neighborhood.as_array().map(|t| t.code());
        match self.position {
            Some(p) => write!(f, "({}, {}, {c}, {u}, {d}, {r}, {l})", p.x, p.z),
            None => write!(f, "({c}, {u}, {d}, {r}, {l})"),
        }
    }
}

impl FromStr for StateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| Error::invalid_key(s, "expected a parenthesised tuple"))?;

        let fields = inner
            .split(',')
            .map(|f| f.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::invalid_key(s, e.to_string()))?;

        let (position, tiles) = match fields.len() {
            5 => (None, &fields[..]),
            7 => {
                let x = i32::try_from(fields[0]).map_err(|e| Error::invalid_key(s, e.to_string()))?;
                let z = i32::try_from(fields[1]).map_err(|e| Error::invalid_key(s, e.to_string()))?;
                (Some(Coordinate::new(x, z)), &fields[2..])
            }
            n => return Err(Error::invalid_key(s, format!("expected 5 or 7 fields, got {n}"))),
        };

        let mut decoded = [TileType::Hole; 5];
        for (slot, code) in decoded.iter_mut().zip(tiles) {
            *slot = TileType::from_code(*code)
                .ok_or_else(|| Error::invalid_key(s, format!("unknown tile code {code}")))?;
        }
        let [center, up, down, right, left] = decoded;

        Ok(StateKey {
            position,
            neighborhood: Neighborhood::new(center, up, down, right, left),
        })
    }
}
