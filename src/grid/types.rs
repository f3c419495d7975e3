//! Core grid types.
//!
//! Defines tile classifications, the four discrete moves and integer grid
//! coordinates used throughout the agent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a single tile, using the trainer's numeric codes.
///
/// Priority for map merging: `Goal > Trap > Floor > Hole`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    Hole,
    Floor,
    Goal,
    Trap,
}

impl TileType {
    /// Decodes a trainer tile code (`0..=3`).
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TileType::Hole),
            1 => Some(TileType::Floor),
            2 => Some(TileType::Goal),
            3 => Some(TileType::Trap),
            _ => None,
        }
    }

    /// Returns the trainer tile code.
    pub fn code(&self) -> u8 {
        match self {
            TileType::Hole => 0,
            TileType::Floor => 1,
            TileType::Goal => 2,
            TileType::Trap => 3,
        }
    }

    /// Merge priority rank; a higher rank is never overwritten by a lower one.
    pub fn priority(&self) -> u8 {
        match self {
            TileType::Hole => 0,
            TileType::Floor => 1,
            TileType::Trap => 2,
            TileType::Goal => 3,
        }
    }

    /// Returns the higher-priority of two classifications.
    pub fn merge(self, other: TileType) -> TileType {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }

    /// Returns all tile types in code order.
    pub fn all() -> [TileType; 4] {
        [TileType::Hole, TileType::Floor, TileType::Goal, TileType::Trap]
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileType::Hole => write!(f, "hole"),
            TileType::Floor => write!(f, "floor"),
            TileType::Goal => write!(f, "goal"),
            TileType::Trap => write!(f, "trap"),
        }
    }
}

/// One discrete move.
///
/// Numbering follows the trainer (`1 = Up` .. `4 = Left`); `Up` is `+z` and
/// `Right` is `+x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Up,
    Right,
    Down,
    Left,
}

impl Action {
    /// All actions in trainer order.
    pub const ALL: [Action; 4] = [Action::Up, Action::Right, Action::Down, Action::Left];

    /// Decodes a trainer action number (`1..=4`).
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Action::Up),
            2 => Some(Action::Right),
            3 => Some(Action::Down),
            4 => Some(Action::Left),
            _ => None,
        }
    }

    /// Returns the trainer action number.
    pub fn code(&self) -> u8 {
        self.index() as u8 + 1
    }

    /// Returns the index into per-action arrays (0=Up, 1=Right, 2=Down, 3=Left).
    pub fn index(&self) -> usize {
        match self {
            Action::Up => 0,
            Action::Right => 1,
            Action::Down => 2,
            Action::Left => 3,
        }
    }

    /// Unit displacement `(dx, dz)` of this move.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Action::Up => (0, 1),
            Action::Right => (1, 0),
            Action::Down => (0, -1),
            Action::Left => (-1, 0),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Up => write!(f, "up"),
            Action::Right => write!(f, "right"),
            Action::Down => write!(f, "down"),
            Action::Left => write!(f, "left"),
        }
    }
}

/// An integer tile coordinate on the `(x, z)` plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub z: i32,
}

impl Coordinate {
    /// Creates a new coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The tile reached by taking `action` once.
    pub fn step(&self, action: Action) -> Self {
        self.offset(action, 1)
    }

    /// The tile `distance` tiles away in the direction of `action`.
    pub fn offset(&self, action: Action, distance: i32) -> Self {
        let (dx, dz) = action.delta();
        Self {
            x: self.x + dx * distance,
            z: self.z + dz * distance,
        }
    }

    /// Manhattan distance to another coordinate.
    pub fn manhattan(&self, other: &Coordinate) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }

    /// Euclidean distance to another coordinate.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dz = f64::from(self.z - other.z);
        (dx * dx + dz * dz).sqrt()
    }

    /// Reflection across the `x = 0` axis.
    pub fn mirrored(&self) -> Self {
        Self {
            x: -self.x,
            z: self.z,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_codes_round_trip() {
        for tile in TileType::all() {
            assert_eq!(TileType::from_code(i64::from(tile.code())), Some(tile));
        }
        assert_eq!(TileType::from_code(9), None);
    }

    #[test]
    fn tile_priority_order() {
        assert!(TileType::Goal.priority() > TileType::Trap.priority());
        assert!(TileType::Trap.priority() > TileType::Floor.priority());
        assert!(TileType::Floor.priority() > TileType::Hole.priority());
        assert_eq!(TileType::Floor.merge(TileType::Hole), TileType::Floor);
        assert_eq!(TileType::Hole.merge(TileType::Goal), TileType::Goal);
    }

    #[test]
    fn action_codes_match_trainer() {
        assert_eq!(Action::Up.code(), 1);
        assert_eq!(Action::Right.code(), 2);
        assert_eq!(Action::Down.code(), 3);
        assert_eq!(Action::Left.code(), 4);
        assert_eq!(Action::from_code(0), None);
        assert_eq!(Action::from_code(3), Some(Action::Down));
    }

    #[test]
    fn coordinate_step_directions() {
        let c = Coordinate::new(0, 0);
        assert_eq!(c.step(Action::Up), Coordinate::new(0, 1));
        assert_eq!(c.step(Action::Right), Coordinate::new(1, 0));
        assert_eq!(c.step(Action::Down), Coordinate::new(0, -1));
        assert_eq!(c.step(Action::Left), Coordinate::new(-1, 0));
        assert_eq!(c.offset(Action::Left, 3), Coordinate::new(-3, 0));
    }

    #[test]
    fn coordinate_distances() {
        let a = Coordinate::new(0, 0);
        let b = Coordinate::new(3, -4);
        assert_eq!(a.manhattan(&b), 7);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn mirror_negates_x() {
        assert_eq!(Coordinate::new(3, 7).mirrored(), Coordinate::new(-3, 7));
    }
}
