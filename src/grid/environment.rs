//! Tile-query interface to the maze.
//!
//! The agent never owns the maze: it only asks what lies at a coordinate.
//! Anything outside the known area is a hole.

use std::collections::HashMap;

use super::types::{Coordinate, TileType};
use crate::error::{Error, Result};

/// Answers "what is at tile `(x, z)`?".
///
/// Implementations must return [`TileType::Hole`] for coordinates they know
/// nothing about; unknown space is unsafe.
pub trait GridEnvironment {
    /// Returns the tile classification at `at`.
    fn tile(&self, at: Coordinate) -> TileType;
}

impl<G: GridEnvironment + ?Sized> GridEnvironment for &G {
    fn tile(&self, at: Coordinate) -> TileType {
        (**self).tile(at)
    }
}

/// A rectangular in-memory maze.
///
/// Covers `x_min..=x_max` by `z_min..=z_max`; everything outside is a hole.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    x_min: i32,
    z_min: i32,
    width: usize,
    depth: usize,
    tiles: Vec<TileType>,
}

impl TileGrid {
    /// Creates a grid filled with `fill`.
    pub fn filled(x_min: i32, z_min: i32, width: usize, depth: usize, fill: TileType) -> Self {
        Self {
            x_min,
            z_min,
            width,
            depth,
            tiles: vec![fill; width * depth],
        }
    }

    /// Builds a grid from text rows, one character per tile.
    ///
    /// The **first** row is the highest `z`; `x` grows to the right. The
    /// bottom-left character sits at `origin`. Characters: `#` or `.` floor,
    /// `o` or ` ` hole, `G` goal, `T` trap.
    pub fn from_rows(origin: Coordinate, rows: &[&str]) -> Result<Self> {
        let depth = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Self::filled(origin.x, origin.z, width, depth, TileType::Hole);

        for (row_idx, row) in rows.iter().enumerate() {
            let z = origin.z + (depth - 1 - row_idx) as i32;
            for (col, ch) in row.chars().enumerate() {
                let tile = match ch {
                    '#' | '.' => TileType::Floor,
                    'o' | ' ' => TileType::Hole,
                    'G' => TileType::Goal,
                    'T' => TileType::Trap,
                    other => {
                        return Err(Error::invalid_config(format!(
                            "unknown tile character '{other}' in row {row_idx}"
                        )))
                    }
                };
                grid.set(Coordinate::new(origin.x + col as i32, z), tile);
            }
        }
        Ok(grid)
    }

    fn index(&self, at: Coordinate) -> Option<usize> {
        let xi = usize::try_from(at.x - self.x_min).ok()?;
        let zi = usize::try_from(at.z - self.z_min).ok()?;
        (xi < self.width && zi < self.depth).then(|| zi * self.width + xi)
    }

    /// Sets a tile; coordinates outside the grid are ignored.
    pub fn set(&mut self, at: Coordinate, tile: TileType) {
        if let Some(idx) = self.index(at) {
            self.tiles[idx] = tile;
        }
    }
}

impl GridEnvironment for TileGrid {
    fn tile(&self, at: Coordinate) -> TileType {
        self.index(at)
            .map(|idx| self.tiles[idx])
            .unwrap_or(TileType::Hole)
    }
}

/// Sparse maze backed by a map; every missing coordinate is a hole.
impl GridEnvironment for HashMap<Coordinate, TileType> {
    fn tile(&self, at: Coordinate) -> TileType {
        self.get(&at).copied().unwrap_or(TileType::Hole)
    }
}
